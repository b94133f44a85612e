use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::CliError;

/// Environment variables used to expand `${VAR}` references in connection
/// strings, loaded from the process and optionally a .env file
#[derive(Debug, Clone)]
pub struct EnvManager {
    vars: HashMap<String, String>,
}

/// Connection string keys whose values never reach the logs
const SENSITIVE_KEYS: &[&str] = &["password", "pwd", "secret", "token", "access token"];

impl EnvManager {
    pub fn new() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Load variables from a .env file; file entries win over the process
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), CliError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read env file {}: {}", path.display(), e))
        })?;

        self.parse_env_content(&content)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Replaces every `${VAR}` with its value. Unknown variables are an error.
    pub fn expand(&self, template: &str) -> Result<String, CliError> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find('}').ok_or_else(|| {
                CliError::Config(format!("Unterminated variable reference in '{}'", Self::mask(template)))
            })?;

            let name = &after[..end];
            let value = self
                .get(name)
                .ok_or_else(|| CliError::Config(format!("Environment variable '{name}' is not set")))?;
            out.push_str(value);
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }

    /// Hides the values of sensitive `key=value` pairs of a connection string.
    pub fn mask(conn_str: &str) -> String {
        conn_str
            .split(';')
            .map(|pair| match pair.split_once('=') {
                Some((key, _))
                    if SENSITIVE_KEYS
                        .iter()
                        .any(|s| key.trim().eq_ignore_ascii_case(s)) =>
                {
                    format!("{key}=****")
                }
                _ => pair.to_string(),
            })
            .collect::<Vec<_>>()
            .join(";")
    }

    fn parse_env_content(&mut self, content: &str) -> Result<(), CliError> {
        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid env file: malformed line {} (expected KEY=VALUE)",
                    line_num + 1
                )));
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::Config(format!(
                    "Invalid env file: empty key at line {}",
                    line_num + 1
                )));
            }

            self.vars
                .insert(key.to_string(), Self::unquote_value(value));
        }

        Ok(())
    }

    fn unquote_value(value: &str) -> String {
        let value = value.trim();
        for quote in ['"', '\''] {
            if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
                return value[1..value.len() - 1].to_string();
            }
        }
        value.to_string()
    }
}

impl Default for EnvManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> EnvManager {
        EnvManager {
            vars: HashMap::new(),
        }
    }

    #[test]
    fn test_parse_quoted_values() {
        let mut env = empty();
        let content = r#"
# Comment
MSSQL_HOST=db.local
MSSQL_PASSWORD="p@ss word"
MSSQL_USER='loader'
        "#;

        env.parse_env_content(content).unwrap();
        assert_eq!(env.get("MSSQL_HOST"), Some("db.local"));
        assert_eq!(env.get("MSSQL_PASSWORD"), Some("p@ss word"));
        assert_eq!(env.get("MSSQL_USER"), Some("loader"));
    }

    #[test]
    fn test_invalid_env_format() {
        let mut env = empty();
        assert!(env.parse_env_content("INVALID LINE WITHOUT EQUALS").is_err());
        assert!(env.parse_env_content("=value").is_err());
    }

    #[test]
    fn test_expand_references() {
        let mut env = empty();
        env.parse_env_content("HOST=db.local\nPWD=s3cret").unwrap();

        let expanded = env
            .expand("server=tcp:${HOST},1433;user=sa;password=${PWD}")
            .unwrap();
        assert_eq!(expanded, "server=tcp:db.local,1433;user=sa;password=s3cret");

        assert!(env.expand("password=${MISSING}").is_err());
        assert!(env.expand("password=${PWD").is_err());
    }

    #[test]
    fn test_mask_sensitive_pairs() {
        assert_eq!(
            EnvManager::mask("server=db;User Id=sa;Password=s3cret;TrustServerCertificate=true"),
            "server=db;User Id=sa;Password=****;TrustServerCertificate=true"
        );
    }
}
