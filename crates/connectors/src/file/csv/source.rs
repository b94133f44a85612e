use crate::file::csv::{
    error::FileError,
    metadata::{CsvColumnMetadata, CsvMetadata, infer_type, normalize_col_name, parse_cell},
};
use model::{
    core::{data_type::SourceType, value::Value},
    records::table::{Series, Table},
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub has_header: bool,
    /// Cells equal to one of these (after trimming) are read as null.
    pub null_values: Vec<String>,
    pub normalize_headers: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            null_values: vec![String::new(), "NULL".to_string()],
            normalize_headers: false,
        }
    }
}

impl CsvOptions {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn with_null_values(mut self, null_values: Vec<String>) -> Self {
        self.null_values = null_values;
        self
    }

    pub fn with_normalized_headers(mut self, normalize: bool) -> Self {
        self.normalize_headers = normalize;
        self
    }
}

/// Reads a whole CSV file into an in-memory [`Table`], inferring one type
/// per column.
pub struct CsvTableReader {
    path: PathBuf,
    options: CsvOptions,
}

impl CsvTableReader {
    pub fn new(path: impl AsRef<Path>, options: CsvOptions) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            options,
        }
    }

    pub fn read(&self) -> Result<(CsvMetadata, Table), FileError> {
        if !self.path.exists() {
            return Err(FileError::NotFound(self.path.display().to_string()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .has_headers(self.options.has_header)
            .from_path(&self.path)?;

        let mut records = Vec::new();
        for record in reader.records() {
            records.push(record?);
        }

        let width = match (self.options.has_header, records.first()) {
            (true, _) => reader.headers()?.len(),
            (false, Some(first)) => first.len(),
            (false, None) => 0,
        };
        if width == 0 {
            return Err(FileError::InvalidFormat(format!(
                "{} has no columns",
                self.path.display()
            )));
        }

        let headers = self.headers(&mut reader, width)?;
        debug!(file = %self.path.display(), rows = records.len(), columns = width, "Read CSV records");

        let nulls = &self.options.null_values;
        let mut series = Vec::with_capacity(width);
        let mut columns = Vec::with_capacity(width);
        for (ordinal, name) in headers.iter().enumerate() {
            let dtype = infer_type(records.iter().map(|r| cell(nulls, r, ordinal)));
            let values = records
                .iter()
                .map(|r| match cell(nulls, r, ordinal) {
                    Some(raw) => parse_cell(raw, &dtype).unwrap_or(Value::Null),
                    None => Value::Null,
                })
                .collect::<Vec<_>>();

            columns.push(CsvColumnMetadata {
                name: name.clone(),
                data_type: dtype.clone(),
                is_nullable: values.iter().any(Value::is_null) || dtype == SourceType::Null,
                ordinal,
            });
            series.push(Series::new(name, dtype, values));
        }

        let table = Table::new(series)?;
        let meta = CsvMetadata {
            name: self
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            columns,
            delimiter: char::from(self.options.delimiter),
            has_header: self.options.has_header,
        };

        info!(file = %self.path.display(), rows = table.height(), columns = table.width(), "Loaded CSV file");
        Ok((meta, table))
    }

    fn headers(
        &self,
        reader: &mut csv::Reader<std::fs::File>,
        width: usize,
    ) -> Result<Vec<String>, FileError> {
        if !self.options.has_header {
            return Ok((1..=width).map(|i| format!("column_{i}")).collect());
        }

        let headers = reader
            .headers()?
            .iter()
            .map(|h| {
                if self.options.normalize_headers {
                    normalize_col_name(h)
                } else {
                    h.trim().to_string()
                }
            })
            .collect();
        Ok(headers)
    }
}

/// A raw cell, or `None` when it is missing or spells a null.
fn cell<'r>(null_values: &[String], row: &'r csv::StringRecord, idx: usize) -> Option<&'r str> {
    row.get(idx)
        .filter(|raw| !null_values.iter().any(|n| n == raw.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_infers_column_types() {
        let file = write_csv("id,price,active,name,seen\n1,2.5,true,ann,2024-01-01\n2,,false,,2024-01-02\n");
        let (meta, table) = CsvTableReader::new(file.path(), CsvOptions::default())
            .read()
            .unwrap();

        let types: Vec<_> = meta.columns.iter().map(|c| c.data_type.clone()).collect();
        assert_eq!(
            types,
            vec![
                SourceType::Int64,
                SourceType::Float64,
                SourceType::Boolean,
                SourceType::Utf8,
                SourceType::Date,
            ]
        );
        assert_eq!(table.height(), 2);
        assert_eq!(table.column("price").unwrap().values[1], Value::Null);
        assert!(meta.columns[3].is_nullable);
        assert!(!meta.columns[0].is_nullable);
    }

    #[test]
    fn test_read_without_header() {
        let file = write_csv("a;1\nb;2\n");
        let options = CsvOptions::default()
            .with_delimiter(b';')
            .with_header(false);
        let (meta, table) = CsvTableReader::new(file.path(), options).read().unwrap();

        assert_eq!(meta.columns[0].name, "column_1");
        assert_eq!(table.width(), 2);
        assert_eq!(table.column("column_2").unwrap().values[0], Value::Int(1));
    }

    #[test]
    fn test_missing_file() {
        let err = CsvTableReader::new("/definitely/not/here.csv", CsvOptions::default())
            .read()
            .unwrap_err();
        assert!(matches!(err, FileError::NotFound(_)));
    }
}
