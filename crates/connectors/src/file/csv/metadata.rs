use chrono::{NaiveDate, NaiveDateTime};
use model::core::{data_type::SourceType, value::Value};
use serde::Serialize;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

#[derive(Debug, Clone, Serialize)]
pub struct CsvColumnMetadata {
    pub name: String,
    pub data_type: SourceType,
    pub is_nullable: bool,
    pub ordinal: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CsvMetadata {
    pub name: String,
    pub columns: Vec<CsvColumnMetadata>,
    pub delimiter: char,
    pub has_header: bool,
}

pub fn normalize_col_name(name: &str) -> String {
    name.trim()
        .replace([' ', '-', '.', '(', ')', ','], "_")
        .to_lowercase()
}

/// Picks the narrowest type every non-empty cell of a column parses as.
pub fn infer_type<'a>(cells: impl Iterator<Item = Option<&'a str>>) -> SourceType {
    let mut present = cells.flatten().peekable();
    if present.peek().is_none() {
        return SourceType::Null;
    }

    let candidates = [
        SourceType::Int64,
        SourceType::Float64,
        SourceType::Boolean,
        SourceType::Date,
        SourceType::Datetime,
    ];

    let cells: Vec<&str> = present.collect();
    candidates
        .into_iter()
        .find(|dtype| cells.iter().all(|c| parse_cell(c, dtype).is_some()))
        .unwrap_or(SourceType::Utf8)
}

/// Parses one raw cell as the given type. `None` when it does not fit.
pub fn parse_cell(raw: &str, dtype: &SourceType) -> Option<Value> {
    let raw = raw.trim();
    match dtype {
        SourceType::Int64 => raw.parse::<i64>().ok().map(Value::Int),
        SourceType::Float64 => raw.parse::<f64>().ok().map(Value::Float),
        SourceType::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" => Some(Value::Boolean(true)),
            "false" => Some(Value::Boolean(false)),
            _ => None,
        },
        SourceType::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .ok()
            .map(Value::Date),
        SourceType::Datetime => TIMESTAMP_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(Value::Timestamp),
        SourceType::Null => None,
        _ => Some(Value::String(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infer(cells: &[Option<&str>]) -> SourceType {
        infer_type(cells.iter().copied())
    }

    #[test]
    fn test_infer_narrowest_type() {
        assert_eq!(infer(&[Some("1"), None, Some("-3")]), SourceType::Int64);
        assert_eq!(infer(&[Some("1"), Some("2.5")]), SourceType::Float64);
        assert_eq!(infer(&[Some("TRUE"), Some("false")]), SourceType::Boolean);
        assert_eq!(infer(&[Some("2024-02-29")]), SourceType::Date);
        assert_eq!(
            infer(&[Some("2024-02-29 10:11:12"), Some("2024-03-01T00:00:00.5")]),
            SourceType::Datetime
        );
        assert_eq!(infer(&[Some("1"), Some("x")]), SourceType::Utf8);
        assert_eq!(infer(&[None, None]), SourceType::Null);
    }

    #[test]
    fn test_normalize_col_name() {
        assert_eq!(normalize_col_name(" Unit Price (EUR)"), "unit_price__eur_");
    }
}
