use crate::core::value::Value;
use std::sync::Arc;

/// A converted row, aligned positionally to the source field order.
pub type WireRow = Vec<Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Submission sequence number within one load.
    pub index: u64,
    /// Offset of the first row of this batch within the source.
    pub first_row: u64,
    /// Source field names, one per position of every row.
    pub columns: Arc<[String]>,
    pub rows: Vec<WireRow>, // already converted
    pub manifest: Manifest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Manifest {
    pub row_count: usize,
    pub size_bytes: usize,
}

pub fn manifest_for(rows: &[WireRow]) -> Manifest {
    Manifest {
        row_count: rows.len(),
        size_bytes: rows
            .iter()
            .map(|r| r.iter().map(Value::size_bytes).sum::<usize>())
            .sum(),
    }
}

impl Batch {
    pub fn new(index: u64, first_row: u64, columns: Arc<[String]>, rows: Vec<WireRow>) -> Self {
        let manifest = manifest_for(&rows);
        Self {
            index,
            first_row,
            columns,
            rows,
            manifest,
        }
    }

    pub fn empty(index: u64, first_row: u64) -> Self {
        Self::new(index, first_row, Arc::from(Vec::new()), Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn size_bytes(&self) -> usize {
        self.manifest.size_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_counts_rows_and_bytes() {
        let batch = Batch::new(
            0,
            0,
            Arc::from(vec!["id".to_string(), "name".to_string()]),
            vec![
                vec![Value::Int(1), Value::String("ab".into())],
                vec![Value::Int(2), Value::Null],
            ],
        );
        assert_eq!(batch.manifest.row_count, 2);
        assert_eq!(batch.size_bytes(), 8 + 2 + 8);
        assert!(!batch.is_empty());
        assert!(Batch::empty(3, 10).is_empty());
    }
}
