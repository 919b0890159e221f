//! Canonical output column schema.
//!
//! Columns run from offset `-past` to `+future`; within an offset the fields
//! follow [`Field::ALL`]. This order is the output contract for every writer.

use super::WindowSpec;
use crate::domain::Field;
use serde::Serialize;
use std::collections::HashMap;

/// Offset tag used in column keys: `d0`, `d-3`, `d+2`.
pub fn offset_tag(offset: i64) -> String {
    if offset > 0 {
        format!("d+{offset}")
    } else {
        format!("d{offset}")
    }
}

/// Column key for one field at one offset, e.g. `close_d-1`.
pub fn column_key(field: Field, offset: i64) -> String {
    format!("{}_{}", field.name(), offset_tag(offset))
}

/// Ordered column names for a window configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    spec: WindowSpec,
    columns: Vec<String>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl ColumnSchema {
    pub fn new(spec: WindowSpec) -> Self {
        let mut columns = Vec::with_capacity(spec.width() * Field::ALL.len());
        for offset in -(spec.past as i64)..=(spec.future as i64) {
            for field in Field::ALL {
                columns.push(column_key(field, offset));
            }
        }
        let positions = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self {
            spec,
            columns,
            positions,
        }
    }

    pub fn spec(&self) -> WindowSpec {
        self.spec
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.as_str())
    }

    /// Position of a column in the canonical order.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_tags() {
        assert_eq!(offset_tag(0), "d0");
        assert_eq!(offset_tag(-3), "d-3");
        assert_eq!(offset_tag(2), "d+2");
    }

    #[test]
    fn default_schema_shape() {
        let schema = ColumnSchema::new(WindowSpec::default());
        assert_eq!(schema.len(), 55);
        assert_eq!(schema.columns()[0], "open_d-5");
        assert_eq!(schema.columns()[4], "volume_d-5");
        assert_eq!(schema.columns()[25], "open_d0");
        assert_eq!(schema.columns()[54], "volume_d+5");
    }

    #[test]
    fn fields_stay_grouped_by_offset() {
        let schema = ColumnSchema::new(WindowSpec::new(1, 1));
        let cols: Vec<&str> = schema.iter().collect();
        assert_eq!(
            cols,
            vec![
                "open_d-1",
                "high_d-1",
                "low_d-1",
                "close_d-1",
                "volume_d-1",
                "open_d0",
                "high_d0",
                "low_d0",
                "close_d0",
                "volume_d0",
                "open_d+1",
                "high_d+1",
                "low_d+1",
                "close_d+1",
                "volume_d+1",
            ]
        );
    }

    #[test]
    fn schema_is_deterministic() {
        let a = ColumnSchema::new(WindowSpec::new(3, 7));
        let b = ColumnSchema::new(WindowSpec::new(3, 7));
        assert_eq!(a.columns(), b.columns());
    }

    #[test]
    fn zero_window_has_only_d0() {
        let schema = ColumnSchema::new(WindowSpec::new(0, 0));
        assert_eq!(schema.len(), 5);
        assert!(schema.iter().all(|c| c.ends_with("_d0")));
    }

    #[test]
    fn position_lookup() {
        let schema = ColumnSchema::new(WindowSpec::new(2, 2));
        assert_eq!(schema.position("open_d-2"), Some(0));
        assert_eq!(schema.position("close_d0"), Some(13));
        assert_eq!(schema.position("close_d+3"), None);
        assert!(!schema.contains("adj_close_d0"));
    }
}
