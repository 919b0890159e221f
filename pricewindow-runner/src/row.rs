//! Input and output rows.
//!
//! An [`InputRow`] is an ordered set of named text cells, exactly as read from
//! the input table. An [`OutputRow`] carries the input cells through unchanged
//! and adds the generated columns in a fixed order:
//!
//! 1. every input column (minus any that collide with generated names)
//! 2. `adjusted_base_date` (only on success)
//! 3. `fetch_status`
//! 4. every schema column, `open_d-5` .. `volume_d+5`

use chrono::NaiveDate;
use pricewindow_core::domain::format_date;
use pricewindow_core::window::{ColumnSchema, FlatRecord};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

/// Output key for the aligned trading date.
pub const ADJUSTED_BASE_DATE: &str = "adjusted_base_date";

/// Output key for the per-row status.
pub const FETCH_STATUS: &str = "fetch_status";

/// One input record: column name to raw text, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputRow {
    fields: Vec<(String, String)>,
}

impl InputRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut row = Self::new();
        for (k, v) in pairs {
            row.set(k, v);
        }
        row
    }

    /// Set a cell. An existing column keeps its position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for InputRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Whether a row got its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Success,
    Failed,
}

impl FetchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FetchStatus::Success => "success",
            FetchStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single output value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell<'a> {
    Text(&'a str),
    Date(NaiveDate),
    Int(i64),
    Null,
}

impl Cell<'_> {
    /// Text form for delimited output; null is the empty string.
    pub fn to_field(&self) -> String {
        match self {
            Cell::Text(s) => (*s).to_string(),
            Cell::Date(d) => format_date(*d),
            Cell::Int(n) => n.to_string(),
            Cell::Null => String::new(),
        }
    }
}

impl Serialize for Cell<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Date(d) => serializer.serialize_str(&format_date(*d)),
            Cell::Int(n) => serializer.serialize_i64(*n),
            Cell::Null => serializer.serialize_none(),
        }
    }
}

/// One processed record.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub input: InputRow,
    /// Aligned trading date. `None` on failed rows.
    pub adjusted_base_date: Option<NaiveDate>,
    pub fetch_status: FetchStatus,
    /// Always conformed to the run's schema.
    pub record: FlatRecord,
}

impl OutputRow {
    pub fn success(input: InputRow, adjusted: NaiveDate, record: FlatRecord) -> Self {
        Self {
            input,
            adjusted_base_date: Some(adjusted),
            fetch_status: FetchStatus::Success,
            record,
        }
    }

    /// A failed row: all schema columns null, no adjusted date.
    pub fn failed(input: InputRow, schema: &ColumnSchema) -> Self {
        Self {
            input,
            adjusted_base_date: None,
            fetch_status: FetchStatus::Failed,
            record: FlatRecord::nulls(schema),
        }
    }

    pub fn is_success(&self) -> bool {
        self.fetch_status == FetchStatus::Success
    }

    fn is_generated(&self, key: &str) -> bool {
        key == ADJUSTED_BASE_DATE || key == FETCH_STATUS || self.record.get(key).is_some()
    }

    /// All cells in output order.
    ///
    /// Input columns named like a generated column (left over from a previous
    /// run over the same file) are replaced, not duplicated.
    pub fn entries(&self) -> Vec<(&str, Cell<'_>)> {
        let mut out = Vec::with_capacity(self.input.len() + 2 + self.record.len());
        out.extend(
            self.input
                .iter()
                .filter(|(k, _)| !self.is_generated(k))
                .map(|(k, v)| (k, Cell::Text(v))),
        );
        if let Some(date) = self.adjusted_base_date {
            out.push((ADJUSTED_BASE_DATE, Cell::Date(date)));
        }
        out.push((FETCH_STATUS, Cell::Text(self.fetch_status.as_str())));
        out.extend(self.record.iter().map(|(k, v)| {
            let cell = match v {
                Some(n) => Cell::Int(n),
                None => Cell::Null,
            };
            (k, cell)
        }));
        out
    }

    /// Look up one output cell by name.
    pub fn get(&self, key: &str) -> Option<Cell<'_>> {
        match key {
            ADJUSTED_BASE_DATE => self.adjusted_base_date.map(Cell::Date),
            FETCH_STATUS => Some(Cell::Text(self.fetch_status.as_str())),
            _ => match self.record.get(key) {
                Some(Some(n)) => Some(Cell::Int(n)),
                Some(None) => Some(Cell::Null),
                None => self.input.get(key).map(Cell::Text),
            },
        }
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries().into_iter().map(|(k, _)| k).collect()
    }
}

impl Serialize for OutputRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.entries();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (k, cell) in &entries {
            map.serialize_entry(k, cell)?;
        }
        map.end()
    }
}

/// Header for a tabular output: input headers, then the generated columns.
///
/// `adjusted_base_date` is always present here so every row has the same
/// width; failed rows leave it empty.
pub fn output_columns(input_headers: &[String], schema: &ColumnSchema) -> Vec<String> {
    let mut columns: Vec<String> = input_headers
        .iter()
        .filter(|h| {
            h.as_str() != ADJUSTED_BASE_DATE && h.as_str() != FETCH_STATUS && !schema.contains(h)
        })
        .cloned()
        .collect();
    columns.push(ADJUSTED_BASE_DATE.to_string());
    columns.push(FETCH_STATUS.to_string());
    columns.extend(schema.iter().map(str::to_string));
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricewindow_core::window::WindowSpec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input() -> InputRow {
        InputRow::from_pairs([
            ("tyo.code", "7203"),
            ("base_date", "2024-01-15"),
            ("note", "x"),
        ])
    }

    #[test]
    fn set_keeps_column_position() {
        let mut row = input();
        row.set("tyo.code", "9984");
        assert_eq!(row.keys().collect::<Vec<_>>(), ["tyo.code", "base_date", "note"]);
        assert_eq!(row.get("tyo.code"), Some("9984"));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn failed_row_has_status_and_null_schema() {
        let schema = ColumnSchema::new(WindowSpec::new(1, 1));
        let row = OutputRow::failed(input(), &schema);

        assert_eq!(row.get(FETCH_STATUS), Some(Cell::Text("failed")));
        assert_eq!(row.get(ADJUSTED_BASE_DATE), None);
        assert_eq!(row.get("close_d0"), Some(Cell::Null));
        assert_eq!(row.get("note"), Some(Cell::Text("x")));
        assert_eq!(row.keys().len(), 3 + 1 + 15);
    }

    #[test]
    fn entries_follow_output_order() {
        let schema = ColumnSchema::new(WindowSpec::new(0, 0));
        let record = FlatRecord::nulls(&schema);
        let row = OutputRow::success(input(), date(2024, 1, 12), record);

        assert_eq!(
            row.keys(),
            [
                "tyo.code",
                "base_date",
                "note",
                ADJUSTED_BASE_DATE,
                FETCH_STATUS,
                "open_d0",
                "high_d0",
                "low_d0",
                "close_d0",
                "volume_d0",
            ]
        );
    }

    #[test]
    fn stale_generated_columns_are_replaced() {
        let schema = ColumnSchema::new(WindowSpec::new(0, 0));
        let mut stale = input();
        stale.set(FETCH_STATUS, "success");
        stale.set(ADJUSTED_BASE_DATE, "2023-12-29");
        stale.set("close_d0", "123");

        let row = OutputRow::failed(stale, &schema);
        let keys = row.keys();

        assert_eq!(keys.iter().filter(|k| **k == FETCH_STATUS).count(), 1);
        assert!(!keys.contains(&ADJUSTED_BASE_DATE));
        assert_eq!(row.get("close_d0"), Some(Cell::Null));
    }

    #[test]
    fn serializes_as_ordered_json_object() {
        let schema = ColumnSchema::new(WindowSpec::new(0, 0));
        let row = OutputRow::success(
            InputRow::from_pairs([("tyo.code", "7203")]),
            date(2024, 1, 12),
            FlatRecord::nulls(&schema),
        );

        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"tyo.code":"7203","adjusted_base_date":"2024-01-12","fetch_status":"success","open_d0":null,"high_d0":null,"low_d0":null,"close_d0":null,"volume_d0":null}"#
        );
    }

    #[test]
    fn output_columns_drop_stale_generated_headers() {
        let schema = ColumnSchema::new(WindowSpec::new(0, 0));
        let headers: Vec<String> = ["tyo.code", "fetch_status", "open_d0", "base_date"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let columns = output_columns(&headers, &schema);
        assert_eq!(
            columns,
            [
                "tyo.code",
                "base_date",
                ADJUSTED_BASE_DATE,
                FETCH_STATUS,
                "open_d0",
                "high_d0",
                "low_d0",
                "close_d0",
                "volume_d0",
            ]
        );
    }

    #[test]
    fn cell_field_text() {
        assert_eq!(Cell::Date(date(2024, 1, 5)).to_field(), "2024-01-05");
        assert_eq!(Cell::Int(-3).to_field(), "-3");
        assert_eq!(Cell::Null.to_field(), "");
    }
}
