//! Window → flat `{field}_{offset}` record, with integer normalization.
//!
//! This is the only place numeric values are floored. Downstream layers
//! (row assembly, writers) pass the integers through untouched.

use super::schema::{column_key, ColumnSchema};
use crate::domain::{Field, TradingSession};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// Floor toward negative infinity. NaN and infinities become `None`.
///
/// `12.9 → 12`, `-0.5 → -1`. Values beyond the `i64` range saturate.
pub fn floor_to_int(value: f64) -> Option<i64> {
    if value.is_finite() {
        Some(value.floor() as i64)
    } else {
        None
    }
}

fn field_value(session: &TradingSession, field: Field) -> Option<i64> {
    match field {
        Field::Volume => session
            .volume
            .map(|v| i64::try_from(v).unwrap_or(i64::MAX)),
        price => session.price(price).and_then(floor_to_int),
    }
}

/// Ordered mapping from column key to integer-or-null.
///
/// Straight out of [`flatten`] it holds only the offsets present in the
/// window; [`FlatRecord::conform`] turns it into the full schema shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatRecord {
    entries: Vec<(String, Option<i64>)>,
}

impl FlatRecord {
    /// All schema columns, all null. Used for failed rows.
    pub fn nulls(schema: &ColumnSchema) -> Self {
        Self {
            entries: schema.iter().map(|c| (c.to_string(), None)).collect(),
        }
    }

    /// Re-key onto `schema`: exactly the schema columns, in schema order,
    /// null where this record has no entry. Keys outside the schema are dropped.
    pub fn conform(&self, schema: &ColumnSchema) -> Self {
        let present: HashMap<&str, Option<i64>> =
            self.entries.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        Self {
            entries: schema
                .iter()
                .map(|c| (c.to_string(), present.get(c).copied().flatten()))
                .collect(),
        }
    }

    /// `None` if the key is absent, `Some(None)` if present but null.
    pub fn get(&self, key: &str) -> Option<Option<i64>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<i64>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of non-null values.
    pub fn populated(&self) -> usize {
        self.entries.iter().filter(|(_, v)| v.is_some()).count()
    }
}

impl Serialize for FlatRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Flatten `(offset, session)` pairs into a record.
///
/// Total over whatever it is given: offsets missing from the input are simply
/// not written.
pub fn flatten<'a, I>(window: I) -> FlatRecord
where
    I: IntoIterator<Item = (i64, &'a TradingSession)>,
{
    let mut entries = Vec::new();
    for (offset, session) in window {
        for field in Field::ALL {
            entries.push((column_key(field, offset), field_value(session, field)));
        }
    }
    FlatRecord { entries }
}
