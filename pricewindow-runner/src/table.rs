//! Tabular input and output.
//!
//! Input is a headed CSV; every cell is kept as text. Output is either CSV
//! (input columns, then `adjusted_base_date`, `fetch_status`, then the window
//! schema) or a JSON array of objects in the same key order. File writes go
//! to a `.tmp` sibling and are renamed into place, so overwriting the input
//! never leaves a half-written file.

use crate::row::{output_columns, Cell, InputRow, OutputRow};
use pricewindow_core::window::ColumnSchema;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input has no header row")]
    NoHeader,
}

/// Rows read from an input table, plus its header in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowTable {
    pub headers: Vec<String>,
    pub rows: Vec<InputRow>,
}

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    /// Guess from the file extension; anything but `.json` is CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
            _ => OutputFormat::Csv,
        }
    }
}

pub fn read_csv(path: &Path) -> Result<RowTable, TableError> {
    let file = fs::File::open(path).map_err(|source| TableError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let table = read_csv_from(file)?;
    tracing::debug!(path = %path.display(), rows = table.rows.len(), "read input table");
    Ok(table)
}

/// Read a headed CSV. Short rows are padded with empty cells.
pub fn read_csv_from<R: Read>(reader: R) -> Result<RowTable, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(TableError::NoHeader);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = InputRow::from_pairs(
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.as_str(), record.get(i).unwrap_or(""))),
        );
        rows.push(row);
    }
    Ok(RowTable { headers, rows })
}

/// Write CSV with a fixed header derived from the input header and schema.
pub fn write_csv_to<W: Write>(
    writer: W,
    input_headers: &[String],
    schema: &ColumnSchema,
    rows: &[OutputRow],
) -> Result<(), TableError> {
    let columns = output_columns(input_headers, schema);
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&columns)?;
    for row in rows {
        wtr.write_record(columns.iter().map(|c| {
            row.get(c)
                .unwrap_or(Cell::Null)
                .to_field()
        }))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a JSON array of row objects.
pub fn write_json_to<W: Write>(writer: W, rows: &[OutputRow]) -> Result<(), TableError> {
    serde_json::to_writer_pretty(writer, rows)?;
    Ok(())
}

/// Write `rows` to `path` in `format`, atomically.
pub fn write_rows(
    path: &Path,
    format: OutputFormat,
    input_headers: &[String],
    schema: &ColumnSchema,
    rows: &[OutputRow],
) -> Result<(), TableError> {
    let tmp_path = tmp_sibling(path);
    let result = (|| {
        let mut file = std::io::BufWriter::new(fs::File::create(&tmp_path)?);
        match format {
            OutputFormat::Csv => write_csv_to(&mut file, input_headers, schema, rows)?,
            OutputFormat::Json => write_json_to(&mut file, rows)?,
        }
        file.flush()?;
        Ok::<_, TableError>(())
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        TableError::Io(e)
    })?;

    tracing::info!(path = %path.display(), rows = rows.len(), ?format, "wrote output");
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
