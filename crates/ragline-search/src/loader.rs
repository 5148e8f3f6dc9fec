//! Content loader: reads tabular records from CSV, JSON Lines or JSON.
//!
//! Every source must carry `id` and `name` columns. All other columns are
//! kept verbatim so the ingestor can pick the content column by name.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use ragline_core::{ContentRecord, Error, Result};

/// Supported source formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    JsonLines,
    JsonArray,
}

impl SourceFormat {
    /// Detect the format from the file extension. Unknown extensions read as CSV.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("jsonl") | Some("ndjson") => Self::JsonLines,
            Some("json") => Self::JsonArray,
            _ => Self::Csv,
        }
    }
}

/// Load all records from the file at `path`.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<ContentRecord>> {
    let path = path.as_ref();
    let format = SourceFormat::from_path(path);
    let file = File::open(path)?;

    let records = match format {
        SourceFormat::Csv => read_csv(file)?,
        SourceFormat::JsonLines => read_json_lines(BufReader::new(file))?,
        SourceFormat::JsonArray => read_json_array(file)?,
    };

    info!(
        path = %path.display(),
        format = ?format,
        document_count = records.len(),
        "Loaded content records"
    );
    Ok(records)
}

/// Read CSV with a header row.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<ContentRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| Error::InvalidInput(format!("unreadable CSV header: {}", e)))?
        .clone();

    let mut records = Vec::new();
    for (i, row) in rdr.records().enumerate() {
        let row_number = i + 1;
        let row = row
            .map_err(|e| Error::InvalidInput(format!("row {}: malformed CSV: {}", row_number, e)))?;
        let columns: BTreeMap<String, String> = headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        records.push(into_record(columns, row_number)?);
    }
    Ok(records)
}

/// Read one JSON object per non-empty line.
pub fn read_json_lines<R: BufRead>(reader: R) -> Result<Vec<ContentRecord>> {
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row_number = i + 1;
        let value: Value = serde_json::from_str(&line).map_err(|e| {
            Error::InvalidInput(format!("line {}: invalid JSON: {}", row_number, e))
        })?;
        records.push(into_record(object_columns(value, row_number)?, row_number)?);
    }
    Ok(records)
}

/// Read a top-level JSON array of objects.
pub fn read_json_array<R: Read>(reader: R) -> Result<Vec<ContentRecord>> {
    let value: Value = serde_json::from_reader(reader)
        .map_err(|e| Error::InvalidInput(format!("invalid JSON: {}", e)))?;
    let Value::Array(items) = value else {
        return Err(Error::InvalidInput(
            "expected a JSON array of records".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| into_record(object_columns(item, i + 1)?, i + 1))
        .collect()
}

fn object_columns(value: Value, row_number: usize) -> Result<BTreeMap<String, String>> {
    let Value::Object(map) = value else {
        return Err(Error::InvalidInput(format!(
            "row {}: expected a JSON object",
            row_number
        )));
    };

    Ok(map
        .into_iter()
        .filter_map(|(k, v)| {
            let text = match v {
                Value::Null => return None,
                Value::String(s) => s,
                other => other.to_string(),
            };
            Some((k, text))
        })
        .collect())
}

fn into_record(mut columns: BTreeMap<String, String>, row_number: usize) -> Result<ContentRecord> {
    let mut required = |column: &str| -> Result<String> {
        match columns.remove(column) {
            Some(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(Error::InvalidInput(format!(
                "row {}: missing required column '{}'",
                row_number, column
            ))),
        }
    };

    let id = required("id")?;
    let name = required("name")?;
    debug!(record_id = %id, row = row_number, "Parsed content record");

    Ok(ContentRecord {
        id,
        name,
        fields: columns,
    })
}
