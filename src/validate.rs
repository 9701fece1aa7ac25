//! Record validation against the schema registry
//!
//! Walks every record of a table and checks each key against the table's
//! column list. Validation is fail-fast per table: the first offending key
//! aborts the scan with an error naming the key, the record, and the file
//! it came from. A whole-source sweep collects one report per table and
//! keeps going past failures.

use serde_json::Value;
use thiserror::Error;

use crate::datasource::{DataSource, SourceError};
use crate::schema::registry;
use crate::typedef::{FieldDef, FILENAME_KEY};

/// A record key that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("unknown key '{key}' in table {table}, ID={id}, file {file}")]
    UnknownKey {
        table: String,
        key: String,
        id: String,
        file: String,
    },
    #[error("validation of key '{key}' failed in table {table}, ID={id}, file {file}")]
    InvalidValue {
        table: String,
        key: String,
        id: String,
        file: String,
    },
}

/// Display label for a record: its ID when present, its index otherwise.
fn record_label(record: &Value, idx: usize) -> String {
    match record.get("ID") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => idx.to_string(),
    }
}

fn record_file(record: &Value) -> String {
    match record.get(FILENAME_KEY).and_then(Value::as_str) {
        Some(file) => file.to_string(),
        None => "<unknown>".to_string(),
    }
}

/// Check every record of `records` against the column list `fields`.
///
/// Keys must either name a declared column whose descriptor accepts the
/// value, or be the reserved `_filename` string. Non-object records have
/// no keys and pass. Absent columns are not errors; records are sparse.
pub fn validate_table(
    table: &str,
    fields: &[FieldDef],
    records: &[Value],
) -> Result<(), SchemaViolation> {
    for (idx, record) in records.iter().enumerate() {
        let map = match record.as_object() {
            Some(map) => map,
            None => continue,
        };
        for (key, value) in map {
            if key == FILENAME_KEY {
                if !value.is_string() {
                    return Err(SchemaViolation::InvalidValue {
                        table: table.to_string(),
                        key: key.clone(),
                        id: record_label(record, idx),
                        file: record_file(record),
                    });
                }
                continue;
            }
            match fields.iter().find(|f| f.name == *key) {
                Some(field) => {
                    if !field.ty.validate(value) {
                        return Err(SchemaViolation::InvalidValue {
                            table: table.to_string(),
                            key: key.clone(),
                            id: record_label(record, idx),
                            file: record_file(record),
                        });
                    }
                }
                None => {
                    return Err(SchemaViolation::UnknownKey {
                        table: table.to_string(),
                        key: key.clone(),
                        id: record_label(record, idx),
                        file: record_file(record),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Outcome of validating one table of a data source.
#[derive(Debug, Clone)]
pub struct TableReport {
    pub table: String,
    pub rows: usize,
    /// Whether a schema is registered for the table; tables without one
    /// are counted but not checked
    pub schema: bool,
    pub error: Option<String>,
}

impl TableReport {
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Validate every table the source lists, one report per table.
///
/// A failed select or a schema violation lands in that table's report;
/// the sweep continues. Only an unreadable manifest aborts.
pub fn validate_all(source: &dyn DataSource) -> Result<Vec<TableReport>, SourceError> {
    let manifest = source.tables()?;
    let mut reports = Vec::with_capacity(manifest.len());
    for entry in &manifest {
        let table = entry.table_name.as_str();
        let report = match source.select(table) {
            Err(e) => TableReport {
                table: table.to_string(),
                rows: 0,
                schema: registry().contains(table),
                error: Some(e.to_string()),
            },
            Ok(records) => match registry().get(table) {
                None => TableReport {
                    table: table.to_string(),
                    rows: records.len(),
                    schema: false,
                    error: None,
                },
                Some(fields) => TableReport {
                    table: table.to_string(),
                    rows: records.len(),
                    schema: true,
                    error: validate_table(table, fields, &records)
                        .err()
                        .map(|e| e.to_string()),
                },
            },
        };
        reports.push(report);
    }
    Ok(reports)
}
