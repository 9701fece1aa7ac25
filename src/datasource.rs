//! Record storage boundary
//!
//! Everything above this layer sees tables of dynamic records. The trait
//! mirrors the four record operations the editor needs plus the manifest
//! listing files per table. The shipped implementation reads a directory
//! holding a `database.json` manifest next to the content files it names;
//! content is hand-edited, so files parse leniently as JSON5, while every
//! mutation rewrites the owning file as pretty-printed strict JSON.
//!
//! On select each record is tagged with the reserved `_filename` key naming
//! its owning file. Mutation bodies have the tag stripped before hitting
//! disk; it never persists.

use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::models::TableEntry;
use crate::typedef::FILENAME_KEY;

/// Manifest file listing tables and their content files.
pub const MANIFEST_FILE: &str = "database.json";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot parse {file}: {message}")]
    Parse { file: String, message: String },
    #[error("cannot write {file}: {message}")]
    Write { file: String, message: String },
    #[error("{file}: expected a top-level array of records")]
    NotAnArray { file: String },
    #[error("unknown table '{0}'")]
    UnknownTable(String),
    #[error("table '{table}' has no content file '{file}'")]
    UnknownFile { table: String, file: String },
    #[error("table '{table}' lists no content files")]
    NoFiles { table: String },
    #[error("no record ID={id} in table '{table}'")]
    NotFound { table: String, id: String },
    #[error("no record at index {idx} in table '{table}'")]
    IndexOutOfRange { table: String, idx: usize },
}

/// Table-level record access.
pub trait DataSource {
    /// The manifest: every table with its content files, in declared order.
    fn tables(&self) -> Result<Vec<TableEntry>, SourceError>;

    /// All records of a table, files merged in manifest order, each record
    /// tagged with `_filename`.
    fn select(&self, table: &str) -> Result<Vec<Value>, SourceError>;

    fn select_by_id(&self, table: &str, id: &str) -> Result<Option<Value>, SourceError> {
        Ok(self
            .select(table)?
            .into_iter()
            .find(|r| r.get("ID").and_then(Value::as_str) == Some(id)))
    }

    /// Append a record to `filename`, or to the table's first file.
    fn insert(&self, table: &str, record: &Value, filename: Option<&str>)
        -> Result<(), SourceError>;

    /// Replace the record whose ID matches `record`'s ID.
    fn update(&self, table: &str, record: &Value, filename: Option<&str>)
        -> Result<(), SourceError>;

    /// Remove a record by ID, or by merged-table position when it has none.
    fn delete(
        &self,
        table: &str,
        id: Option<&str>,
        idx: usize,
        filename: Option<&str>,
    ) -> Result<(), SourceError>;
}

/// A content directory: `database.json` plus the files it names.
#[derive(Debug, Clone)]
pub struct FileDataSource {
    root: PathBuf,
}

impl FileDataSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn manifest(&self) -> Result<Vec<TableEntry>, SourceError> {
        let path = self.root.join(MANIFEST_FILE);
        let text = fs::read_to_string(&path).map_err(|e| SourceError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        json5::from_str(&text).map_err(|e| SourceError::Parse {
            file: MANIFEST_FILE.to_string(),
            message: e.to_string(),
        })
    }

    fn entry(&self, table: &str) -> Result<TableEntry, SourceError> {
        self.manifest()?
            .into_iter()
            .find(|e| e.table_name == table)
            .ok_or_else(|| SourceError::UnknownTable(table.to_string()))
    }

    fn read_rows(&self, file: &str) -> Result<Vec<Value>, SourceError> {
        let path = self.root.join(file);
        let text = fs::read_to_string(&path).map_err(|e| SourceError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let value: Value = json5::from_str(&text).map_err(|e| SourceError::Parse {
            file: file.to_string(),
            message: e.to_string(),
        })?;
        match value {
            Value::Array(rows) => Ok(rows),
            _ => Err(SourceError::NotAnArray {
                file: file.to_string(),
            }),
        }
    }

    fn write_rows(&self, file: &str, rows: Vec<Value>) -> Result<(), SourceError> {
        let path = self.root.join(file);
        let text =
            serde_json::to_string_pretty(&Value::Array(rows)).map_err(|e| SourceError::Write {
                file: file.to_string(),
                message: e.to_string(),
            })?;
        fs::write(&path, text + "\n").map_err(|e| SourceError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Files to consider for a mutation: the named one, or all of them.
    fn candidate_files(
        &self,
        table: &str,
        entry: &TableEntry,
        filename: Option<&str>,
    ) -> Result<Vec<String>, SourceError> {
        match filename {
            Some(name) => {
                if !entry.files.iter().any(|f| f.file == name) {
                    return Err(SourceError::UnknownFile {
                        table: table.to_string(),
                        file: name.to_string(),
                    });
                }
                Ok(vec![name.to_string()])
            }
            None => Ok(entry.files.iter().map(|f| f.file.clone()).collect()),
        }
    }
}

fn strip_filename(record: &Value) -> Value {
    match record {
        Value::Object(map) => {
            let mut out = map.clone();
            out.remove(FILENAME_KEY);
            Value::Object(out)
        }
        other => other.clone(),
    }
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("ID").and_then(Value::as_str)
}

impl DataSource for FileDataSource {
    fn tables(&self) -> Result<Vec<TableEntry>, SourceError> {
        self.manifest()
    }

    fn select(&self, table: &str) -> Result<Vec<Value>, SourceError> {
        let entry = self.entry(table)?;
        let mut records = Vec::new();
        for file in &entry.files {
            for mut row in self.read_rows(&file.file)? {
                if let Some(map) = row.as_object_mut() {
                    map.insert(
                        FILENAME_KEY.to_string(),
                        Value::String(file.file.clone()),
                    );
                }
                records.push(row);
            }
        }
        Ok(records)
    }

    fn insert(
        &self,
        table: &str,
        record: &Value,
        filename: Option<&str>,
    ) -> Result<(), SourceError> {
        let entry = self.entry(table)?;
        let file = match filename {
            Some(name) => self
                .candidate_files(table, &entry, Some(name))?
                .remove(0),
            None => match entry.files.first() {
                Some(f) => f.file.clone(),
                None => {
                    return Err(SourceError::NoFiles {
                        table: table.to_string(),
                    })
                }
            },
        };
        let mut rows = self.read_rows(&file)?;
        rows.push(strip_filename(record));
        self.write_rows(&file, rows)
    }

    fn update(
        &self,
        table: &str,
        record: &Value,
        filename: Option<&str>,
    ) -> Result<(), SourceError> {
        let id = match record_id(record) {
            Some(id) => id.to_string(),
            None => {
                return Err(SourceError::NotFound {
                    table: table.to_string(),
                    id: "<missing>".to_string(),
                })
            }
        };
        let entry = self.entry(table)?;
        for file in self.candidate_files(table, &entry, filename)? {
            let mut rows = self.read_rows(&file)?;
            if let Some(pos) = rows.iter().position(|r| record_id(r) == Some(&id)) {
                rows[pos] = strip_filename(record);
                return self.write_rows(&file, rows);
            }
        }
        Err(SourceError::NotFound {
            table: table.to_string(),
            id,
        })
    }

    fn delete(
        &self,
        table: &str,
        id: Option<&str>,
        idx: usize,
        filename: Option<&str>,
    ) -> Result<(), SourceError> {
        let entry = self.entry(table)?;
        let files = self.candidate_files(table, &entry, filename)?;

        if let Some(id) = id {
            for file in &files {
                let mut rows = self.read_rows(file)?;
                if let Some(pos) = rows.iter().position(|r| record_id(r) == Some(id)) {
                    rows.remove(pos);
                    return self.write_rows(file, rows);
                }
            }
            return Err(SourceError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            });
        }

        // No ID to match; fall back to position within the candidate files
        // in manifest order.
        let mut idx = idx;
        for file in &files {
            let mut rows = self.read_rows(file)?;
            if idx < rows.len() {
                rows.remove(idx);
                return self.write_rows(file, rows);
            }
            idx -= rows.len();
        }
        Err(SourceError::IndexOutOfRange {
            table: table.to_string(),
            idx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;

    fn write_fixture(dir: &Path) {
        fs::write(
            dir.join("database.json"),
            r#"[
                {"TableName": "Items", "JSON": [{"File": "items.json"}, {"File": "items_extra.json"}]},
                {"TableName": "BaseSprites", "JSON": [{"File": "floors.json", "Tilesheet": "floors.png"}]}
            ]"#,
        )
        .unwrap();
        fs::write(
            dir.join("items.json"),
            r#"[
                {ID: 'Log', Value: 5},
                {ID: 'Plank', Value: 8},
            ]"#,
        )
        .unwrap();
        fs::write(
            dir.join("items_extra.json"),
            r#"[{"ID": "Nail", "Value": 1}]"#,
        )
        .unwrap();
        fs::write(
            dir.join("floors.json"),
            r#"[{"ID": "GrassFloor", "SourceRectangle": "0 0 32 32"}]"#,
        )
        .unwrap();
    }

    #[test]
    fn test_select_merges_files_and_tags_filename() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let source = FileDataSource::new(dir.path());

        let records = source.select("Items").unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["ID"], "Log");
        assert_eq!(records[0]["_filename"], "items.json");
        assert_eq!(records[2]["ID"], "Nail");
        assert_eq!(records[2]["_filename"], "items_extra.json");
    }

    #[test]
    fn test_select_unknown_table() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let source = FileDataSource::new(dir.path());

        let err = source.select("Nope").unwrap_err();
        assert!(matches!(err, SourceError::UnknownTable(ref t) if t == "Nope"));
    }

    #[test]
    fn test_select_by_id() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let source = FileDataSource::new(dir.path());

        let record = source.select_by_id("Items", "Plank").unwrap().unwrap();
        assert_eq!(record["Value"], 8);
        assert!(source.select_by_id("Items", "Screw").unwrap().is_none());
    }

    #[test]
    fn test_tables_lists_manifest() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let source = FileDataSource::new(dir.path());

        let manifest = source.tables().unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest[1].table_name, "BaseSprites");
        assert_eq!(manifest[1].files[0].tilesheet.as_deref(), Some("floors.png"));
    }

    #[test]
    fn test_insert_appends_to_first_file_and_strips_tag() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let source = FileDataSource::new(dir.path());

        let record = json!({"ID": "Screw", "Value": 2, "_filename": "items.json"});
        source.insert("Items", &record, None).unwrap();

        // The rewritten file is strict JSON and carries no tag
        let text = fs::read_to_string(dir.path().join("items.json")).unwrap();
        let rows: Vec<Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2]["ID"], "Screw");
        assert!(rows[2].get("_filename").is_none());
    }

    #[test]
    fn test_insert_into_named_file() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let source = FileDataSource::new(dir.path());

        source
            .insert("Items", &json!({"ID": "Screw"}), Some("items_extra.json"))
            .unwrap();
        let records = source.select("Items").unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[3]["_filename"], "items_extra.json");
    }

    #[test]
    fn test_insert_unknown_file() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let source = FileDataSource::new(dir.path());

        let err = source
            .insert("Items", &json!({"ID": "Screw"}), Some("elsewhere.json"))
            .unwrap_err();
        assert!(matches!(err, SourceError::UnknownFile { .. }));
    }

    #[test]
    fn test_update_replaces_matching_id() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let source = FileDataSource::new(dir.path());

        source
            .update("Items", &json!({"ID": "Nail", "Value": 2}), None)
            .unwrap();
        let record = source.select_by_id("Items", "Nail").unwrap().unwrap();
        assert_eq!(record["Value"], 2);
        // Untouched files keep their rows
        assert_eq!(source.select("Items").unwrap().len(), 3);
    }

    #[test]
    fn test_update_missing_record() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let source = FileDataSource::new(dir.path());

        let err = source
            .update("Items", &json!({"ID": "Ghost"}), None)
            .unwrap_err();
        assert!(matches!(err, SourceError::NotFound { ref id, .. } if id == "Ghost"));
    }

    #[test]
    fn test_delete_by_id() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let source = FileDataSource::new(dir.path());

        source.delete("Items", Some("Plank"), 0, None).unwrap();
        assert!(source.select_by_id("Items", "Plank").unwrap().is_none());
        assert_eq!(source.select("Items").unwrap().len(), 2);
    }

    #[test]
    fn test_delete_by_position_spans_files() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let source = FileDataSource::new(dir.path());

        // Index 2 of the merged table lives in the second file
        source.delete("Items", None, 2, None).unwrap();
        assert!(source.select_by_id("Items", "Nail").unwrap().is_none());

        let err = source.delete("Items", None, 10, None).unwrap_err();
        assert!(matches!(err, SourceError::IndexOutOfRange { .. }));
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        fs::write(dir.path().join("items.json"), "[{ID: }]").unwrap();
        let source = FileDataSource::new(dir.path());

        let err = source.select("Items").unwrap_err();
        assert!(err.to_string().contains("items.json"));
    }

    #[test]
    fn test_non_array_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        fs::write(dir.path().join("items.json"), r#"{"ID": "Log"}"#).unwrap();
        let source = FileDataSource::new(dir.path());

        let err = source.select("Items").unwrap_err();
        assert!(matches!(err, SourceError::NotAnArray { .. }));
    }
}
