//! Persisted category dictionary.
//!
//! Maps each one-hot encoded source column to the sorted set of tokens seen
//! during an encoding run. Written as a small versioned JSON document so an
//! inference-time encoder can rebuild the same indicator columns:
//!
//! ```json
//! {
//!   "version": 1,
//!   "columns": {
//!     "Structure.Cooling": ["Ceiling Fan(s)", "Central Air"]
//!   }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::core::writers::{create_buffered_writer, ensure_parent_dirs, WriteError};

/// Schema version written by this crate.
pub const DICTIONARY_VERSION: u32 = 1;

/// Errors raised while saving or loading a dictionary.
#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("failed to read dictionary '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("invalid dictionary JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("dictionary schema error: {0}")]
    Schema(String),
}

pub type Result<T> = std::result::Result<T, DictionaryError>;

/// Column name to distinct category tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDictionary {
    pub version: u32,
    pub columns: BTreeMap<String, BTreeSet<String>>,
}

impl Default for CategoryDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryDictionary {
    pub fn new() -> Self {
        Self {
            version: DICTIONARY_VERSION,
            columns: BTreeMap::new(),
        }
    }

    /// Records the token set of a column, replacing any earlier entry.
    pub fn insert(&mut self, column: impl Into<String>, tokens: BTreeSet<String>) {
        self.columns.insert(column.into(), tokens);
    }

    pub fn get(&self, column: &str) -> Option<&BTreeSet<String>> {
        self.columns.get(column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a dictionary document.
    ///
    /// The document must be an object with `version` equal to
    /// [`DICTIONARY_VERSION`] and a `columns` object whose values are arrays
    /// of strings.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;

        let object = value
            .as_object()
            .ok_or_else(|| DictionaryError::Schema("top level must be an object".into()))?;

        match object.get("version").and_then(Value::as_u64) {
            Some(v) if v == u64::from(DICTIONARY_VERSION) => {}
            Some(v) => {
                return Err(DictionaryError::Schema(format!(
                    "unsupported version {} (expected {})",
                    v, DICTIONARY_VERSION
                )))
            }
            None => return Err(DictionaryError::Schema("missing numeric 'version'".into())),
        }

        let columns = object
            .get("columns")
            .and_then(Value::as_object)
            .ok_or_else(|| DictionaryError::Schema("'columns' must be an object".into()))?;

        for (name, tokens) in columns {
            let valid = tokens
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string));
            if !valid {
                return Err(DictionaryError::Schema(format!(
                    "column '{}' must map to an array of strings",
                    name
                )));
            }
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Writes the dictionary to `path`, overwriting any previous file.
    ///
    /// The document is serialized before the file is created, so a
    /// serialization failure leaves an existing file untouched.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;

        ensure_parent_dirs(path)?;
        let mut writer = create_buffered_writer(path)?;
        let path_str = path.display().to_string();

        writer
            .write_all(json.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .and_then(|_| writer.flush())
            .map_err(|e| WriteError::WriteFile {
                path: path_str,
                source: e,
            })?;

        Ok(())
    }

    /// Reads and validates a dictionary file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| DictionaryError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_json_layout_is_sorted() {
        let mut dict = CategoryDictionary::new();
        dict.insert("Structure.Cooling", tokens(&["Central Air", "Ceiling Fan(s)"]));
        dict.insert("Characteristics.LotFeatures", tokens(&[]));

        let json = dict.to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["version"], 1);
        assert_eq!(
            value["columns"]["Structure.Cooling"],
            serde_json::json!(["Ceiling Fan(s)", "Central Air"])
        );
        assert_eq!(
            value["columns"]["Characteristics.LotFeatures"],
            serde_json::json!([])
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("backend").join("data").join("saved_data.json");

        let mut dict = CategoryDictionary::new();
        dict.insert("Tax.Zoning", tokens(&["R-1", "B-2"]));
        dict.save(&path).unwrap();

        let loaded = CategoryDictionary::load(&path).unwrap();
        assert_eq!(loaded, dict);
        assert_eq!(loaded.get("Tax.Zoning").unwrap().len(), 2);
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("saved_data.json");

        let mut first = CategoryDictionary::new();
        first.insert("a", tokens(&["x"]));
        first.insert("b", tokens(&["y"]));
        first.save(&path).unwrap();

        let mut second = CategoryDictionary::new();
        second.insert("a", tokens(&["z"]));
        second.save(&path).unwrap();

        let loaded = CategoryDictionary::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("a"), Some(&tokens(&["z"])));
    }

    #[test]
    fn test_rejects_non_mapping() {
        let err = CategoryDictionary::from_json("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, DictionaryError::Schema(_)));

        let err = CategoryDictionary::from_json(r#"{"version": 1, "columns": []}"#).unwrap_err();
        assert!(matches!(err, DictionaryError::Schema(_)));

        let err =
            CategoryDictionary::from_json(r#"{"version": 1, "columns": {"a": [1]}}"#).unwrap_err();
        assert!(matches!(err, DictionaryError::Schema(_)));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let err =
            CategoryDictionary::from_json(r#"{"version": 2, "columns": {}}"#).unwrap_err();
        assert!(matches!(err, DictionaryError::Schema(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let result = CategoryDictionary::load(Path::new("/nonexistent/saved_data.json"));
        assert!(matches!(result, Err(DictionaryError::Read { .. })));
    }
}
