//! Per-directory key-value metadata (`__metadata__.json`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use crate::error::{IdeError, Result};

pub const METADATA_FILE: &str = "__metadata__.json";

/// Keys the controller itself reads or writes.
pub mod keys {
    pub const TITLE: &str = "title";
    pub const YEAR: &str = "year";
    pub const NAME: &str = "name";
    pub const VIEW_NAME: &str = "view_name";
    pub const FORCES_TAGLINE: &str = "forces_tagline";
    pub const PAPER_SIZE: &str = "paper_size";
    pub const SEGMENT_NUMBER: &str = "segment_number";
    pub const SEGMENT_COUNT: &str = "segment_count";
    pub const FIRST_BAR_NUMBER: &str = "first_bar_number";
    pub const MEASURE_COUNT: &str = "measure_count";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, Value>);

impl Metadata {
    /// Load the metadata of `directory`. A missing file, or a path that is
    /// not a directory, yields empty metadata.
    pub fn load(directory: &Path) -> Result<Metadata> {
        let path = directory.join(METADATA_FILE);
        if !path.is_file() {
            return Ok(Metadata::default());
        }
        let text = std::fs::read_to_string(&path)?;
        if text.trim().is_empty() {
            return Ok(Metadata::default());
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Like [`Metadata::load`], but a file that is not valid JSON gives empty
    /// metadata and a warning line naming it.
    pub fn load_or_warn(directory: &Path, warnings: &mut Vec<String>) -> Result<Metadata> {
        match Metadata::load(directory) {
            Err(IdeError::Json(e)) => {
                let path = directory.join(METADATA_FILE);
                log::warn!("can not interpret {}: {}", path.display(), e);
                warnings.push(format!("Can not interpret metadata {}: {}", path.display(), e));
                Ok(Metadata::default())
            }
            other => other,
        }
    }

    /// Write atomically; empty metadata removes the file.
    pub fn save(&self, directory: &Path) -> Result<()> {
        let path = directory.join(METADATA_FILE);
        if self.0.is_empty() {
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
            return Ok(());
        }
        let mut tmp = tempfile::NamedTempFile::new_in(directory)?;
        serde_json::to_writer_pretty(&mut tmp, &self.0)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

/// Read a single key from `directory`.
pub fn get(directory: &Path, key: &str) -> Result<Option<Value>> {
    Ok(Metadata::load(directory)?.get(key).cloned())
}

/// Set a single key in `directory`, leaving the rest untouched.
pub fn set(directory: &Path, key: &str, value: impl Into<Value>) -> Result<()> {
    let mut metadata = Metadata::load(directory)?;
    metadata.set(key, value);
    metadata.save(directory)
}

/// Remove a single key from `directory`.
pub fn remove(directory: &Path, key: &str) -> Result<()> {
    let mut metadata = Metadata::load(directory)?;
    if metadata.remove(key).is_some() {
        metadata.save(directory)?;
    }
    Ok(())
}

/// Render a metadata value for display: strings unquoted, the rest as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
