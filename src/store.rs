//! Saved test definitions
//!
//! A store keeps complete serialized documents plus a metadata table
//! describing them. [`FsStore`] is the directory-backed implementation: one
//! `.yaml` file per saved definition and an `index.json` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{BenchError, Result};
use crate::model::TestDefinition;
use crate::transcoder::Transcoder;

const INDEX_FILE: &str = "index.json";

/// Metadata row for one saved definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDefinition {
    pub name: String,
    pub description: String,
    /// File name inside the store, used to load the document back
    pub storage_path: String,
    pub created_at: DateTime<Utc>,
}

pub trait DefinitionStore {
    /// Serialize and persist a definition; nothing is left behind on failure
    fn save(
        &mut self,
        definition: &TestDefinition,
        transcoder: &Transcoder,
    ) -> Result<StoredDefinition>;

    /// Saved definitions, newest first
    fn list(&self) -> Result<Vec<StoredDefinition>>;

    /// Document text of a saved definition listed by [`Self::list`]
    fn load(&self, storage_path: &str) -> Result<String>;
}

/// Directory-backed store
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "opened definition store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save with an explicit timestamp
    pub fn save_at(
        &mut self,
        definition: &TestDefinition,
        transcoder: &Transcoder,
        created_at: DateTime<Utc>,
    ) -> Result<StoredDefinition> {
        let text = transcoder.serialize(definition);
        // Read the index first so a broken table fails before any file exists
        let mut index = self.read_index()?;
        let base = format!(
            "{}_{}",
            file_stem(&definition.name),
            created_at.timestamp_millis()
        );
        let storage_path = self.write_new(&base, &text)?;

        let record = StoredDefinition {
            name: definition.name.clone(),
            description: definition.description.clone(),
            storage_path,
            created_at,
        };
        index.push(record.clone());
        if let Err(e) = self.write_index(&index) {
            if let Err(cleanup) = fs::remove_file(self.root.join(&record.storage_path)) {
                warn!(path = %record.storage_path, error = %cleanup, "could not remove unindexed document");
            }
            return Err(e);
        }

        info!(
            name = %record.name,
            path = %record.storage_path,
            steps = definition.steps.len(),
            "saved test definition"
        );
        Ok(record)
    }

    /// Write `text` under a fresh `<base>.yaml` (or `<base>-N.yaml`) name
    fn write_new(&self, base: &str, text: &str) -> Result<String> {
        for attempt in 0..100u32 {
            let file_name = if attempt == 0 {
                format!("{}.yaml", base)
            } else {
                format!("{}-{}.yaml", base, attempt)
            };
            let path = self.root.join(&file_name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(text.as_bytes())?;
                    file.sync_all()?;
                    return Ok(file_name);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(BenchError::store(format!(
            "could not find a free file name for '{}'",
            base
        )))
    }

    fn read_index(&self) -> Result<Vec<StoredDefinition>> {
        let path = self.root.join(INDEX_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the index via a temp file so readers never see half of it
    fn write_index(&self, index: &[StoredDefinition]) -> Result<()> {
        let json = serde_json::to_string_pretty(index)?;
        let tmp = self.root.join(format!("{}.tmp", INDEX_FILE));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, self.root.join(INDEX_FILE))?;
        Ok(())
    }
}

impl DefinitionStore for FsStore {
    fn save(
        &mut self,
        definition: &TestDefinition,
        transcoder: &Transcoder,
    ) -> Result<StoredDefinition> {
        self.save_at(definition, transcoder, Utc::now())
    }

    fn list(&self) -> Result<Vec<StoredDefinition>> {
        let mut index = self.read_index()?;
        index.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.storage_path.cmp(&a.storage_path))
        });
        Ok(index)
    }

    /// Only documents listed in the index can be loaded, and they must
    /// still parse.
    fn load(&self, storage_path: &str) -> Result<String> {
        let indexed = self
            .read_index()?
            .iter()
            .any(|record| record.storage_path == storage_path);
        if !indexed || storage_path.contains(['/', '\\']) {
            return Err(BenchError::store(format!(
                "no saved definition at '{}'",
                storage_path
            )));
        }
        let text = fs::read_to_string(self.root.join(storage_path))?;
        crate::transcoder::parse(&text)?;
        Ok(text)
    }
}

/// Whitespace runs become `_`; anything unsafe in a file name becomes `_` too
fn file_stem(name: &str) -> String {
    let joined = name.split_whitespace().collect::<Vec<_>>().join("_");
    let stem: String = joined
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_start_matches('.');
    if stem.is_empty() {
        "test".to_string()
    } else {
        stem.to_string()
    }
}
