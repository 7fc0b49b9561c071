//! Bench configuration file handling.
//!
//! A small JSON file supplying the document metadata and global settings the
//! serializer emits, plus where saved definitions are kept. Every field is
//! optional; missing fields fall back to the defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::settings::{DocumentMeta, GlobalSettings};
use crate::transcoder::Transcoder;

/// Configuration that can be saved/loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// `test_info.author` of emitted documents
    pub author: String,
    /// `test_info.version` of emitted documents
    pub version: String,
    pub global_settings: GlobalSettings,
    /// Directory backing the definition store
    pub store_dir: PathBuf,
}

impl Default for BenchConfig {
    fn default() -> Self {
        let meta = DocumentMeta::default();
        Self {
            author: meta.author,
            version: meta.version,
            global_settings: GlobalSettings::default(),
            store_dir: PathBuf::from("test-files"),
        }
    }
}

impl BenchConfig {
    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise; validated either way
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.author.trim().is_empty() {
            anyhow::bail!("Author must be specified");
        }
        if self.version.trim().is_empty() {
            anyhow::bail!("Version must be specified");
        }

        let settings = &self.global_settings;
        if !(settings.sample_rate_hz.is_finite() && settings.sample_rate_hz > 0.0) {
            anyhow::bail!("sample_rate_hz must be a positive number");
        }
        if !(settings.max_test_time_s.is_finite() && settings.max_test_time_s > 0.0) {
            anyhow::bail!("max_test_time_s must be a positive number");
        }

        if self.store_dir.as_os_str().is_empty() {
            anyhow::bail!("store_dir must not be empty");
        }

        Ok(())
    }

    pub fn meta(&self) -> DocumentMeta {
        DocumentMeta {
            author: self.author.clone(),
            version: self.version.clone(),
        }
    }

    /// Transcoder emitting this configuration's metadata and settings
    pub fn transcoder(&self) -> Transcoder {
        Transcoder::new(self.meta(), self.global_settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = BenchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.author, "Test Engineer");
        assert_eq!(config.store_dir, PathBuf::from("test-files"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let config = BenchConfig {
            author: "Bench Ops".to_string(),
            global_settings: GlobalSettings {
                sample_rate_hz: 25.0,
                max_test_time_s: 300.0,
            },
            ..Default::default()
        };
        let temp_file = NamedTempFile::new().unwrap();
        config.save_to_file(temp_file.path()).unwrap();

        let loaded = BenchConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(br#"{ "global_settings": { "sample_rate_hz": 100 } }"#)
            .unwrap();
        temp_file.flush().unwrap();

        let loaded = BenchConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded.global_settings.sample_rate_hz, 100.0);
        assert_eq!(loaded.global_settings.max_test_time_s, 120.0);
        assert_eq!(loaded.version, "1.0");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = BenchConfig::load_from_file(Path::new("/nonexistent/bench.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"{ invalid json }").unwrap();
        temp_file.flush().unwrap();
        assert!(BenchConfig::load_from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_validation_rejects_bad_settings() {
        let mut config = BenchConfig::default();
        config.global_settings.sample_rate_hz = 0.0;
        assert!(config.validate().is_err());

        let mut config = BenchConfig::default();
        config.global_settings.max_test_time_s = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = BenchConfig::default();
        config.author = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_without_path() {
        let config = BenchConfig::load_or_default(None).unwrap();
        assert_eq!(config, BenchConfig::default());
    }

    #[test]
    fn test_load_or_default_rejects_invalid_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(br#"{ "author": "", "global_settings": { "sample_rate_hz": -5 } }"#)
            .unwrap();
        temp_file.flush().unwrap();

        let err = BenchConfig::load_or_default(Some(temp_file.path())).unwrap_err();
        assert_eq!(err.to_string(), "Author must be specified");
    }

    #[test]
    fn test_load_or_default_with_valid_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(br#"{ "store_dir": "/srv/bench/defs" }"#)
            .unwrap();
        temp_file.flush().unwrap();

        let config = BenchConfig::load_or_default(Some(temp_file.path())).unwrap();
        assert_eq!(config.store_dir, PathBuf::from("/srv/bench/defs"));
        assert_eq!(config.author, "Test Engineer");
    }

    #[test]
    fn test_transcoder_carries_settings() {
        let config = BenchConfig {
            version: "3.0".to_string(),
            ..Default::default()
        };
        let transcoder = config.transcoder();
        assert_eq!(transcoder.meta.version, "3.0");
        assert_eq!(transcoder.settings, config.global_settings);
    }
}
