//! Document-level settings emitted alongside the step sequence

use serde::{Deserialize, Serialize};

/// Sampling parameters written to the `global_settings` block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    pub sample_rate_hz: f64,
    pub max_test_time_s: f64,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            sample_rate_hz: 10.0,
            max_test_time_s: 120.0,
        }
    }
}

/// Fixed `test_info` metadata that is not part of the edited definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentMeta {
    pub author: String,
    pub version: String,
}

impl Default for DocumentMeta {
    fn default() -> Self {
        Self {
            author: "Test Engineer".to_string(),
            version: "1.0".to_string(),
        }
    }
}
