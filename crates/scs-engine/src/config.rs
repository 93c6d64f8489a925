//! Engine settings

use std::path::PathBuf;

use serde::Deserialize;

use crate::classify::DEFAULT_MARKER_TYPE;

/// Settings that shape resolution and compilation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base directory for `//#include <...>`
    pub reference_dir: PathBuf,
    /// Marker type that flags a module as a script binary
    pub marker_type: String,
    /// References passed to every compilation, before resolved ones
    pub default_references: Vec<String>,
    pub optimize: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_dir: PathBuf::from("Ref"),
            marker_type: DEFAULT_MARKER_TYPE.to_string(),
            default_references: vec![
                "System.dll".to_string(),
                "System.Core.dll".to_string(),
            ],
            optimize: true,
        }
    }
}
