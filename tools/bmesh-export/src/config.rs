//! bmesh.toml configuration
//!
//! ```toml
//! [encode]
//! preserve_manifold_info = true
//! adjacency = true
//! loop_topology = true
//! face_normals = true
//!
//! [fan]
//! anchor = "robust"   # or "first"
//! ```
//!
//! Every key is optional.

use anyhow::{Context, Result};
use bmesh_codec::{EncodeOptions, FanOptions};
use serde::Deserialize;
use std::path::Path;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "bmesh.toml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    #[serde(default)]
    pub encode: EncodeOptions,
    #[serde(default)]
    pub fan: FanOptions,
}

impl ExportConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse export config")
    }
}

/// Load a config file
pub fn load_config(path: &Path) -> Result<ExportConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {:?}", path))?;
    ExportConfig::from_toml_str(&content).with_context(|| format!("Invalid config: {:?}", path))
}

/// Load `explicit` if given, else `bmesh.toml` if present, else defaults
pub fn resolve_config(explicit: Option<&Path>) -> Result<ExportConfig> {
    match explicit {
        Some(path) => load_config(path),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                tracing::info!("Using {}", DEFAULT_CONFIG_FILE);
                load_config(default_path)
            } else {
                Ok(ExportConfig::default())
            }
        }
    }
}
