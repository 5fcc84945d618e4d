//! Dispatch configuration via `dispatch.toml`
//!
//! Selects, once per deployment, how kernels are looked up: by matching node
//! types against kernel constraints (needs operator schemas), or by the
//! kernel definition hash baked into the model (minimal builds).

use opkernel_core::{KernelError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "dispatch.toml";

/// How kernels are located for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupMode {
    /// Verify node types against kernel constraints using operator schemas
    #[default]
    Schema,
    /// Look kernels up by the precomputed definition hash on each node
    Hash,
}

/// Dispatch configuration loaded from `dispatch.toml`.
///
/// # Example
///
/// ```toml
/// # "schema" (default) or "hash"
/// lookup_mode = "schema"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Kernel lookup strategy
    #[serde(default)]
    pub lookup_mode: LookupMode,
}

impl DispatchConfig {
    /// Config for minimal builds
    pub fn hash_only() -> Self {
        Self {
            lookup_mode: LookupMode::Hash,
        }
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Kernel dispatch configuration
#
# Lookup mode: "schema" (default) or "hash"
#   "schema" = match node types against kernel constraints; needs operator schemas
#   "hash"   = look kernels up by the kernel def hash stored on each node
lookup_mode = "schema"
"#
    }

    /// Parse config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| KernelError::Config(format!("Failed to parse dispatch config: {}", e)))
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            KernelError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| KernelError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            KernelError::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
