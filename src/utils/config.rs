//! Configuration and constants for the engine and CLI.

use crate::sizing::{ObjectSizes, SizerProfile};
use crate::utils::error::ConfigError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current aggregation report schema version
pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Default maximum nesting depth accepted by trace traversals
pub const DEFAULT_MAX_TRACE_DEPTH: usize = 4096;

/// HTTP request URIs longer than this are truncated
pub const MAX_URI_LENGTH: usize = 1000;

/// Reported for CPU/exclusive values of a finalized aggregate that never saw them
pub const NOT_APPLICABLE: f64 = -1.0;

/// Complete engine configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Memory model used for size accounting
    #[serde(default)]
    pub sizer: SizerConfig,

    /// Trace traversal limits
    #[serde(default)]
    pub trace: TraceConfig,
}

/// Memory model selection with optional constant overrides
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SizerConfig {
    /// Base profile (`bits32`, `bits64`, `bits64-compressed`)
    #[serde(default)]
    pub profile: SizerProfile,

    /// Override for the object header size in bytes
    pub object_header: Option<u64>,

    /// Override for the reference size in bytes
    pub reference_size: Option<u64>,

    /// Override for the alignment boundary in bytes
    pub alignment: Option<u64>,
}

impl SizerConfig {
    /// Build the sizer described by this configuration
    pub fn build(&self) -> ObjectSizes {
        let mut sizes = ObjectSizes::for_profile(self.profile);
        if let Some(header) = self.object_header {
            sizes.object_header = header;
        }
        if let Some(reference) = self.reference_size {
            sizes.reference_size = reference;
        }
        if let Some(alignment) = self.alignment {
            sizes.alignment = alignment;
        }
        sizes
    }
}

/// Trace traversal limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TraceConfig {
    /// Maximum nesting depth before traversals fail with `TraceTooDeep`
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_TRACE_DEPTH,
        }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_TRACE_DEPTH
}

/// Load engine configuration from a TOML file
///
/// # Errors
/// * `ConfigError::ReadFailed` - file cannot be read
/// * `ConfigError::ParseFailed` - file is not valid TOML for this schema
/// * `ConfigError::Invalid` - values are out of range
pub fn load_config(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    debug!("Loading engine config from {}", path.display());

    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse engine configuration from TOML text
pub fn parse_config(content: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.trace.max_depth == 0 {
        return Err(ConfigError::Invalid(
            "trace.max_depth must be at least 1".to_string(),
        ));
    }

    if let Some(alignment) = config.sizer.alignment {
        if alignment == 0 || !alignment.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "sizer.alignment must be a power of two, got {}",
                alignment
            )));
        }
    }

    Ok(())
}
