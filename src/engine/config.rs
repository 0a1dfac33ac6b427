use crate::core::{MapError, Result};
use serde::{Deserialize, Serialize};

/// How merge treats a raw array field that already holds a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayMergePolicy {
    /// The input becomes the new value; old entries are dropped.
    #[default]
    Replace,
    /// Input keys overwrite old ones and old keys the input lacks are kept.
    /// Lists are appended to.
    Overlay,
}

/// Mapper configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Raw array merge policy
    pub array_merge: ArrayMergePolicy,

    /// UTC offset in seconds for temporal input that carries none
    pub default_offset_seconds: i32,

    /// Reject scalar coercions that lose information
    pub strict_scalars: bool,
}

impl MapperConfig {
    pub fn new() -> Self {
        Self {
            array_merge: ArrayMergePolicy::Replace,
            default_offset_seconds: 0,
            strict_scalars: false,
        }
    }

    /// Set the raw array merge policy
    pub fn array_merge(mut self, policy: ArrayMergePolicy) -> Self {
        self.array_merge = policy;
        self
    }

    /// Set the default temporal offset
    pub fn default_offset_seconds(mut self, seconds: i32) -> Self {
        self.default_offset_seconds = seconds;
        self
    }

    /// Enable or disable strict scalar coercion
    pub fn strict_scalars(mut self, strict: bool) -> Self {
        self.strict_scalars = strict;
        self
    }

    /// Parse from a JSON document; absent keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // chrono accepts offsets strictly inside one day
        if self.default_offset_seconds.abs() >= 86_400 {
            return Err(MapError::Config(format!(
                "default_offset_seconds out of range: {}",
                self.default_offset_seconds
            )));
        }

        Ok(())
    }
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self::new()
    }
}
