//! Embedding configuration.
//!
//! Both sides of a transfer must agree on these values: the bit-depth plan is
//! a function of the block size and of which channel carries the payload, so
//! an image embedded with one configuration cannot be read with another.
//!
//! ```toml
//! # All options are optional - defaults shown below
//! block_size = 2            # Side of the square planning block, in pixels
//! carrier_channel = "blue"  # red | green | blue
//! ```

use crate::error::{Result, SteganographyError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Largest accepted block side
pub const MAX_BLOCK_SIZE: u32 = 64;

/// Color channel whose low bits carry the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarrierChannel {
    Red,
    Green,
    #[default]
    Blue,
}

impl CarrierChannel {
    /// Index into an `Rgb<u8>` pixel
    pub fn index(self) -> usize {
        match self {
            CarrierChannel::Red => 0,
            CarrierChannel::Green => 1,
            CarrierChannel::Blue => 2,
        }
    }
}

/// Configuration for adaptive embedding parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingConfiguration {
    pub block_size: u32,
    pub carrier_channel: CarrierChannel,
}

impl Default for EmbeddingConfiguration {
    fn default() -> Self {
        Self {
            block_size: 2,
            carrier_channel: CarrierChannel::Blue,
        }
    }
}

impl EmbeddingConfiguration {
    /// Parses a sparse TOML document on top of the defaults and validates it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let configuration: EmbeddingConfiguration = toml::from_str(content)?;
        configuration.validate()?;
        Ok(configuration)
    }

    /// Loads and validates a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validates config values are within acceptable ranges
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(SteganographyError::Configuration(format!(
                "block_size must be 1-{}, got {}",
                MAX_BLOCK_SIZE, self.block_size
            )));
        }
        Ok(())
    }
}

/// Returns a fully-commented stock configuration file
pub fn stock_config_toml() -> &'static str {
    r#"# adaptive-steg configuration
#
# Embedding and extraction must use the same values.

# Side of the square block used to decide 1-bit or 2-bit embedding (1-64).
block_size = 2

# Channel whose least significant bits carry the payload: red, green or blue.
carrier_channel = "blue"
"#
}
