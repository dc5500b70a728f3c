//! Demultiplexer configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::protocol::DEFAULT_MAX_FRAME_SIZE;

/// Settings for one demux channel.
///
/// Deserializes from JSON with every field optional:
///
/// ```
/// use geocam_demux::DemuxConfig;
///
/// let config = DemuxConfig::from_json(r#"{"max_frame_size": 1048576}"#).unwrap();
/// assert_eq!(config.max_frame_size, 1024 * 1024);
///
/// let config = DemuxConfig::from_json("{}").unwrap();
/// assert_eq!(config, DemuxConfig::default());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemuxConfig {
    /// Largest accepted `total_length`, header included.
    pub max_frame_size: u32,
}

impl DemuxConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the largest accepted frame.
    pub fn with_max_frame_size(mut self, max_frame_size: u32) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}
