//! Per-channel demultiplexer owner.
//!
//! A [`DemuxChannel`] is created when a capture channel opens on a MUX
//! stream and dropped when it closes. It owns the parsing state, so no state
//! is shared between channels, and keeps running statistics.
//!
//! # Example
//!
//! ```
//! use geocam_demux::format::MUX_FOURCC;
//! use geocam_demux::protocol::FrameBuilder;
//! use geocam_demux::{DemuxChannel, DemuxConfig};
//!
//! let mut channel = DemuxChannel::open(MUX_FOURCC, DemuxConfig::default()).unwrap();
//!
//! let mut buf = FrameBuilder::new().build(b"access unit");
//! let len = buf.len();
//! let produced = channel.process(&mut buf, len).unwrap();
//!
//! assert_eq!(&buf[..produced], b"access unit");
//! assert_eq!(channel.stats().frames_completed, 1);
//! ```

use bytes::BytesMut;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::config::DemuxConfig;
use crate::error::{DemuxError, Result};
use crate::format::FourCc;
use crate::protocol::DemuxState;

/// Running counters for one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DemuxStats {
    /// Successful `process` calls.
    pub calls: u64,
    /// Container bytes fed in.
    pub bytes_in: u64,
    /// Payload bytes produced.
    pub bytes_out: u64,
    /// Frames fully demultiplexed.
    pub frames_completed: u64,
    /// Calls rejected with an error.
    pub errors: u64,
}

impl DemuxStats {
    /// Serialize the snapshot as a single JSON line.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Demultiplexer bound to one capture channel.
#[derive(Debug)]
pub struct DemuxChannel {
    state: DemuxState,
    config: DemuxConfig,
    stats: DemuxStats,
}

impl DemuxChannel {
    /// Open a channel for a stream negotiated as `fourcc`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` unless `fourcc` announces the MUX
    /// container; such streams must bypass the demultiplexer.
    pub fn open(fourcc: FourCc, config: DemuxConfig) -> Result<Self> {
        if !fourcc.is_mux() {
            return Err(DemuxError::UnsupportedFormat(fourcc));
        }
        debug!(%fourcc, max_frame_size = config.max_frame_size, "Opened demux channel");
        Ok(Self::with_config(config))
    }

    /// Create a channel without format negotiation.
    pub fn with_config(config: DemuxConfig) -> Self {
        Self {
            state: DemuxState::with_config(config),
            config,
            stats: DemuxStats::default(),
        }
    }

    /// Demultiplex one delivered buffer in place.
    ///
    /// See [`DemuxState::process`] for the contract.
    pub fn process(&mut self, buf: &mut [u8], valid_len: usize) -> Result<usize> {
        let before = self.state.frames_completed();

        match self.state.process(buf, valid_len) {
            Ok(produced) => {
                self.stats.calls += 1;
                self.stats.bytes_in += valid_len as u64;
                self.stats.bytes_out += produced as u64;
                self.stats.frames_completed += self.state.frames_completed() - before;
                trace!(valid_len, produced, phase = ?self.state.phase(), "Demuxed buffer");
                Ok(produced)
            }
            Err(e) => {
                self.stats.errors += 1;
                match &e {
                    DemuxError::Format { source, produced } => {
                        warn!(produced, "Malformed MUX header: {}", source)
                    }
                    other => debug!("Demux call rejected: {}", other),
                }
                Err(e)
            }
        }
    }

    /// Demultiplex a whole buffer, truncating it to the produced payload.
    ///
    /// On error the buffer is left untouched in length but its contents are
    /// unspecified.
    pub fn process_bytes(&mut self, buf: &mut BytesMut) -> Result<()> {
        let len = buf.len();
        let produced = self.process(&mut buf[..], len)?;
        buf.truncate(produced);
        Ok(())
    }

    /// Restart parsing at a frame boundary and clear any failure.
    ///
    /// Statistics are kept.
    pub fn reset(&mut self) {
        debug!("Resetting demux channel");
        self.state.reset();
    }

    /// Snapshot of the running counters.
    pub fn stats(&self) -> DemuxStats {
        self.stats
    }

    /// Parsing state (read-only).
    pub fn state(&self) -> &DemuxState {
        &self.state
    }

    /// Configuration the channel was opened with.
    pub fn config(&self) -> &DemuxConfig {
        &self.config
    }

    /// Check if a format error has failed the channel.
    pub fn is_failed(&self) -> bool {
        self.state.is_failed()
    }
}
