//! Async adapter that demultiplexes a byte source on the fly.
//!
//! Reads land directly in the caller's buffer and are compacted in place,
//! the same way a capture driver hands out dequeued buffers.
//!
//! # Example
//!
//! ```
//! use geocam_demux::protocol::FrameBuilder;
//! use geocam_demux::transport::DemuxReader;
//! use geocam_demux::DemuxConfig;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> geocam_demux::Result<()> {
//! let stream = FrameBuilder::new().skip(b"sei").build(b"frame");
//! let mut reader = DemuxReader::new(&stream[..], DemuxConfig::default());
//!
//! let mut payload = Vec::new();
//! reader.read_to_end(&mut payload).await?;
//! assert_eq!(payload, b"frame");
//! # Ok(())
//! # }
//! ```

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use crate::channel::{DemuxChannel, DemuxStats};
use crate::config::DemuxConfig;
use crate::error::{DemuxError, Result};

/// Default read size for [`DemuxReader::read_to_end`].
pub const DEFAULT_READ_SIZE: usize = 64 * 1024;

/// Byte source wrapped with a demux channel.
#[derive(Debug)]
pub struct DemuxReader<R> {
    inner: R,
    channel: DemuxChannel,
}

impl<R: AsyncRead + Unpin> DemuxReader<R> {
    /// Wrap a source that yields raw MUX container bytes.
    pub fn new(inner: R, config: DemuxConfig) -> Self {
        Self::with_channel(inner, DemuxChannel::with_config(config))
    }

    /// Wrap a source using an already opened channel.
    pub fn with_channel(inner: R, channel: DemuxChannel) -> Self {
        Self { inner, channel }
    }

    /// Read payload bytes into `buf`.
    ///
    /// Keeps reading while chunks hold only header or side data, so `Ok(0)`
    /// means the source reached EOF (or `buf` is empty).
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let n = self.inner.read(buf).await?;
            if n == 0 {
                return Ok(0);
            }
            let produced = self.channel.process(buf, n)?;
            if produced > 0 {
                return Ok(produced);
            }
        }
    }

    /// Read the next run of payload, up to `capacity` bytes.
    ///
    /// A `capacity` of 0 reads up to [`DEFAULT_READ_SIZE`] bytes. Returns
    /// `None` only at EOF.
    pub async fn next_chunk(&mut self, capacity: usize) -> Result<Option<Bytes>> {
        let capacity = if capacity == 0 {
            DEFAULT_READ_SIZE
        } else {
            capacity
        };
        let mut buf = BytesMut::zeroed(capacity);
        let produced = self.read(&mut buf[..]).await?;
        if produced == 0 {
            return Ok(None);
        }
        buf.truncate(produced);
        Ok(Some(buf.freeze()))
    }

    /// Demultiplex the rest of the source into `out`.
    ///
    /// Returns the number of payload bytes appended.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedStream` if the source ends inside a frame.
    pub async fn read_to_end(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        let mut buf = vec![0u8; DEFAULT_READ_SIZE];
        let mut total = 0;

        loop {
            let produced = self.read(&mut buf).await?;
            if produced == 0 {
                break;
            }
            out.extend_from_slice(&buf[..produced]);
            total += produced;
        }

        if !self.channel.state().is_at_frame_boundary() {
            debug!(phase = ?self.channel.state().phase(), "Source ended inside a frame");
            return Err(DemuxError::TruncatedStream);
        }
        Ok(total)
    }

    /// Channel statistics so far.
    pub fn stats(&self) -> DemuxStats {
        self.channel.stats()
    }

    /// The demux channel.
    pub fn channel(&self) -> &DemuxChannel {
        &self.channel
    }

    /// Unwrap into the source and the channel.
    pub fn into_parts(self) -> (R, DemuxChannel) {
        (self.inner, self.channel)
    }
}
