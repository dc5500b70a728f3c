//! Demux File - extract the H.264 elementary stream from a MUX capture.
//!
//! This example demonstrates:
//! - Opening a channel for the MUX pixel format
//! - Streaming a capture through `DemuxReader`
//! - Printing channel statistics as JSON on stderr
//!
//! # Running
//!
//! ```sh
//! cargo run --example demux_file -- capture.mux > video.h264
//! ffplay video.h264
//! ```

use geocam_demux::format::MUX_FOURCC;
use geocam_demux::transport::DemuxReader;
use geocam_demux::{DemuxChannel, DemuxConfig};
use tokio::io::AsyncWriteExt;

const READ_CHUNK: usize = 256 * 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("usage: demux_file <capture.mux>")?;

    let file = tokio::fs::File::open(&path).await?;
    let channel = DemuxChannel::open(MUX_FOURCC, DemuxConfig::default())?;
    let mut reader = DemuxReader::with_channel(file, channel);
    let mut stdout = tokio::io::stdout();

    while let Some(chunk) = reader.next_chunk(READ_CHUNK).await? {
        stdout.write_all(&chunk).await?;
    }
    stdout.flush().await?;

    if !reader.channel().state().is_at_frame_boundary() {
        eprintln!("warning: capture ends inside a frame");
    }
    eprintln!("{}", reader.stats().to_json()?);

    Ok(())
}
