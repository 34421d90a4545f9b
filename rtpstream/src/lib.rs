//! RTP repacketization of Ogg/Opus voice messages.
//!
//! Each demuxed Opus packet becomes one RTP packet (RFC 3550) with a
//! sequence number and timestamp taken from a cursor that persists across
//! calls, so consecutive voice messages play back as one continuous
//! stream. Writes are paced at one packet per frame period and can be
//! cancelled at any point.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use voxbridge_rtpstream::{Relay, Repacketizer, StreamConfig, UdpSink};
//!
//! # async fn run(audio: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let sink = UdpSink::connect("0.0.0.0:0", "127.0.0.1:5004").await?;
//! let repacketizer = Arc::new(Repacketizer::new(StreamConfig::default()));
//! let relay = Relay::spawn(repacketizer, sink, CancellationToken::new());
//!
//! let sent = relay.handle().submit("voice-message.ogg", audio).await?;
//! println!("sent {sent} packets");
//! relay.join().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod cursor;
mod error;
pub mod packet;
mod relay;
mod repacketizer;
pub mod sink;

pub use config::{
    ConfigError, DEFAULT_FRAME_PERIOD_MS, DEFAULT_PAYLOAD_TYPE, DEFAULT_SAMPLES_PER_FRAME,
    DEFAULT_SSRC, MAX_PAYLOAD_TYPE, StreamConfig,
};
pub use cursor::{Position, StreamCursor};
pub use error::{RelayError, StreamError};
pub use packet::{Header, Packet, PacketError};
pub use relay::{DEFAULT_QUEUE_CAPACITY, Relay, RelayHandle, is_voice_attachment};
pub use repacketizer::Repacketizer;
pub use sink::{ChannelSink, RtpSink, SinkError, UdpSink, channel_sink};
