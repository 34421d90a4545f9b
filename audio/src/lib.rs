//! Ogg/Opus container handling.
//!
//! This crate turns a voice file (Ogg pages carrying Opus packets) into the
//! ordered list of opaque Opus packets the RTP side re-emits:
//!
//! - `codec::ogg`: page parsing, demuxing and page writing
//! - `codec::opus`: the [`OpusPacket`] payload type
//!
//! # Example
//!
//! ```rust
//! use voxbridge_audio::codec::ogg::{PageWriter, extract_opus_packets};
//!
//! let mut file = Vec::new();
//! let mut writer = PageWriter::new(&mut file, 1);
//! writer.write_segments(&[1, 1, 1], &[0xF8, 0xF9, 0xFA], 0, 2880).unwrap();
//!
//! let packets = extract_opus_packets(&file);
//! assert_eq!(packets.len(), 3);
//! ```

pub mod codec;

pub use codec::ogg::{Demuxed, demux, extract_opus_packets};
pub use codec::opus::OpusPacket;
