//! Opus payloads as they travel through the bridge.
//!
//! Packets are opaque: nothing here decodes audio.

mod packet;

pub use packet::*;
