//! Audio container and payload types.
//!
//! - `ogg`: Ogg container format (RFC 3533)
//! - `opus`: Opus packet payloads

pub mod ogg;
pub mod opus;
