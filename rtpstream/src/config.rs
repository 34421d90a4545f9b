//! Stream parameters.

use std::time::Duration;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Dynamic payload type browsers negotiate for Opus.
pub const DEFAULT_PAYLOAD_TYPE: u8 = 111;

/// Largest value the 7-bit payload type field can carry.
pub const MAX_PAYLOAD_TYPE: u8 = 127;

/// Synchronization source used for every packet of the outbound stream.
pub const DEFAULT_SSRC: u32 = 123456789;

/// Samples in one 20 ms Opus frame at 48 kHz.
pub const DEFAULT_SAMPLES_PER_FRAME: u32 = 960;

/// One Opus frame period in milliseconds.
pub const DEFAULT_FRAME_PERIOD_MS: u64 = 20;

/// Fixed parameters of one logical outbound stream.
///
/// All fields have defaults, so an empty YAML/JSON map is a valid config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// RTP payload type, at most [`MAX_PAYLOAD_TYPE`].
    #[serde(deserialize_with = "deserialize_payload_type")]
    pub payload_type: u8,
    /// RTP synchronization source identifier.
    pub ssrc: u32,
    /// Timestamp increment per packet.
    pub samples_per_frame: u32,
    /// Delay between two emitted packets, in milliseconds.
    pub frame_period_ms: u64,
}

/// Invalid stream parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("stream: payload type {0} out of range 0..={max}", max = MAX_PAYLOAD_TYPE)]
    PayloadType(u8),
}

fn deserialize_payload_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let pt = u8::deserialize(deserializer)?;
    if pt > MAX_PAYLOAD_TYPE {
        return Err(D::Error::custom(ConfigError::PayloadType(pt)));
    }
    Ok(pt)
}

impl StreamConfig {
    /// Checks that every field fits its wire representation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.payload_type > MAX_PAYLOAD_TYPE {
            return Err(ConfigError::PayloadType(self.payload_type));
        }
        Ok(())
    }

    /// Delay between two emitted packets.
    pub fn frame_period(&self) -> Duration {
        Duration::from_millis(self.frame_period_ms)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            payload_type: DEFAULT_PAYLOAD_TYPE,
            ssrc: DEFAULT_SSRC,
            samples_per_frame: DEFAULT_SAMPLES_PER_FRAME,
            frame_period_ms: DEFAULT_FRAME_PERIOD_MS,
        }
    }
}
