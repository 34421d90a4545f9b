//! Re-times demuxed Opus packets onto one continuous RTP stream.
//!
//! A [`Repacketizer`] owns the stream's [`StreamCursor`]. Each call to
//! [`Repacketizer::stream`] snapshots the cursor, frames and paces its
//! packets from a local position, and commits the position of the next
//! unsent packet when it stops. The cursor lock is never held across a
//! sink write or a pacing delay.
//!
//! Two calls on the same repacketizer must not overlap: the second call
//! would snapshot the same starting position. Use a [`Relay`](crate::Relay)
//! to serialize deliveries.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use voxbridge_audio::OpusPacket;

use crate::config::StreamConfig;
use crate::cursor::{Position, StreamCursor};
use crate::error::StreamError;
use crate::packet::{Header, Packet};
use crate::sink::RtpSink;

/// Stateful RTP framer and pacer for one logical outbound stream.
#[derive(Debug, Default)]
pub struct Repacketizer {
    config: StreamConfig,
    cursor: StreamCursor,
}

impl Repacketizer {
    /// Creates a repacketizer whose cursor starts at (0, 0).
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            cursor: StreamCursor::new(),
        }
    }

    /// Creates a repacketizer whose cursor starts at `position`.
    pub fn starting_at(config: StreamConfig, position: Position) -> Self {
        Self {
            config,
            cursor: StreamCursor::starting_at(position),
        }
    }

    /// Returns the stream parameters.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Returns the committed position of the next packet.
    pub fn position(&self) -> Position {
        self.cursor.snapshot()
    }

    /// Frames `payload` as the packet at `position`.
    pub fn frame(&self, position: Position, payload: &OpusPacket) -> Packet {
        let header = Header::new(
            self.config.payload_type,
            position.sequence,
            position.timestamp,
            self.config.ssrc,
        );
        Packet::new(header, payload.0.clone())
    }

    /// Streams `packets` to `sink`, one per frame period.
    ///
    /// Returns the number of packets written. On sink failure or
    /// cancellation the cursor is advanced past the packets that were
    /// actually written and the error reports that count.
    pub async fn stream<S>(
        &self,
        packets: &[OpusPacket],
        sink: &S,
        cancel: &CancellationToken,
    ) -> Result<usize, StreamError>
    where
        S: RtpSink + ?Sized,
    {
        if packets.is_empty() {
            return Err(StreamError::NoPayload);
        }

        let start = self.cursor.snapshot();
        let period = self.config.frame_period();
        let mut position = start;
        let mut sent = 0usize;

        info!(
            "stream: found {} opus packets, streaming from seq {} ts {}",
            packets.len(),
            start.sequence,
            start.timestamp
        );

        for payload in packets {
            if cancel.is_cancelled() {
                return Err(self.abort(position, StreamError::Cancelled { sent }));
            }

            let packet = self.frame(position, payload);
            let written = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = sink.write_rtp(&packet) => Some(result),
            };
            match written {
                None => return Err(self.abort(position, StreamError::Cancelled { sent })),
                Some(Err(source)) => {
                    return Err(self.abort(position, StreamError::Sink { sent, source }));
                }
                Some(Ok(())) => {}
            }

            sent += 1;
            position = position.next(self.config.samples_per_frame);
            if sent == 1 {
                debug!("stream: first packet sent (seq {})", packet.header.sequence_number);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(self.abort(position, StreamError::Cancelled { sent }));
                }
                _ = tokio::time::sleep(period) => {}
            }
        }

        self.cursor.commit(position);
        info!(
            "stream: finished, {} packets (next seq {}, next ts {})",
            sent, position.sequence, position.timestamp
        );
        Ok(sent)
    }

    fn abort(&self, position: Position, err: StreamError) -> StreamError {
        self.cursor.commit(position);
        warn!(
            "{} (next seq {}, next ts {})",
            err, position.sequence, position.timestamp
        );
        err
    }
}
