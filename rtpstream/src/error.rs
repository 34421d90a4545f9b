use thiserror::Error;

use crate::sink::SinkError;

/// Outcome of a streaming call that did not run to completion.
#[derive(Error, Debug, Clone)]
pub enum StreamError {
    #[error("stream: no payload found")]
    NoPayload,

    #[error("stream: sink write failed after {sent} packets: {source}")]
    Sink {
        sent: usize,
        #[source]
        source: SinkError,
    },

    #[error("stream: cancelled after {sent} packets")]
    Cancelled { sent: usize },
}

impl StreamError {
    /// Packets that reached the sink before the call stopped.
    pub fn sent(&self) -> usize {
        match self {
            StreamError::NoPayload => 0,
            StreamError::Sink { sent, .. } | StreamError::Cancelled { sent } => *sent,
        }
    }

    /// Returns true if the call stopped because of cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StreamError::Cancelled { .. })
    }
}

/// Error submitting a delivery to a [`Relay`](crate::Relay).
#[derive(Error, Debug, Clone)]
pub enum RelayError {
    #[error("relay: closed")]
    Closed,

    #[error("relay: delivery dropped before completion")]
    Dropped,

    #[error(transparent)]
    Stream(#[from] StreamError),
}
