//! Serializes audio deliveries onto one outbound stream.
//!
//! A [`Relay`] runs one worker task per logical stream. Deliveries
//! submitted from any number of tasks are queued and streamed strictly
//! one after another, so their packets form one gapless run.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use voxbridge_audio::extract_opus_packets;

use crate::error::{RelayError, StreamError};
use crate::repacketizer::Repacketizer;
use crate::sink::RtpSink;

/// Default number of deliveries that may wait behind the one in flight.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

struct Delivery {
    label: String,
    audio: Bytes,
    reply: oneshot::Sender<Result<usize, StreamError>>,
}

/// Worker owning the stream of one repacketizer and one sink.
pub struct Relay {
    handle: RelayHandle,
    task: JoinHandle<()>,
}

impl Relay {
    /// Spawns the worker with [`DEFAULT_QUEUE_CAPACITY`].
    pub fn spawn<S>(repacketizer: Arc<Repacketizer>, sink: S, cancel: CancellationToken) -> Self
    where
        S: RtpSink + 'static,
    {
        Self::with_capacity(repacketizer, sink, cancel, DEFAULT_QUEUE_CAPACITY)
    }

    /// Spawns the worker with a bounded delivery queue.
    pub fn with_capacity<S>(
        repacketizer: Arc<Repacketizer>,
        sink: S,
        cancel: CancellationToken,
        capacity: usize,
    ) -> Self
    where
        S: RtpSink + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let task = tokio::spawn(run(repacketizer.clone(), sink, cancel.clone(), rx));
        Self {
            handle: RelayHandle {
                tx,
                repacketizer,
                cancel,
            },
            task,
        }
    }

    /// Returns a cloneable handle for submitting deliveries.
    pub fn handle(&self) -> RelayHandle {
        self.handle.clone()
    }

    /// Stops the in-flight delivery and the worker.
    ///
    /// Queued deliveries resolve to [`StreamError::Cancelled`] with nothing
    /// sent.
    pub async fn cancel(self) {
        self.handle.cancel.cancel();
        self.join().await;
    }

    /// Waits for the worker to finish.
    ///
    /// The worker exits once every handle is dropped and the queue is
    /// drained, or when the cancellation token fires.
    pub async fn join(self) {
        let Relay { handle, task } = self;
        drop(handle);
        if let Err(e) = task.await {
            warn!("relay: worker task failed: {}", e);
        }
    }
}

/// Submits deliveries to a [`Relay`].
#[derive(Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<Delivery>,
    repacketizer: Arc<Repacketizer>,
    cancel: CancellationToken,
}

impl RelayHandle {
    /// Queues one Ogg/Opus buffer and waits until it has been streamed.
    ///
    /// Returns the number of packets written.
    pub async fn submit(
        &self,
        label: impl Into<String>,
        audio: impl Into<Bytes>,
    ) -> Result<usize, RelayError> {
        let (reply, outcome) = oneshot::channel();
        let delivery = Delivery {
            label: label.into(),
            audio: audio.into(),
            reply,
        };
        self.tx.send(delivery).await.map_err(|_| RelayError::Closed)?;
        Ok(outcome.await.map_err(|_| RelayError::Dropped)??)
    }

    /// Returns the repacketizer the relay streams through.
    pub fn repacketizer(&self) -> &Arc<Repacketizer> {
        &self.repacketizer
    }

    /// Returns true once the relay has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

async fn run<S: RtpSink>(
    repacketizer: Arc<Repacketizer>,
    sink: S,
    cancel: CancellationToken,
    mut rx: mpsc::Receiver<Delivery>,
) {
    loop {
        let delivery = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = rx.recv() => match next {
                Some(delivery) => delivery,
                None => break,
            },
        };

        debug!("relay: delivery {} ({} bytes)", delivery.label, delivery.audio.len());
        let packets = extract_opus_packets(&delivery.audio);
        let result = repacketizer.stream(&packets, &sink, &cancel).await;
        match &result {
            Ok(n) => info!("relay: delivery {} streamed, {} packets", delivery.label, n),
            Err(e) => warn!("relay: delivery {} failed: {}", delivery.label, e),
        }
        if delivery.reply.send(result).is_err() {
            debug!("relay: submitter of {} went away", delivery.label);
        }
    }

    // Deliveries queued behind a cancellation never start.
    rx.close();
    while let Some(delivery) = rx.recv().await {
        debug!("relay: delivery {} cancelled before start", delivery.label);
        let _ = delivery.reply.send(Err(StreamError::Cancelled { sent: 0 }));
    }
    debug!("relay: worker stopped");
}

/// Returns true if an attachment name looks like a voice message.
///
/// Matches `.ogg` and `.opus` files and names containing `voice-message`,
/// ignoring case.
pub fn is_voice_attachment(filename: &str) -> bool {
    let name = filename.to_lowercase();
    name.ends_with(".ogg") || name.ends_with(".opus") || name.contains("voice-message")
}
