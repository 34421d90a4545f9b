//! Packet consumers the repacketizer writes to.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::{ToSocketAddrs, UdpSocket};
use tokio::sync::mpsc;

use crate::packet::Packet;

/// Error type for sink writes.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SinkError {
    #[error("sink closed")]
    Closed,
    #[error("io error: {0}")]
    Io(String),
    #[error("other error: {0}")]
    Other(String),
}

impl From<std::io::Error> for SinkError {
    fn from(e: std::io::Error) -> Self {
        SinkError::Io(e.to_string())
    }
}

/// Consumer of outbound RTP packets, one at a time.
#[async_trait]
pub trait RtpSink: Send + Sync {
    /// Writes one packet to the transport.
    async fn write_rtp(&self, packet: &Packet) -> Result<(), SinkError>;
}

#[async_trait]
impl<S: RtpSink + ?Sized> RtpSink for Arc<S> {
    async fn write_rtp(&self, packet: &Packet) -> Result<(), SinkError> {
        (**self).write_rtp(packet).await
    }
}

/// Sends each packet as one UDP datagram to a fixed peer.
pub struct UdpSink {
    socket: UdpSocket,
}

impl UdpSink {
    /// Binds `bind` and connects to `target`.
    pub async fn connect(bind: impl ToSocketAddrs, target: impl ToSocketAddrs) -> Result<Self, SinkError> {
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(target).await?;
        Ok(Self { socket })
    }

    /// Wraps an already connected socket.
    pub fn from_socket(socket: UdpSocket) -> Self {
        Self { socket }
    }

    /// Local address of the socket.
    pub fn local_addr(&self) -> Result<SocketAddr, SinkError> {
        Ok(self.socket.local_addr()?)
    }

    /// Address packets are sent to.
    pub fn peer_addr(&self) -> Result<SocketAddr, SinkError> {
        Ok(self.socket.peer_addr()?)
    }
}

#[async_trait]
impl RtpSink for UdpSink {
    async fn write_rtp(&self, packet: &Packet) -> Result<(), SinkError> {
        let wire = packet.marshal();
        let n = self.socket.send(&wire).await?;
        if n != wire.len() {
            return Err(SinkError::Io(format!("short datagram write: {} of {} bytes", n, wire.len())));
        }
        Ok(())
    }
}

/// Creates an in-process sink and the receiver for the packets written to it.
pub fn channel_sink(capacity: usize) -> (ChannelSink, mpsc::Receiver<Packet>) {
    let (tx, rx) = mpsc::channel(capacity);
    (ChannelSink { tx }, rx)
}

/// Sink backed by a bounded channel.
///
/// Writes wait for capacity; a dropped receiver turns every write into
/// [`SinkError::Closed`].
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Packet>,
}

#[async_trait]
impl RtpSink for ChannelSink {
    async fn write_rtp(&self, packet: &Packet) -> Result<(), SinkError> {
        self.tx
            .send(packet.clone())
            .await
            .map_err(|_| SinkError::Closed)
    }
}
