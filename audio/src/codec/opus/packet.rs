//! Opaque Opus packet payloads.

use bytes::Bytes;

/// One Opus packet as carried in a container segment.
///
/// The bytes are never inspected beyond [`OpusPacket::is_header`]; they are
/// forwarded unmodified as RTP payloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpusPacket(pub Bytes);

impl OpusPacket {
    /// Creates a packet from owned bytes.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }

    /// Creates a packet by copying a slice.
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(data))
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the packet is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true for the `OpusHead`/`OpusTags` stream headers.
    pub fn is_header(&self) -> bool {
        is_opus_header(&self.0)
    }

    /// Consumes the packet, returning the shared buffer.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl AsRef<[u8]> for OpusPacket {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for OpusPacket {
    fn from(data: Vec<u8>) -> Self {
        Self(Bytes::from(data))
    }
}

impl From<&[u8]> for OpusPacket {
    fn from(data: &[u8]) -> Self {
        Self::copy_from_slice(data)
    }
}

impl From<Bytes> for OpusPacket {
    fn from(data: Bytes) -> Self {
        Self(data)
    }
}

/// Returns true if `data` starts with an Ogg Opus header magic.
pub fn is_opus_header(data: &[u8]) -> bool {
    data.starts_with(b"OpusHead") || data.starts_with(b"OpusTags")
}
