//! RTP packet structure and wire format (RFC 3550).
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |V=2|P|X|  CC   |M|     PT      |       sequence number         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           timestamp                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           synchronization source (SSRC) identifier            |
//! +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
//! |            contributing source (CSRC) identifiers             |
//! |                             ....                              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// RTP version carried by every packet.
pub const RTP_VERSION: u8 = 2;

/// Size of the fixed header without CSRCs or extension.
pub const FIXED_HEADER_SIZE: usize = 12;

/// Error decoding an RTP packet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PacketError {
    #[error("rtp: packet too short: {len} bytes, need {need}")]
    TooShort { len: usize, need: usize },
    #[error("rtp: unsupported version {0}")]
    BadVersion(u8),
    #[error("rtp: invalid padding length {0}")]
    BadPadding(u8),
}

/// Header extension (RFC 3550 section 5.3.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    /// Profile-defined identifier.
    pub profile: u16,
    /// Extension body, a multiple of four bytes on the wire.
    pub data: Bytes,
}

/// RTP fixed header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub padding: bool,
    pub marker: bool,
    pub payload_type: u8,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    pub csrc: Vec<u32>,
    pub extension: Option<Extension>,
}

impl Header {
    /// Creates a version-2 header with no CSRCs, extension or marker.
    pub fn new(payload_type: u8, sequence_number: u16, timestamp: u32, ssrc: u32) -> Self {
        Self {
            version: RTP_VERSION,
            padding: false,
            marker: false,
            payload_type,
            sequence_number,
            timestamp,
            ssrc,
            csrc: Vec::new(),
            extension: None,
        }
    }

    /// Encoded size of the header.
    pub fn marshal_size(&self) -> usize {
        let ext = self
            .extension
            .as_ref()
            .map(|e| 4 + e.data.len().div_ceil(4) * 4)
            .unwrap_or(0);
        FIXED_HEADER_SIZE + self.csrc.len() * 4 + ext
    }

    fn marshal_to(&self, buf: &mut BytesMut) {
        let csrc_count = self.csrc.len().min(15) as u8;
        let mut b0 = (self.version << 6) | csrc_count;
        if self.padding {
            b0 |= 0x20;
        }
        if self.extension.is_some() {
            b0 |= 0x10;
        }
        buf.put_u8(b0);

        let mut b1 = self.payload_type & 0x7F;
        if self.marker {
            b1 |= 0x80;
        }
        buf.put_u8(b1);
        buf.put_u16(self.sequence_number);
        buf.put_u32(self.timestamp);
        buf.put_u32(self.ssrc);
        for &csrc in self.csrc.iter().take(15) {
            buf.put_u32(csrc);
        }

        if let Some(ext) = &self.extension {
            let words = ext.data.len().div_ceil(4);
            buf.put_u16(ext.profile);
            buf.put_u16(words as u16);
            buf.put_slice(&ext.data);
            buf.put_bytes(0, words * 4 - ext.data.len());
        }
    }
}

/// One RTP packet: header plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: Header,
    pub payload: Bytes,
}

impl Packet {
    /// Creates a packet.
    pub fn new(header: Header, payload: impl Into<Bytes>) -> Self {
        Self {
            header,
            payload: payload.into(),
        }
    }

    /// Encoded size of the packet.
    pub fn marshal_size(&self) -> usize {
        self.header.marshal_size() + self.payload.len()
    }

    /// Serializes the packet to wire format.
    ///
    /// When `header.padding` is set the payload is assumed to already end
    /// with its padding count byte.
    pub fn marshal(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.marshal_size());
        self.header.marshal_to(&mut buf);
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    /// Parses a packet from wire format.
    ///
    /// Padding, if flagged, is stripped from the returned payload.
    pub fn unmarshal(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < FIXED_HEADER_SIZE {
            return Err(PacketError::TooShort {
                len: data.len(),
                need: FIXED_HEADER_SIZE,
            });
        }

        let mut buf = data;
        let b0 = buf.get_u8();
        let version = b0 >> 6;
        if version != RTP_VERSION {
            return Err(PacketError::BadVersion(version));
        }
        let padding = b0 & 0x20 != 0;
        let has_extension = b0 & 0x10 != 0;
        let csrc_count = (b0 & 0x0F) as usize;

        let b1 = buf.get_u8();
        let marker = b1 & 0x80 != 0;
        let payload_type = b1 & 0x7F;
        let sequence_number = buf.get_u16();
        let timestamp = buf.get_u32();
        let ssrc = buf.get_u32();

        let need = FIXED_HEADER_SIZE + csrc_count * 4;
        if data.len() < need {
            return Err(PacketError::TooShort { len: data.len(), need });
        }
        let csrc = (0..csrc_count).map(|_| buf.get_u32()).collect();

        let extension = if has_extension {
            if buf.remaining() < 4 {
                return Err(PacketError::TooShort {
                    len: data.len(),
                    need: need + 4,
                });
            }
            let profile = buf.get_u16();
            let len = buf.get_u16() as usize * 4;
            if buf.remaining() < len {
                return Err(PacketError::TooShort {
                    len: data.len(),
                    need: need + 4 + len,
                });
            }
            let ext = Bytes::copy_from_slice(&buf[..len]);
            buf.advance(len);
            Some(Extension { profile, data: ext })
        } else {
            None
        };

        let mut payload = buf;
        if padding {
            let pad = *payload.last().ok_or(PacketError::BadPadding(0))?;
            if pad == 0 || pad as usize > payload.len() {
                return Err(PacketError::BadPadding(pad));
            }
            payload = &payload[..payload.len() - pad as usize];
        }

        Ok(Self {
            header: Header {
                version,
                padding,
                marker,
                payload_type,
                sequence_number,
                timestamp,
                ssrc,
                csrc,
                extension,
            },
            payload: Bytes::copy_from_slice(payload),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marshal_fixed_header() {
        let packet = Packet::new(Header::new(111, 0x0102, 0x0304_0506, 123456789), vec![0xAA, 0xBB]);
        let wire = packet.marshal();

        assert_eq!(wire.len(), 14);
        assert_eq!(wire[0], 0x80);
        assert_eq!(wire[1], 111);
        assert_eq!(&wire[2..4], &[0x01, 0x02]);
        assert_eq!(&wire[4..8], &[0x03, 0x04, 0x05, 0x06]);
        assert_eq!(&wire[8..12], &123456789u32.to_be_bytes());
        assert_eq!(&wire[12..], &[0xAA, 0xBB]);
    }

    #[test]
    fn test_marker_bit() {
        let mut header = Header::new(111, 1, 2, 3);
        header.marker = true;
        let wire = Packet::new(header, Bytes::new()).marshal();
        assert_eq!(wire[1], 0x80 | 111);
    }

    #[test]
    fn test_unmarshal_emitted_packet() {
        let packet = Packet::new(Header::new(111, 65535, u32::MAX, 42), vec![1, 2, 3]);
        let parsed = Packet::unmarshal(&packet.marshal()).unwrap();
        assert_eq!(parsed, packet);
    }

    #[test]
    fn test_unmarshal_csrc_and_extension() {
        let mut header = Header::new(96, 7, 8, 9);
        header.csrc = vec![0x11111111, 0x22222222];
        header.extension = Some(Extension {
            profile: 0xBEDE,
            data: Bytes::from_static(&[1, 2, 3, 4]),
        });
        let packet = Packet::new(header, vec![0xFF]);
        let wire = packet.marshal();
        assert_eq!(wire.len(), packet.marshal_size());
        assert_eq!(wire[0] & 0x0F, 2);
        assert_eq!(wire[0] & 0x10, 0x10);

        let parsed = Packet::unmarshal(&wire).unwrap();
        assert_eq!(parsed, packet);
    }

    #[test]
    fn test_unmarshal_strips_padding() {
        let mut wire = Packet::new(Header::new(111, 1, 1, 1), vec![9, 9]).marshal().to_vec();
        wire[0] |= 0x20;
        wire.extend_from_slice(&[0, 0, 3]);

        let parsed = Packet::unmarshal(&wire).unwrap();
        assert!(parsed.header.padding);
        assert_eq!(parsed.payload.as_ref(), &[9, 9]);
    }

    #[test]
    fn test_unmarshal_errors() {
        assert_eq!(
            Packet::unmarshal(&[0x80, 111, 0]),
            Err(PacketError::TooShort { len: 3, need: 12 })
        );

        let mut wire = Packet::new(Header::new(111, 1, 1, 1), Bytes::new()).marshal().to_vec();
        wire[0] = 0x40;
        assert_eq!(Packet::unmarshal(&wire), Err(PacketError::BadVersion(1)));

        wire[0] = 0x81;
        assert!(matches!(Packet::unmarshal(&wire), Err(PacketError::TooShort { need: 16, .. })));
    }
}
