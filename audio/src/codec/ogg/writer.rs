//! Ogg page writer.

use std::io::{self, Write};

use super::page::{CAPTURE_PATTERN, Page, flags};

/// CRC lookup table for Ogg (polynomial 0x04c11db7, no reflection).
static CRC_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut r = (i as u32) << 24;
        let mut j = 0;
        while j < 8 {
            if r & 0x80000000 != 0 {
                r = (r << 1) ^ 0x04c11db7;
            } else {
                r <<= 1;
            }
            j += 1;
        }
        table[i] = r;
        i += 1;
    }
    table
};

/// Computes the Ogg page checksum over `data`.
pub fn crc32(data: &[u8]) -> u32 {
    data.iter().fold(0u32, |crc, &byte| {
        (crc << 8) ^ CRC_TABLE[((crc >> 24) as u8 ^ byte) as usize]
    })
}

/// Serializes a page, computing its checksum.
///
/// The `checksum` field of `page` is ignored. Fails with
/// [`io::ErrorKind::InvalidInput`] if the segment table has more than 255
/// entries or does not add up to the body length.
pub fn encode_page(page: &Page) -> io::Result<Vec<u8>> {
    let segments = u8::try_from(page.segment_table.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "ogg: more than 255 segments in one page",
        )
    })?;
    let declared: usize = page.segment_table.iter().map(|&s| s as usize).sum();
    if declared != page.body.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "ogg: segment table declares {} bytes, body has {}",
                declared,
                page.body.len()
            ),
        ));
    }

    let mut out = Vec::with_capacity(page.size());
    out.extend_from_slice(CAPTURE_PATTERN);
    out.push(page.version);
    out.push(page.header_type);
    out.extend_from_slice(&page.granule_position.to_le_bytes());
    out.extend_from_slice(&page.serial.to_le_bytes());
    out.extend_from_slice(&page.sequence.to_le_bytes());
    out.extend_from_slice(&[0u8; 4]);
    out.push(segments);
    out.extend_from_slice(&page.segment_table);
    out.extend_from_slice(&page.body);

    let crc = crc32(&out);
    out[22..26].copy_from_slice(&crc.to_le_bytes());
    Ok(out)
}

/// Returns true if the stored checksum of a parsed page matches its
/// contents.
pub fn checksum_matches(page: &Page) -> bool {
    encode_page(page).is_ok_and(|bytes| bytes[22..26] == page.checksum.to_le_bytes())
}

/// Writes a logical Ogg stream page by page.
///
/// Tracks the page sequence number and the granule position for one
/// serial number.
pub struct PageWriter<W: Write> {
    writer: W,
    serial: u32,
    sequence: u32,
    granule_position: i64,
}

impl<W: Write> PageWriter<W> {
    /// Creates a new page writer.
    pub fn new(writer: W, serial: u32) -> Self {
        Self {
            writer,
            serial,
            sequence: 0,
            granule_position: 0,
        }
    }

    /// Returns the serial number.
    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Returns the sequence number the next page will carry.
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Returns the granule position of the last written page.
    pub fn granule_position(&self) -> i64 {
        self.granule_position
    }

    /// Writes one page with an explicit segment table.
    ///
    /// `body` must be exactly as long as the sum of `segment_table`.
    pub fn write_segments(
        &mut self,
        segment_table: &[u8],
        body: &[u8],
        header_type: u8,
        granule_increment: i64,
    ) -> io::Result<()> {
        let granule_position = self.granule_position + granule_increment;
        let page = Page {
            version: 0,
            header_type,
            granule_position,
            serial: self.serial,
            sequence: self.sequence,
            checksum: 0,
            segment_table: segment_table.to_vec(),
            body: body.to_vec(),
        };

        self.writer.write_all(&encode_page(&page)?)?;
        self.granule_position = granule_position;
        self.sequence = self.sequence.wrapping_add(1);
        Ok(())
    }

    /// Writes one packet on its own page, lacing it into 255-byte segments.
    pub fn write_packet(
        &mut self,
        data: &[u8],
        granule_increment: i64,
        is_bos: bool,
        is_eos: bool,
    ) -> io::Result<()> {
        let mut header_type = 0u8;
        if is_bos {
            header_type |= flags::BOS;
        }
        if is_eos {
            header_type |= flags::EOS;
        }
        self.write_segments(&lacing(data.len()), data, header_type, granule_increment)
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Returns the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Builds the lacing values for one packet of `len` bytes.
///
/// A packet that is an exact multiple of 255 bytes ends with a zero entry.
pub fn lacing(len: usize) -> Vec<u8> {
    let mut table = vec![255u8; len / 255];
    table.push((len % 255) as u8);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ogg::{HEADER_SIZE, page_size, parse_page};

    #[test]
    fn test_crc32_empty() {
        assert_eq!(crc32(&[]), 0);
    }

    #[test]
    fn test_crc32_known_page() {
        // The stored checksum covers the page with its CRC field zeroed.
        let mut page = Page::new();
        page.header_type = flags::BOS;
        page.serial = 1;
        page.segment_table = vec![1];
        page.body = vec![0x42];

        let bytes = encode_page(&page).unwrap();
        let stored = u32::from_le_bytes([bytes[22], bytes[23], bytes[24], bytes[25]]);
        let mut zeroed = bytes.clone();
        zeroed[22..26].copy_from_slice(&[0; 4]);
        assert_eq!(crc32(&zeroed), stored);
    }

    #[test]
    fn test_checksum_matches() {
        let mut page = Page::new();
        page.segment_table = vec![2];
        page.body = vec![0xFC, 0x01];
        let bytes = encode_page(&page).unwrap();

        let (parsed, _) = parse_page(&bytes).unwrap();
        assert!(checksum_matches(&parsed));

        let mut corrupt = bytes.clone();
        corrupt[HEADER_SIZE + 1] ^= 0xFF;
        let (parsed, _) = parse_page(&corrupt).unwrap();
        assert!(!checksum_matches(&parsed));
    }

    #[test]
    fn test_lacing() {
        assert_eq!(lacing(0), vec![0]);
        assert_eq!(lacing(100), vec![100]);
        assert_eq!(lacing(255), vec![255, 0]);
        assert_eq!(lacing(300), vec![255, 45]);
    }

    #[test]
    fn test_write_segments_sequence_and_granule() {
        let mut buf = Vec::new();
        let mut writer = PageWriter::new(&mut buf, 7);
        writer.write_segments(&[1, 1], &[9, 9], flags::BOS, 960).unwrap();
        writer.write_segments(&[1], &[9], flags::EOS, 960).unwrap();
        assert_eq!(writer.sequence(), 2);
        assert_eq!(writer.granule_position(), 1920);

        let (first, size) = parse_page(&buf).unwrap();
        let (second, _) = parse_page(&buf[size..]).unwrap();
        assert_eq!(first.sequence, 0);
        assert!(first.is_bos());
        assert_eq!(second.sequence, 1);
        assert!(second.is_eos());
        assert_eq!(second.granule_position, 1920);
    }

    #[test]
    fn test_write_segments_rejects_length_mismatch() {
        let mut writer = PageWriter::new(Vec::new(), 1);
        let err = writer.write_segments(&[3], &[1, 2], 0, 0).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(writer.sequence(), 0);
        assert_eq!(writer.granule_position(), 0);
    }

    #[test]
    fn test_encode_page_rejects_oversized_table() {
        let mut page = Page::new();
        page.segment_table = vec![1; 256];
        page.body = vec![0; 256];

        let err = encode_page(&page).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(!checksum_matches(&page));

        let mut writer = PageWriter::new(Vec::new(), 1);
        let err = writer.write_segments(&[1; 256], &[0; 256], 0, 960).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn test_encode_page_rejects_short_body() {
        let mut page = Page::new();
        page.segment_table = vec![4];
        page.body = vec![1, 2];
        assert_eq!(encode_page(&page).unwrap_err().kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_write_packet_laces_large_packet() {
        let mut buf = Vec::new();
        let mut writer = PageWriter::new(&mut buf, 1);
        writer.write_packet(&[0xAB; 600], 960, false, true).unwrap();

        let (page, size) = parse_page(&buf).unwrap();
        assert_eq!(size, page_size(3, 600));
        assert_eq!(page.segment_table, vec![255, 255, 90]);
        assert!(page.is_eos());
    }
}
