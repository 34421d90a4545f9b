//! Demuxes back-to-back Ogg pages into Opus packets.
//!
//! Every non-empty segment table entry is taken as one packet. Segments
//! are not re-joined across 255-byte lacing boundaries or page boundaries,
//! and stream headers (`OpusHead`, `OpusTags`) are passed through; callers
//! that want to drop them can filter on [`OpusPacket::is_header`].

use tracing::debug;

use super::page::page_bounds;
use crate::codec::opus::OpusPacket;

/// Result of demuxing one buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Demuxed {
    /// Non-empty segments in page-then-table order.
    pub packets: Vec<OpusPacket>,
    /// Number of well-formed pages consumed.
    pub pages: usize,
    /// Number of segment table entries seen, empty ones included.
    pub segments: usize,
    /// Bytes after the last well-formed page that were not parsed.
    pub trailing: usize,
}

impl Demuxed {
    /// Number of zero-length segments that were dropped.
    pub fn empty_segments(&self) -> usize {
        self.segments - self.packets.len()
    }

    /// Total payload bytes across all packets.
    pub fn payload_bytes(&self) -> usize {
        self.packets.iter().map(OpusPacket::len).sum()
    }
}

/// Demuxes `buf`, stopping at the first position that does not hold a
/// complete page.
///
/// A short or garbled tail is not an error; it is reported in
/// [`Demuxed::trailing`].
pub fn demux(buf: &[u8]) -> Demuxed {
    let mut out = Demuxed::default();
    let mut pos = 0usize;

    while let Some(bounds) = page_bounds(&buf[pos..]) {
        let table = &buf[pos + bounds.table_start()..pos + bounds.body_start()];
        let mut seg_start = pos + bounds.body_start();

        for &len in table {
            let len = len as usize;
            if len > 0 {
                out.packets
                    .push(OpusPacket::copy_from_slice(&buf[seg_start..seg_start + len]));
            }
            seg_start += len;
        }

        out.pages += 1;
        out.segments += bounds.segments;
        pos += bounds.size();
    }

    out.trailing = buf.len() - pos;
    if out.trailing > 0 {
        debug!(
            "ogg: stopped at offset {} with {} unparsed bytes",
            pos, out.trailing
        );
    }
    out
}

/// Extracts the Opus packets carried by the pages in `buf`.
///
/// Returns an empty vector when no complete page is present.
pub fn extract_opus_packets(buf: &[u8]) -> Vec<OpusPacket> {
    demux(buf).packets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ogg::{PageWriter, flags};

    /// Writes one page per table; segment `i` of a page is filled with
    /// `(page << 4) | i`.
    fn build(tables: &[&[u8]]) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut writer = PageWriter::new(&mut buf, 42);
        for (p, table) in tables.iter().enumerate() {
            let mut body = Vec::new();
            for (i, &len) in table.iter().enumerate() {
                body.extend(std::iter::repeat_n(((p as u8) << 4) | i as u8, len as usize));
            }
            let header_type = if p == 0 { flags::BOS } else { 0 };
            writer.write_segments(table, &body, header_type, 960).unwrap();
        }
        buf
    }

    #[test]
    fn test_empty_buffer() {
        let out = demux(&[]);
        assert!(out.packets.is_empty());
        assert_eq!(out.pages, 0);
        assert_eq!(out.trailing, 0);
    }

    #[test]
    fn test_no_valid_page() {
        let out = demux(&[0u8; 100]);
        assert!(out.packets.is_empty());
        assert_eq!(out.pages, 0);
        assert_eq!(out.trailing, 100);
    }

    #[test]
    fn test_two_pages_three_segments_each() {
        let buf = build(&[&[1, 1, 1], &[1, 1, 1]]);
        let packets = extract_opus_packets(&buf);

        let firsts: Vec<u8> = packets.iter().map(|p| p.as_bytes()[0]).collect();
        assert_eq!(firsts, vec![0x00, 0x01, 0x02, 0x10, 0x11, 0x12]);
    }

    #[test]
    fn test_count_matches_non_empty_segments() {
        let tables: [&[u8]; 4] = [&[19, 0, 7], &[0], &[255, 255, 3, 0, 1], &[60; 10]];
        let expected: usize = tables
            .iter()
            .map(|t| t.iter().filter(|&&s| s > 0).count())
            .sum();

        let out = demux(&build(&tables));
        assert_eq!(out.packets.len(), expected);
        assert_eq!(out.pages, 4);
        assert_eq!(out.segments, 19);
        assert_eq!(out.empty_segments(), 19 - expected);
        assert_eq!(out.trailing, 0);
    }

    #[test]
    fn test_segment_order_and_lengths() {
        let out = demux(&build(&[&[2, 0, 5], &[3]]));
        let lens: Vec<usize> = out.packets.iter().map(OpusPacket::len).collect();
        assert_eq!(lens, vec![2, 5, 3]);
        assert_eq!(out.packets[0].as_bytes(), &[0x00, 0x00]);
        assert_eq!(out.packets[1].as_bytes(), &[0x02; 5]);
        assert_eq!(out.packets[2].as_bytes(), &[0x10; 3]);
        assert_eq!(out.payload_bytes(), 10);
    }

    #[test]
    fn test_all_zero_length_segments() {
        let out = demux(&build(&[&[0, 0], &[0], &[0, 0, 0]]));
        assert!(out.packets.is_empty());
        assert_eq!(out.pages, 3);
        assert_eq!(out.segments, 6);
    }

    #[test]
    fn test_zero_segment_page() {
        let out = demux(&build(&[&[], &[4]]));
        assert_eq!(out.pages, 2);
        assert_eq!(out.packets.len(), 1);
    }

    #[test]
    fn test_truncated_final_page_header() {
        let full = build(&[&[1, 1], &[1, 1, 1]]);
        let first_page = crate::codec::ogg::page_size(2, 2);

        // Magic present but the fixed header is cut short.
        let buf = &full[..first_page + 10];
        let out = demux(buf);
        assert_eq!(out.packets.len(), 2);
        assert_eq!(out.pages, 1);
        assert_eq!(out.trailing, 10);
    }

    #[test]
    fn test_truncated_final_page_body() {
        let full = build(&[&[3], &[3, 3]]);
        let out = demux(&full[..full.len() - 1]);
        assert_eq!(out.packets.len(), 1);
        assert_eq!(out.packets[0].as_bytes(), &[0x00; 3]);
    }

    #[test]
    fn test_garbage_between_pages_stops_parsing() {
        let mut buf = build(&[&[2]]);
        buf.extend_from_slice(b"junk");
        buf.extend_from_slice(&build(&[&[2]]));

        let out = demux(&buf);
        assert_eq!(out.packets.len(), 1);
        assert_eq!(out.pages, 1);
    }

    #[test]
    fn test_headers_pass_through() {
        let mut buf = Vec::new();
        let mut writer = PageWriter::new(&mut buf, 1);
        writer.write_packet(b"OpusHead\x01\x01\x38\x01\x80\xbb\x00\x00\x00\x00\x00", 0, true, false).unwrap();
        writer.write_packet(b"OpusTags\x00\x00\x00\x00\x00\x00\x00\x00", 0, false, false).unwrap();
        writer.write_packet(&[0xFC, 0x01], 960, false, true).unwrap();

        let packets = extract_opus_packets(&buf);
        assert_eq!(packets.len(), 3);
        assert!(packets[0].is_header());
        assert!(packets[1].is_header());
        assert!(!packets[2].is_header());
    }

    #[test]
    fn test_reparse_is_idempotent() {
        let buf = build(&[&[5, 5], &[1]]);
        assert_eq!(demux(&buf), demux(&buf));
    }
}
