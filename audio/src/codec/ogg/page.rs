//! Ogg page structures and in-memory page parsing.
//!
//! Layout of the fixed header (RFC 3533, all integers little-endian):
//!
//! ```text
//!  0       4   5   6               14      18      22      26  27
//! +-------+---+---+---------------+-------+-------+-------+---+------------+------+
//! | OggS  |ver|typ| granule (i64) |serial |  seq  |  crc  | n | table (n)  | body |
//! +-------+---+---+---------------+-------+-------+-------+---+------------+------+
//! ```

/// Capture pattern at the start of every page.
pub const CAPTURE_PATTERN: &[u8; 4] = b"OggS";

/// Size of the fixed page header, up to and including the segment count.
pub const HEADER_SIZE: usize = 27;

/// Offset of the segment count byte within the fixed header.
pub const SEGMENT_COUNT_OFFSET: usize = 26;

/// Ogg page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Version (always 0)
    pub version: u8,
    /// Header type flags
    pub header_type: u8,
    /// Absolute granule position
    pub granule_position: i64,
    /// Stream serial number
    pub serial: u32,
    /// Page sequence number
    pub sequence: u32,
    /// CRC checksum as stored in the header (not verified)
    pub checksum: u32,
    /// Segment table, one length byte per segment
    pub segment_table: Vec<u8>,
    /// Page body data
    pub body: Vec<u8>,
}

impl Page {
    /// Creates a new empty page.
    pub fn new() -> Self {
        Self {
            version: 0,
            header_type: 0,
            granule_position: 0,
            serial: 0,
            sequence: 0,
            checksum: 0,
            segment_table: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Returns true if this is a beginning-of-stream page.
    pub fn is_bos(&self) -> bool {
        (self.header_type & flags::BOS) != 0
    }

    /// Returns true if this is an end-of-stream page.
    pub fn is_eos(&self) -> bool {
        (self.header_type & flags::EOS) != 0
    }

    /// Returns true if the first packet continues one from the previous page.
    pub fn is_continuation(&self) -> bool {
        (self.header_type & flags::CONTINUATION) != 0
    }

    /// Number of entries in the segment table.
    pub fn segments(&self) -> usize {
        self.segment_table.len()
    }

    /// Encoded size of the page: header, segment table and body.
    pub fn size(&self) -> usize {
        page_size(self.segment_table.len(), self.body.len())
    }

    /// Iterates the body slices described by the segment table, in order.
    ///
    /// Zero-length entries yield empty slices. Iteration stops at the first
    /// entry that would run past the end of `body`.
    pub fn segment_slices(&self) -> impl Iterator<Item = &[u8]> {
        let mut offset = 0usize;
        self.segment_table.iter().map_while(move |&len| {
            let start = offset;
            offset += len as usize;
            self.body.get(start..offset)
        })
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

/// Header type flags.
pub mod flags {
    /// Continuation of previous packet.
    pub const CONTINUATION: u8 = 0x01;
    /// Beginning of stream.
    pub const BOS: u8 = 0x02;
    /// End of stream.
    pub const EOS: u8 = 0x04;
}

/// Bounds of one well-formed page found at the start of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageBounds {
    /// Number of segment table entries.
    pub segments: usize,
    /// Sum of the segment table entries.
    pub body_len: usize,
}

impl PageBounds {
    /// Offset of the segment table from the page start.
    pub const fn table_start(&self) -> usize {
        HEADER_SIZE
    }

    /// Offset of the body from the page start.
    pub const fn body_start(&self) -> usize {
        HEADER_SIZE + self.segments
    }

    /// Total encoded page size.
    pub const fn size(&self) -> usize {
        page_size(self.segments, self.body_len)
    }
}

/// Size of a page carrying `segments` table entries and `body_len` bytes.
pub const fn page_size(segments: usize, body_len: usize) -> usize {
    HEADER_SIZE + segments + body_len
}

/// Checks that a complete page starts at `buf[0]`.
///
/// Returns `None` when the buffer is shorter than the fixed header, the
/// capture pattern does not match, or the segment table or body would run
/// past the end of the buffer.
pub(crate) fn page_bounds(buf: &[u8]) -> Option<PageBounds> {
    if buf.len() < HEADER_SIZE || &buf[..4] != CAPTURE_PATTERN {
        return None;
    }

    let segments = buf[SEGMENT_COUNT_OFFSET] as usize;
    let table = buf.get(HEADER_SIZE..HEADER_SIZE + segments)?;
    let body_len: usize = table.iter().map(|&s| s as usize).sum();

    let bounds = PageBounds { segments, body_len };
    if bounds.size() > buf.len() {
        return None;
    }
    Some(bounds)
}

/// Parses the page at the start of `buf`.
///
/// Returns the page and the number of bytes it occupies, or `None` if no
/// complete page starts there.
pub fn parse_page(buf: &[u8]) -> Option<(Page, usize)> {
    let bounds = page_bounds(buf)?;

    let le32 = |at: usize| u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
    let mut granule = [0u8; 8];
    granule.copy_from_slice(&buf[6..14]);

    let page = Page {
        version: buf[4],
        header_type: buf[5],
        granule_position: i64::from_le_bytes(granule),
        serial: le32(14),
        sequence: le32(18),
        checksum: le32(22),
        segment_table: buf[bounds.table_start()..bounds.body_start()].to_vec(),
        body: buf[bounds.body_start()..bounds.size()].to_vec(),
    };
    Some((page, bounds.size()))
}

/// Returns an iterator over the back-to-back pages in `buf`.
pub fn pages(buf: &[u8]) -> Pages<'_> {
    Pages { buf, offset: 0 }
}

/// Iterator over well-formed pages; stops at the first malformed or
/// truncated page.
pub struct Pages<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl Pages<'_> {
    /// Byte offset of the next page to be parsed.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left over after the pages parsed so far.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }
}

impl Iterator for Pages<'_> {
    type Item = Page;

    fn next(&mut self) -> Option<Self::Item> {
        let (page, size) = parse_page(&self.buf[self.offset..])?;
        self.offset += size;
        Some(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ogg::PageWriter;

    fn write_pages(tables: &[(&[u8], u8)]) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut writer = PageWriter::new(&mut buf, 0xDEADBEEF);
        for (table, header_type) in tables {
            let body_len: usize = table.iter().map(|&s| s as usize).sum();
            let body: Vec<u8> = (0..body_len).map(|i| i as u8).collect();
            writer.write_segments(table, &body, *header_type, 960).unwrap();
        }
        buf
    }

    #[test]
    fn test_page_new() {
        let page = Page::new();
        assert_eq!(page.version, 0);
        assert_eq!(page.header_type, 0);
        assert_eq!(page.segments(), 0);
        assert!(page.body.is_empty());
        assert_eq!(page.size(), HEADER_SIZE);
    }

    #[test]
    fn test_page_flags() {
        let mut page = Page::new();
        assert!(!page.is_bos());
        assert!(!page.is_eos());
        assert!(!page.is_continuation());

        page.header_type = flags::BOS | flags::EOS | flags::CONTINUATION;
        assert!(page.is_bos());
        assert!(page.is_eos());
        assert!(page.is_continuation());
    }

    #[test]
    fn test_parse_page_fields() {
        let buf = write_pages(&[(&[3, 0, 2], flags::BOS)]);
        let (page, size) = parse_page(&buf).unwrap();

        assert_eq!(size, buf.len());
        assert_eq!(page.version, 0);
        assert!(page.is_bos());
        assert_eq!(page.serial, 0xDEADBEEF);
        assert_eq!(page.sequence, 0);
        assert_eq!(page.granule_position, 960);
        assert_ne!(page.checksum, 0);
        assert_eq!(page.segment_table, vec![3, 0, 2]);
        assert_eq!(page.body.len(), 5);
    }

    #[test]
    fn test_segment_slices() {
        let buf = write_pages(&[(&[2, 0, 1], 0)]);
        let (page, _) = parse_page(&buf).unwrap();
        let slices: Vec<&[u8]> = page.segment_slices().collect();
        assert_eq!(slices, vec![&[0u8, 1][..], &[][..], &[2u8][..]]);
    }

    #[test]
    fn test_segment_slices_stop_at_short_body() {
        let mut page = Page::new();
        page.segment_table = vec![2, 3, 1];
        page.body = vec![7, 8, 9];
        let slices: Vec<&[u8]> = page.segment_slices().collect();
        assert_eq!(slices, vec![&[7u8, 8][..]]);
    }

    #[test]
    fn test_page_size() {
        assert_eq!(page_size(0, 0), HEADER_SIZE);
        assert_eq!(page_size(3, 600), HEADER_SIZE + 603);
    }

    #[test]
    fn test_parse_page_rejects_bad_magic() {
        let mut buf = write_pages(&[(&[1], 0)]);
        buf[0] = b'X';
        assert!(parse_page(&buf).is_none());
    }

    #[test]
    fn test_parse_page_short_header() {
        let buf = write_pages(&[(&[1], 0)]);
        assert!(parse_page(&buf[..HEADER_SIZE - 1]).is_none());
    }

    #[test]
    fn test_parse_page_truncated_table() {
        let buf = write_pages(&[(&[1, 1, 1, 1], 0)]);
        assert!(parse_page(&buf[..HEADER_SIZE + 2]).is_none());
    }

    #[test]
    fn test_parse_page_truncated_body() {
        let buf = write_pages(&[(&[10], 0)]);
        assert!(parse_page(&buf[..buf.len() - 1]).is_none());
    }

    #[test]
    fn test_pages_iterator() {
        let mut buf = write_pages(&[(&[1], flags::BOS), (&[2, 2], 0), (&[0], flags::EOS)]);
        buf.extend_from_slice(b"Ogg");

        let mut iter = pages(&buf);
        let seqs: Vec<u32> = iter.by_ref().map(|p| p.sequence).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(iter.remaining(), 3);
        assert_eq!(iter.offset(), buf.len() - 3);
    }
}
