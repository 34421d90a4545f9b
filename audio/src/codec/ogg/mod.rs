//! Ogg container format.
//!
//! This module implements the parts of RFC 3533 the bridge needs: page
//! parsing over an in-memory buffer, demuxing pages into Opus packets, and
//! a page writer for authoring streams.

mod demux;
mod page;
mod writer;

pub use demux::*;
pub use page::{
    CAPTURE_PATTERN, HEADER_SIZE, Page, Pages, SEGMENT_COUNT_OFFSET, flags, page_size, pages, parse_page,
};
pub use writer::*;
