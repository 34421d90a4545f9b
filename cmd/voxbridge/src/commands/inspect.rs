//! Voice file inspection.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use voxbridge_audio::codec::ogg::{checksum_matches, pages};
use voxbridge_audio::demux;
use super::{format_bytes, get_context, output};
use crate::Cli;

/// Summarize the pages and packets of a voice file.
///
/// Reports what the stream command would send: every non-empty segment
/// becomes one RTP packet.
#[derive(Args)]
pub struct InspectCommand {
    /// Ogg/Opus file to inspect
    file: PathBuf,

    /// Include one entry per page
    #[arg(long)]
    pages: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    file: String,
    size: String,
    pages: usize,
    segments: usize,
    empty_segments: usize,
    packets: usize,
    header_packets: usize,
    payload_bytes: usize,
    trailing_bytes: usize,
    /// Frame period of the selected context.
    frame_period_ms: u64,
    /// Playback time at one packet per frame period.
    stream_ms: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    page_details: Vec<PageReport>,
}

#[derive(Debug, Serialize)]
struct PageReport {
    sequence: u32,
    serial: u32,
    granule_position: i64,
    segments: usize,
    body_bytes: usize,
    bos: bool,
    eos: bool,
    continuation: bool,
    checksum_ok: bool,
}

impl InspectCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let frame_period_ms = get_context(cli)?.stream_config().frame_period_ms;
        let data = tokio::fs::read(&self.file).await?;
        let report = inspect(&self.file.display().to_string(), &data, self.pages, frame_period_ms);
        if report.trailing_bytes > 0 {
            tracing::warn!(
                "inspect: {} trailing bytes after last complete page",
                report.trailing_bytes
            );
        }
        output(cli).write(&report)
    }
}

fn inspect(name: &str, data: &[u8], with_pages: bool, frame_period_ms: u64) -> Report {
    let demuxed = demux(data);
    let header_packets = demuxed.packets.iter().filter(|p| p.is_header()).count();

    let page_details = if with_pages {
        pages(data)
            .map(|page| PageReport {
                sequence: page.sequence,
                serial: page.serial,
                granule_position: page.granule_position,
                segments: page.segments(),
                body_bytes: page.body.len(),
                bos: page.is_bos(),
                eos: page.is_eos(),
                continuation: page.is_continuation(),
                checksum_ok: checksum_matches(&page),
            })
            .collect()
    } else {
        Vec::new()
    };

    Report {
        file: name.to_string(),
        size: format_bytes(data.len()),
        pages: demuxed.pages,
        segments: demuxed.segments,
        empty_segments: demuxed.empty_segments(),
        packets: demuxed.packets.len(),
        header_packets,
        payload_bytes: demuxed.payload_bytes(),
        trailing_bytes: demuxed.trailing,
        frame_period_ms,
        stream_ms: demuxed.packets.len() as u64 * frame_period_ms,
        page_details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxbridge_audio::codec::ogg::PageWriter;

    fn voice_file() -> Vec<u8> {
        let mut file = Vec::new();
        let mut writer = PageWriter::new(&mut file, 7);
        writer.write_packet(b"OpusHead\x01\x01\x38\x01\x80\xbb\x00\x00\x00\x00\x00", 0, true, false).unwrap();
        writer.write_segments(&[3, 0, 2], &[0xFC, 1, 2, 0xFC, 3], 0, 1920).unwrap();
        file
    }

    #[test]
    fn test_inspect_counts() {
        let mut data = voice_file();
        data.extend_from_slice(b"Ogg");

        let report = inspect("clip.ogg", &data, false, 20);

        assert_eq!(report.pages, 2);
        assert_eq!(report.segments, 4);
        assert_eq!(report.empty_segments, 1);
        assert_eq!(report.packets, 3);
        assert_eq!(report.header_packets, 1);
        assert_eq!(report.payload_bytes, 19 + 5);
        assert_eq!(report.trailing_bytes, 3);
        assert_eq!(report.stream_ms, 60);
        assert!(report.page_details.is_empty());
    }

    #[test]
    fn test_inspect_pages() {
        let report = inspect("clip.ogg", &voice_file(), true, 20);

        assert_eq!(report.page_details.len(), 2);
        let first = &report.page_details[0];
        assert!(first.bos);
        assert_eq!(first.serial, 7);
        assert_eq!(first.sequence, 0);
        assert!(first.checksum_ok);
        let second = &report.page_details[1];
        assert_eq!(second.segments, 3);
        assert_eq!(second.body_bytes, 5);
        assert_eq!(second.granule_position, 1920);
    }

    #[test]
    fn test_inspect_uses_frame_period() {
        let report = inspect("clip.ogg", &voice_file(), false, 10);
        assert_eq!(report.frame_period_ms, 10);
        assert_eq!(report.stream_ms, 30);
    }

    #[test]
    fn test_inspect_garbage() {
        let report = inspect("junk.bin", b"definitely not ogg", true, 20);
        assert_eq!(report.pages, 0);
        assert_eq!(report.packets, 0);
        assert_eq!(report.trailing_bytes, 18);
        assert!(report.page_details.is_empty());
    }
}
