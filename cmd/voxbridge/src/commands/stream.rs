//! Streams voice files through one relay.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use voxbridge_rtpstream::{
    Relay, RelayError, Repacketizer, StreamConfig, StreamError, UdpSink, is_voice_attachment,
};

use super::{get_context, output, print_success, print_warning};
use crate::Cli;

/// Stream voice files to an RTP target.
///
/// Files are sent in the order given, one Opus packet every 20 ms, on a
/// single stream: sequence numbers and timestamps continue from one file
/// to the next. Files that do not look like voice messages (.ogg, .opus or
/// a name containing "voice-message") are skipped. Ctrl-C stops the stream
/// after the packet in flight.
#[derive(Args)]
pub struct StreamCommand {
    /// Voice files to send
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// RTP destination host:port (overrides the context)
    #[arg(short = 't', long)]
    target: Option<String>,

    /// Local bind address (overrides the context)
    #[arg(long)]
    bind: Option<String>,

    /// RTP synchronization source (overrides the context)
    #[arg(long)]
    ssrc: Option<u32>,

    /// RTP payload type, 0-127 (overrides the context)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=127))]
    payload_type: Option<u8>,
}

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    status: &'static str,
    packets: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct StreamReport {
    target: String,
    ssrc: u32,
    packets: usize,
    next_sequence: u16,
    next_timestamp: u32,
    files: Vec<FileReport>,
}

impl StreamCommand {
    fn stream_config(&self, base: StreamConfig) -> StreamConfig {
        let mut config = base;
        if let Some(ssrc) = self.ssrc {
            config.ssrc = ssrc;
        }
        if let Some(pt) = self.payload_type {
            config.payload_type = pt;
        }
        config
    }

    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let target = self.target.as_deref().unwrap_or(&ctx.target);
        let bind = self.bind.as_deref().unwrap_or(&ctx.bind);
        let config = self.stream_config(ctx.stream_config());
        config.validate()?;

        let sink = UdpSink::connect(bind, target).await?;
        info!(
            "stream: sending from {} to {} (pt {}, ssrc {})",
            sink.local_addr()?,
            sink.peer_addr()?,
            config.payload_type,
            config.ssrc
        );

        let cancel = CancellationToken::new();
        let repacketizer = Arc::new(Repacketizer::new(config));
        let relay = Relay::spawn(repacketizer.clone(), sink, cancel.clone());
        let handle = relay.handle();

        {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("stream: interrupted");
                    cancel.cancel();
                }
            });
        }

        let mut files = Vec::with_capacity(self.files.len());
        for path in &self.files {
            let name = file_name(path);
            if !is_voice_attachment(&name) {
                print_warning(&format!("skipping {}: not a voice file", path.display()));
                files.push(FileReport::new(&name, "skipped", 0, None));
                continue;
            }

            if cancel.is_cancelled() {
                files.push(FileReport::new(&name, "cancelled", 0, None));
                continue;
            }

            let data = match tokio::fs::read(path).await {
                Ok(data) => data,
                Err(e) => {
                    warn!("stream: cannot read {}: {}", path.display(), e);
                    files.push(FileReport::new(&name, "failed", 0, Some(e.to_string())));
                    continue;
                }
            };
            let outcome = handle.submit(name.clone(), data).await;
            files.push(file_report(&name, outcome, cancel.is_cancelled()));
        }

        drop(handle);
        relay.join().await;

        let position = repacketizer.position();
        let report = StreamReport {
            target: target.to_string(),
            ssrc: config.ssrc,
            packets: files.iter().map(|f| f.packets).sum(),
            next_sequence: position.sequence,
            next_timestamp: position.timestamp,
            files,
        };
        output(cli).write(&report)?;

        let failed = report.files.iter().filter(|f| f.status == "failed").count();
        if failed > 0 {
            anyhow::bail!("{} of {} files failed", failed, report.files.len());
        }
        if cancel.is_cancelled() {
            anyhow::bail!("stream interrupted");
        }
        print_success(&format!("Sent {} packets to {}", report.packets, report.target));
        Ok(())
    }
}

impl FileReport {
    fn new(file: &str, status: &'static str, packets: usize, error: Option<String>) -> Self {
        Self {
            file: file.to_string(),
            status,
            packets,
            error,
        }
    }
}

/// Classifies the outcome of one submitted file.
///
/// Once the run is cancelled, a relay that is closed or dropped the
/// delivery counts as a cancellation rather than a failure.
fn file_report(name: &str, outcome: Result<usize, RelayError>, cancelled: bool) -> FileReport {
    match outcome {
        Ok(sent) => FileReport::new(name, "sent", sent, None),
        Err(RelayError::Stream(StreamError::NoPayload)) => {
            print_warning(&format!("skipping {}: no opus packets", name));
            FileReport::new(name, "empty", 0, None)
        }
        Err(RelayError::Stream(e)) if e.is_cancelled() => {
            FileReport::new(name, "cancelled", e.sent(), None)
        }
        Err(RelayError::Closed | RelayError::Dropped) if cancelled => {
            FileReport::new(name, "cancelled", 0, None)
        }
        Err(RelayError::Stream(e)) => {
            FileReport::new(name, "failed", e.sent(), Some(e.to_string()))
        }
        Err(e) => FileReport::new(name, "failed", 0, Some(e.to_string())),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
