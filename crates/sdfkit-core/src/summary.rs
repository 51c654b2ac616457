use std::collections::BTreeMap;
use std::path::Path;

use time::format_description::well_known::Rfc3339;

use crate::decoder::{DecodeOptions, Document, Ping};
use crate::format::channels::Samples;
use crate::format::layout;
use crate::source::{SourceError, decode_sdf_file};
use crate::{ChannelSummary, PingSummary, Report, VersionCount, make_stub_report};

/// Pings summarised when the caller does not choose a limit.
pub const DEFAULT_PING_LIMIT: usize = 5;
/// Samples shown at each end of a channel.
pub const PREVIEW_SAMPLES: usize = 5;

/// Decode `path` and summarise the first `limit` pings.
pub fn summarize_sdf_file(
    path: &Path,
    options: DecodeOptions,
    limit: usize,
) -> Result<Report, SourceError> {
    let document = decode_sdf_file(path, options)?;
    let bytes = path.metadata()?.len();
    Ok(summarize_document(
        &path.display().to_string(),
        bytes,
        &document,
        limit,
    ))
}

/// Build a report from an already decoded document.
///
/// Version counts cover every ping; per-ping summaries stop at `limit`.
///
/// # Examples
/// ```
/// use sdfkit_core::{Document, summarize_document};
///
/// let report = summarize_document("empty.sdf", 0, &Document::default(), 5);
/// assert_eq!(report.ping_count, 0);
/// assert!(report.pings.is_empty());
/// ```
pub fn summarize_document(
    input_path: &str,
    input_bytes: u64,
    document: &Document,
    limit: usize,
) -> Report {
    let mut report = make_stub_report(input_path, input_bytes);
    report.ping_count = document.len() as u64;
    report.skipped_count = document.skipped.len() as u64;

    let mut versions: BTreeMap<u32, (&'static str, u64)> = BTreeMap::new();
    for ping in document.iter() {
        let version = ping.header.page_version();
        versions.entry(version.code()).or_insert((version.name(), 0)).1 += 1;
    }
    report.page_versions = versions
        .into_iter()
        .map(|(page_version, (name, count))| VersionCount {
            page_version,
            name: name.to_string(),
            count,
        })
        .collect();

    report.pings = document.iter().take(limit).map(ping_summary).collect();
    report
}

pub fn ping_summary(ping: &Ping) -> PingSummary {
    let header = &ping.header;
    PingSummary {
        offset: ping.offset,
        ping_number: header.ping_number(),
        page_version: header.page_version().code(),
        number_bytes: header.get_u32(layout::NUMBER_BYTES).unwrap_or_default(),
        num_samples: header.num_samples(),
        range: header.get_u32(layout::RANGE).unwrap_or_default(),
        speed_sound: header.get_u32(layout::SPEED_SOUND).unwrap_or_default(),
        timestamp: header
            .timestamp()
            .and_then(|ts| ts.assume_utc().format(&Rfc3339).ok()),
        tx_waveform: header.tx_waveform(),
        channels: ping
            .channels
            .iter()
            .map(|channel| channel_summary(channel.label, &channel.samples))
            .collect(),
        extension_records: ping.extension.as_ref().map(Vec::len),
    }
}

fn channel_summary(label: &str, samples: &Samples) -> ChannelSummary {
    let len = samples.len();
    let head = len.min(PREVIEW_SAMPLES);
    let tail_start = len - head;
    ChannelSummary {
        label: label.to_string(),
        samples: len as u64,
        first: (0..head).filter_map(|i| samples.get(i)).collect(),
        last: (tail_start..len).filter_map(|i| samples.get(i)).collect(),
    }
}
