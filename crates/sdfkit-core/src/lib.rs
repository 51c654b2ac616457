//! SDFKit core library for decoding SDF side-scan sonar recordings.
//!
//! An SDF file is a flat sequence of pings. Each ping is a 4-byte marker,
//! a fixed little-endian header whose tail depends on the page version,
//! per-channel sample arrays selected by the header's `configuration`
//! bits, and an optional block of extension records.
//!
//! Decoding is layered the way the wire format is: `format` holds the
//! field tables and one decoder per ping part (layout/reader/domain
//! decoder/error), `decoder` drives the marker search and ping assembly,
//! `source` opens files and `summary` folds a decoded document into a
//! serializable report. Decoders are pure over `std::io::Read`; all
//! diagnostics go through a [`DecodeObserver`].
//!
//! Invariants:
//! - Every decoded header carries an accepted [`PageVersion`].
//! - A ping consumes exactly the bytes its header declares; the next
//!   marker search starts where the previous ping ended.
//! - Errors carry the absolute byte offset where decoding stopped.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use sdfkit_core::{DecodeOptions, decode_sdf_file};
//!
//! let document = decode_sdf_file(Path::new("survey.sdf"), DecodeOptions::strict())?;
//! for ping in document.iter() {
//!     println!("ping {} has {} channels", ping.header.ping_number(), ping.channels.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

mod decoder;
mod format;
mod observer;
mod source;
mod summary;

pub use decoder::{
    DecodeOptions, Document, ErrorPolicy, Ping, PingDecoder, SkipReason, SkippedPing, SyncMode,
    decode, decode_with_observer,
};
pub use format::channels::{Channel, ChannelSet, Samples, read_channels};
pub use format::error::DecodeError;
pub use format::extension::{ExtensionRecord, RecordPayload, ShipConfiguration, read_extension};
pub use format::header::{FieldValue, Header, TxWaveform, read_header};
pub use format::layout;
pub use format::reader::SdfReader;
pub use format::version::{
    ChannelBit, ChannelLayout, FixedChannel, HeaderExtensions, PageVersion, SampleKind,
    VersionLayout,
};
pub use observer::{DecodeObserver, LogObserver, NoopObserver};
pub use source::{SourceError, decode_sdf_file, decode_sdf_file_with_observer, open_sdf_file};
pub use summary::{
    DEFAULT_PING_LIMIT, PREVIEW_SAMPLES, ping_summary, summarize_document, summarize_sdf_file,
};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;

/// Summary of a decoded SDF file.
///
/// # Examples
/// ```
/// use sdfkit_core::make_stub_report;
///
/// let report = make_stub_report("survey.sdf", 123);
/// assert_eq!(report.report_version, sdfkit_core::REPORT_VERSION);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// Input file metadata.
    pub input: InputInfo,
    /// Number of decoded pings.
    pub ping_count: u64,
    /// Number of pings dropped under the lenient policy.
    pub skipped_count: u64,
    /// Ping counts per page version, ascending by version code.
    pub page_versions: Vec<VersionCount>,
    /// Leading pings in stream order, bounded by the summary limit.
    pub pings: Vec<PingSummary>,
}

/// Tool metadata embedded in reports.
///
/// # Examples
/// ```
/// use sdfkit_core::ToolInfo;
///
/// let tool = ToolInfo {
///     name: "sdfkit".to_string(),
///     version: "0.1.0".to_string(),
/// };
/// assert_eq!(tool.name, "sdfkit");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input file metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the decoder.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionCount {
    pub page_version: u32,
    /// Sonar model name, e.g. "System 3000".
    pub name: String,
    pub count: u64,
}

/// Per-ping summary.
///
/// # Examples
/// ```
/// use sdfkit_core::{PingSummary, TxWaveform};
///
/// let ping = PingSummary {
///     offset: 0,
///     ping_number: 1,
///     page_version: 3000,
///     number_bytes: 0,
///     num_samples: 3,
///     range: 50,
///     speed_sound: 150_000,
///     timestamp: None,
///     tx_waveform: TxWaveform::from_bits(0),
///     channels: Vec::new(),
///     extension_records: None,
/// };
/// assert_eq!(ping.page_version, 3000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingSummary {
    /// Byte offset of the ping marker.
    pub offset: u64,
    pub ping_number: u32,
    pub page_version: u32,
    pub number_bytes: u32,
    pub num_samples: u32,
    /// Range in meters.
    pub range: u32,
    /// Speed of sound in cm/s.
    pub speed_sound: u32,
    /// RFC3339 ping time, when the header date and time are valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub tx_waveform: TxWaveform,
    /// Channels in wire order.
    pub channels: Vec<ChannelSummary>,
    /// Extension record count, when the ping carried an extension block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_records: Option<usize>,
}

/// Channel length with a few samples from each end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub label: String,
    pub samples: u64,
    pub first: Vec<i64>,
    pub last: Vec<i64>,
}

/// Build a stub report with base fields filled and no pings.
///
/// # Examples
/// ```
/// use sdfkit_core::make_stub_report;
///
/// let report = make_stub_report("survey.sdf", 123);
/// assert_eq!(report.input.bytes, 123);
/// assert!(report.pings.is_empty());
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "sdfkit".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        ping_count: 0,
        skipped_count: 0,
        page_versions: vec![],
        pings: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::{REPORT_VERSION, Report, make_stub_report};

    #[test]
    fn stub_report_has_tool_metadata() {
        let report = make_stub_report("survey.sdf", 42);
        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.tool.name, "sdfkit");
        assert_eq!(report.tool.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(report.input.path, "survey.sdf");
        assert_eq!(report.ping_count, 0);
    }

    #[test]
    fn report_round_trips_through_json() {
        let report = make_stub_report("survey.sdf", 42);
        let json = serde_json::to_string(&report).unwrap();
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back.input.bytes, 42);
        assert!(back.page_versions.is_empty());
    }
}
