//! Ping stream decoding.
//!
//! The decoder repeats `seek marker -> header -> channels -> extension ->
//! emit` until a marker read comes up short. One ping is fully decoded
//! before the next marker is looked for, since its position depends on how
//! many bytes the current ping consumed.

use std::fmt;
use std::io::Read;
use std::iter::FusedIterator;

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::format::channels::{ChannelSet, read_channels};
use crate::format::error::DecodeError;
use crate::format::extension::{ExtensionRecord, read_extension};
use crate::format::header::{Header, read_header};
use crate::format::layout::{MARKER_LEN, PING_MARKER_BYTES};
use crate::format::reader::SdfReader;
use crate::format::version::PageVersion;
use crate::observer::{DecodeObserver, NoopObserver};

/// What happens to a ping that cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// The first error ends decoding.
    Strict,
    /// Pings with an unknown page version, or a known version whose
    /// channel data has no layout, are skipped and recorded; decoding
    /// resumes at the next marker. Structural errors still end decoding.
    Lenient,
}

/// How the decoder treats bytes that are not a ping marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Discard the mismatching 4-byte word and try the next one. Only
    /// recovers when the marker sits on a 4-byte boundary of the skipped
    /// run.
    SkipWord,
    /// Slide one byte at a time until the marker pattern appears.
    Scan,
    /// Fail with `MissingMarker`.
    Strict,
}

/// Decoder configuration. There is no default; the host picks a policy.
///
/// # Examples
/// ```
/// use sdfkit_core::{DecodeOptions, ErrorPolicy, SyncMode};
///
/// let options = DecodeOptions::new(ErrorPolicy::Lenient).with_sync(SyncMode::Scan);
/// assert_eq!(options.policy, ErrorPolicy::Lenient);
/// assert_eq!(options.sync, SyncMode::Scan);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub policy: ErrorPolicy,
    pub sync: SyncMode,
}

impl DecodeOptions {
    /// Options with the given policy and word-skipping marker search.
    pub fn new(policy: ErrorPolicy) -> Self {
        Self {
            policy,
            sync: SyncMode::SkipWord,
        }
    }

    pub fn strict() -> Self {
        Self::new(ErrorPolicy::Strict)
    }

    pub fn lenient() -> Self {
        Self::new(ErrorPolicy::Lenient)
    }

    pub fn with_sync(mut self, sync: SyncMode) -> Self {
        self.sync = sync;
        self
    }
}

/// One decoded ping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ping {
    /// Offset of the ping marker.
    pub offset: u64,
    pub header: Header,
    pub channels: ChannelSet,
    /// Present when the header declares a non-empty extension block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<ExtensionRecord>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "page_version", rename_all = "snake_case")]
pub enum SkipReason {
    InvalidPageVersion(u32),
    UnsupportedPageVersion(PageVersion),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidPageVersion(value) => write!(f, "invalid page version {value}"),
            SkipReason::UnsupportedPageVersion(version) => {
                write!(f, "no channel layout for page version {version}")
            }
        }
    }
}

/// A ping dropped under [`ErrorPolicy::Lenient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkippedPing {
    /// Offset of the ping marker.
    pub offset: u64,
    pub reason: SkipReason,
}

/// All pings of a stream, in stream order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub pings: Vec<Ping>,
    pub skipped: Vec<SkippedPing>,
}

impl Document {
    pub fn len(&self) -> usize {
        self.pings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Ping> {
        self.pings.iter()
    }
}

enum Outcome {
    Ping(Ping),
    Skipped(SkippedPing),
}

/// Lazy ping decoder over a byte stream.
///
/// Yields `Ok(ping)` per decoded ping and stops after the first `Err`. It
/// cannot be restarted; a host may stop between pings but not inside one.
///
/// # Examples
/// ```
/// use sdfkit_core::{DecodeOptions, PingDecoder};
///
/// let empty: &[u8] = &[];
/// let mut decoder = PingDecoder::new(empty, DecodeOptions::strict());
/// assert!(decoder.next().is_none());
/// ```
pub struct PingDecoder<R, O = NoopObserver> {
    reader: SdfReader<R>,
    options: DecodeOptions,
    observer: O,
    skipped: Vec<SkippedPing>,
    done: bool,
}

impl<R: Read> PingDecoder<R> {
    pub fn new(inner: R, options: DecodeOptions) -> Self {
        Self::with_observer(inner, options, NoopObserver)
    }
}

impl<R: Read, O: DecodeObserver> PingDecoder<R, O> {
    pub fn with_observer(inner: R, options: DecodeOptions, observer: O) -> Self {
        Self {
            reader: SdfReader::new(inner),
            options,
            observer,
            skipped: Vec::new(),
            done: false,
        }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.reader.offset()
    }

    /// Pings skipped so far under the lenient policy.
    pub fn skipped(&self) -> &[SkippedPing] {
        &self.skipped
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Decode the next ping, `Ok(None)` at end of stream.
    ///
    /// # Errors
    /// Any `DecodeError` not absorbed by the lenient policy. After an error
    /// every further call returns `Ok(None)`.
    pub fn next_ping(&mut self) -> Result<Option<Ping>, DecodeError> {
        if self.done {
            return Ok(None);
        }
        let result = self.advance();
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        result
    }

    fn advance(&mut self) -> Result<Option<Ping>, DecodeError> {
        while let Some(offset) = self.seek_marker()? {
            match self.decode_ping(offset)? {
                Outcome::Ping(ping) => {
                    self.observer.ping(&ping);
                    return Ok(Some(ping));
                }
                Outcome::Skipped(skipped) => {
                    self.observer.skipped_ping(&skipped);
                    self.skipped.push(skipped);
                }
            }
        }
        Ok(None)
    }

    /// Position the stream just past the next marker and return the
    /// marker's offset, or `None` at end of stream.
    fn seek_marker(&mut self) -> Result<Option<u64>, DecodeError> {
        let start = self.reader.offset();
        let mut word = [0u8; MARKER_LEN];
        let read = self.reader.read_up_to(&mut word)?;
        if read < MARKER_LEN {
            if read > 0 {
                self.observer.skipped_bytes(start, read as u64);
            }
            return Ok(None);
        }

        let mut word_offset = start;
        loop {
            if word == PING_MARKER_BYTES {
                if word_offset > start {
                    self.observer.skipped_bytes(start, word_offset - start);
                }
                return Ok(Some(word_offset));
            }

            match self.options.sync {
                SyncMode::Strict => {
                    return Err(DecodeError::MissingMarker {
                        offset: word_offset,
                        found: LittleEndian::read_u32(&word),
                    });
                }
                SyncMode::SkipWord => {
                    word_offset = self.reader.offset();
                    if self.reader.read_up_to(&mut word)? < MARKER_LEN {
                        self.observer
                            .skipped_bytes(start, self.reader.offset() - start);
                        return Ok(None);
                    }
                }
                SyncMode::Scan => {
                    let mut next = [0u8; 1];
                    if self.reader.read_up_to(&mut next)? == 0 {
                        self.observer
                            .skipped_bytes(start, self.reader.offset() - start);
                        return Ok(None);
                    }
                    word.copy_within(1.., 0);
                    word[MARKER_LEN - 1] = next[0];
                    word_offset += 1;
                }
            }
        }
    }

    fn decode_ping(&mut self, offset: u64) -> Result<Outcome, DecodeError> {
        let lenient = self.options.policy == ErrorPolicy::Lenient;

        let header = match read_header(&mut self.reader, &mut self.observer) {
            Ok(header) => header,
            Err(DecodeError::InvalidPageVersion { value, .. }) if lenient => {
                return Ok(Outcome::Skipped(SkippedPing {
                    offset,
                    reason: SkipReason::InvalidPageVersion(value),
                }));
            }
            Err(err) => return Err(err),
        };

        let channels = read_channels(&mut self.reader, &header, &mut self.observer)?;
        let extension = match header.sdf_extension_size() {
            Some(size) if size > 0 => Some(read_extension(
                &mut self.reader,
                size,
                &mut self.observer,
            )?),
            _ => None,
        };

        let version = header.page_version();
        if lenient && !version.layout().has_channel_layout() {
            return Ok(Outcome::Skipped(SkippedPing {
                offset,
                reason: SkipReason::UnsupportedPageVersion(version),
            }));
        }

        Ok(Outcome::Ping(Ping {
            offset,
            header,
            channels,
            extension,
        }))
    }
}

impl<R: Read, O: DecodeObserver> Iterator for PingDecoder<R, O> {
    type Item = Result<Ping, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_ping().transpose()
    }
}

impl<R: Read, O: DecodeObserver> FusedIterator for PingDecoder<R, O> {}

/// Decode every ping of `reader`.
///
/// # Errors
/// The first `DecodeError` the policy does not absorb.
///
/// # Examples
/// ```
/// use sdfkit_core::{DecodeOptions, decode};
///
/// let document = decode(&[0u8; 3][..], DecodeOptions::strict()).unwrap();
/// assert!(document.is_empty());
/// ```
pub fn decode<R: Read>(reader: R, options: DecodeOptions) -> Result<Document, DecodeError> {
    decode_with_observer(reader, options, NoopObserver)
}

pub fn decode_with_observer<R: Read, O: DecodeObserver>(
    reader: R,
    options: DecodeOptions,
    observer: O,
) -> Result<Document, DecodeError> {
    let mut decoder = PingDecoder::with_observer(reader, options, observer);
    let mut pings = Vec::new();
    while let Some(ping) = decoder.next_ping()? {
        pings.push(ping);
    }
    Ok(Document {
        pings,
        skipped: decoder.skipped,
    })
}
