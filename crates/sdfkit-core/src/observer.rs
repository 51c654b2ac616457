//! Decode diagnostics.
//!
//! Decoders report what they read to a [`DecodeObserver`] instead of
//! printing, so the library stays side-effect free. Hosts that want traces
//! plug in [`LogObserver`]; everything else uses [`NoopObserver`].

use log::{debug, trace, warn};

use crate::decoder::{Ping, SkippedPing};
use crate::format::header::FieldValue;

/// Receives decode events. All methods default to doing nothing.
pub trait DecodeObserver {
    /// A header field was read at `offset`.
    fn field(&mut self, _offset: u64, _name: &'static str, _value: FieldValue) {}

    /// A channel array starting at `offset` was read.
    fn channel(&mut self, _offset: u64, _label: &'static str, _samples: usize) {}

    /// An extension record starting at `offset` was read.
    fn record(&mut self, _offset: u64, _record_id: u32, _record_size: u32) {}

    /// A complete ping was assembled.
    fn ping(&mut self, _ping: &Ping) {}

    /// `len` bytes starting at `offset` were discarded while looking for a
    /// ping marker.
    fn skipped_bytes(&mut self, _offset: u64, _len: u64) {}

    /// A ping was dropped under the lenient policy.
    fn skipped_ping(&mut self, _skipped: &SkippedPing) {}
}

impl<O: DecodeObserver + ?Sized> DecodeObserver for &mut O {
    fn field(&mut self, offset: u64, name: &'static str, value: FieldValue) {
        (**self).field(offset, name, value);
    }

    fn channel(&mut self, offset: u64, label: &'static str, samples: usize) {
        (**self).channel(offset, label, samples);
    }

    fn record(&mut self, offset: u64, record_id: u32, record_size: u32) {
        (**self).record(offset, record_id, record_size);
    }

    fn ping(&mut self, ping: &Ping) {
        (**self).ping(ping);
    }

    fn skipped_bytes(&mut self, offset: u64, len: u64) {
        (**self).skipped_bytes(offset, len);
    }

    fn skipped_ping(&mut self, skipped: &SkippedPing) {
        (**self).skipped_ping(skipped);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DecodeObserver for NoopObserver {}

/// Forwards decode events to the `log` facade.
///
/// Field reads go to `trace`, channels, records and pings to `debug`, and
/// discarded bytes or pings to `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl DecodeObserver for LogObserver {
    fn field(&mut self, offset: u64, name: &'static str, value: FieldValue) {
        trace!("@{offset} {name} = {value}");
    }

    fn channel(&mut self, offset: u64, label: &'static str, samples: usize) {
        debug!("@{offset} channel {label}: {samples} samples");
    }

    fn record(&mut self, offset: u64, record_id: u32, record_size: u32) {
        debug!("@{offset} extension record {record_id:#010x} ({record_size} bytes)");
    }

    fn ping(&mut self, ping: &Ping) {
        debug!(
            "@{} ping {} version {} with {} channels",
            ping.offset,
            ping.header.ping_number(),
            ping.header.page_version().code(),
            ping.channels.len()
        );
    }

    fn skipped_bytes(&mut self, offset: u64, len: u64) {
        warn!("@{offset} skipped {len} bytes looking for a ping marker");
    }

    fn skipped_ping(&mut self, skipped: &SkippedPing) {
        warn!("@{} skipped ping: {}", skipped.offset, skipped.reason);
    }
}
