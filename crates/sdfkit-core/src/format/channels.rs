use std::io::Read;

use byteorder::{ByteOrder, LittleEndian};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::error::DecodeError;
use super::header::Header;
use super::reader::SdfReader;
use super::version::{ChannelLayout, SampleKind};
use crate::observer::DecodeObserver;

/// Sample array of one channel, typed by its wire element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Samples {
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
}

impl Samples {
    pub fn kind(&self) -> SampleKind {
        match self {
            Samples::U16(_) => SampleKind::U16,
            Samples::I32(_) => SampleKind::I32,
            Samples::U32(_) => SampleKind::U32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Samples::U16(v) => v.len(),
            Samples::I32(v) => v.len(),
            Samples::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample at `index`, widened so all element kinds compare alike.
    pub fn get(&self, index: usize) -> Option<i64> {
        match self {
            Samples::U16(v) => v.get(index).map(|&s| i64::from(s)),
            Samples::I32(v) => v.get(index).map(|&s| i64::from(s)),
            Samples::U32(v) => v.get(index).map(|&s| i64::from(s)),
        }
    }

    pub fn as_u16(&self) -> Option<&[u16]> {
        match self {
            Samples::U16(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<&[i32]> {
        match self {
            Samples::I32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<&[u32]> {
        match self {
            Samples::U32(v) => Some(v),
            _ => None,
        }
    }

    fn decode(kind: SampleKind, bytes: &[u8]) -> Self {
        let count = bytes.len() / kind.width();
        match kind {
            SampleKind::U16 => {
                let mut out = vec![0u16; count];
                LittleEndian::read_u16_into(bytes, &mut out);
                Samples::U16(out)
            }
            SampleKind::I32 => {
                let mut out = vec![0i32; count];
                LittleEndian::read_i32_into(bytes, &mut out);
                Samples::I32(out)
            }
            SampleKind::U32 => {
                let mut out = vec![0u32; count];
                LittleEndian::read_u32_into(bytes, &mut out);
                Samples::U32(out)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub label: &'static str,
    pub samples: Samples,
}

/// Channels of one ping in the order they appeared on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelSet {
    channels: Vec<Channel>,
}

impl ChannelSet {
    pub fn get(&self, label: &str) -> Option<&Samples> {
        self.channels
            .iter()
            .find(|c| c.label == label)
            .map(|c| &c.samples)
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.channels.iter().map(|c| c.label)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Channel> {
        self.channels.iter()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    fn push(&mut self, label: &'static str, samples: Samples) {
        self.channels.push(Channel { label, samples });
    }
}

impl<'a> IntoIterator for &'a ChannelSet {
    type Item = &'a Channel;
    type IntoIter = std::slice::Iter<'a, Channel>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for ChannelSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.channels.len()))?;
        for channel in &self.channels {
            map.serialize_entry(channel.label, &channel.samples)?;
        }
        map.end()
    }
}

/// Read the channel arrays that follow `header`, as dictated by the
/// version's channel layout.
///
/// Bit-table layouts read one count-prefixed array per set bit of
/// `configuration`, in table order. Fixed layouts read `numSamples`
/// elements per channel regardless of `configuration`. Versions without a
/// layout read nothing.
///
/// # Errors
/// `UnexpectedEndOfStream` naming the channel when an array is cut short,
/// `ImpossibleSampleCount` when the declared length cannot be addressed.
pub fn read_channels<R: Read>(
    reader: &mut SdfReader<R>,
    header: &Header,
    observer: &mut dyn DecodeObserver,
) -> Result<ChannelSet, DecodeError> {
    let mut set = ChannelSet::default();
    match header.page_version().layout().channels {
        ChannelLayout::None => {}
        ChannelLayout::BitTable(bits) => {
            let configuration = header.configuration();
            for bit in bits.iter().filter(|b| configuration & b.mask != 0) {
                let offset = reader.offset();
                let count = reader.read_u16(&format!("channel {} sample count", bit.label))?;
                let samples = read_samples(reader, bit.label, bit.element, u64::from(count))?;
                observer.channel(offset, bit.label, samples.len());
                set.push(bit.label, samples);
            }
        }
        ChannelLayout::Fixed(channels) => {
            let count = u64::from(header.num_samples());
            for channel in channels {
                let offset = reader.offset();
                let samples = read_samples(reader, channel.label, channel.element, count)?;
                observer.channel(offset, channel.label, samples.len());
                set.push(channel.label, samples);
            }
        }
    }
    Ok(set)
}

/// Count-prefixed arrays are bounded by their u16 prefix, so only fixed
/// layouts driven by a u32 `numSamples` can overflow, and only where
/// `usize` is 32 bits wide.
fn read_samples<R: Read>(
    reader: &mut SdfReader<R>,
    label: &str,
    kind: SampleKind,
    count: u64,
) -> Result<Samples, DecodeError> {
    let byte_len = usize::try_from(count)
        .ok()
        .and_then(|n| n.checked_mul(kind.width()))
        .ok_or_else(|| DecodeError::ImpossibleSampleCount {
            offset: reader.offset(),
            channel: label.to_string(),
            count,
        })?;
    let bytes = reader.read_vec(byte_len, &format!("channel {label} samples"))?;
    Ok(Samples::decode(kind, &bytes))
}

#[cfg(test)]
mod tests {
    use super::{Samples, read_channels};
    use crate::format::error::DecodeError;
    use crate::format::fixtures::{HeaderBuilder, i32_channel, u16_channel};
    use crate::format::header::read_header;
    use crate::format::reader::SdfReader;
    use crate::format::version::SampleKind;
    use crate::observer::NoopObserver;

    fn decode(header: HeaderBuilder, body: &[u8]) -> (Result<super::ChannelSet, DecodeError>, u64) {
        let mut bytes = header.build();
        let header_len = bytes.len() as u64;
        bytes.extend_from_slice(body);
        let mut reader = SdfReader::new(&bytes[..]);
        let header = read_header(&mut reader, &mut NoopObserver).unwrap();
        let result = read_channels(&mut reader, &header, &mut NoopObserver);
        (result, reader.offset() - header_len)
    }

    #[test]
    fn all_sidescan_bits_in_label_order() {
        let mut body = Vec::new();
        for i in 0..4u16 {
            body.extend(u16_channel(&[i, i + 1]));
        }
        body.extend(i32_channel(&[-5, 6]));
        let header = HeaderBuilder::new(3000).u32("configuration", 0x1F);

        let (set, consumed) = decode(header, &body);
        let set = set.unwrap();
        let labels: Vec<_> = set.labels().collect();
        assert_eq!(
            labels,
            ["lf_port", "lf_starboard", "hf_port", "hf_starboard", "sbp"]
        );
        assert_eq!(set.get("hf_port").unwrap().as_u16(), Some(&[2u16, 3][..]));
        assert_eq!(set.get("sbp").unwrap().as_i32(), Some(&[-5i32, 6][..]));
        assert_eq!(consumed as usize, body.len());
    }

    #[test]
    fn zero_configuration_reads_nothing() {
        let header = HeaderBuilder::new(3001).u32("configuration", 0);
        let (set, consumed) = decode(header, &[1, 2, 3]);
        assert!(set.unwrap().is_empty());
        assert_eq!(consumed, 0);
    }

    #[test]
    fn sparse_bits_skip_absent_channels() {
        let mut body = u16_channel(&[7]);
        body.extend(i32_channel(&[i32::MIN]));
        let header = HeaderBuilder::new(3001).u32("configuration", 0x12);
        let (set, _) = decode(header, &body);
        let set = set.unwrap();
        let labels: Vec<_> = set.labels().collect();
        assert_eq!(labels, ["lf_starboard", "sbp"]);
        assert_eq!(set.get("sbp").unwrap().get(0), Some(i64::from(i32::MIN)));
    }

    #[test]
    fn beams_use_one_based_labels() {
        let mut body = u16_channel(&[1]);
        body.extend(u16_channel(&[10, 10]));
        let header = HeaderBuilder::new(5001).u32("configuration", (1 << 0) | (1 << 9) | (1 << 12));
        let (set, consumed) = decode(header, &body);
        let set = set.unwrap();
        let labels: Vec<_> = set.labels().collect();
        assert_eq!(labels, ["beam_1", "beam_10"]);
        assert_eq!(consumed as usize, body.len());
    }

    #[test]
    fn uuv_bathy_reads_fixed_pair() {
        let mut body = Vec::new();
        for v in [1u32, 2, 3, 4, 5, 6] {
            body.extend_from_slice(&v.to_le_bytes());
        }
        let header = HeaderBuilder::new(3502)
            .u32("numSamples", 3)
            .u32("configuration", 0);
        let (set, consumed) = decode(header, &body);
        let set = set.unwrap();
        assert_eq!(set.get("port_hf").unwrap().as_u32(), Some(&[1u32, 2, 3][..]));
        assert_eq!(set.get("stbd_hf").unwrap().as_u32(), Some(&[4u32, 5, 6][..]));
        assert_eq!(consumed, 24);
    }

    #[test]
    fn versions_without_layout_read_nothing() {
        for version in [3501, 5002, 5004] {
            let header = HeaderBuilder::new(version).u32("configuration", 0xFF);
            let (set, consumed) = decode(header, &[0u8; 16]);
            assert!(set.unwrap().is_empty());
            assert_eq!(consumed, 0);
        }
    }

    #[test]
    fn truncated_array_names_channel() {
        let mut body = u16_channel(&[1, 2, 3]);
        body.extend_from_slice(&4u16.to_le_bytes());
        body.extend_from_slice(&[0, 0, 0]);
        let header = HeaderBuilder::new(3000).u32("configuration", 0x03);
        let (result, _) = decode(header, &body);
        match result.unwrap_err() {
            DecodeError::UnexpectedEndOfStream {
                context,
                needed,
                actual,
                ..
            } => {
                assert_eq!(context, "channel lf_starboard samples");
                assert_eq!(needed, 8);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_count_prefix_is_end_of_stream() {
        let header = HeaderBuilder::new(3000).u32("configuration", 0x01);
        let (result, _) = decode(header, &[9]);
        match result.unwrap_err() {
            DecodeError::UnexpectedEndOfStream { context, .. } => {
                assert_eq!(context, "channel lf_port sample count")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn samples_widen_for_comparison() {
        let samples = Samples::U32(vec![u32::MAX]);
        assert_eq!(samples.get(0), Some(i64::from(u32::MAX)));
        assert_eq!(samples.get(1), None);
        assert_eq!(samples.kind(), SampleKind::U32);
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    fn fixed_layout_count_beyond_address_space_is_impossible() {
        let header = HeaderBuilder::new(3502).u32("numSamples", 0x4000_0000);
        let (result, consumed) = decode(header, &[]);
        match result.unwrap_err() {
            DecodeError::ImpossibleSampleCount { channel, count, .. } => {
                assert_eq!(channel, "port_hf");
                assert_eq!(count, 0x4000_0000);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(consumed, 0);
    }
}
