use std::io::Read;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use time::{Date, Month, PrimitiveDateTime, Time};

use super::error::DecodeError;
use super::layout::{self, FIXED_HEADER_FIELDS, V3_EXTENSION_FIELDS, V4_EXTENSION_FIELDS};
use super::reader::SdfReader;
use super::version::{HeaderExtensions, PageVersion};
use crate::observer::DecodeObserver;

/// Value of one header field as it appeared on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    U32(u32),
    F32(f32),
    F64(f64),
}

impl FieldValue {
    pub fn as_u32(self) -> Option<u32> {
        match self {
            FieldValue::U32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(self) -> Option<f32> {
        match self {
            FieldValue::F32(v) => Some(v),
            _ => None,
        }
    }

    /// Any field widened to f64.
    pub fn as_f64(self) -> f64 {
        match self {
            FieldValue::U32(v) => f64::from(v),
            FieldValue::F32(v) => f64::from(v),
            FieldValue::F64(v) => v,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::U32(v) => write!(f, "{v}"),
            FieldValue::F32(v) => write!(f, "{v}"),
            FieldValue::F64(v) => write!(f, "{v}"),
        }
    }
}

/// Decoded ping header: field names mapped to values in wire order.
///
/// Only [`read_header`] builds a `Header`, so the fixed fields and the
/// extension fields gated by the page version are always present.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    fields: Vec<(&'static str, FieldValue)>,
    version: PageVersion,
}

impl Header {
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| *value)
    }

    pub fn get_u32(&self, name: &str) -> Option<u32> {
        self.get(name).and_then(FieldValue::as_u32)
    }

    /// Fields in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, FieldValue)> + '_ {
        self.fields.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn page_version(&self) -> PageVersion {
        self.version
    }

    pub fn configuration(&self) -> u32 {
        self.fixed_u32(layout::CONFIGURATION)
    }

    pub fn ping_number(&self) -> u32 {
        self.fixed_u32(layout::PING_NUMBER)
    }

    pub fn num_samples(&self) -> u32 {
        self.fixed_u32(layout::NUM_SAMPLES)
    }

    /// Declared size of the extension block; absent before version 3001.
    pub fn sdf_extension_size(&self) -> Option<u32> {
        self.get_u32(layout::SDF_EXTENSION_SIZE)
    }

    pub fn tx_waveform(&self) -> TxWaveform {
        TxWaveform::from_bits(self.fixed_u32(layout::TX_WAVEFORM))
    }

    /// Ping time from the year..hundredths fields, or `None` when they do
    /// not form a valid calendar date and time.
    pub fn timestamp(&self) -> Option<PrimitiveDateTime> {
        let year = i32::try_from(self.fixed_u32(layout::YEAR)).ok()?;
        let month = Month::try_from(u8::try_from(self.fixed_u32(layout::MONTH)).ok()?).ok()?;
        let day = u8::try_from(self.fixed_u32(layout::DAY)).ok()?;
        let date = Date::from_calendar_date(year, month, day).ok()?;

        let hour = u8::try_from(self.fixed_u32(layout::HOUR)).ok()?;
        let minute = u8::try_from(self.fixed_u32(layout::MINUTE)).ok()?;
        let second = u8::try_from(self.fixed_u32(layout::SECOND)).ok()?;
        let millis = u16::try_from(self.fixed_u32(layout::HUNDREDTHS))
            .ok()?
            .checked_mul(10)?;
        let time = Time::from_hms_milli(hour, minute, second, millis).ok()?;

        Some(PrimitiveDateTime::new(date, time))
    }

    fn fixed_u32(&self, name: &str) -> u32 {
        self.get_u32(name).unwrap_or_default()
    }
}

impl Serialize for Header {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Transmit waveform selection packed into the `txWaveform` field.
///
/// # Examples
/// ```
/// use sdfkit_core::TxWaveform;
///
/// let tx = TxWaveform::from_bits(0x8283);
/// assert_eq!(tx.lf_waveform, 3);
/// assert!(tx.lf_enabled);
/// assert_eq!(tx.hf_waveform, 2);
/// assert!(tx.hf_enabled);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxWaveform {
    pub lf_waveform: u8,
    pub hf_waveform: u8,
    pub lf_enabled: bool,
    pub hf_enabled: bool,
}

impl TxWaveform {
    pub fn from_bits(bits: u32) -> Self {
        Self {
            lf_waveform: (bits & 0x0F) as u8,
            hf_waveform: ((bits >> 8) & 0x0F) as u8,
            lf_enabled: bits & 0x80 != 0,
            hf_enabled: bits & 0x8000 != 0,
        }
    }
}

/// Read the fixed header, validate the page version and read the
/// version-gated extension fields.
///
/// Consumes `FIXED_HEADER_LEN` bytes plus the extension length of the
/// decoded version. On `InvalidPageVersion` the stream is left just past
/// the fixed fields.
///
/// # Errors
/// `UnexpectedEndOfStream` on a short stream, `InvalidPageVersion` when
/// `pageVersion` is not an accepted version.
pub fn read_header<R: Read>(
    reader: &mut SdfReader<R>,
    observer: &mut dyn DecodeObserver,
) -> Result<Header, DecodeError> {
    let mut fields = Vec::with_capacity(
        FIXED_HEADER_FIELDS.len() + V3_EXTENSION_FIELDS.len() + V4_EXTENSION_FIELDS.len(),
    );
    let mut version_field = None;

    for spec in &FIXED_HEADER_FIELDS {
        let offset = reader.offset();
        let value = reader.read_field(spec)?;
        observer.field(offset, spec.name, value);
        if spec.name == layout::PAGE_VERSION {
            version_field = value.as_u32().map(|code| (offset, code));
        }
        fields.push((spec.name, value));
    }

    let (offset, code) = version_field.ok_or_else(|| DecodeError::MalformedField {
        offset: reader.offset(),
        field: layout::PAGE_VERSION.to_string(),
        reason: "header table has no u32 page version".to_string(),
    })?;
    let version = PageVersion::from_code(code)
        .ok_or(DecodeError::InvalidPageVersion { offset, value: code })?;

    let extensions = HeaderExtensions::for_code(code);
    let gated = V3_EXTENSION_FIELDS
        .iter()
        .filter(|_| extensions.tvg_page)
        .chain(
            V4_EXTENSION_FIELDS
                .iter()
                .filter(|_| extensions.sdf_extension_size),
        );
    for spec in gated {
        let offset = reader.offset();
        let value = reader.read_field(spec)?;
        observer.field(offset, spec.name, value);
        fields.push((spec.name, value));
    }

    Ok(Header { fields, version })
}
