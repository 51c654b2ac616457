//! Synthetic SDF byte builders for unit tests.

use super::header::FieldValue;
use super::layout::{
    self, FIXED_HEADER_FIELDS, FieldKind, FieldSpec, PING_MARKER_BYTES, RECORD_HEADER_LEN,
    V3_EXTENSION_FIELDS, V4_EXTENSION_FIELDS,
};

pub(crate) struct HeaderBuilder {
    values: Vec<(FieldSpec, FieldValue)>,
    version: u32,
}

impl HeaderBuilder {
    pub(crate) fn new(version: u32) -> Self {
        let values = FIXED_HEADER_FIELDS
            .iter()
            .chain(V3_EXTENSION_FIELDS.iter())
            .chain(V4_EXTENSION_FIELDS.iter())
            .map(|spec| {
                let value = match spec.kind {
                    FieldKind::U32 => FieldValue::U32(0),
                    FieldKind::F32 => FieldValue::F32(0.0),
                    FieldKind::F64 => FieldValue::F64(0.0),
                };
                (*spec, value)
            })
            .collect();
        Self { values, version }.u32(layout::PAGE_VERSION, version)
    }

    pub(crate) fn u32(self, name: &str, value: u32) -> Self {
        self.set(name, FieldValue::U32(value))
    }

    pub(crate) fn f32(self, name: &str, value: f32) -> Self {
        self.set(name, FieldValue::F32(value))
    }

    pub(crate) fn f64(self, name: &str, value: f64) -> Self {
        self.set(name, FieldValue::F64(value))
    }

    fn set(mut self, name: &str, value: FieldValue) -> Self {
        let slot = self
            .values
            .iter_mut()
            .find(|(spec, _)| spec.name == name)
            .unwrap_or_else(|| panic!("unknown header field {name}"));
        slot.1 = value;
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let fixed = FIXED_HEADER_FIELDS.len();
        let mut count = fixed;
        if self.version >= layout::V3_EXTENSION_MIN_VERSION {
            count += V3_EXTENSION_FIELDS.len();
        }
        if self.version >= layout::V4_EXTENSION_MIN_VERSION {
            count += V4_EXTENSION_FIELDS.len();
        }

        let mut out = Vec::new();
        for (_, value) in self.values.iter().take(count) {
            match value {
                FieldValue::U32(v) => out.extend_from_slice(&v.to_le_bytes()),
                FieldValue::F32(v) => out.extend_from_slice(&v.to_le_bytes()),
                FieldValue::F64(v) => out.extend_from_slice(&v.to_le_bytes()),
            }
        }
        out
    }
}

pub(crate) fn u16_channel(samples: &[u16]) -> Vec<u8> {
    let mut out = (samples.len() as u16).to_le_bytes().to_vec();
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}

pub(crate) fn i32_channel(samples: &[i32]) -> Vec<u8> {
    let mut out = (samples.len() as u16).to_le_bytes().to_vec();
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}

pub(crate) fn record(record_id: u32, payload: &[u8]) -> Vec<u8> {
    let size = RECORD_HEADER_LEN + payload.len() as u32;
    let mut out = Vec::new();
    out.extend_from_slice(&record_id.to_le_bytes());
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(payload);
    out
}

pub(crate) fn ping(header: &HeaderBuilder, body: &[u8]) -> Vec<u8> {
    let mut out = PING_MARKER_BYTES.to_vec();
    out.extend_from_slice(&header.build());
    out.extend_from_slice(body);
    out
}
