#![allow(dead_code)]

use sdfkit_core::layout::{
    self, FIXED_HEADER_FIELDS, FieldKind, FieldSpec, V3_EXTENSION_FIELDS, V4_EXTENSION_FIELDS,
};

/// Synthetic ping byte builder driven by the public field tables.
pub struct PingBytes {
    version: u32,
    values: Vec<(FieldSpec, f64)>,
    body: Vec<u8>,
}

impl PingBytes {
    pub fn new(version: u32) -> Self {
        let values = FIXED_HEADER_FIELDS
            .iter()
            .chain(V3_EXTENSION_FIELDS.iter())
            .chain(V4_EXTENSION_FIELDS.iter())
            .map(|spec| (*spec, 0.0))
            .collect();
        Self {
            version,
            values,
            body: Vec::new(),
        }
        .field(layout::PAGE_VERSION, f64::from(version))
    }

    /// Set a header field; the value is encoded with the field's wire kind.
    pub fn field(mut self, name: &str, value: f64) -> Self {
        let slot = self
            .values
            .iter_mut()
            .find(|(spec, _)| spec.name == name)
            .unwrap_or_else(|| panic!("unknown header field {name}"));
        slot.1 = value;
        self
    }

    pub fn u16_channel(mut self, samples: &[u16]) -> Self {
        self.body
            .extend_from_slice(&(samples.len() as u16).to_le_bytes());
        for s in samples {
            self.body.extend_from_slice(&s.to_le_bytes());
        }
        self
    }

    pub fn i32_channel(mut self, samples: &[i32]) -> Self {
        self.body
            .extend_from_slice(&(samples.len() as u16).to_le_bytes());
        for s in samples {
            self.body.extend_from_slice(&s.to_le_bytes());
        }
        self
    }

    /// Bare u32 samples, as used by fixed channel layouts.
    pub fn u32_samples(mut self, samples: &[u32]) -> Self {
        for s in samples {
            self.body.extend_from_slice(&s.to_le_bytes());
        }
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    pub fn header_bytes(&self) -> Vec<u8> {
        let mut count = FIXED_HEADER_FIELDS.len();
        if self.version >= layout::V3_EXTENSION_MIN_VERSION {
            count += V3_EXTENSION_FIELDS.len();
        }
        if self.version >= layout::V4_EXTENSION_MIN_VERSION {
            count += V4_EXTENSION_FIELDS.len();
        }

        let mut out = Vec::new();
        for (spec, value) in self.values.iter().take(count) {
            match spec.kind {
                FieldKind::U32 => out.extend_from_slice(&(*value as u32).to_le_bytes()),
                FieldKind::F32 => out.extend_from_slice(&(*value as f32).to_le_bytes()),
                FieldKind::F64 => out.extend_from_slice(&value.to_le_bytes()),
            }
        }
        out
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = layout::PING_MARKER_BYTES.to_vec();
        out.extend(self.header_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}

pub fn record(record_id: u32, payload: &[u8]) -> Vec<u8> {
    let size = layout::RECORD_HEADER_LEN + payload.len() as u32;
    let mut out = Vec::new();
    out.extend_from_slice(&record_id.to_le_bytes());
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(payload);
    out
}

pub fn stream(pings: &[PingBytes]) -> Vec<u8> {
    pings.iter().flat_map(PingBytes::build).collect()
}
