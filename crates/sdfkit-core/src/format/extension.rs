use std::io::Read;

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use super::error::DecodeError;
use super::layout::{
    EXTENSION_END_ID, RECORD_HEADER_LEN, SHIP_CONFIGURATION_ID, SHIP_CONFIGURATION_MIN_LEN,
};
use super::reader::SdfReader;
use crate::observer::DecodeObserver;

/// One self-describing record of a ping's extension block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionRecord {
    pub record_id: u32,
    /// Total size including the 16-byte record header.
    pub record_size: u32,
    pub header_version: u32,
    pub record_version: u32,
    pub payload: RecordPayload,
}

impl ExtensionRecord {
    pub fn is_end_marker(&self) -> bool {
        self.record_id == EXTENSION_END_ID
    }
}

/// Record payload, interpreted by record id.
///
/// Ids without a known layout keep their bytes untouched; the format keeps
/// gaining record types and an unknown id is not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum RecordPayload {
    ShipConfiguration(ShipConfiguration),
    Raw(Vec<u8>),
}

/// Ship configuration record (id 0x00000001).
///
/// Only the leading length and width are documented; the rest of the
/// payload is kept verbatim in `reserved`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipConfiguration {
    pub ship_length: f32,
    pub ship_width: f32,
    pub reserved: Vec<u8>,
}

/// Read extension records until `byte_budget` bytes are consumed or an end
/// record (id 0xEEEEEEEE) has been read. The end record is returned too.
///
/// # Errors
/// `TruncatedRecord` when fewer than 16 budget bytes remain for a record
/// header, when a record declares a size below 16 or beyond the remaining
/// budget, or when a ship configuration payload is too short.
/// `UnexpectedEndOfStream` when the stream ends inside a record.
///
/// # Examples
/// ```
/// use sdfkit_core::{NoopObserver, SdfReader, read_extension};
///
/// let mut bytes = Vec::new();
/// bytes.extend_from_slice(&0xEEEE_EEEEu32.to_le_bytes());
/// bytes.extend_from_slice(&16u32.to_le_bytes());
/// bytes.extend_from_slice(&[0u8; 8]);
///
/// let mut reader = SdfReader::new(&bytes[..]);
/// let records = read_extension(&mut reader, 64, &mut NoopObserver).unwrap();
/// assert_eq!(records.len(), 1);
/// assert!(records[0].is_end_marker());
/// ```
pub fn read_extension<R: Read>(
    reader: &mut SdfReader<R>,
    byte_budget: u32,
    observer: &mut dyn DecodeObserver,
) -> Result<Vec<ExtensionRecord>, DecodeError> {
    let budget = u64::from(byte_budget);
    let mut consumed = 0u64;
    let mut records = Vec::new();

    while consumed < budget {
        let offset = reader.offset();
        let remaining = budget - consumed;
        if remaining < u64::from(RECORD_HEADER_LEN) {
            return Err(DecodeError::TruncatedRecord {
                offset,
                reason: format!(
                    "{remaining} bytes left in extension block, record header needs {RECORD_HEADER_LEN}"
                ),
            });
        }

        let record_id = reader.read_u32("extension recordId")?;
        let record_size = reader.read_u32("extension recordSize")?;
        let header_version = reader.read_u32("extension headerVersion")?;
        let record_version = reader.read_u32("extension recordVersion")?;

        if record_size < RECORD_HEADER_LEN {
            return Err(DecodeError::TruncatedRecord {
                offset,
                reason: format!(
                    "record {record_id:#010x} declares size {record_size}, smaller than its {RECORD_HEADER_LEN}-byte header"
                ),
            });
        }
        if u64::from(record_size) > remaining {
            return Err(DecodeError::TruncatedRecord {
                offset,
                reason: format!(
                    "record {record_id:#010x} declares size {record_size}, only {remaining} bytes left in extension block"
                ),
            });
        }

        let payload_len = (record_size - RECORD_HEADER_LEN) as usize;
        let payload = read_payload(reader, record_id, payload_len, offset)?;
        observer.record(offset, record_id, record_size);
        consumed += u64::from(record_size);

        records.push(ExtensionRecord {
            record_id,
            record_size,
            header_version,
            record_version,
            payload,
        });
        if record_id == EXTENSION_END_ID {
            break;
        }
    }

    Ok(records)
}

fn read_payload<R: Read>(
    reader: &mut SdfReader<R>,
    record_id: u32,
    len: usize,
    record_offset: u64,
) -> Result<RecordPayload, DecodeError> {
    match record_id {
        SHIP_CONFIGURATION_ID => {
            if len < SHIP_CONFIGURATION_MIN_LEN {
                return Err(DecodeError::TruncatedRecord {
                    offset: record_offset,
                    reason: format!(
                        "ship configuration payload is {len} bytes, needs at least {SHIP_CONFIGURATION_MIN_LEN}"
                    ),
                });
            }
            let bytes = reader.read_vec(len, "ship configuration payload")?;
            Ok(RecordPayload::ShipConfiguration(ShipConfiguration {
                ship_length: LittleEndian::read_f32(&bytes[0..4]),
                ship_width: LittleEndian::read_f32(&bytes[4..8]),
                reserved: bytes[SHIP_CONFIGURATION_MIN_LEN..].to_vec(),
            }))
        }
        _ => {
            let bytes = reader.read_vec(len, &format!("record {record_id:#010x} payload"))?;
            Ok(RecordPayload::Raw(bytes))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordPayload, read_extension};
    use crate::format::error::DecodeError;
    use crate::format::fixtures::record;
    use crate::format::layout::{EXTENSION_END_ID, SHIP_CONFIGURATION_ID};
    use crate::format::reader::SdfReader;
    use crate::observer::NoopObserver;

    fn decode(bytes: &[u8], budget: u32) -> (Result<Vec<super::ExtensionRecord>, DecodeError>, u64) {
        let mut reader = SdfReader::new(bytes);
        let result = read_extension(&mut reader, budget, &mut NoopObserver);
        (result, reader.offset())
    }

    #[test]
    fn stops_at_end_marker_within_budget() {
        let mut bytes = record(0x42, &[]);
        bytes.extend(record(EXTENSION_END_ID, &[]));
        bytes.extend(record(0x43, &[]));

        let (records, consumed) = decode(&bytes, 32);
        let records = records.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].is_end_marker());
        assert_eq!(consumed, 32);
    }

    #[test]
    fn end_marker_stops_before_budget_is_spent() {
        let mut bytes = record(EXTENSION_END_ID, &[]);
        bytes.extend(record(0x43, &[1, 2, 3, 4]));

        let (records, consumed) = decode(&bytes, 200);
        assert_eq!(records.unwrap().len(), 1);
        assert_eq!(consumed, 16);
    }

    #[test]
    fn unknown_ids_keep_raw_payload() {
        let bytes = record(0x1234, &[9, 8, 7]);
        let (records, _) = decode(&bytes, 19);
        let records = records.unwrap();
        assert_eq!(records[0].record_size, 19);
        assert_eq!(records[0].header_version, 1);
        assert_eq!(records[0].record_version, 2);
        assert_eq!(records[0].payload, RecordPayload::Raw(vec![9, 8, 7]));
    }

    #[test]
    fn ship_configuration_decodes_dimensions() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&12.5f32.to_le_bytes());
        payload.extend_from_slice(&4.25f32.to_le_bytes());
        payload.extend_from_slice(&[0xAA, 0xBB]);
        let bytes = record(SHIP_CONFIGURATION_ID, &payload);

        let (records, consumed) = decode(&bytes, bytes.len() as u32);
        let records = records.unwrap();
        match &records[0].payload {
            RecordPayload::ShipConfiguration(ship) => {
                assert_eq!(ship.ship_length, 12.5);
                assert_eq!(ship.ship_width, 4.25);
                assert_eq!(ship.reserved, vec![0xAA, 0xBB]);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
        assert_eq!(consumed as usize, bytes.len());
    }

    #[test]
    fn short_ship_configuration_is_truncated() {
        let bytes = record(SHIP_CONFIGURATION_ID, &[0; 4]);
        let (result, _) = decode(&bytes, 20);
        assert!(matches!(
            result.unwrap_err(),
            DecodeError::TruncatedRecord { .. }
        ));
    }

    #[test]
    fn size_below_header_is_truncated() {
        let mut bytes = record(0x42, &[]);
        bytes[4..8].copy_from_slice(&8u32.to_le_bytes());
        let (result, _) = decode(&bytes, 64);
        match result.unwrap_err() {
            DecodeError::TruncatedRecord { offset, reason } => {
                assert_eq!(offset, 0);
                assert!(reason.contains("declares size 8"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn size_beyond_budget_is_truncated() {
        let bytes = record(0x42, &[0; 16]);
        let (result, _) = decode(&bytes, 24);
        assert!(matches!(
            result.unwrap_err(),
            DecodeError::TruncatedRecord { .. }
        ));
    }

    #[test]
    fn leftover_budget_below_header_is_truncated() {
        let mut bytes = record(0x42, &[]);
        bytes.extend_from_slice(&[0; 8]);
        let (result, _) = decode(&bytes, 24);
        match result.unwrap_err() {
            DecodeError::TruncatedRecord { offset, .. } => assert_eq!(offset, 16),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn stream_ending_inside_payload_is_end_of_stream() {
        let bytes = record(0x42, &[1, 2, 3, 4]);
        let (result, _) = decode(&bytes[..18], 20);
        assert!(matches!(
            result.unwrap_err(),
            DecodeError::UnexpectedEndOfStream { needed: 4, actual: 2, .. }
        ));
    }

    #[test]
    fn zero_budget_reads_nothing() {
        let (records, consumed) = decode(&[1, 2, 3], 0);
        assert!(records.unwrap().is_empty());
        assert_eq!(consumed, 0);
    }
}
