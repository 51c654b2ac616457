//! Wire layout of an SDF ping: markers, header field table and record sizes.
//!
//! Everything here is the source of truth for byte widths and ordering; the
//! decoders never hard-code offsets of their own.

/// Marker preceding every ping, little-endian.
pub const PING_MARKER: u32 = 0xFFFF_FFFF;
pub const PING_MARKER_BYTES: [u8; MARKER_LEN] = PING_MARKER.to_le_bytes();
pub const MARKER_LEN: usize = 4;

/// Record id that terminates an extension block.
pub const EXTENSION_END_ID: u32 = 0xEEEE_EEEE;
/// Record id of the ship configuration record.
pub const SHIP_CONFIGURATION_ID: u32 = 0x0000_0001;
/// recordId, recordSize, headerVersion, recordVersion.
pub const RECORD_HEADER_LEN: u32 = 16;
/// shipLength + shipWidth.
pub const SHIP_CONFIGURATION_MIN_LEN: usize = 8;

pub const NUMBER_BYTES: &str = "numberBytes";
pub const PAGE_VERSION: &str = "pageVersion";
pub const CONFIGURATION: &str = "configuration";
pub const PING_NUMBER: &str = "pingNumber";
pub const NUM_SAMPLES: &str = "numSamples";
pub const RANGE: &str = "range";
pub const SPEED_SOUND: &str = "speedSound";
pub const TX_WAVEFORM: &str = "txWaveform";
pub const YEAR: &str = "year";
pub const MONTH: &str = "month";
pub const DAY: &str = "day";
pub const HOUR: &str = "hour";
pub const MINUTE: &str = "minute";
pub const SECOND: &str = "second";
pub const HUNDREDTHS: &str = "hSecond";
pub const TVG_PAGE: &str = "tvgPage";
pub const HEADER_SIZE: &str = "headerSize";
pub const SDF_EXTENSION_SIZE: &str = "sdfExtensionSize";

/// Numeric encoding of a header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U32,
    F32,
    F64,
}

impl FieldKind {
    pub const fn width(self) -> usize {
        match self {
            FieldKind::U32 | FieldKind::F32 => 4,
            FieldKind::F64 => 8,
        }
    }
}

/// One entry of the header table: name, encoding and wire width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub width: usize,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            width: kind.width(),
        }
    }
}

const fn u32_field(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::U32)
}

const fn f32_field(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::F32)
}

const fn f64_field(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::F64)
}

/// Fixed header fields in wire order. Reordering breaks the format.
pub const FIXED_HEADER_FIELDS: [FieldSpec; 40] = [
    u32_field(NUMBER_BYTES),
    u32_field(PAGE_VERSION),
    u32_field(CONFIGURATION),
    u32_field(PING_NUMBER),
    u32_field(NUM_SAMPLES),
    u32_field("beamsToDisplay"),
    u32_field("errorFlags"),
    u32_field(RANGE),
    u32_field("speedFish"),
    u32_field(SPEED_SOUND),
    u32_field("resMode"),
    u32_field(TX_WAVEFORM),
    u32_field("respDiv"),
    u32_field("respFreq"),
    u32_field("manualSpeedSwitch"),
    u32_field("despeckleSwitch"),
    u32_field("speedFilterSwitch"),
    u32_field(YEAR),
    u32_field(MONTH),
    u32_field(DAY),
    u32_field(HOUR),
    u32_field(MINUTE),
    u32_field(SECOND),
    u32_field(HUNDREDTHS),
    u32_field("fixTimeHour"),
    u32_field("fixTimeMinute"),
    f32_field("fixTimeSecond"),
    f32_field("heading"),
    f32_field("pitch"),
    f32_field("roll"),
    f32_field("depth"),
    f32_field("altitude"),
    f32_field("temperature"),
    f32_field("speed"),
    f32_field("shipHeading"),
    f32_field("magneticVariation"),
    f64_field("shipLat"),
    f64_field("shipLon"),
    f64_field("fishLat"),
    f64_field("fishLon"),
];

/// Fields appended for page versions >= 3000.
pub const V3_EXTENSION_FIELDS: [FieldSpec; 2] = [u32_field(TVG_PAGE), u32_field(HEADER_SIZE)];
/// Field appended for page versions >= 3001.
pub const V4_EXTENSION_FIELDS: [FieldSpec; 1] = [u32_field(SDF_EXTENSION_SIZE)];

pub const V3_EXTENSION_MIN_VERSION: u32 = 3000;
pub const V4_EXTENSION_MIN_VERSION: u32 = 3001;

pub const FIXED_HEADER_LEN: usize = table_len(&FIXED_HEADER_FIELDS);
pub const V3_EXTENSION_LEN: usize = table_len(&V3_EXTENSION_FIELDS);
pub const V4_EXTENSION_LEN: usize = table_len(&V4_EXTENSION_FIELDS);

const fn table_len(fields: &[FieldSpec]) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < fields.len() {
        total += fields[i].width;
        i += 1;
    }
    total
}
