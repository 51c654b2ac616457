//! Page version dispatch.
//!
//! All version-dependent behaviour of the format is captured in
//! [`VERSION_TABLE`]: which header extension fields follow the fixed header
//! and how channel data is laid out. Supporting a new sonar model means
//! adding one row here.

use serde::{Deserialize, Serialize};

use super::layout::{
    V3_EXTENSION_LEN, V3_EXTENSION_MIN_VERSION, V4_EXTENSION_LEN, V4_EXTENSION_MIN_VERSION,
};

/// Accepted SDF page versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum PageVersion {
    System3000 = 3000,
    System3000V4 = 3001,
    Uuv3500Lf = 3501,
    Uuv3500Hf = 3502,
    System5000 = 5000,
    System5000V4 = 5001,
    System5000Bathy = 5002,
    System5000V2Bathy = 5004,
}

impl PageVersion {
    pub const ALL: [PageVersion; 8] = [
        PageVersion::System3000,
        PageVersion::System3000V4,
        PageVersion::Uuv3500Lf,
        PageVersion::Uuv3500Hf,
        PageVersion::System5000,
        PageVersion::System5000V4,
        PageVersion::System5000Bathy,
        PageVersion::System5000V2Bathy,
    ];

    /// Map a raw header value onto the enumeration.
    ///
    /// # Examples
    /// ```
    /// use sdfkit_core::PageVersion;
    ///
    /// assert_eq!(PageVersion::from_code(3502), Some(PageVersion::Uuv3500Hf));
    /// assert_eq!(PageVersion::from_code(3003), None);
    /// ```
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.code() == code)
    }

    pub const fn code(self) -> u32 {
        self as u32
    }

    pub const fn name(self) -> &'static str {
        match self {
            PageVersion::System3000 => "System 3000",
            PageVersion::System3000V4 => "System 3000 V4",
            PageVersion::Uuv3500Lf => "UUV 3500 LF",
            PageVersion::Uuv3500Hf => "UUV 3500 HF",
            PageVersion::System5000 => "System 5000",
            PageVersion::System5000V4 => "System 5000 V4",
            PageVersion::System5000Bathy => "System 5000 bathy",
            PageVersion::System5000V2Bathy => "System 5000 V2 bathy",
        }
    }

    /// Dispatch row for this version.
    pub fn layout(self) -> &'static VersionLayout {
        let index = match self {
            PageVersion::System3000 => 0,
            PageVersion::System3000V4 => 1,
            PageVersion::Uuv3500Lf => 2,
            PageVersion::Uuv3500Hf => 3,
            PageVersion::System5000 => 4,
            PageVersion::System5000V4 => 5,
            PageVersion::System5000Bathy => 6,
            PageVersion::System5000V2Bathy => 7,
        };
        &VERSION_TABLE[index]
    }
}

impl From<PageVersion> for u32 {
    fn from(value: PageVersion) -> Self {
        value.code()
    }
}

impl TryFrom<u32> for PageVersion {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_code(value).ok_or_else(|| format!("unknown page version {value}"))
    }
}

impl std::fmt::Display for PageVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code(), self.name())
    }
}

/// Which optional fields follow the fixed header.
///
/// Gating compares the raw version number, so any accepted version at or
/// above a threshold gets the field, including ones added later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderExtensions {
    /// `tvgPage` and `headerSize`.
    pub tvg_page: bool,
    /// `sdfExtensionSize`.
    pub sdf_extension_size: bool,
}

impl HeaderExtensions {
    pub const fn for_code(code: u32) -> Self {
        Self {
            tvg_page: code >= V3_EXTENSION_MIN_VERSION,
            sdf_extension_size: code >= V4_EXTENSION_MIN_VERSION,
        }
    }

    /// Bytes occupied by the extension fields.
    pub const fn len(self) -> usize {
        let mut total = 0;
        if self.tvg_page {
            total += V3_EXTENSION_LEN;
        }
        if self.sdf_extension_size {
            total += V4_EXTENSION_LEN;
        }
        total
    }

    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }
}

/// Element type of a channel array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    U16,
    I32,
    U32,
}

impl SampleKind {
    pub const fn width(self) -> usize {
        match self {
            SampleKind::U16 => 2,
            SampleKind::I32 | SampleKind::U32 => 4,
        }
    }
}

/// A channel present when `mask` is set in `configuration`; the array is
/// prefixed with its own u16 sample count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelBit {
    pub mask: u32,
    pub label: &'static str,
    pub element: SampleKind,
}

/// A channel that is always present and holds exactly `numSamples`
/// elements with no count prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedChannel {
    pub label: &'static str,
    pub element: SampleKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    /// No channel data follows the header.
    None,
    BitTable(&'static [ChannelBit]),
    Fixed(&'static [FixedChannel]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionLayout {
    pub version: PageVersion,
    pub extensions: HeaderExtensions,
    pub channels: ChannelLayout,
}

impl VersionLayout {
    /// Whether this version's channel data is understood.
    pub fn has_channel_layout(&self) -> bool {
        !matches!(self.channels, ChannelLayout::None)
    }
}

const fn bit(mask: u32, label: &'static str, element: SampleKind) -> ChannelBit {
    ChannelBit {
        mask,
        label,
        element,
    }
}

pub const SIDESCAN_CHANNELS: [ChannelBit; 5] = [
    bit(0x01, "lf_port", SampleKind::U16),
    bit(0x02, "lf_starboard", SampleKind::U16),
    bit(0x04, "hf_port", SampleKind::U16),
    bit(0x08, "hf_starboard", SampleKind::U16),
    bit(0x10, "sbp", SampleKind::I32),
];

pub const BEAM_CHANNELS: [ChannelBit; 10] = [
    bit(1 << 0, "beam_1", SampleKind::U16),
    bit(1 << 1, "beam_2", SampleKind::U16),
    bit(1 << 2, "beam_3", SampleKind::U16),
    bit(1 << 3, "beam_4", SampleKind::U16),
    bit(1 << 4, "beam_5", SampleKind::U16),
    bit(1 << 5, "beam_6", SampleKind::U16),
    bit(1 << 6, "beam_7", SampleKind::U16),
    bit(1 << 7, "beam_8", SampleKind::U16),
    bit(1 << 8, "beam_9", SampleKind::U16),
    bit(1 << 9, "beam_10", SampleKind::U16),
];

pub const UUV_BATHY_CHANNELS: [FixedChannel; 2] = [
    FixedChannel {
        label: "port_hf",
        element: SampleKind::U32,
    },
    FixedChannel {
        label: "stbd_hf",
        element: SampleKind::U32,
    },
];

const fn row(version: PageVersion, channels: ChannelLayout) -> VersionLayout {
    VersionLayout {
        version,
        extensions: HeaderExtensions::for_code(version as u32),
        channels,
    }
}

pub const VERSION_TABLE: [VersionLayout; 8] = [
    row(
        PageVersion::System3000,
        ChannelLayout::BitTable(&SIDESCAN_CHANNELS),
    ),
    row(
        PageVersion::System3000V4,
        ChannelLayout::BitTable(&SIDESCAN_CHANNELS),
    ),
    row(PageVersion::Uuv3500Lf, ChannelLayout::None),
    row(
        PageVersion::Uuv3500Hf,
        ChannelLayout::Fixed(&UUV_BATHY_CHANNELS),
    ),
    row(
        PageVersion::System5000,
        ChannelLayout::BitTable(&BEAM_CHANNELS),
    ),
    row(
        PageVersion::System5000V4,
        ChannelLayout::BitTable(&BEAM_CHANNELS),
    ),
    row(PageVersion::System5000Bathy, ChannelLayout::None),
    row(PageVersion::System5000V2Bathy, ChannelLayout::None),
];
