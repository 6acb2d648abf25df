//! Protocol version negotiation values.

use std::fmt;
use std::str::FromStr;

use crate::error::{CqlError, Result};

/// A CQL native protocol revision.
///
/// The version decides how collection lengths are framed and which value
/// features (unset markers, durations) may be put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProtocolVersion {
    V1 = 0x01,
    V2 = 0x02,
    V3 = 0x03,
    V4 = 0x04,
    /// Beta in most server releases.
    V5 = 0x05,
    DseV1 = 0x41,
    DseV2 = 0x42,
}

impl ProtocolVersion {
    /// Resolves a version from its header byte.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0x01 => Ok(ProtocolVersion::V1),
            0x02 => Ok(ProtocolVersion::V2),
            0x03 => Ok(ProtocolVersion::V3),
            0x04 => Ok(ProtocolVersion::V4),
            0x05 => Ok(ProtocolVersion::V5),
            0x41 => Ok(ProtocolVersion::DseV1),
            0x42 => Ok(ProtocolVersion::DseV2),
            other => Err(CqlError::Configuration(format!(
                "unknown protocol version: 0x{:02x}",
                other
            ))),
        }
    }

    /// Returns the header byte of this version.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// The highest non-beta version this crate speaks.
    pub fn max_supported() -> Self {
        ProtocolVersion::DseV2
    }

    /// Position in the feature ordering. DSE versions build on V4.
    pub fn feature_rank(self) -> u8 {
        match self {
            ProtocolVersion::V1 => 1,
            ProtocolVersion::V2 => 2,
            ProtocolVersion::V3 => 3,
            ProtocolVersion::V4 => 4,
            ProtocolVersion::DseV1 => 5,
            ProtocolVersion::DseV2 => 6,
            ProtocolVersion::V5 => 7,
        }
    }

    /// Whether collection counts and item lengths are 4 bytes wide (V3+).
    pub fn uses_int32_collection_length(self) -> bool {
        self.feature_rank() >= 3
    }

    /// Collection length prefix width in bytes.
    pub fn collection_length_size(self) -> usize {
        if self.uses_int32_collection_length() {
            4
        } else {
            2
        }
    }

    /// Whether bound values may be left unset (V4+).
    pub fn supports_unset(self) -> bool {
        self.feature_rank() >= 4
    }

    /// Whether duration values may be sent (V4+).
    pub fn supports_duration(self) -> bool {
        self.feature_rank() >= 4
    }

    pub fn is_beta(self) -> bool {
        self == ProtocolVersion::V5
    }

    pub fn is_dse(self) -> bool {
        matches!(self, ProtocolVersion::DseV1 | ProtocolVersion::DseV2)
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        ProtocolVersion::V4
    }
}

impl FromStr for ProtocolVersion {
    type Err = CqlError;

    /// Accepts the display names (`V4`, `DSE_V1`) and plain numbers (`4`).
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "DSE_V1" | "DSEV1" => return Ok(ProtocolVersion::DseV1),
            "DSE_V2" | "DSEV2" => return Ok(ProtocolVersion::DseV2),
            _ => {}
        }
        let digits = trimmed
            .strip_prefix('V')
            .or_else(|| trimmed.strip_prefix('v'))
            .unwrap_or(trimmed);
        let code = digits
            .parse::<u8>()
            .map_err(|_| CqlError::Configuration(format!("unknown protocol version: {}", s)))?;
        Self::from_code(code)
    }
}

impl PartialOrd for ProtocolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProtocolVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.feature_rank().cmp(&other.feature_rank())
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVersion::DseV1 => write!(f, "DSE_V1"),
            ProtocolVersion::DseV2 => write!(f, "DSE_V2"),
            other => write!(f, "V{}", other.code()),
        }
    }
}
