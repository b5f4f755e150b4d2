//! Display topology snapshot model
//!
//! A snapshot holds every display path and mode the platform reported at one
//! point in time. Each mode carries its own optional monitor identity, so there
//! is no positional coupling between modes and identities in memory.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod document;
mod printable;

#[cfg(test)]
pub(crate) mod fixtures;

pub use document::{DocumentError, SnapshotDocument};
pub use printable::printable_representation;

/// Two-part adapter identifier (platform LUID)
/// `high` is stable, `low` is re-enumerated across reboots and docking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AdapterId {
    pub low: u32,
    pub high: i32,
}

impl AdapterId {
    #[cfg(any(test, windows))]
    pub const fn new(high: i32, low: u32) -> Self {
        Self { low, high }
    }

    /// Same adapter id with the volatile part replaced
    pub const fn with_low(self, low: u32) -> Self {
        Self { low, high: self.high }
    }
}

impl fmt::Display for AdapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}:{:08X}", self.high, self.low)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

impl Rational {
    #[cfg(any(test, windows))]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self { numerator, denominator }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Region {
    pub cx: u32,
    pub cy: u32,
}

/// Source end of a path (a GPU output surface)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSource {
    pub adapter_id: AdapterId,
    pub id: u32,
    /// Index into the snapshot's modes, absent for inactive paths
    pub mode_index: Option<u32>,
    pub status_flags: u32,
}

/// Target end of a path (a physical monitor output)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathTarget {
    pub adapter_id: AdapterId,
    pub id: u32,
    pub mode_index: Option<u32>,
    pub output_technology: u32,
    pub rotation: u32,
    pub scaling: u32,
    pub refresh_rate: Rational,
    pub scan_line_ordering: u32,
    /// Whether the physical output currently exists
    pub target_available: bool,
    pub status_flags: u32,
}

/// One source → target connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPath {
    pub source: PathSource,
    pub target: PathTarget,
    pub flags: u32,
}

impl DisplayPath {
    /// `(source.id, target.id)`, the key that survives adapter re-enumeration
    pub fn id_pair(&self) -> (u32, u32) {
        (self.source.id, self.target.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceMode {
    pub width: u32,
    pub height: u32,
    pub pixel_format: u32,
    pub position: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TargetMode {
    pub pixel_rate: u64,
    pub h_sync_freq: Rational,
    pub v_sync_freq: Rational,
    pub active_size: Region,
    pub total_size: Region,
    pub video_standard: u32,
    pub scan_line_ordering: u32,
}

/// Mode payload, discriminated by the platform's info type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ModeInfo {
    Source(SourceMode),
    Target(TargetMode),
    /// Filler slot the platform left zeroed
    Uninitialized,
}

/// Platform discriminant values for [`ModeInfo`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeInfoType {
    Zero = 0,
    Source = 1,
    Target = 2,
}

/// Monitor identity resolved from the target's EDID
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonitorIdentity {
    pub manufacturer_id: u16,
    pub product_code_id: u16,
    pub valid: bool,
    #[serde(default, with = "document::encoded_text")]
    pub friendly_name: Option<String>,
    #[serde(default, with = "document::encoded_text")]
    pub device_path: Option<String>,
}

impl MonitorIdentity {
    /// Placeholder recorded when the identity lookup failed
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Friendly name usable for matching (valid and non-empty)
    pub fn matchable_name(&self) -> Option<&str> {
        if !self.valid {
            return None;
        }
        self.friendly_name.as_deref().filter(|name| !name.is_empty())
    }
}

/// One display mode with the identity of the monitor it drives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayMode {
    pub adapter_id: AdapterId,
    pub id: u32,
    pub info: ModeInfo,
    /// Only ever set on target modes
    pub identity: Option<MonitorIdentity>,
}

impl DisplayMode {
    #[cfg(test)]
    pub fn source(adapter_id: AdapterId, id: u32, mode: SourceMode) -> Self {
        Self {
            adapter_id,
            id,
            info: ModeInfo::Source(mode),
            identity: None,
        }
    }

    #[cfg(test)]
    pub fn target(adapter_id: AdapterId, id: u32, mode: TargetMode) -> Self {
        Self {
            adapter_id,
            id,
            info: ModeInfo::Target(mode),
            identity: None,
        }
    }

    pub fn info_type(&self) -> ModeInfoType {
        match self.info {
            ModeInfo::Source(_) => ModeInfoType::Source,
            ModeInfo::Target(_) => ModeInfoType::Target,
            ModeInfo::Uninitialized => ModeInfoType::Zero,
        }
    }

    pub fn is_target(&self) -> bool {
        self.info_type() == ModeInfoType::Target
    }

    pub fn is_source(&self) -> bool {
        self.info_type() == ModeInfoType::Source
    }

    /// Identity only if the lookup succeeded
    pub fn valid_identity(&self) -> Option<&MonitorIdentity> {
        self.identity.as_ref().filter(|identity| identity.valid)
    }

    /// Copy of this mode as the platform sees it (no identity attached)
    pub fn without_identity(&self) -> Self {
        Self {
            identity: None,
            ..self.clone()
        }
    }
}

/// Full captured display topology
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TopologySnapshot {
    pub paths: Vec<DisplayPath>,
    pub modes: Vec<DisplayMode>,
}

impl TopologySnapshot {
    pub fn new(paths: Vec<DisplayPath>, modes: Vec<DisplayMode>) -> Self {
        Self { paths, modes }
    }

    /// An empty topology is valid but can never be applied
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() || self.modes.is_empty()
    }

    /// First path with the given `(source.id, target.id)` pair
    pub fn find_path(&self, source_id: u32, target_id: u32) -> Option<&DisplayPath> {
        self.paths
            .iter()
            .find(|path| path.id_pair() == (source_id, target_id))
    }

    pub fn has_valid_identity(&self) -> bool {
        self.modes.iter().any(|mode| mode.valid_identity().is_some())
    }

    /// Paths and modes stripped of identities, as submitted to the platform
    pub fn platform_view(&self) -> (Vec<DisplayPath>, Vec<DisplayMode>) {
        let modes = self.modes.iter().map(DisplayMode::without_identity).collect();
        (self.paths.clone(), modes)
    }
}
