//! Display configuration primitives
//!
//! The engine only talks to the operating system through [`DisplayConfigApi`].
//! On Windows this is the CCD API; elsewhere every call reports
//! [`StatusCode::NotSupported`].

use thiserror::Error;

use crate::constants::{ccd, status};
use crate::topology::{AdapterId, DisplayMode, DisplayPath, MonitorIdentity};

#[cfg(windows)]
mod ccd_api;
#[cfg(not(windows))]
mod unsupported;

#[cfg(test)]
pub(crate) mod fake;

#[cfg(windows)]
pub use ccd_api::CcdApi as NativeApi;
#[cfg(not(windows))]
pub use unsupported::Unsupported as NativeApi;

/// Non-zero status returned by a platform primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatusCode {
    #[error("invalid parameter ({})", status::INVALID_PARAMETER)]
    InvalidParameter,
    #[error("not supported ({})", status::NOT_SUPPORTED)]
    NotSupported,
    #[error("access denied ({})", status::ACCESS_DENIED)]
    AccessDenied,
    #[error("general failure ({})", status::GEN_FAILURE)]
    GenFailure,
    #[error("bad configuration ({})", status::BAD_CONFIGURATION)]
    BadConfiguration,
    #[error("insufficient buffer ({})", status::INSUFFICIENT_BUFFER)]
    InsufficientBuffer,
    #[error("platform status {0}")]
    Other(u32),
}

impl StatusCode {
    #[cfg(any(test, windows))]
    pub fn from_raw(code: u32) -> Self {
        match code {
            status::INVALID_PARAMETER => Self::InvalidParameter,
            status::NOT_SUPPORTED => Self::NotSupported,
            status::ACCESS_DENIED => Self::AccessDenied,
            status::GEN_FAILURE => Self::GenFailure,
            status::BAD_CONFIGURATION => Self::BadConfiguration,
            status::INSUFFICIENT_BUFFER => Self::InsufficientBuffer,
            other => Self::Other(other),
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::InvalidParameter => status::INVALID_PARAMETER,
            Self::NotSupported => status::NOT_SUPPORTED,
            Self::AccessDenied => status::ACCESS_DENIED,
            Self::GenFailure => status::GEN_FAILURE,
            Self::BadConfiguration => status::BAD_CONFIGURATION,
            Self::InsufficientBuffer => status::INSUFFICIENT_BUFFER,
            Self::Other(code) => code,
        }
    }
}

/// Which paths a query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFlags {
    /// Every known path, including available-but-inactive ones
    AllPaths,
    OnlyActivePaths,
}

impl QueryFlags {
    pub fn for_active_only(active_only: bool) -> Self {
        if active_only {
            Self::OnlyActivePaths
        } else {
            Self::AllPaths
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            Self::AllPaths => ccd::QDC_ALL_PATHS,
            Self::OnlyActivePaths => ccd::QDC_ONLY_ACTIVE_PATHS,
        }
    }
}

/// Flag set passed to the apply primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyFlags(u32);

impl ApplyFlags {
    /// Apply exactly what was supplied and persist it
    pub const CONSERVATIVE: Self = Self(
        ccd::SDC_APPLY
            | ccd::SDC_USE_SUPPLIED_DISPLAY_CONFIG
            | ccd::SDC_NO_OPTIMIZATION
            | ccd::SDC_SAVE_TO_DATABASE,
    );

    /// Conservative set, but the platform may adjust ancillary settings
    pub const RELAXED: Self = Self(Self::CONSERVATIVE.0 | ccd::SDC_ALLOW_CHANGES);

    pub fn bits(self) -> u32 {
        self.0
    }

    #[cfg(test)]
    pub fn allows_changes(self) -> bool {
        self.0 & ccd::SDC_ALLOW_CHANGES != 0
    }
}

/// The platform primitives the engine consumes
pub trait DisplayConfigApi {
    /// Buffer sizes `(paths, modes)` needed for a query
    fn buffer_sizes(&self, flags: QueryFlags) -> Result<(u32, u32), StatusCode>;

    /// Fill query; returned modes carry no identity
    fn query_config(
        &self,
        flags: QueryFlags,
        path_count: u32,
        mode_count: u32,
    ) -> Result<(Vec<DisplayPath>, Vec<DisplayMode>), StatusCode>;

    /// EDID-derived identity of the monitor behind a target
    fn target_identity(
        &self,
        adapter_id: AdapterId,
        target_id: u32,
    ) -> Result<MonitorIdentity, StatusCode>;

    /// Submit a topology; all-or-nothing
    fn apply_config(
        &self,
        paths: &[DisplayPath],
        modes: &[DisplayMode],
        flags: ApplyFlags,
    ) -> Result<(), StatusCode>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_raw_roundtrip() {
        for code in [5, 31, 50, 87, 122, 1610, 1234] {
            assert_eq!(StatusCode::from_raw(code).raw(), code);
        }
        assert_eq!(StatusCode::from_raw(1610), StatusCode::BadConfiguration);
        assert_eq!(StatusCode::from_raw(1234), StatusCode::Other(1234));
    }

    #[test]
    fn test_status_code_messages_carry_code() {
        assert_eq!(StatusCode::InvalidParameter.to_string(), "invalid parameter (87)");
        assert_eq!(StatusCode::Other(42).to_string(), "platform status 42");
    }

    #[test]
    fn test_flag_sets() {
        assert_eq!(ApplyFlags::CONSERVATIVE.bits(), 0x0000_03A0);
        assert_eq!(ApplyFlags::RELAXED.bits(), 0x0000_07A0);
        assert!(!ApplyFlags::CONSERVATIVE.allows_changes());
        assert!(ApplyFlags::RELAXED.allows_changes());
    }

    #[test]
    fn test_query_flags() {
        assert_eq!(QueryFlags::for_active_only(true), QueryFlags::OnlyActivePaths);
        assert_eq!(QueryFlags::for_active_only(false).bits(), 0x1);
    }
}
