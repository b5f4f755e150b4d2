//! Application-wide constants
//!
//! Platform flag values, status codes, file locations and environment
//! variable names used across the crate.

/// Settings file and profile storage locations
pub mod config {
    /// Directory under the platform config dir holding settings and profiles
    pub const APP_DIR: &str = "monitor-switcher";

    /// Settings file name
    pub const FILENAME: &str = "config.toml";

    /// Subdirectory holding one snapshot file per profile
    pub const PROFILES_DIR: &str = "Profiles";

    /// File extension of stored snapshots
    pub const PROFILE_EXTENSION: &str = "json";
}

/// Environment variables read at startup
pub mod env {
    /// Log level override (trace, debug, info, warn, error)
    pub const LOG_LEVEL: &str = "LOG_LEVEL";

    /// Overrides the profiles directory from the settings file
    pub const PROFILES_DIR: &str = "MONITOR_SWITCHER_PROFILES_DIR";

    /// "1", "true", "yes" or "on" disables adapter id matching
    pub const NO_ID_MATCH: &str = "MONITOR_SWITCHER_NO_ID_MATCH";
}

/// Connecting and Configuring Displays (CCD) flag values
pub mod ccd {
    /// QDC_ALL_PATHS: every known path, active or not
    pub const QDC_ALL_PATHS: u32 = 0x0000_0001;

    /// QDC_ONLY_ACTIVE_PATHS: paths currently driving a monitor
    pub const QDC_ONLY_ACTIVE_PATHS: u32 = 0x0000_0002;

    pub const SDC_USE_SUPPLIED_DISPLAY_CONFIG: u32 = 0x0000_0020;
    pub const SDC_APPLY: u32 = 0x0000_0080;
    pub const SDC_NO_OPTIMIZATION: u32 = 0x0000_0100;
    pub const SDC_SAVE_TO_DATABASE: u32 = 0x0000_0200;
    pub const SDC_ALLOW_CHANGES: u32 = 0x0000_0400;

    /// DISPLAYCONFIG_PATH_MODE_IDX_INVALID: path has no mode at this end
    #[cfg(windows)]
    pub const MODE_INDEX_INVALID: u32 = 0xFFFF_FFFF;
}

/// Win32 status codes returned by the CCD primitives
pub mod status {
    #[cfg(windows)]
    pub const SUCCESS: u32 = 0;
    pub const ACCESS_DENIED: u32 = 5;
    pub const GEN_FAILURE: u32 = 31;
    pub const NOT_SUPPORTED: u32 = 50;
    pub const INVALID_PARAMETER: u32 = 87;
    pub const INSUFFICIENT_BUFFER: u32 = 122;
    pub const BAD_CONFIGURATION: u32 = 1610;
}

/// Persisted snapshot document
pub mod snapshot {
    /// Current document format version
    pub const DOCUMENT_VERSION: u32 = 1;
}
