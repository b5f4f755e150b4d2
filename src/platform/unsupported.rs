//! Backend for targets without a CCD API

use tracing::warn;

use super::{ApplyFlags, DisplayConfigApi, QueryFlags, StatusCode};
use crate::topology::{AdapterId, DisplayMode, DisplayPath, MonitorIdentity};

#[derive(Debug, Default)]
pub struct Unsupported;

impl DisplayConfigApi for Unsupported {
    fn buffer_sizes(&self, _flags: QueryFlags) -> Result<(u32, u32), StatusCode> {
        warn!("display configuration is only available on Windows");
        Err(StatusCode::NotSupported)
    }

    fn query_config(
        &self,
        _flags: QueryFlags,
        _path_count: u32,
        _mode_count: u32,
    ) -> Result<(Vec<DisplayPath>, Vec<DisplayMode>), StatusCode> {
        Err(StatusCode::NotSupported)
    }

    fn target_identity(
        &self,
        _adapter_id: AdapterId,
        _target_id: u32,
    ) -> Result<MonitorIdentity, StatusCode> {
        Err(StatusCode::NotSupported)
    }

    fn apply_config(
        &self,
        _paths: &[DisplayPath],
        _modes: &[DisplayMode],
        _flags: ApplyFlags,
    ) -> Result<(), StatusCode> {
        warn!("display configuration is only available on Windows");
        Err(StatusCode::NotSupported)
    }
}
