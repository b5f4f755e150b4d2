//! Live topology query
//!
//! Sizes and fills the platform buffers, drops filler modes and unavailable
//! paths, then resolves monitor identities best-effort.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::platform::{DisplayConfigApi, QueryFlags, StatusCode};
use crate::topology::{
    AdapterId, DisplayMode, DisplayPath, ModeInfoType, MonitorIdentity, TopologySnapshot,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("failed to get display config buffer sizes: {0}")]
    BufferSizes(StatusCode),

    #[error("failed to query display config: {0}")]
    Fill(StatusCode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("identity lookup for target {target_id} on adapter {adapter_id} failed: {status}")]
pub struct LookupError {
    pub adapter_id: AdapterId,
    pub target_id: u32,
    pub status: StatusCode,
}

/// Resolve the monitor behind a target
pub fn identify<A: DisplayConfigApi + ?Sized>(
    api: &A,
    adapter_id: AdapterId,
    target_id: u32,
) -> Result<MonitorIdentity, LookupError> {
    api.target_identity(adapter_id, target_id)
        .map_err(|status| LookupError {
            adapter_id,
            target_id,
            status,
        })
}

/// Query the live topology
/// `active_only = false` also returns available-but-inactive paths
pub fn query_topology<A: DisplayConfigApi + ?Sized>(
    api: &A,
    active_only: bool,
) -> Result<TopologySnapshot, QueryError> {
    let flags = QueryFlags::for_active_only(active_only);

    let (path_count, mode_count) = api.buffer_sizes(flags).map_err(QueryError::BufferSizes)?;
    let (mut paths, modes) = api
        .query_config(flags, path_count, mode_count)
        .map_err(QueryError::Fill)?;
    debug!(
        paths = paths.len(),
        modes = modes.len(),
        flags = flags.bits(),
        "raw display config received"
    );

    let mut modes = discard_uninitialized_modes(&mut paths, modes);
    let paths = discard_unavailable_paths(paths);

    for mode in modes.iter_mut().filter(|mode| mode.is_target()) {
        let identity = match identify(api, mode.adapter_id, mode.id) {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "monitor identity unavailable, continuing without it");
                MonitorIdentity::unknown()
            }
        };
        mode.identity = Some(identity);
    }

    info!(paths = paths.len(), modes = modes.len(), active_only, "queried display topology");
    Ok(TopologySnapshot::new(paths, modes))
}

/// Drop zeroed filler modes and re-point path mode indices at the compacted
/// positions. Does nothing if every mode is a filler.
pub(crate) fn discard_uninitialized_modes(
    paths: &mut [DisplayPath],
    modes: Vec<DisplayMode>,
) -> Vec<DisplayMode> {
    let valid = modes
        .iter()
        .filter(|mode| mode.info_type() != ModeInfoType::Zero)
        .count();
    if valid == 0 || valid == modes.len() {
        return modes;
    }

    // Old index → new index; dropped slots map to None
    let mut remap = Vec::with_capacity(modes.len());
    let mut kept = Vec::with_capacity(valid);
    for mode in modes {
        if mode.info_type() == ModeInfoType::Zero {
            remap.push(None);
        } else {
            remap.push(Some(kept.len() as u32));
            kept.push(mode);
        }
    }

    let reindex =
        |index: Option<u32>| index.and_then(|index| remap.get(index as usize).copied().flatten());
    for path in paths.iter_mut() {
        path.source.mode_index = reindex(path.source.mode_index);
        path.target.mode_index = reindex(path.target.mode_index);
    }

    debug!(dropped = remap.len() - kept.len(), "discarded uninitialized modes");
    kept
}

/// Drop paths whose target is not currently present.
/// Does nothing if no path has an available target.
pub(crate) fn discard_unavailable_paths(paths: Vec<DisplayPath>) -> Vec<DisplayPath> {
    if !paths.iter().any(|path| path.target.target_available) {
        return paths;
    }
    let before = paths.len();
    let kept: Vec<DisplayPath> = paths
        .into_iter()
        .filter(|path| path.target.target_available)
        .collect();
    if kept.len() != before {
        debug!(dropped = before - kept.len(), "discarded unavailable paths");
    }
    kept
}
