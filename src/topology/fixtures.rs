//! Snapshot builders shared by the unit tests

use super::*;

pub const ADAPTER_A: AdapterId = AdapterId::new(0, 0x0000_D1A0);
pub const ADAPTER_B: AdapterId = AdapterId::new(0, 0x0001_2F40);
pub const ADAPTER_C: AdapterId = AdapterId::new(0, 0x0000_8E52);

pub const TARGET_1: u32 = 0x1100;
pub const TARGET_2: u32 = 0x1101;
pub const TARGET_3: u32 = 0x1102;

pub fn hd_source_mode(x: i32) -> SourceMode {
    SourceMode {
        width: 1920,
        height: 1080,
        pixel_format: 4,
        position: Point { x, y: 0 },
    }
}

pub fn hd_target_mode() -> TargetMode {
    TargetMode {
        pixel_rate: 148_500_000,
        h_sync_freq: Rational::new(67_500, 1),
        v_sync_freq: Rational::new(60_000, 1_000),
        active_size: Region { cx: 1920, cy: 1080 },
        total_size: Region { cx: 2200, cy: 1125 },
        video_standard: 255,
        scan_line_ordering: 1,
    }
}

pub fn path(
    adapter_id: AdapterId,
    source_id: u32,
    target_id: u32,
    source_mode: u32,
    target_mode: u32,
) -> DisplayPath {
    DisplayPath {
        source: PathSource {
            adapter_id,
            id: source_id,
            mode_index: Some(source_mode),
            status_flags: 1,
        },
        target: PathTarget {
            adapter_id,
            id: target_id,
            mode_index: Some(target_mode),
            output_technology: 5,
            rotation: 1,
            scaling: 1,
            refresh_rate: Rational::new(60_000, 1_000),
            scan_line_ordering: 1,
            target_available: true,
            status_flags: 1,
        },
        flags: 1,
    }
}

/// One monitor on `adapter_id`: source 0 → TARGET_1
pub fn single_monitor(adapter_id: AdapterId) -> TopologySnapshot {
    TopologySnapshot::new(
        vec![path(adapter_id, 0, TARGET_1, 0, 1)],
        vec![
            DisplayMode::source(adapter_id, 0, hd_source_mode(0)),
            DisplayMode::target(adapter_id, TARGET_1, hd_target_mode()),
        ],
    )
}

/// Two monitors side by side on `adapter_id`
pub fn dual_monitor(adapter_id: AdapterId) -> TopologySnapshot {
    TopologySnapshot::new(
        vec![
            path(adapter_id, 0, TARGET_1, 0, 1),
            path(adapter_id, 1, TARGET_2, 2, 3),
        ],
        vec![
            DisplayMode::source(adapter_id, 0, hd_source_mode(0)),
            DisplayMode::target(adapter_id, TARGET_1, hd_target_mode()),
            DisplayMode::source(adapter_id, 1, hd_source_mode(1920)),
            DisplayMode::target(adapter_id, TARGET_2, hd_target_mode()),
        ],
    )
}

pub fn identity(name: &str) -> MonitorIdentity {
    MonitorIdentity {
        manufacturer_id: 0x10AC,
        product_code_id: 0xA0C4,
        valid: true,
        friendly_name: Some(name.to_string()),
        device_path: Some(format!(r"\\?\DISPLAY#{}#5&1a2b3c4d&0&UID4352", name.replace(' ', "_"))),
    }
}

/// Attach identities to the target modes, in mode order
pub fn with_identities(mut snapshot: TopologySnapshot, names: &[&str]) -> TopologySnapshot {
    let mut names = names.iter();
    for mode in snapshot.modes.iter_mut().filter(|mode| mode.is_target()) {
        if let Some(name) = names.next() {
            mode.identity = Some(identity(name));
        }
    }
    snapshot
}

/// Replace every occurrence of adapter `from` with `to`
pub fn relabel(mut snapshot: TopologySnapshot, from: AdapterId, to: AdapterId) -> TopologySnapshot {
    for path in &mut snapshot.paths {
        if path.source.adapter_id == from {
            path.source.adapter_id = to;
        }
        if path.target.adapter_id == from {
            path.target.adapter_id = to;
        }
    }
    for mode in &mut snapshot.modes {
        if mode.adapter_id == from {
            mode.adapter_id = to;
        }
    }
    snapshot
}
