//! Human-readable dump of a snapshot (used by `print`, `show` and debug logs)

use std::fmt;

use super::{DisplayMode, DisplayPath, ModeInfo, TopologySnapshot};

fn mode_index(index: Option<u32>) -> String {
    index.map_or_else(|| "-".to_string(), |index| index.to_string())
}

fn write_path(f: &mut fmt::Formatter<'_>, index: usize, path: &DisplayPath) -> fmt::Result {
    let target = &path.target;
    writeln!(
        f,
        "  [{index}] source {}#{} (mode {}) -> target {}#{} (mode {})",
        path.source.adapter_id,
        path.source.id,
        mode_index(path.source.mode_index),
        target.adapter_id,
        target.id,
        mode_index(target.mode_index),
    )?;
    writeln!(
        f,
        "      output={} rotation={} scaling={} refresh={}/{} scan={} available={} flags={:#x}",
        target.output_technology,
        target.rotation,
        target.scaling,
        target.refresh_rate.numerator,
        target.refresh_rate.denominator,
        target.scan_line_ordering,
        target.target_available,
        path.flags,
    )
}

fn write_mode(f: &mut fmt::Formatter<'_>, index: usize, mode: &DisplayMode) -> fmt::Result {
    match &mode.info {
        ModeInfo::Source(source) => writeln!(
            f,
            "  [{index}] source {}#{} {}x{} at ({}, {}) format={}",
            mode.adapter_id,
            mode.id,
            source.width,
            source.height,
            source.position.x,
            source.position.y,
            source.pixel_format,
        ),
        ModeInfo::Target(target) => {
            writeln!(
                f,
                "  [{index}] target {}#{} active={}x{} total={}x{} vsync={}/{} pixel_rate={} standard={}",
                mode.adapter_id,
                mode.id,
                target.active_size.cx,
                target.active_size.cy,
                target.total_size.cx,
                target.total_size.cy,
                target.v_sync_freq.numerator,
                target.v_sync_freq.denominator,
                target.pixel_rate,
                target.video_standard,
            )?;
            match mode.valid_identity() {
                Some(identity) => writeln!(
                    f,
                    "      monitor \"{}\" mfg={:#06x} product={:#06x} path={}",
                    identity.friendly_name.as_deref().unwrap_or(""),
                    identity.manufacturer_id,
                    identity.product_code_id,
                    identity.device_path.as_deref().unwrap_or("-"),
                ),
                None => writeln!(f, "      monitor unknown"),
            }
        }
        ModeInfo::Uninitialized => writeln!(f, "  [{index}] uninitialized"),
    }
}

impl fmt::Display for TopologySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "paths ({}):", self.paths.len())?;
        for (index, path) in self.paths.iter().enumerate() {
            write_path(f, index, path)?;
        }
        writeln!(f, "modes ({}):", self.modes.len())?;
        for (index, mode) in self.modes.iter().enumerate() {
            write_mode(f, index, mode)?;
        }
        Ok(())
    }
}

/// Text form of a snapshot for the CLI and logs
pub fn printable_representation(snapshot: &TopologySnapshot) -> String {
    snapshot.to_string()
}
