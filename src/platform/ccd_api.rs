//! Windows backend over the Connecting and Configuring Displays (CCD) API
//!
//! Raw `DISPLAYCONFIG_*` records are converted to and from the snapshot model
//! here; nothing outside this module sees a platform struct.

#![allow(unsafe_code)]

use std::mem::size_of;

use tracing::{debug, warn};
use windows::Win32::Devices::Display::{
    DISPLAYCONFIG_2DREGION, DISPLAYCONFIG_DEVICE_INFO_GET_TARGET_NAME, DISPLAYCONFIG_MODE_INFO,
    DISPLAYCONFIG_MODE_INFO_TYPE, DISPLAYCONFIG_MODE_INFO_TYPE_SOURCE,
    DISPLAYCONFIG_MODE_INFO_TYPE_TARGET, DISPLAYCONFIG_PATH_INFO, DISPLAYCONFIG_PIXELFORMAT,
    DISPLAYCONFIG_RATIONAL, DISPLAYCONFIG_ROTATION, DISPLAYCONFIG_SCALING,
    DISPLAYCONFIG_SCANLINE_ORDERING, DISPLAYCONFIG_SOURCE_MODE, DISPLAYCONFIG_TARGET_DEVICE_NAME,
    DISPLAYCONFIG_TARGET_MODE, DISPLAYCONFIG_VIDEO_OUTPUT_TECHNOLOGY, DisplayConfigGetDeviceInfo,
    GetDisplayConfigBufferSizes, QUERY_DISPLAY_CONFIG_FLAGS, QueryDisplayConfig,
    SET_DISPLAY_CONFIG_FLAGS, SetDisplayConfig,
};
use windows::Win32::Foundation::{LUID, POINTL};

use super::{ApplyFlags, DisplayConfigApi, QueryFlags, StatusCode};
use crate::constants::{ccd, status};
use crate::topology::{
    AdapterId, DisplayMode, DisplayPath, ModeInfo, MonitorIdentity, PathSource, PathTarget, Point,
    Rational, Region, SourceMode, TargetMode,
};

#[derive(Debug, Default)]
pub struct CcdApi;

fn check(code: u32) -> Result<(), StatusCode> {
    if code == status::SUCCESS {
        Ok(())
    } else {
        Err(StatusCode::from_raw(code))
    }
}

fn adapter_from_luid(luid: LUID) -> AdapterId {
    AdapterId::new(luid.HighPart, luid.LowPart)
}

fn luid_from_adapter(id: AdapterId) -> LUID {
    LUID {
        LowPart: id.low,
        HighPart: id.high,
    }
}

fn mode_index_from_raw(raw: u32) -> Option<u32> {
    (raw != ccd::MODE_INDEX_INVALID).then_some(raw)
}

fn mode_index_to_raw(index: Option<u32>) -> u32 {
    index.unwrap_or(ccd::MODE_INDEX_INVALID)
}

fn rational_from_raw(raw: DISPLAYCONFIG_RATIONAL) -> Rational {
    Rational::new(raw.Numerator, raw.Denominator)
}

fn rational_to_raw(rational: Rational) -> DISPLAYCONFIG_RATIONAL {
    DISPLAYCONFIG_RATIONAL {
        Numerator: rational.numerator,
        Denominator: rational.denominator,
    }
}

fn region_from_raw(raw: DISPLAYCONFIG_2DREGION) -> Region {
    Region { cx: raw.cx, cy: raw.cy }
}

fn region_to_raw(region: Region) -> DISPLAYCONFIG_2DREGION {
    DISPLAYCONFIG_2DREGION {
        cx: region.cx,
        cy: region.cy,
    }
}

fn path_from_raw(raw: &DISPLAYCONFIG_PATH_INFO) -> DisplayPath {
    // Without QDC_VIRTUAL_MODE_AWARE the unions hold plain mode indices
    let source_index = unsafe { raw.sourceInfo.Anonymous.modeInfoIdx };
    let target_index = unsafe { raw.targetInfo.Anonymous.modeInfoIdx };
    let target = &raw.targetInfo;

    DisplayPath {
        source: PathSource {
            adapter_id: adapter_from_luid(raw.sourceInfo.adapterId),
            id: raw.sourceInfo.id,
            mode_index: mode_index_from_raw(source_index),
            status_flags: raw.sourceInfo.statusFlags,
        },
        target: PathTarget {
            adapter_id: adapter_from_luid(target.adapterId),
            id: target.id,
            mode_index: mode_index_from_raw(target_index),
            output_technology: target.outputTechnology.0 as u32,
            rotation: target.rotation.0 as u32,
            scaling: target.scaling.0 as u32,
            refresh_rate: rational_from_raw(target.refreshRate),
            scan_line_ordering: target.scanLineOrdering.0 as u32,
            target_available: target.targetAvailable.as_bool(),
            status_flags: target.statusFlags,
        },
        flags: raw.flags,
    }
}

fn path_to_raw(path: &DisplayPath) -> DISPLAYCONFIG_PATH_INFO {
    let mut raw = DISPLAYCONFIG_PATH_INFO::default();
    raw.flags = path.flags;

    raw.sourceInfo.adapterId = luid_from_adapter(path.source.adapter_id);
    raw.sourceInfo.id = path.source.id;
    raw.sourceInfo.Anonymous.modeInfoIdx = mode_index_to_raw(path.source.mode_index);
    raw.sourceInfo.statusFlags = path.source.status_flags;

    let target = &path.target;
    raw.targetInfo.adapterId = luid_from_adapter(target.adapter_id);
    raw.targetInfo.id = target.id;
    raw.targetInfo.Anonymous.modeInfoIdx = mode_index_to_raw(target.mode_index);
    raw.targetInfo.outputTechnology = DISPLAYCONFIG_VIDEO_OUTPUT_TECHNOLOGY(target.output_technology as i32);
    raw.targetInfo.rotation = DISPLAYCONFIG_ROTATION(target.rotation as i32);
    raw.targetInfo.scaling = DISPLAYCONFIG_SCALING(target.scaling as i32);
    raw.targetInfo.refreshRate = rational_to_raw(target.refresh_rate);
    raw.targetInfo.scanLineOrdering = DISPLAYCONFIG_SCANLINE_ORDERING(target.scan_line_ordering as i32);
    raw.targetInfo.targetAvailable = target.target_available.into();
    raw.targetInfo.statusFlags = target.status_flags;
    raw
}

fn mode_from_raw(raw: &DISPLAYCONFIG_MODE_INFO) -> DisplayMode {
    let info = if raw.infoType == DISPLAYCONFIG_MODE_INFO_TYPE_SOURCE {
        let source = unsafe { raw.Anonymous.sourceMode };
        ModeInfo::Source(SourceMode {
            width: source.width,
            height: source.height,
            pixel_format: source.pixelFormat.0 as u32,
            position: Point {
                x: source.position.x,
                y: source.position.y,
            },
        })
    } else if raw.infoType == DISPLAYCONFIG_MODE_INFO_TYPE_TARGET {
        let signal = unsafe { raw.Anonymous.targetMode }.targetVideoSignalInfo;
        ModeInfo::Target(TargetMode {
            pixel_rate: signal.pixelRate,
            h_sync_freq: rational_from_raw(signal.hSyncFreq),
            v_sync_freq: rational_from_raw(signal.vSyncFreq),
            active_size: region_from_raw(signal.activeSize),
            total_size: region_from_raw(signal.totalSize),
            video_standard: unsafe { signal.Anonymous.videoStandard },
            scan_line_ordering: signal.scanLineOrdering.0 as u32,
        })
    } else {
        if raw.infoType.0 != 0 {
            warn!(info_type = raw.infoType.0, "unsupported mode info type, treating slot as filler");
        }
        ModeInfo::Uninitialized
    };

    DisplayMode {
        adapter_id: adapter_from_luid(raw.adapterId),
        id: raw.id,
        info,
        identity: None,
    }
}

fn mode_to_raw(mode: &DisplayMode) -> DISPLAYCONFIG_MODE_INFO {
    let mut raw = DISPLAYCONFIG_MODE_INFO::default();
    raw.id = mode.id;
    raw.adapterId = luid_from_adapter(mode.adapter_id);

    match mode.info {
        ModeInfo::Source(source) => {
            raw.infoType = DISPLAYCONFIG_MODE_INFO_TYPE_SOURCE;
            raw.Anonymous.sourceMode = DISPLAYCONFIG_SOURCE_MODE {
                width: source.width,
                height: source.height,
                pixelFormat: DISPLAYCONFIG_PIXELFORMAT(source.pixel_format as i32),
                position: POINTL {
                    x: source.position.x,
                    y: source.position.y,
                },
            };
        }
        ModeInfo::Target(target) => {
            raw.infoType = DISPLAYCONFIG_MODE_INFO_TYPE_TARGET;
            let mut mode = DISPLAYCONFIG_TARGET_MODE::default();
            let signal = &mut mode.targetVideoSignalInfo;
            signal.pixelRate = target.pixel_rate;
            signal.hSyncFreq = rational_to_raw(target.h_sync_freq);
            signal.vSyncFreq = rational_to_raw(target.v_sync_freq);
            signal.activeSize = region_to_raw(target.active_size);
            signal.totalSize = region_to_raw(target.total_size);
            signal.Anonymous.videoStandard = target.video_standard;
            signal.scanLineOrdering = DISPLAYCONFIG_SCANLINE_ORDERING(target.scan_line_ordering as i32);
            raw.Anonymous.targetMode = mode;
        }
        ModeInfo::Uninitialized => {
            raw.infoType = DISPLAYCONFIG_MODE_INFO_TYPE(0);
        }
    }
    raw
}

/// NUL-terminated UTF-16 buffer to a Rust string
fn wide_to_string(buffer: &[u16]) -> String {
    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..len])
}

impl DisplayConfigApi for CcdApi {
    fn buffer_sizes(&self, flags: QueryFlags) -> Result<(u32, u32), StatusCode> {
        let mut path_count = 0u32;
        let mut mode_count = 0u32;
        let code = unsafe {
            GetDisplayConfigBufferSizes(
                QUERY_DISPLAY_CONFIG_FLAGS(flags.bits()),
                &mut path_count,
                &mut mode_count,
            )
        };
        check(code.0)?;
        debug!(path_count, mode_count, ?flags, "display config buffer sizes");
        Ok((path_count, mode_count))
    }

    fn query_config(
        &self,
        flags: QueryFlags,
        path_count: u32,
        mode_count: u32,
    ) -> Result<(Vec<DisplayPath>, Vec<DisplayMode>), StatusCode> {
        let mut raw_paths = vec![DISPLAYCONFIG_PATH_INFO::default(); path_count as usize];
        let mut raw_modes = vec![DISPLAYCONFIG_MODE_INFO::default(); mode_count as usize];
        let mut path_count = path_count;
        let mut mode_count = mode_count;

        let code = unsafe {
            QueryDisplayConfig(
                QUERY_DISPLAY_CONFIG_FLAGS(flags.bits()),
                &mut path_count,
                raw_paths.as_mut_ptr(),
                &mut mode_count,
                raw_modes.as_mut_ptr(),
                None,
            )
        };
        check(code.0)?;

        // The call may fill fewer entries than it asked room for
        raw_paths.truncate(path_count as usize);
        raw_modes.truncate(mode_count as usize);

        Ok((
            raw_paths.iter().map(path_from_raw).collect(),
            raw_modes.iter().map(mode_from_raw).collect(),
        ))
    }

    fn target_identity(
        &self,
        adapter_id: AdapterId,
        target_id: u32,
    ) -> Result<MonitorIdentity, StatusCode> {
        let mut request = DISPLAYCONFIG_TARGET_DEVICE_NAME::default();
        request.header.r#type = DISPLAYCONFIG_DEVICE_INFO_GET_TARGET_NAME;
        request.header.size = size_of::<DISPLAYCONFIG_TARGET_DEVICE_NAME>() as u32;
        request.header.adapterId = luid_from_adapter(adapter_id);
        request.header.id = target_id;

        let code = unsafe { DisplayConfigGetDeviceInfo(&mut request.header) };
        check(code as u32)?;

        Ok(MonitorIdentity {
            manufacturer_id: request.edidManufactureId,
            product_code_id: request.edidProductCodeId,
            valid: true,
            friendly_name: Some(wide_to_string(&request.monitorFriendlyDeviceName)),
            device_path: Some(wide_to_string(&request.monitorDevicePath)),
        })
    }

    fn apply_config(
        &self,
        paths: &[DisplayPath],
        modes: &[DisplayMode],
        flags: ApplyFlags,
    ) -> Result<(), StatusCode> {
        let raw_paths: Vec<DISPLAYCONFIG_PATH_INFO> = paths.iter().map(path_to_raw).collect();
        let raw_modes: Vec<DISPLAYCONFIG_MODE_INFO> = modes.iter().map(mode_to_raw).collect();

        let code = unsafe {
            SetDisplayConfig(
                Some(raw_paths.as_slice()),
                Some(raw_modes.as_slice()),
                SET_DISPLAY_CONFIG_FLAGS(flags.bits()),
            )
        };
        check(code as u32)
    }
}
