//! Persisted snapshot document
//!
//! On disk a snapshot is three ordered sections: paths, modes, and identities.
//! `identities[i]` belongs to `modes[i]`; the pairing is checked when a
//! document is turned back into a [`TopologySnapshot`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{AdapterId, DisplayMode, DisplayPath, ModeInfo, MonitorIdentity, TopologySnapshot};
use crate::constants::snapshot::DOCUMENT_VERSION;

/// Structural problems in a well-formed JSON document
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("unsupported snapshot version {found}")]
    UnsupportedVersion { found: u32 },

    #[error("{identities} identities recorded for {modes} modes")]
    IdentityCountMismatch { modes: usize, identities: usize },

    #[error("path {path} refers to mode {index}, but only {modes} modes exist")]
    ModeIndexOutOfRange { path: usize, index: u32, modes: usize },

    #[error("mode {index} is not a target mode but carries a monitor identity")]
    IdentityOnNonTarget { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeRecord {
    pub adapter_id: AdapterId,
    pub id: u32,
    pub info: ModeInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub version: u32,
    pub paths: Vec<DisplayPath>,
    pub modes: Vec<ModeRecord>,
    /// Parallel to `modes`; `None` for modes without a monitor
    pub identities: Vec<Option<MonitorIdentity>>,
}

impl From<&TopologySnapshot> for SnapshotDocument {
    fn from(snapshot: &TopologySnapshot) -> Self {
        let (modes, identities) = snapshot
            .modes
            .iter()
            .map(|mode| {
                let record = ModeRecord {
                    adapter_id: mode.adapter_id,
                    id: mode.id,
                    info: mode.info,
                };
                (record, mode.identity.clone())
            })
            .unzip();

        Self {
            version: DOCUMENT_VERSION,
            paths: snapshot.paths.clone(),
            modes,
            identities,
        }
    }
}

impl TryFrom<SnapshotDocument> for TopologySnapshot {
    type Error = DocumentError;

    fn try_from(document: SnapshotDocument) -> Result<Self, Self::Error> {
        if document.version != DOCUMENT_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: document.version,
            });
        }

        if document.identities.len() != document.modes.len() {
            return Err(DocumentError::IdentityCountMismatch {
                modes: document.modes.len(),
                identities: document.identities.len(),
            });
        }

        let mode_count = document.modes.len();
        for (path_index, path) in document.paths.iter().enumerate() {
            for index in [path.source.mode_index, path.target.mode_index].into_iter().flatten() {
                if index as usize >= mode_count {
                    return Err(DocumentError::ModeIndexOutOfRange {
                        path: path_index,
                        index,
                        modes: mode_count,
                    });
                }
            }
        }

        let mut modes = Vec::with_capacity(mode_count);
        for (index, (record, identity)) in document
            .modes
            .into_iter()
            .zip(document.identities)
            .enumerate()
        {
            check_identity_placement(index, &record.info, identity.as_ref())?;
            modes.push(DisplayMode {
                adapter_id: record.adapter_id,
                id: record.id,
                info: record.info,
                identity,
            });
        }

        Ok(Self::new(document.paths, modes))
    }
}

/// Only target modes may carry a resolved identity.
/// Failed-lookup placeholders are allowed anywhere.
fn check_identity_placement(
    index: usize,
    info: &ModeInfo,
    identity: Option<&MonitorIdentity>,
) -> Result<(), DocumentError> {
    let resolved = identity.is_some_and(|identity| identity.valid);
    if resolved && !matches!(info, ModeInfo::Target(_)) {
        return Err(DocumentError::IdentityOnNonTarget { index });
    }
    Ok(())
}

impl TopologySnapshot {
    /// Same identity rule a stored document is checked against on load
    pub fn check_identities(&self) -> Result<(), DocumentError> {
        self.modes.iter().enumerate().try_for_each(|(index, mode)| {
            check_identity_placement(index, &mode.info, mode.identity.as_ref())
        })
    }
}

/// Base64 encoding for free-text identity fields.
/// Monitor names come from EDID blobs and may hold anything.
pub mod encoded_text {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(text) => serializer.serialize_some(&STANDARD.encode(text.as_bytes())),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(encoded) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let bytes = STANDARD.decode(encoded.as_bytes()).map_err(D::Error::custom)?;
        String::from_utf8(bytes).map(Some).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::fixtures::*;

    fn document_of(snapshot: &TopologySnapshot) -> SnapshotDocument {
        SnapshotDocument::from(snapshot)
    }

    #[test]
    fn test_document_has_parallel_identity_section() {
        let snapshot = with_identities(dual_monitor(ADAPTER_A), &["DELL U2720Q", "LG HDR 4K"]);
        let document = document_of(&snapshot);

        assert_eq!(document.version, DOCUMENT_VERSION);
        assert_eq!(document.modes.len(), 4);
        assert_eq!(document.identities.len(), 4);
        assert!(document.identities[0].is_none());
        assert_eq!(
            document.identities[3].as_ref().unwrap().friendly_name.as_deref(),
            Some("LG HDR 4K")
        );
    }

    #[test]
    fn test_document_back_to_snapshot_is_lossless() {
        let snapshot = with_identities(dual_monitor(ADAPTER_B), &["DELL U2720Q", "LG HDR 4K"]);
        let restored = TopologySnapshot::try_from(document_of(&snapshot)).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn test_identity_count_mismatch_rejected() {
        let mut document = document_of(&single_monitor(ADAPTER_A));
        document.identities.pop();
        assert_eq!(
            TopologySnapshot::try_from(document),
            Err(DocumentError::IdentityCountMismatch { modes: 2, identities: 1 })
        );
    }

    #[test]
    fn test_mode_index_out_of_range_rejected() {
        let mut document = document_of(&single_monitor(ADAPTER_A));
        document.paths[0].target.mode_index = Some(9);
        assert_eq!(
            TopologySnapshot::try_from(document),
            Err(DocumentError::ModeIndexOutOfRange { path: 0, index: 9, modes: 2 })
        );
    }

    #[test]
    fn test_absent_mode_index_is_accepted() {
        let mut snapshot = single_monitor(ADAPTER_A);
        snapshot.paths[0].source.mode_index = None;
        let restored = TopologySnapshot::try_from(document_of(&snapshot)).unwrap();
        assert_eq!(restored.paths[0].source.mode_index, None);
    }

    #[test]
    fn test_identity_on_source_mode_rejected() {
        let mut document = document_of(&single_monitor(ADAPTER_A));
        document.identities[0] = Some(identity("DELL U2720Q"));
        assert_eq!(
            TopologySnapshot::try_from(document),
            Err(DocumentError::IdentityOnNonTarget { index: 0 })
        );
    }

    #[test]
    fn test_placeholder_on_source_mode_is_kept() {
        let mut snapshot = single_monitor(ADAPTER_A);
        snapshot.modes[0].identity = Some(MonitorIdentity::unknown());
        assert_eq!(snapshot.check_identities(), Ok(()));

        let restored = TopologySnapshot::try_from(document_of(&snapshot)).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn test_check_identities_matches_load_rule() {
        let mut snapshot = single_monitor(ADAPTER_A);
        snapshot.modes[0].identity = Some(identity("DELL U2720Q"));
        assert_eq!(
            snapshot.check_identities(),
            Err(DocumentError::IdentityOnNonTarget { index: 0 })
        );
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let mut document = document_of(&single_monitor(ADAPTER_A));
        document.version = 99;
        assert_eq!(
            TopologySnapshot::try_from(document),
            Err(DocumentError::UnsupportedVersion { found: 99 })
        );
    }

    #[test]
    fn test_friendly_name_is_encoded_on_disk() {
        let name = "Büro <\"Links\"> \u{1F5B5}";
        let snapshot = with_identities(single_monitor(ADAPTER_A), &[name]);
        let json = serde_json::to_string(&document_of(&snapshot)).unwrap();

        assert!(!json.contains("Links"));
        let parsed: SnapshotDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(
            parsed.identities[1].as_ref().unwrap().friendly_name.as_deref(),
            Some(name)
        );
    }

    #[test]
    fn test_invalid_encoding_is_a_parse_error() {
        let json = r#"{"manufacturer_id":1,"product_code_id":2,"valid":true,"friendly_name":"***","device_path":null}"#;
        assert!(serde_json::from_str::<MonitorIdentity>(json).is_err());
    }

    #[test]
    fn test_missing_text_fields_default_to_none() {
        let json = r#"{"manufacturer_id":1,"product_code_id":2,"valid":false}"#;
        let identity: MonitorIdentity = serde_json::from_str(json).unwrap();
        assert_eq!(identity.friendly_name, None);
        assert_eq!(identity.device_path, None);
    }
}
