//! Reconciliation of a stored snapshot against the live system
//!
//! Adapter ids are re-enumerated across reboots and docking, so a stored
//! topology usually cannot be applied verbatim. Each [`Tier`] builds a
//! candidate from the *original* stored snapshot and the current one; the
//! ladder submits candidates in order until the platform accepts one.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::platform::{ApplyFlags, DisplayConfigApi, StatusCode};
use crate::query::{QueryError, query_topology};
use crate::topology::{TopologySnapshot, printable_representation};

/// Strategies of the reconciliation ladder, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Stored snapshot as-is
    Direct,
    /// Adapter id low parts adopted from paths with the same `(source, target)` ids
    PairwiseRemap,
    /// Adapter and target ids adopted from monitors with the same friendly name
    IdentityRemap,
    /// Every occurrence of a stale adapter id low part substituted
    BlanketSubstitution,
}

impl Tier {
    pub const LADDER: [Tier; 4] = [
        Tier::Direct,
        Tier::PairwiseRemap,
        Tier::IdentityRemap,
        Tier::BlanketSubstitution,
    ];

    /// Candidate for this tier, or `None` if the tier does not apply
    pub fn candidate(
        self,
        loaded: &TopologySnapshot,
        current: &TopologySnapshot,
    ) -> Option<TopologySnapshot> {
        match self {
            Tier::Direct => Some(loaded.clone()),
            Tier::PairwiseRemap => Some(remap_pairwise(loaded, current)),
            Tier::IdentityRemap => remap_by_identity(loaded, current),
            Tier::BlanketSubstitution => Some(substitute_adapter_ids(loaded, current)),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Direct => "direct apply",
            Tier::PairwiseRemap => "pairwise adapter id remap",
            Tier::IdentityRemap => "monitor identity remap",
            Tier::BlanketSubstitution => "blanket adapter id substitution",
        };
        f.write_str(name)
    }
}

/// The two flag sets every tier tries, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagSet {
    Conservative,
    /// Platform may make ancillary adjustments
    Relaxed,
}

impl FlagSet {
    pub const ORDER: [FlagSet; 2] = [FlagSet::Conservative, FlagSet::Relaxed];

    pub fn flags(self) -> ApplyFlags {
        match self {
            FlagSet::Conservative => ApplyFlags::CONSERVATIVE,
            FlagSet::Relaxed => ApplyFlags::RELAXED,
        }
    }
}

/// One rejected apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptFailure {
    pub tier: Tier,
    pub flag_set: FlagSet,
    pub status: StatusCode,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?} flags): {}", self.tier, self.flag_set, self.status)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApplyError {
    #[error("snapshot has no paths or modes, nothing to apply")]
    EmptySnapshot,

    #[error("could not read the current display topology")]
    Query(#[from] QueryError),

    #[error("display topology rejected by every strategy ({} attempts)", .attempts.len())]
    Exhausted { attempts: Vec<AttemptFailure> },
}

/// Apply `loaded`, remapping stale adapter ids as needed.
/// With `match_adapter_ids = false` only the direct apply is tried.
/// Returns the tier that was accepted.
pub fn reconcile_and_apply<A: DisplayConfigApi + ?Sized>(
    api: &A,
    loaded: &TopologySnapshot,
    match_adapter_ids: bool,
) -> Result<Tier, ApplyError> {
    if loaded.is_empty() {
        return Err(ApplyError::EmptySnapshot);
    }

    let mut attempts = Vec::new();

    if !match_adapter_ids {
        info!("adapter id matching disabled, applying stored topology as-is");
        if submit(api, Tier::Direct, loaded, &mut attempts) {
            return Ok(Tier::Direct);
        }
        return Err(ApplyError::Exhausted { attempts });
    }

    let current = query_topology(api, false)?;

    for tier in Tier::LADDER {
        let Some(candidate) = tier.candidate(loaded, &current) else {
            info!(%tier, "skipping, no monitor identities to match on");
            continue;
        };
        if submit(api, tier, &candidate, &mut attempts) {
            return Ok(tier);
        }
    }

    warn!(attempts = attempts.len(), "every reconciliation strategy failed");
    Err(ApplyError::Exhausted { attempts })
}

/// Conservative then relaxed apply of one candidate
fn submit<A: DisplayConfigApi + ?Sized>(
    api: &A,
    tier: Tier,
    candidate: &TopologySnapshot,
    attempts: &mut Vec<AttemptFailure>,
) -> bool {
    debug!(%tier, "candidate topology:\n{}", printable_representation(candidate));
    let (paths, modes) = candidate.platform_view();

    for flag_set in FlagSet::ORDER {
        match api.apply_config(&paths, &modes, flag_set.flags()) {
            Ok(()) => {
                info!(%tier, ?flag_set, flags = flag_set.flags().bits(), "display topology applied");
                return true;
            }
            Err(status) => {
                warn!(
                    %tier,
                    ?flag_set,
                    flags = flag_set.flags().bits(),
                    code = status.raw(),
                    "display topology rejected"
                );
                attempts.push(AttemptFailure {
                    tier,
                    flag_set,
                    status,
                });
            }
        }
    }
    false
}

/// Adopt adapter id low parts from current paths with equal `(source, target)`
/// ids, then carry them over to the target modes and their source modes.
pub fn remap_pairwise(loaded: &TopologySnapshot, current: &TopologySnapshot) -> TopologySnapshot {
    let mut candidate = loaded.clone();

    for path in &mut candidate.paths {
        if let Some(live) = current.find_path(path.source.id, path.target.id) {
            debug!(
                source = path.source.id,
                target = path.target.id,
                stale = %path.source.adapter_id,
                live = %live.source.adapter_id,
                "path ids match, adopting live adapter id"
            );
            path.source.adapter_id = path.source.adapter_id.with_low(live.source.adapter_id.low);
            path.target.adapter_id = path.target.adapter_id.with_low(live.target.adapter_id.low);
        }
    }

    for (index, mode) in loaded.modes.iter().enumerate() {
        if !mode.is_target() {
            continue;
        }
        let Some(path) = candidate.paths.iter().find(|path| path.target.id == mode.id) else {
            continue;
        };
        let (source_id, source_low, target_low) =
            (path.source.id, path.source.adapter_id.low, path.target.adapter_id.low);

        // Source mode on the same adapter, judged by the stored ids
        if let Some(source_index) = loaded.modes.iter().position(|source| {
            source.is_source() && source.id == source_id && source.adapter_id.low == mode.adapter_id.low
        }) {
            candidate.modes[source_index].adapter_id.low = source_low;
        }
        candidate.modes[index].adapter_id.low = target_low;
    }

    candidate
}

/// Match stored monitors to live ones by friendly name. Each matched monitor's
/// path, target mode and source mode move to its live adapter and target;
/// anything else on the stored adapter follows the latest match.
/// `None` unless both snapshots carry at least one valid identity.
pub fn remap_by_identity(
    loaded: &TopologySnapshot,
    current: &TopologySnapshot,
) -> Option<TopologySnapshot> {
    if !loaded.has_valid_identity() || !current.has_valid_identity() {
        return None;
    }

    let mut candidate = loaded.clone();
    // Two identical monitors share a name; each live one is claimed once
    let mut claimed = vec![false; current.modes.len()];
    // Paths and modes already moved with a matched monitor
    let mut pinned_paths = vec![false; loaded.paths.len()];
    let mut pinned_modes = vec![false; loaded.modes.len()];

    for (index, mode) in loaded.modes.iter().enumerate() {
        if !mode.is_target() {
            continue;
        }
        let Some(name) = mode.valid_identity().and_then(|identity| identity.matchable_name()) else {
            continue;
        };
        let Some(live_index) = (0..current.modes.len()).find(|&live_index| {
            let live = &current.modes[live_index];
            !claimed[live_index]
                && live.is_target()
                && live.valid_identity().and_then(|identity| identity.matchable_name()) == Some(name)
        }) else {
            debug!(monitor = name, "no live monitor with this name");
            continue;
        };
        claimed[live_index] = true;
        let live = &current.modes[live_index];
        let original_id = mode.adapter_id;

        debug!(
            monitor = name,
            stale_adapter = %original_id,
            live_adapter = %live.adapter_id,
            stale_target = mode.id,
            live_target = live.id,
            "monitor name matches, adopting live adapter and target"
        );

        // The monitor's own path and modes follow it to its live adapter
        for (path_index, stored) in loaded.paths.iter().enumerate() {
            if stored.target.adapter_id != original_id || stored.target.id != mode.id {
                continue;
            }
            let path = &mut candidate.paths[path_index];
            path.source.adapter_id = live.adapter_id;
            path.target.adapter_id = live.adapter_id;
            path.target.id = live.id;
            pinned_paths[path_index] = true;

            if let Some(source_index) = loaded.modes.iter().position(|source| {
                source.is_source()
                    && source.id == stored.source.id
                    && source.adapter_id == stored.source.adapter_id
            }) {
                candidate.modes[source_index].adapter_id = live.adapter_id;
                pinned_modes[source_index] = true;
            }
        }
        candidate.modes[index].adapter_id = live.adapter_id;
        candidate.modes[index].id = live.id;
        pinned_modes[index] = true;

        // Everything else still on the stored adapter goes along with it
        for (path_index, stored) in loaded.paths.iter().enumerate() {
            if !pinned_paths[path_index] && stored.target.adapter_id == original_id {
                candidate.paths[path_index].source.adapter_id = live.adapter_id;
                candidate.paths[path_index].target.adapter_id = live.adapter_id;
            }
        }
        for (mode_index, stored) in loaded.modes.iter().enumerate() {
            if !pinned_modes[mode_index] && stored.adapter_id == original_id {
                candidate.modes[mode_index].adapter_id = live.adapter_id;
            }
        }
    }

    Some(candidate)
}

/// For every path matched by `(source, target)` ids, substitute the live
/// source adapter low part for the stored one across the whole snapshot.
pub fn substitute_adapter_ids(
    loaded: &TopologySnapshot,
    current: &TopologySnapshot,
) -> TopologySnapshot {
    let mut substitutions: HashMap<u32, u32> = HashMap::new();
    for path in &loaded.paths {
        if let Some(live) = current.find_path(path.source.id, path.target.id) {
            substitutions
                .entry(path.source.adapter_id.low)
                .or_insert(live.source.adapter_id.low);
        }
    }
    debug!(?substitutions, "adapter id substitutions");

    // Every entry is looked up by its stored value, so substitutions never chain
    let substitute = |low: u32| substitutions.get(&low).copied().unwrap_or(low);
    let mut candidate = loaded.clone();
    for path in &mut candidate.paths {
        path.source.adapter_id.low = substitute(path.source.adapter_id.low);
        path.target.adapter_id.low = substitute(path.target.adapter_id.low);
    }
    for mode in &mut candidate.modes {
        mode.adapter_id.low = substitute(mode.adapter_id.low);
    }
    candidate
}
