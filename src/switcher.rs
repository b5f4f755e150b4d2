//! Save and restore whole display topologies

use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::persistence::{self, StorageError};
use crate::platform::DisplayConfigApi;
use crate::query::{QueryError, query_topology};
use crate::reconcile::{ApplyError, Tier, reconcile_and_apply};
use crate::topology::{self, TopologySnapshot};

#[derive(Debug, Error)]
pub enum SwitchError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Apply(#[from] ApplyError),
}

/// Entry point for callers; owns the platform backend
#[derive(Debug)]
pub struct DisplaySwitcher<A: DisplayConfigApi> {
    api: A,
}

impl<A: DisplayConfigApi> DisplaySwitcher<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn query_current(&self, active_only: bool) -> Result<TopologySnapshot, QueryError> {
        query_topology(&self.api, active_only)
    }

    /// Capture the active topology into `path`
    pub fn save_snapshot(&self, path: &Path) -> Result<TopologySnapshot, SwitchError> {
        let snapshot = self.query_current(true)?;
        persistence::save_snapshot(path, &snapshot)?;
        Ok(snapshot)
    }

    /// Restore the topology stored in `path`; returns the tier that worked
    pub fn load_and_apply_snapshot(
        &self,
        path: &Path,
        match_adapter_ids: bool,
    ) -> Result<Tier, SwitchError> {
        let snapshot = persistence::load_snapshot(path)?;
        let tier = reconcile_and_apply(&self.api, &snapshot, match_adapter_ids)?;
        info!(path = %path.display(), %tier, "display snapshot restored");
        Ok(tier)
    }

    pub fn printable_representation(&self, snapshot: &TopologySnapshot) -> String {
        topology::printable_representation(snapshot)
    }
}
