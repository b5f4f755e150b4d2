//! Scripted in-memory display configuration for tests
//!
//! Queries return the scripted "live" paths and modes verbatim. An apply
//! succeeds only if the submitted topology equals one of the accepted ones,
//! in which case it becomes the new live topology.

use std::cell::RefCell;
use std::collections::HashMap;

use super::{ApplyFlags, DisplayConfigApi, QueryFlags, StatusCode};
use crate::topology::{AdapterId, DisplayMode, DisplayPath, MonitorIdentity, TopologySnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedApply {
    pub paths: Vec<DisplayPath>,
    pub modes: Vec<DisplayMode>,
    pub flags: ApplyFlags,
    pub accepted: bool,
}

#[derive(Debug)]
pub struct FakeDisplayConfig {
    live_paths: RefCell<Vec<DisplayPath>>,
    live_modes: RefCell<Vec<DisplayMode>>,
    identities: HashMap<(AdapterId, u32), MonitorIdentity>,
    accepted: Vec<(Vec<DisplayPath>, Vec<DisplayMode>)>,
    size_failure: Option<StatusCode>,
    query_failure: Option<StatusCode>,
    relaxed_only: bool,
    pub applies: RefCell<Vec<RecordedApply>>,
    pub queries: RefCell<Vec<QueryFlags>>,
}

impl FakeDisplayConfig {
    /// Live system showing `live`; only `live` itself is accepted
    pub fn new(live: &TopologySnapshot) -> Self {
        let identities = live
            .modes
            .iter()
            .filter_map(|mode| {
                mode.valid_identity()
                    .map(|identity| ((mode.adapter_id, mode.id), identity.clone()))
            })
            .collect();
        let platform_view = live.platform_view();

        Self {
            live_paths: RefCell::new(platform_view.0.clone()),
            live_modes: RefCell::new(platform_view.1.clone()),
            identities,
            accepted: vec![platform_view],
            size_failure: None,
            query_failure: None,
            relaxed_only: false,
            applies: RefCell::new(Vec::new()),
            queries: RefCell::new(Vec::new()),
        }
    }

    /// Raw query result, including filler modes and unavailable paths
    pub fn with_raw(paths: Vec<DisplayPath>, modes: Vec<DisplayMode>) -> Self {
        let fake = Self::new(&TopologySnapshot::default());
        *fake.live_paths.borrow_mut() = paths;
        *fake.live_modes.borrow_mut() = modes;
        fake
    }

    /// Replace the set of topologies the platform will accept
    pub fn accepting(mut self, accepted: &[&TopologySnapshot]) -> Self {
        self.accepted = accepted.iter().map(|snapshot| snapshot.platform_view()).collect();
        self
    }

    pub fn with_identity(mut self, adapter_id: AdapterId, target_id: u32, identity: MonitorIdentity) -> Self {
        self.identities.insert((adapter_id, target_id), identity);
        self
    }

    pub fn without_identities(mut self) -> Self {
        self.identities.clear();
        self
    }

    pub fn failing_sizes(mut self, status: StatusCode) -> Self {
        self.size_failure = Some(status);
        self
    }

    pub fn failing_query(mut self, status: StatusCode) -> Self {
        self.query_failure = Some(status);
        self
    }

    /// Accepted topologies need the allow-changes flag
    pub fn relaxed_only(mut self) -> Self {
        self.relaxed_only = true;
        self
    }

    pub fn live(&self) -> (Vec<DisplayPath>, Vec<DisplayMode>) {
        (self.live_paths.borrow().clone(), self.live_modes.borrow().clone())
    }

    pub fn apply_count(&self) -> usize {
        self.applies.borrow().len()
    }

    pub fn last_accepted(&self) -> Option<RecordedApply> {
        self.applies.borrow().iter().rev().find(|apply| apply.accepted).cloned()
    }
}

impl DisplayConfigApi for FakeDisplayConfig {
    fn buffer_sizes(&self, flags: QueryFlags) -> Result<(u32, u32), StatusCode> {
        self.queries.borrow_mut().push(flags);
        if let Some(status) = self.size_failure {
            return Err(status);
        }
        Ok((
            self.live_paths.borrow().len() as u32,
            self.live_modes.borrow().len() as u32,
        ))
    }

    fn query_config(
        &self,
        _flags: QueryFlags,
        path_count: u32,
        mode_count: u32,
    ) -> Result<(Vec<DisplayPath>, Vec<DisplayMode>), StatusCode> {
        if let Some(status) = self.query_failure {
            return Err(status);
        }
        let (paths, modes) = self.live();
        if paths.len() > path_count as usize || modes.len() > mode_count as usize {
            return Err(StatusCode::InsufficientBuffer);
        }
        Ok((paths, modes))
    }

    fn target_identity(
        &self,
        adapter_id: AdapterId,
        target_id: u32,
    ) -> Result<MonitorIdentity, StatusCode> {
        self.identities
            .get(&(adapter_id, target_id))
            .cloned()
            .ok_or(StatusCode::InvalidParameter)
    }

    fn apply_config(
        &self,
        paths: &[DisplayPath],
        modes: &[DisplayMode],
        flags: ApplyFlags,
    ) -> Result<(), StatusCode> {
        let modes: Vec<DisplayMode> = modes.iter().map(DisplayMode::without_identity).collect();
        let matches = self
            .accepted
            .iter()
            .any(|(accepted_paths, accepted_modes)| accepted_paths == paths && *accepted_modes == modes);
        let accepted = matches && (!self.relaxed_only || flags.allows_changes());

        self.applies.borrow_mut().push(RecordedApply {
            paths: paths.to_vec(),
            modes: modes.clone(),
            flags,
            accepted,
        });

        if !accepted {
            return Err(StatusCode::BadConfiguration);
        }
        *self.live_paths.borrow_mut() = paths.to_vec();
        *self.live_modes.borrow_mut() = modes;
        Ok(())
    }
}
