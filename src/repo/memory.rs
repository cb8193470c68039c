//! In-memory repository manager
//!
//! Keeps stores, content paths and tracking reports in process. Any
//! operation can be made to fail, and the most recent calls are recorded, so
//! the driver can run end to end without a real repository manager.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{
    ArtifactStore, PathsPromoteRequest, PathsPromoteResult, RepoError, RepoResult,
    RepositoryManager, ValidationResult,
};
use crate::model::{StoreKey, TrackedContent};

/// Repository manager operation, for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    StoreExists,
    CreateStore,
    LoadStore,
    UpdateStore,
    DeleteStore,
    PromoteByPath,
    RollbackPathPromote,
    InitTrackingReport,
    SealTrackingRecord,
    GetTrackingReport,
}

/// Number of calls kept in the call log; older calls are dropped.
pub const CALL_LOG_CAPACITY: usize = 1024;

/// A recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateStore(StoreKey),
    UpdateStore(ArtifactStore),
    DeleteStore(StoreKey),
    Promote(PathsPromoteRequest),
    Rollback(PathsPromoteRequest),
    InitTrackingReport(String),
    SealTrackingRecord(String),
    GetTrackingReport(String),
}

#[derive(Debug, Default)]
struct State {
    stores: BTreeMap<StoreKey, ArtifactStore>,
    content: HashMap<StoreKey, BTreeSet<String>>,
    reports: HashMap<String, TrackedContent>,
    sealed: BTreeSet<String>,
    failures: HashMap<Operation, String>,
    rejections: HashMap<StoreKey, ValidationResult>,
    calls: VecDeque<Call>,
}

impl State {
    fn record(&mut self, call: Call) {
        if self.calls.len() == CALL_LOG_CAPACITY {
            self.calls.pop_front();
        }
        self.calls.push_back(call);
    }

    fn check(&self, op: Operation) -> RepoResult<()> {
        match self.failures.get(&op) {
            Some(reason) => Err(RepoError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

/// Repository manager held entirely in memory.
#[derive(Debug)]
pub struct InMemoryRepositoryManager {
    base_url: String,
    state: Mutex<State>,
}

impl Default for InMemoryRepositoryManager {
    fn default() -> Self {
        Self::new("http://localhost")
    }
}

impl InMemoryRepositoryManager {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace a store
    pub fn add_store(&self, store: ArtifactStore) {
        self.state().stores.insert(store.key.clone(), store);
    }

    /// Register a tracking report, as a build would produce it
    pub fn put_tracking_report(&self, report: TrackedContent) {
        self.state().reports.insert(report.key.id.clone(), report);
    }

    /// Make every later call of `op` fail with `reason`
    pub fn fail(&self, op: Operation, reason: impl Into<String>) {
        self.state().failures.insert(op, reason.into());
    }

    pub fn clear_failure(&self, op: Operation) {
        self.state().failures.remove(&op);
    }

    /// Reject every promotion into `target` with the given validation result
    pub fn reject_promotions_to(&self, target: StoreKey, validations: ValidationResult) {
        self.state().rejections.insert(target, validations);
    }

    pub fn store(&self, key: &StoreKey) -> Option<ArtifactStore> {
        self.state().stores.get(key).cloned()
    }

    /// Paths currently held by a store
    pub fn content(&self, key: &StoreKey) -> BTreeSet<String> {
        self.state().content.get(key).cloned().unwrap_or_default()
    }

    pub fn is_sealed(&self, build_id: &str) -> bool {
        self.state().sealed.contains(build_id)
    }

    /// Recorded calls, oldest first, at most `CALL_LOG_CAPACITY`
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.iter().cloned().collect()
    }

    /// Promotion requests, in order
    pub fn promotions(&self) -> Vec<PathsPromoteRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Promote(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    /// Requests of rolled back promotions, in order
    pub fn rollbacks(&self) -> Vec<PathsPromoteRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Rollback(request) => Some(request),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl RepositoryManager for InMemoryRepositoryManager {
    async fn store_exists(&self, key: &StoreKey) -> RepoResult<bool> {
        let state = self.state();
        state.check(Operation::StoreExists)?;
        Ok(state.stores.contains_key(key))
    }

    async fn create_store(&self, store: &ArtifactStore, _changelog: &str) -> RepoResult<()> {
        let mut state = self.state();
        state.check(Operation::CreateStore)?;
        state.record(Call::CreateStore(store.key.clone()));
        state.stores.insert(store.key.clone(), store.clone());
        Ok(())
    }

    async fn load_store(&self, key: &StoreKey) -> RepoResult<ArtifactStore> {
        let state = self.state();
        state.check(Operation::LoadStore)?;
        state
            .stores
            .get(key)
            .cloned()
            .ok_or_else(|| RepoError::StoreNotFound(key.to_string()))
    }

    async fn update_store(&self, store: &ArtifactStore, _changelog: &str) -> RepoResult<()> {
        let mut state = self.state();
        state.check(Operation::UpdateStore)?;
        state.record(Call::UpdateStore(store.clone()));
        if !state.stores.contains_key(&store.key) {
            return Err(RepoError::StoreNotFound(store.key.to_string()));
        }
        state.stores.insert(store.key.clone(), store.clone());
        Ok(())
    }

    async fn delete_store(&self, key: &StoreKey, _changelog: &str) -> RepoResult<()> {
        let mut state = self.state();
        state.check(Operation::DeleteStore)?;
        state.record(Call::DeleteStore(key.clone()));
        state.stores.remove(key);
        Ok(())
    }

    async fn promote_by_path(
        &self,
        request: &PathsPromoteRequest,
    ) -> RepoResult<PathsPromoteResult> {
        let mut state = self.state();
        state.check(Operation::PromoteByPath)?;
        state.record(Call::Promote(request.clone()));

        if let Some(validations) = state.rejections.get(&request.target) {
            return Ok(PathsPromoteResult::rejected(
                request.clone(),
                None,
                Some(validations.clone()),
            ));
        }
        for key in [&request.source, &request.target] {
            if !state.stores.contains_key(key) {
                return Ok(PathsPromoteResult::rejected(
                    request.clone(),
                    Some(format!("No such store: {}", key)),
                    None,
                ));
            }
        }

        let content = state.content.entry(request.target.clone()).or_default();
        content.extend(request.paths.iter().cloned());
        Ok(PathsPromoteResult::completed(request.clone()))
    }

    async fn rollback_path_promote(
        &self,
        result: &PathsPromoteResult,
    ) -> RepoResult<PathsPromoteResult> {
        let mut state = self.state();
        state.check(Operation::RollbackPathPromote)?;
        state.record(Call::Rollback(result.request.clone()));

        if let Some(content) = state.content.get_mut(&result.request.target) {
            for path in &result.completed_paths {
                content.remove(path);
            }
        }
        let mut rolled_back = result.clone();
        rolled_back.pending_paths = std::mem::take(&mut rolled_back.completed_paths);
        Ok(rolled_back)
    }

    async fn init_tracking_report(&self, build_id: &str) -> RepoResult<()> {
        let mut state = self.state();
        state.check(Operation::InitTrackingReport)?;
        state.record(Call::InitTrackingReport(build_id.to_string()));
        state
            .reports
            .entry(build_id.to_string())
            .or_insert_with(|| TrackedContent::new(build_id));
        Ok(())
    }

    async fn seal_tracking_record(&self, build_id: &str) -> RepoResult<bool> {
        let mut state = self.state();
        state.check(Operation::SealTrackingRecord)?;
        state.record(Call::SealTrackingRecord(build_id.to_string()));
        if !state.reports.contains_key(build_id) {
            return Ok(false);
        }
        state.sealed.insert(build_id.to_string());
        Ok(true)
    }

    async fn get_tracking_report(&self, build_id: &str) -> RepoResult<Option<TrackedContent>> {
        let mut state = self.state();
        state.check(Operation::GetTrackingReport)?;
        state.record(Call::GetTrackingReport(build_id.to_string()));
        Ok(state.reports.get(build_id).cloned())
    }

    fn tracking_url(&self, build_id: &str, key: &StoreKey) -> String {
        format!(
            "{}/api/folo/track/{}/{}/{}/{}",
            self.base_url,
            build_id,
            key.package_type(),
            key.store_type(),
            key.name()
        )
    }
}
