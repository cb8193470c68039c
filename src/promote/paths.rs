//! Promotion instruction set

use std::collections::{BTreeMap, BTreeSet};

use crate::model::StoreKey;
use crate::repo::PathsPromoteRequest;

/// Paths to promote, keyed by (source, target).
///
/// The repository manager promotes one pair atomically, so every path for
/// a pair is coalesced into a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotionPaths {
    pairs: BTreeMap<(StoreKey, StoreKey), BTreeSet<String>>,
}

impl PromotionPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, source: &StoreKey, target: &StoreKey, path: impl Into<String>) {
        self.pairs
            .entry((source.clone(), target.clone()))
            .or_default()
            .insert(path.into());
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of (source, target) pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Paths for one pair
    pub fn paths(&self, source: &StoreKey, target: &StoreKey) -> Option<&BTreeSet<String>> {
        self.pairs.get(&(source.clone(), target.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StoreKey, &StoreKey, &BTreeSet<String>)> {
        self.pairs
            .iter()
            .map(|((source, target), paths)| (source, target, paths))
    }

    /// One promotion request per pair, purge-source off.
    pub fn requests(&self) -> Vec<PathsPromoteRequest> {
        self.iter()
            .map(|(source, target, paths)| {
                PathsPromoteRequest::new(
                    source.clone(),
                    target.clone(),
                    paths.iter().cloned().collect(),
                )
            })
            .collect()
    }
}
