// src/graph/map.rs

use std::collections::BTreeMap;

use crate::config::model::JobConfig;

/// Mapping from job name to its ordered list of prerequisite job names.
///
/// Built once per run from **all** defined jobs (not just the requested
/// ones) so that validation sees the whole universe. Keys are exactly the
/// defined job names; values preserve each job's `depends_on` declaration
/// order with whitespace trimmed and blank entries dropped.
pub type DependencyMap = BTreeMap<String, Vec<String>>;

/// Build the dependency map from every defined job, regardless of its
/// `enabled` flag.
///
/// Pure transformation: no validation, no I/O, deterministic for a given
/// input.
pub fn build_dependency_map(jobs: &BTreeMap<String, JobConfig>) -> DependencyMap {
    jobs.iter()
        .map(|(name, job)| (name.clone(), normalized_deps(&job.depends_on)))
        .collect()
}

/// Trim whitespace and drop blank entries, preserving declaration order.
pub(crate) fn normalized_deps(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|dep| dep.trim())
        .filter(|dep| !dep.is_empty())
        .map(str::to_string)
        .collect()
}
