// src/graph/plan.rs

//! Execution planning: closure expansion plus Kahn's algorithm.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use tracing::debug;

use crate::errors::{BackstopError, Result};
use crate::graph::map::DependencyMap;

/// Ordered sequence of job names in which every job appears after all of its
/// transitive prerequisites. Computed once per run; immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub jobs: Vec<String>,
}

/// Structured planning result.
///
/// Planning never fails with an `Err` for an ordering problem — only for
/// malformed input (a requested job absent from the map). A cycle among the
/// relevant jobs yields [`PlanOutcome::Cycle`] naming the jobs that could
/// not be ordered.
#[derive(Debug, Clone)]
pub enum PlanOutcome {
    Ordered(ExecutionPlan),
    Cycle {
        unordered: Vec<String>,
        message: String,
    },
}

/// Compute the execution order for the requested jobs.
///
/// 1. Expand the request to the transitive closure of its prerequisites
///    (breadth-first; terminates because the relevant set only grows and is
///    bounded by the number of defined jobs).
/// 2. Topologically sort the relevant set with Kahn's algorithm. The ready
///    queue is seeded with the zero-in-degree jobs in sorted name order and
///    processed FIFO, so the order is deterministic for a given map and
///    request.
/// 3. Re-verify completeness: if some relevant jobs could not be ordered, a
///    cycle exists among them. The validator reports cycles with full paths
///    before planning, but the planner checks independently.
pub fn plan_execution(requested: &[String], map: &DependencyMap) -> Result<PlanOutcome> {
    for name in requested {
        if !map.contains_key(name) {
            return Err(BackstopError::JobNotFound(name.clone()));
        }
    }

    let relevant = expand_closure(requested, map);
    debug!(
        requested = requested.len(),
        relevant = relevant.len(),
        "expanded request to relevant job set"
    );

    // Adjacency (prerequisite -> dependents) and in-degrees, restricted to
    // edges with both endpoints in the relevant set.
    let mut in_degree: BTreeMap<&str, usize> =
        relevant.iter().map(|name| (name.as_str(), 0)).collect();
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for name in relevant.iter() {
        for dep in map.get(name.as_str()).into_iter().flatten() {
            if !relevant.contains(dep) {
                continue;
            }
            if let Some(degree) = in_degree.get_mut(name.as_str()) {
                *degree += 1;
            }
            dependents.entry(dep.as_str()).or_default().push(name.as_str());
        }
    }

    // BTreeMap iteration gives the sorted-name seed order.
    let mut ready: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| *name)
        .collect();

    let mut ordered: Vec<String> = Vec::with_capacity(relevant.len());

    while let Some(job) = ready.pop_front() {
        ordered.push(job.to_string());
        for &dependent in dependents.get(job).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.push_back(dependent);
                }
            }
        }
    }

    if ordered.len() != relevant.len() {
        let placed: HashSet<&str> = ordered.iter().map(String::as_str).collect();
        let unordered: Vec<String> = relevant
            .iter()
            .filter(|name| !placed.contains(name.as_str()))
            .cloned()
            .collect();
        let message = format!(
            "cannot order jobs [{}]: they form a dependency cycle",
            unordered.join(", ")
        );
        return Ok(PlanOutcome::Cycle { unordered, message });
    }

    Ok(PlanOutcome::Ordered(ExecutionPlan { jobs: ordered }))
}

/// Breadth-first expansion of the requested jobs to include every transitive
/// prerequisite.
///
/// Prerequisites missing from the map never join the set (the validator has
/// already reported them; including them would make the sort operate on
/// undefined nodes).
fn expand_closure(requested: &[String], map: &DependencyMap) -> BTreeSet<String> {
    let mut relevant: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();

    for name in requested {
        if relevant.insert(name.clone()) {
            queue.push_back(name.clone());
        }
    }

    while let Some(job) = queue.pop_front() {
        for dep in map.get(&job).into_iter().flatten() {
            if !map.contains_key(dep) {
                continue;
            }
            if relevant.insert(dep.clone()) {
                queue.push_back(dep.clone());
            }
        }
    }

    relevant
}
