// src/graph/validate.rs

//! Structural validation of the dependency map.
//!
//! Three checks, in order: unknown prerequisites (errors), disabled
//! prerequisites (warnings), cycles (errors, reported with the offending
//! path). Messages with identical text are emitted at most once.

use std::collections::{HashMap, HashSet};

use crate::config::model::JobConfig;
use crate::graph::map::DependencyMap;

/// Severity of a validation message.
///
/// Any `Error` must abort the run before execution planning; warnings are
/// informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// One finding from graph validation, with remediation advice.
#[derive(Debug, Clone)]
pub struct ValidationMessage {
    pub severity: Severity,
    pub text: String,
    pub advice: String,
}

/// Collects messages, suppressing duplicates by text across all checks.
struct MessageSink {
    seen: HashSet<String>,
    messages: Vec<ValidationMessage>,
}

impl MessageSink {
    fn new() -> Self {
        Self {
            seen: HashSet::new(),
            messages: Vec::new(),
        }
    }

    fn push(&mut self, severity: Severity, text: String, advice: impl Into<String>) {
        if self.seen.insert(text.clone()) {
            self.messages.push(ValidationMessage {
                severity,
                text,
                advice: advice.into(),
            });
        }
    }
}

/// Validate the dependency map against the universe of defined jobs.
///
/// Does not mutate the map; returns an empty vector if the graph is fully
/// valid.
pub fn validate_graph(
    jobs: &std::collections::BTreeMap<String, JobConfig>,
    map: &DependencyMap,
) -> Vec<ValidationMessage> {
    let mut sink = MessageSink::new();

    check_references(jobs, map, &mut sink);
    check_cycles(map, &mut sink);

    sink.messages
}

/// Unknown-dependency errors and disabled-dependency warnings.
fn check_references(
    jobs: &std::collections::BTreeMap<String, JobConfig>,
    map: &DependencyMap,
    sink: &mut MessageSink,
) {
    for (name, deps) in map.iter() {
        for dep in deps.iter() {
            match jobs.get(dep) {
                None => {
                    sink.push(
                        Severity::Error,
                        format!("job '{}' depends on '{}', which is not defined", name, dep),
                        format!(
                            "check `depends_on` of job '{}' for typos, or define job '{}'",
                            name, dep
                        ),
                    );
                }
                Some(dep_job) if !dep_job.enabled => {
                    sink.push(
                        Severity::Warning,
                        format!("job '{}' depends on '{}', which is disabled", name, dep),
                        format!(
                            "job '{}' will be skipped at run time unless '{}' is enabled",
                            name, dep
                        ),
                    );
                }
                Some(_) => {}
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Cycle detection via three-color depth-first search.
///
/// Iterative with an explicit frame stack, so arbitrarily deep chains cannot
/// overflow the call stack. Each node starts `White`; entering the walk marks
/// it `Gray`, finishing marks it `Black`. Meeting a `Gray` node signals a
/// cycle, reported as the accumulated path (`a -> b -> c -> a`). Only white
/// nodes are used as entry points, so the whole graph is covered in O(V+E).
///
/// Prerequisites that are not keys of the map are skipped here; they were
/// already reported by the reference check.
fn check_cycles(map: &DependencyMap, sink: &mut MessageSink) {
    let mut colors: HashMap<&str, Color> =
        map.keys().map(|name| (name.as_str(), Color::White)).collect();

    for start in map.keys() {
        if colors.get(start.as_str()) != Some(&Color::White) {
            continue;
        }

        // (node, index of the next prerequisite to visit)
        let mut stack: Vec<(&str, usize)> = vec![(start.as_str(), 0)];
        // Gray nodes in visit order; parallels `stack`.
        let mut path: Vec<&str> = vec![start.as_str()];
        colors.insert(start.as_str(), Color::Gray);

        loop {
            let (node, next) = match stack.last_mut() {
                Some(frame) => {
                    let node = frame.0;
                    let next = frame.1;
                    frame.1 += 1;
                    (node, next)
                }
                None => break,
            };

            let deps = match map.get(node) {
                Some(deps) => deps,
                None => {
                    // Cannot happen: only map keys are pushed.
                    stack.pop();
                    path.pop();
                    continue;
                }
            };

            if next >= deps.len() {
                colors.insert(node, Color::Black);
                stack.pop();
                path.pop();
                continue;
            }

            let dep = deps[next].as_str();
            match colors.get(dep).copied() {
                None => {
                    // Unknown prerequisite; already reported above.
                }
                Some(Color::White) => {
                    colors.insert(dep, Color::Gray);
                    stack.push((dep, 0));
                    path.push(dep);
                }
                Some(Color::Gray) => {
                    let cycle_start = path.iter().position(|n| *n == dep).unwrap_or(0);
                    let mut cycle: Vec<&str> = path[cycle_start..].to_vec();
                    cycle.push(dep);
                    sink.push(
                        Severity::Error,
                        format!("dependency cycle detected: {}", cycle.join(" -> ")),
                        "break the cycle by removing one of the `depends_on` entries involved",
                    );
                }
                Some(Color::Black) => {}
            }
        }
    }
}
