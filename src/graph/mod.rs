// src/graph/mod.rs

//! Job dependency graph: construction, validation and execution planning.
//!
//! - [`map`] builds the job → prerequisites mapping from configuration.
//! - [`validate`] checks the map for unknown/disabled prerequisites and
//!   cycles, producing actionable messages.
//! - [`plan`] expands a requested job selection to its transitive closure
//!   and produces a topologically sorted execution order.

pub mod map;
pub mod plan;
pub mod validate;

pub use map::{DependencyMap, build_dependency_map};
pub use plan::{ExecutionPlan, PlanOutcome, plan_execution};
pub use validate::{Severity, ValidationMessage, validate_graph};
