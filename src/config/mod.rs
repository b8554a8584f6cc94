// src/config/mod.rs

//! Configuration loading and validation for backstop.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate structural invariants, including the dependency graph
//!   (`validate.rs`).
//! - Resolve the effective per-job configuration from the job/global/CLI
//!   layers (`resolve.rs`).

pub mod loader;
pub mod model;
pub mod resolve;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, GlobalSection, JobConfig, RawConfigFile, SetConfig};
pub use resolve::{EffectiveJobConfig, resolve_job};
