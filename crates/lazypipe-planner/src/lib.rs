#![forbid(unsafe_code)]
//! lazypipe-planner: YAML pipeline documents → rewritten step list →
//! physical program (source + stage bindings).
//!
//! Design:
//! - Steps are a tagged enum (`op: <name>`), one variant per stage key.
//! - `rules` applies small order-preserving rewrites (sort+limit → top_k).
//! - Lowering turns each step into a `StageBinding {key, config}` and checks
//!   it against the operator registry, so bad arguments and wrong strategy
//!   arity are reported before anything runs.
//! - exec instantiates the bindings through the same registry.

pub mod dsl;
pub mod error;
pub mod lower;
pub mod physical;
pub mod rules;

pub use dsl::yaml::{parse_yaml_pipeline, PipelineDoc, SourceSpec, Step};
pub use error::PlanError;
pub use lower::{lower_to_physical, plan_yaml};
pub use physical::{PhysicalProgram, StageBinding};
