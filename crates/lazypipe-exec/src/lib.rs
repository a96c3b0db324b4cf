#![forbid(unsafe_code)]
//! lazypipe-exec: the push-driven driver loop, the pipeline builder and
//! run manifests.
//!
//! A [`Pipeline`] is a producer plus a chain of stages. It can be consumed
//! two ways:
//! - pushed, through an [`Engine`] that owns the `Signal` and lets stages
//!   reshape the run (restart, continue, limit, forget, ...);
//! - pulled, by folding every stage's `transform` over the producer's items.
//!
//! Both yield the same items in the same order.

pub mod engine;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod sub;

pub use engine::Engine;
pub use error::ExecError;
pub use metrics::RunMetrics;
pub use pipeline::{Pipeline, RunOutput};
pub use sub::sub_pipeline;
