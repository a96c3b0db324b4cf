#![forbid(unsafe_code)]
//! lazypipe-core: values, items, producers, strategy traits, and the
//! Signal/Pipe/Source control-flow core shared by every other crate.
//!
//! Design intent:
//! - No stages and no driver loop here; `lazypipe-operators` defines stages
//!   against the `Signal` API and `lazypipe-exec` drives them.
//! - Everything is single-threaded: strategies are shared through `Rc`.

pub mod collector;
pub mod config;
pub mod error;
pub mod flow;
pub mod hash;
pub mod id;
pub mod item;
pub mod manifest;
pub mod prelude;
pub mod producer;
pub mod strategy;
pub mod value;

/// Engine version recorded in run manifests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{Error, Result};
pub use item::Item;
pub use value::Value;
