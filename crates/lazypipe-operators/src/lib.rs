#![forbid(unsafe_code)]
//! lazypipe-operators: the stages a pipeline is built from.
//!
//! Design intent:
//! - Every stage implements [`Operation`] twice over: `handle` for the
//!   push-driven run (talking to the `Signal`), and `transform` for the pure
//!   pull path over an [`ItemStream`]. Both must yield the same items in the
//!   same order.
//! - Buffering stages keep their algorithm in a small state type shared by
//!   both paths; bounded buffers come from `lazypipe-mem`.
//! - Stages never see their own index: they ask the signal (`here()`).

pub mod builtin;
pub mod expr;
pub mod plan;
pub mod registry;
pub mod stream;
pub mod traits;

pub mod chunk;
pub mod concat;
pub mod fanout;
pub mod filter;
pub mod flatten;
pub mod group;
pub mod limit;
pub mod map;
pub mod segregate;
pub mod sort;
pub mod window;

pub use fanout::handler::{Handler, HandlerFactory};
pub use plan::{StageKind, StagePlan};
pub use stream::ItemStream;
pub use traits::{OpError, Operation};
