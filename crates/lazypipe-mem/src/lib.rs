#![forbid(unsafe_code)]
//! lazypipe-mem: fixed-capacity buffers backing the stateful stages.
//!
//! - [`CircularBuffer`]: last-N history in arrival order (tail).
//! - [`BoundedTopK`]: the K best items of a stream in O(N log K).
//! - [`Segregator`]: sorted equivalence-class buckets with optional caps.
//!
//! Everything here is generic over the element type and the ordering; the
//! stages in `lazypipe-operators` supply `Item`s and strategy comparators.

pub mod buckets;
pub mod error;
pub mod ring;
pub mod topk;

pub use buckets::{Bucket, Placement, Segregator};
pub use error::{Error, Result};
pub use ring::CircularBuffer;
pub use topk::BoundedTopK;
