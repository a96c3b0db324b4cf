//! Windowed stages over bounded history.

pub mod tail;

pub use tail::Tail;
