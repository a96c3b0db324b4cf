//! Control-flow core: the cursor state ([`Pipe`]), the feed state machine
//! ([`Source`]) and the per-run control object ([`Signal`]) stages talk to.

mod pipe;
mod signal;
mod source;

pub use pipe::Pipe;
pub use signal::{Signal, SignalCounters};
pub use source::Source;

/// What a stage did with the live item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Hand the item to the next stage.
    Forward,
    /// The item stops here (dropped, buffered, or replaced by a new source).
    Consumed,
}
