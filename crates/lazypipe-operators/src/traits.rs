//! Operation trait + common interfaces.
//!
//! The driver calls `prepare` once on every stage before the first item,
//! `handle` for each item that reaches the stage, and `streaming_finished`
//! once natural end-of-stream reaches it. `transform` is the independent pull
//! path and consumes the stage.

use lazypipe_core::flow::{Flow, Signal};
use lazypipe_core::Value;

use thiserror::Error;

use crate::plan::StagePlan;
use crate::stream::ItemStream;

#[derive(Debug, Error)]
pub enum OpError {
    #[error("invalid stage configuration: {0}")]
    Config(String),

    #[error("strategy contract violated: {0}")]
    Contract(String),

    #[error("no branch declared for discriminator label '{0}'")]
    UnmappedLabel(Value),

    #[error("execution error: {0}")]
    Exec(String),

    #[error(transparent)]
    Core(#[from] lazypipe_core::Error),

    #[error(transparent)]
    Buffer(#[from] lazypipe_mem::Error),
}

impl OpError {
    /// Control verbs used outside their legal context.
    pub fn is_structural(&self) -> bool {
        matches!(self, OpError::Core(e) if e.is_structural())
    }
}

/// Trait that every stage implements.
///
/// Invariants:
/// - `handle` either forwards the live item (`Flow::Forward`) or finishes
///   with it (`Flow::Consumed`); anything retained is taken or cloned.
/// - Pushing a sequence through `handle` + `streaming_finished` and pulling
///   it through `transform` yield the same ordered items.
pub trait Operation {
    /// Human-readable stage name (stable).
    fn name(&self) -> &'static str;

    fn plan(&self) -> StagePlan;

    fn prepare(&mut self, _signal: &mut Signal) -> Result<(), OpError> {
        Ok(())
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError>;

    /// Natural end-of-stream. Buffering stages inject their results here
    /// with `restart_with`.
    fn streaming_finished(&mut self, _signal: &mut Signal) -> Result<(), OpError> {
        Ok(())
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream;

    /// Release buffers and handlers. Called once per stage; must tolerate
    /// repeated calls.
    fn destroy(&mut self) {}
}

pub type BoxOperation = Box<dyn Operation>;
