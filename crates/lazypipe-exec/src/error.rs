use lazypipe_operators::OpError;
use lazypipe_planner::PlanError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    Op(#[from] OpError),

    #[error(transparent)]
    Core(#[from] lazypipe_core::Error),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("run exceeded the step limit of {0} item deliveries")]
    StepLimit(u64),

    #[error("engine used after destroy()")]
    Destroyed,
}

impl ExecError {
    /// A control verb was used outside its legal context.
    pub fn is_structural(&self) -> bool {
        match self {
            ExecError::Op(e) => e.is_structural(),
            ExecError::Core(e) => e.is_structural(),
            _ => false,
        }
    }
}
