use lazypipe_operators::OpError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("pipeline document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("step encoding: {0}")]
    Json(#[from] serde_json::Error),

    #[error("step {index} ({key}): {source}")]
    Stage {
        index: usize,
        key: String,
        #[source]
        source: OpError,
    },

    #[error("invalid source: {0}")]
    Source(String),

    #[error(transparent)]
    Core(#[from] lazypipe_core::Error),
}
