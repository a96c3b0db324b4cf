//! Stage planning surface reported to `explain`.

use serde::Serialize;

/// How much a stage holds on to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageKind {
    /// One item in, at most a few out; nothing retained.
    Streaming,
    /// Retains its whole input until end-of-stream.
    Buffering,
    /// Retains at most `capacity` items.
    Bounded { capacity: usize },
}

/// What a stage is and which control verbs it may use.
#[derive(Debug, Clone, Serialize)]
pub struct StagePlan {
    pub name: &'static str,
    #[serde(flatten)]
    pub kind: StageKind,
    pub verbs: &'static [&'static str],
}

impl StagePlan {
    pub fn streaming(name: &'static str) -> Self {
        Self {
            name,
            kind: StageKind::Streaming,
            verbs: &[],
        }
    }

    pub fn buffering(name: &'static str) -> Self {
        Self {
            name,
            kind: StageKind::Buffering,
            verbs: &["restart_with"],
        }
    }

    pub fn bounded(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            kind: StageKind::Bounded { capacity },
            verbs: &["restart_with"],
        }
    }

    pub fn with_verbs(mut self, verbs: &'static [&'static str]) -> Self {
        self.verbs = verbs;
        self
    }

    pub fn retains_input(&self) -> bool {
        !matches!(self.kind, StageKind::Streaming)
    }
}
