//! Counting stages: `Limit(n)` and `Skip(n)`.

use lazypipe_core::flow::{Flow, Signal};

use crate::plan::StagePlan;
use crate::stream::ItemStream;
use crate::traits::{OpError, Operation};

/// First `n` items. Never pulls item `n + 1`.
pub struct Limit {
    n: usize,
    seen: usize,
}

impl Limit {
    pub fn new(n: usize) -> Self {
        Self { n, seen: 0 }
    }
}

impl Operation for Limit {
    fn name(&self) -> &'static str {
        "limit"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::streaming(self.name()).with_verbs(&["limit_reached"])
    }

    fn prepare(&mut self, signal: &mut Signal) -> Result<(), OpError> {
        self.seen = 0;
        if self.n == 0 {
            let here = signal.here();
            signal.limit_reached(here)?;
        }
        Ok(())
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        if self.seen >= self.n {
            return Ok(Flow::Consumed);
        }
        self.seen += 1;
        if self.seen == self.n {
            let here = signal.here();
            signal.limit_reached(here)?;
        }
        Ok(Flow::Forward)
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        Box::new(input.take(self.n))
    }
}

/// Drop the first `n` items, then step out of the chain.
pub struct Skip {
    n: usize,
    dropped: usize,
}

impl Skip {
    pub fn new(n: usize) -> Self {
        Self { n, dropped: 0 }
    }
}

impl Operation for Skip {
    fn name(&self) -> &'static str {
        "skip"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::streaming(self.name()).with_verbs(&["forget"])
    }

    fn prepare(&mut self, signal: &mut Signal) -> Result<(), OpError> {
        self.dropped = 0;
        if self.n == 0 {
            let here = signal.here();
            signal.forget(here)?;
        }
        Ok(())
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        if self.dropped >= self.n {
            return Ok(Flow::Forward);
        }
        self.dropped += 1;
        if self.dropped == self.n {
            let here = signal.here();
            signal.forget(here)?;
        }
        Ok(Flow::Consumed)
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let mut left = self.n;
        Box::new(input.filter(move |r| {
            if r.is_err() || left == 0 {
                return true;
            }
            left -= 1;
            false
        }))
    }
}
