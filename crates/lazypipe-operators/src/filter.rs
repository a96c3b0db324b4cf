//! Predicate-driven stages: filter, take/skip while, find.

use lazypipe_core::flow::{Flow, Signal};
use lazypipe_core::strategy::SharedFilter;

use crate::plan::StagePlan;
use crate::stream::{self, ItemStream};
use crate::traits::{OpError, Operation};

pub struct Filter {
    pub predicate: SharedFilter,
}

impl Filter {
    pub fn new(predicate: SharedFilter) -> Self {
        Self { predicate }
    }
}

impl Operation for Filter {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::streaming(self.name())
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        let item = signal.item();
        if self.predicate.test(&item.value, &item.key) {
            Ok(Flow::Forward)
        } else {
            Ok(Flow::Consumed)
        }
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let predicate = self.predicate;
        stream::filter_ok(input, move |item| predicate.test(&item.value, &item.key))
    }
}

/// Forward items while the predicate holds; the first failure ends all input.
pub struct TakeWhile {
    pub predicate: SharedFilter,
}

impl Operation for TakeWhile {
    fn name(&self) -> &'static str {
        "take_while"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::streaming(self.name()).with_verbs(&["limit_reached"])
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        let item = signal.item();
        if self.predicate.test(&item.value, &item.key) {
            return Ok(Flow::Forward);
        }
        let here = signal.here();
        signal.limit_reached(here)?;
        Ok(Flow::Consumed)
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let predicate = self.predicate;
        Box::new(input.take_while(move |r| {
            r.as_ref()
                .map_or(true, |item| predicate.test(&item.value, &item.key))
        }))
    }
}

/// Drop items while the predicate holds, then step out of the chain.
pub struct SkipWhile {
    pub predicate: SharedFilter,
}

impl Operation for SkipWhile {
    fn name(&self) -> &'static str {
        "skip_while"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::streaming(self.name()).with_verbs(&["forget"])
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        let item = signal.item();
        if self.predicate.test(&item.value, &item.key) {
            return Ok(Flow::Consumed);
        }
        let here = signal.here();
        signal.forget(here)?;
        Ok(Flow::Forward)
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let predicate = self.predicate;
        Box::new(input.skip_while(move |r| {
            r.as_ref()
                .map_or(false, |item| predicate.test(&item.value, &item.key))
        }))
    }
}

/// Forward the first match, then take no further input.
///
/// Mid-chain the match still flows through the stages that follow and they
/// are finalized as usual. [`Find::ending_run`] stops the whole run instead,
/// for callers that only want the matching item.
pub struct Find {
    predicate: SharedFilter,
    ends_run: bool,
}

impl Find {
    pub fn new(predicate: SharedFilter) -> Self {
        Self {
            predicate,
            ends_run: false,
        }
    }

    pub fn ending_run(predicate: SharedFilter) -> Self {
        Self {
            predicate,
            ends_run: true,
        }
    }
}

impl Operation for Find {
    fn name(&self) -> &'static str {
        "find"
    }

    fn plan(&self) -> StagePlan {
        let verbs: &'static [&'static str] = if self.ends_run {
            &["stop"]
        } else {
            &["limit_reached"]
        };
        StagePlan::streaming(self.name()).with_verbs(verbs)
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        let item = signal.item();
        if !self.predicate.test(&item.value, &item.key) {
            return Ok(Flow::Consumed);
        }
        if self.ends_run {
            signal.stop();
        } else {
            let next = signal.here().next();
            signal.limit_reached(next)?;
        }
        Ok(Flow::Forward)
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let predicate = self.predicate;
        Box::new(
            input
                .filter(move |r| {
                    r.as_ref()
                        .map_or(true, |item| predicate.test(&item.value, &item.key))
                })
                .take(1),
        )
    }
}
