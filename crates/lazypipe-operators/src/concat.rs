//! Concatenation: items from another producer before or after the input.

use lazypipe_core::flow::{Flow, Signal};
use lazypipe_core::producer::{BoxProducer, EmptyProducer};

use crate::plan::StagePlan;
use crate::stream::ItemStream;
use crate::traits::{OpError, Operation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrependPhase {
    /// No item has reached the stage yet.
    Waiting,
    /// The prefix is running; the held-back item will come back here.
    Injected,
}

/// Emit `producer`'s items before the first input item.
///
/// The first item to arrive is pushed back and the stage takes over the
/// head, so when the prefix runs dry the held item re-enters here rather
/// than at the top of the chain. The stage then hands the head back and
/// splices itself out.
pub struct Prepend {
    producer: Option<BoxProducer>,
    phase: PrependPhase,
}

impl Prepend {
    pub fn new(producer: BoxProducer) -> Self {
        Self {
            producer: Some(producer),
            phase: PrependPhase::Waiting,
        }
    }

    fn take_producer(&mut self) -> BoxProducer {
        self.producer
            .take()
            .unwrap_or_else(|| Box::new(EmptyProducer))
    }
}

impl Operation for Prepend {
    fn name(&self) -> &'static str {
        "prepend"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::streaming(self.name()).with_verbs(&[
            "push_back",
            "swap_head",
            "continue_with",
            "restore_head",
            "forget",
            "restart_with",
        ])
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        let here = signal.here();
        match self.phase {
            PrependPhase::Waiting => {
                let held = signal.take_item();
                signal.push_back(held);
                signal.swap_head(here)?;
                let prefix = self.take_producer();
                signal.continue_with(prefix, here.next())?;
                self.phase = PrependPhase::Injected;
                Ok(Flow::Consumed)
            }
            PrependPhase::Injected => {
                signal.restore_head()?;
                signal.forget(here)?;
                Ok(Flow::Forward)
            }
        }
    }

    /// Empty input: the prefix is all there is.
    fn streaming_finished(&mut self, signal: &mut Signal) -> Result<(), OpError> {
        if self.phase == PrependPhase::Waiting {
            let prefix = self.take_producer();
            let next = signal.here().next();
            signal.restart_with(prefix, next)?;
        }
        Ok(())
    }

    fn transform(mut self: Box<Self>, input: ItemStream) -> ItemStream {
        let mut prefix = Some(self.take_producer());
        let head = std::iter::from_fn(move || prefix.take())
            .flat_map(|mut p| p.open())
            .map(Ok);
        Box::new(head.chain(input))
    }

    fn destroy(&mut self) {
        if let Some(mut p) = self.producer.take() {
            p.release();
        }
    }
}

/// Emit `producer`'s items after the input ends.
pub struct Append {
    producer: Option<BoxProducer>,
}

impl Append {
    pub fn new(producer: BoxProducer) -> Self {
        Self {
            producer: Some(producer),
        }
    }
}

impl Operation for Append {
    fn name(&self) -> &'static str {
        "append"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::streaming(self.name()).with_verbs(&["restart_with"])
    }

    fn handle(&mut self, _signal: &mut Signal) -> Result<Flow, OpError> {
        Ok(Flow::Forward)
    }

    fn streaming_finished(&mut self, signal: &mut Signal) -> Result<(), OpError> {
        if let Some(suffix) = self.producer.take() {
            let next = signal.here().next();
            signal.restart_with(suffix, next)?;
        }
        Ok(())
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let mut suffix = self.producer;
        let tail = std::iter::from_fn(move || suffix.take())
            .flat_map(|mut p| p.open())
            .map(Ok);
        Box::new(input.chain(tail))
    }

    fn destroy(&mut self) {
        if let Some(mut p) = self.producer.take() {
            p.release();
        }
    }
}
