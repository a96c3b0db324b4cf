//! Ordering stages: full sort, reversal, and bounded top-K.

pub mod topk;

use lazypipe_core::flow::{Flow, Signal};
use lazypipe_core::producer::VecProducer;
use lazypipe_core::strategy::SharedComparator;
use lazypipe_core::Item;

use crate::plan::StagePlan;
use crate::stream::{self, ItemStream};
use crate::traits::{OpError, Operation};

pub use topk::TopK;

fn stable_sort(items: &mut [Item], cmp: &SharedComparator) {
    items.sort_by(|a, b| cmp.compare(&a.value, &b.value, &a.key, &b.key));
}

/// Buffers everything, then re-emits in comparator order (stable).
pub struct Sort {
    comparator: SharedComparator,
    buffer: Vec<Item>,
}

impl Sort {
    pub fn new(comparator: SharedComparator) -> Self {
        Self {
            comparator,
            buffer: Vec::new(),
        }
    }
}

impl Operation for Sort {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::buffering(self.name())
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        self.buffer.push(signal.take_item());
        Ok(Flow::Consumed)
    }

    fn streaming_finished(&mut self, signal: &mut Signal) -> Result<(), OpError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let mut items = std::mem::take(&mut self.buffer);
        stable_sort(&mut items, &self.comparator);
        let next = signal.here().next();
        signal.restart_with(Box::new(VecProducer::new(items)), next)?;
        Ok(())
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let comparator = self.comparator;
        stream::deferred(input, move |input| {
            let mut items = stream::collect_all(input)?;
            stable_sort(&mut items, &comparator);
            Ok(items)
        })
    }

    fn destroy(&mut self) {
        self.buffer = Vec::new();
    }
}

/// Buffers everything, then re-emits last to first.
#[derive(Default)]
pub struct Reverse {
    buffer: Vec<Item>,
}

impl Operation for Reverse {
    fn name(&self) -> &'static str {
        "reverse"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::buffering(self.name())
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        self.buffer.push(signal.take_item());
        Ok(Flow::Consumed)
    }

    fn streaming_finished(&mut self, signal: &mut Signal) -> Result<(), OpError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let mut items = std::mem::take(&mut self.buffer);
        items.reverse();
        let next = signal.here().next();
        signal.restart_with(Box::new(VecProducer::new(items)), next)?;
        Ok(())
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        stream::deferred(input, |input| {
            let mut items = stream::collect_all(input)?;
            items.reverse();
            Ok(items)
        })
    }

    fn destroy(&mut self) {
        self.buffer = Vec::new();
    }
}
