//! Whole-input aggregation: grouping by label and folding.

use lazypipe_core::collector::{Collector, ItemCollector};
use lazypipe_core::flow::{Flow, Signal};
use lazypipe_core::producer::VecProducer;
use lazypipe_core::strategy::{SharedDiscriminator, SharedReducer};
use lazypipe_core::{Item, Value};

use crate::plan::StagePlan;
use crate::stream::{self, ItemStream};
use crate::traits::{OpError, Operation};

/// `label => [values]` for every label, in first-seen label order.
pub struct Group {
    discriminator: SharedDiscriminator,
    groups: ItemCollector,
}

impl Group {
    pub fn new(discriminator: SharedDiscriminator) -> Self {
        Self {
            discriminator,
            groups: ItemCollector::new(),
        }
    }
}

fn file_under(groups: &mut ItemCollector, discriminator: &SharedDiscriminator, item: Item) {
    let label = discriminator.classify(&item.value, &item.key).into_label();
    match groups.get_mut(&label) {
        Some(Value::List(values)) => values.push(item.value),
        _ => groups.set(label, Value::List(vec![item.value])),
    }
}

impl Operation for Group {
    fn name(&self) -> &'static str {
        "group"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::buffering(self.name())
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        file_under(&mut self.groups, &self.discriminator, signal.take_item());
        Ok(Flow::Consumed)
    }

    fn streaming_finished(&mut self, signal: &mut Signal) -> Result<(), OpError> {
        if self.groups.is_empty() {
            return Ok(());
        }
        let groups = std::mem::take(&mut self.groups);
        let next = signal.here().next();
        signal.restart_with(Box::new(groups.into_producer()), next)?;
        Ok(())
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let Self {
            discriminator,
            mut groups,
        } = *self;
        stream::deferred(input, move |input| {
            for item in input {
                file_under(&mut groups, &discriminator, item?);
            }
            Ok(groups.into_items())
        })
    }

    fn destroy(&mut self) {
        self.groups = ItemCollector::new();
    }
}

/// Folds every item into one `(0, accumulator)` item.
pub struct Reduce {
    reducer: SharedReducer,
    init: Value,
    acc: Option<Value>,
}

impl Reduce {
    pub fn new(reducer: SharedReducer, init: Value) -> Self {
        Self {
            reducer,
            acc: Some(init.clone()),
            init,
        }
    }

    /// Number of items as `(0, n)`.
    pub fn count() -> Self {
        Self::new(std::rc::Rc::new(crate::builtin::count), Value::I64(0))
    }
}

impl Operation for Reduce {
    fn name(&self) -> &'static str {
        "reduce"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::bounded(self.name(), 1)
    }

    fn prepare(&mut self, _signal: &mut Signal) -> Result<(), OpError> {
        self.acc = Some(self.init.clone());
        Ok(())
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        let item = signal.item();
        let acc = self.acc.take().unwrap_or_else(|| self.init.clone());
        self.acc = Some(self.reducer.reduce(acc, &item.value, &item.key));
        Ok(Flow::Consumed)
    }

    fn streaming_finished(&mut self, signal: &mut Signal) -> Result<(), OpError> {
        if let Some(acc) = self.acc.take() {
            let next = signal.here().next();
            signal.restart_with(Box::new(VecProducer::new(vec![Item::new(0, acc)])), next)?;
        }
        Ok(())
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let Self { reducer, init, .. } = *self;
        stream::deferred(input, move |input| {
            let mut acc = init;
            for item in input {
                let item = item?;
                acc = reducer.reduce(acc, &item.value, &item.key);
            }
            Ok(vec![Item::new(0, acc)])
        })
    }
}
