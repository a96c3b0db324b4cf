//! `Dispatch(d, branches)`: pre-declared labels only.

use lazypipe_core::flow::{Flow, Signal};
use lazypipe_core::producer::VecProducer;
use lazypipe_core::strategy::SharedDiscriminator;
use lazypipe_core::{Item, Value};

use super::handler::HandlerFactory;
use super::Lanes;
use crate::plan::StagePlan;
use crate::stream::{self, ItemStream};
use crate::traits::{OpError, Operation};

pub struct Dispatch {
    discriminator: SharedDiscriminator,
    lanes: Lanes,
}

impl Dispatch {
    /// Labels are coerced like discriminator results; an empty or duplicated
    /// label set is rejected.
    pub fn new(
        discriminator: SharedDiscriminator,
        branches: Vec<(Value, HandlerFactory)>,
    ) -> Result<Self, OpError> {
        if branches.is_empty() {
            return Err(OpError::Config("dispatch needs at least one branch".into()));
        }
        let mut lanes = Lanes::default();
        for (label, factory) in branches {
            let label = label.into_label();
            if !lanes.open(label.clone(), factory()) {
                return Err(OpError::Config(format!(
                    "dispatch label '{label}' declared twice"
                )));
            }
        }
        Ok(Self {
            discriminator,
            lanes,
        })
    }
}

fn route(
    lanes: &mut Lanes,
    discriminator: &SharedDiscriminator,
    item: Item,
) -> Result<(), OpError> {
    let label = discriminator.classify(&item.value, &item.key).into_label();
    match lanes.position(&label) {
        Some(lane) => lanes.send(lane, item),
        None => Err(OpError::UnmappedLabel(label)),
    }
}

impl Operation for Dispatch {
    fn name(&self) -> &'static str {
        "dispatch"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::buffering(self.name())
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        route(&mut self.lanes, &self.discriminator, signal.take_item())?;
        Ok(Flow::Consumed)
    }

    fn streaming_finished(&mut self, signal: &mut Signal) -> Result<(), OpError> {
        let results = self.lanes.finish()?;
        if !results.is_empty() {
            let next = signal.here().next();
            signal.restart_with(Box::new(VecProducer::new(results)), next)?;
        }
        Ok(())
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let Self {
            discriminator,
            mut lanes,
        } = *self;
        stream::deferred(input, move |input| {
            for item in input {
                route(&mut lanes, &discriminator, item?)?;
            }
            lanes.finish()
        })
    }

    fn destroy(&mut self) {
        self.lanes.destroy();
    }
}
