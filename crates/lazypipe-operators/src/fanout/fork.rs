//! `Fork(d, factory)`: one handler per first-seen label.

use lazypipe_core::flow::{Flow, Signal};
use lazypipe_core::producer::VecProducer;
use lazypipe_core::strategy::SharedDiscriminator;
use lazypipe_core::Item;

use super::handler::HandlerFactory;
use super::Lanes;
use crate::plan::StagePlan;
use crate::stream::{self, ItemStream};
use crate::traits::{OpError, Operation};

struct Forking {
    discriminator: SharedDiscriminator,
    factory: HandlerFactory,
    lanes: Lanes,
}

impl Forking {
    fn route(&mut self, item: Item) -> Result<(), OpError> {
        let label = self
            .discriminator
            .classify(&item.value, &item.key)
            .into_label();
        let lane = match self.lanes.position(&label) {
            Some(lane) => lane,
            None => {
                self.lanes.open(label, (self.factory)());
                self.lanes.len() - 1
            }
        };
        self.lanes.send(lane, item)
    }
}

pub struct Fork {
    state: Forking,
}

impl Fork {
    pub fn new(discriminator: SharedDiscriminator, factory: HandlerFactory) -> Self {
        Self {
            state: Forking {
                discriminator,
                factory,
                lanes: Lanes::default(),
            },
        }
    }
}

impl Operation for Fork {
    fn name(&self) -> &'static str {
        "fork"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::buffering(self.name())
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        self.state.route(signal.take_item())?;
        Ok(Flow::Consumed)
    }

    fn streaming_finished(&mut self, signal: &mut Signal) -> Result<(), OpError> {
        let results = self.state.lanes.finish()?;
        if !results.is_empty() {
            let next = signal.here().next();
            signal.restart_with(Box::new(VecProducer::new(results)), next)?;
        }
        Ok(())
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let mut state = self.state;
        stream::deferred(input, move |input| {
            for item in input {
                state.route(item?)?;
            }
            state.lanes.finish()
        })
    }

    fn destroy(&mut self) {
        self.state.lanes.destroy();
    }
}
