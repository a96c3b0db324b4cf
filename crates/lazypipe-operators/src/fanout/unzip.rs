//! `Unzip(handlers)`: list-valued items split positionally.
//!
//! Part `i` of each value goes to handler `i` (keyed by the item's key).
//! Extra parts are ignored; short lists simply skip the missing handlers.

use lazypipe_core::flow::{Flow, Signal};
use lazypipe_core::producer::VecProducer;
use lazypipe_core::{Item, Value};

use super::handler::HandlerFactory;
use super::Lanes;
use crate::plan::StagePlan;
use crate::stream::{self, ItemStream};
use crate::traits::{OpError, Operation};

pub struct Unzip {
    lanes: Lanes,
}

impl Unzip {
    pub fn new(handlers: Vec<HandlerFactory>) -> Result<Self, OpError> {
        if handlers.is_empty() {
            return Err(OpError::Config("unzip needs at least one handler".into()));
        }
        let mut lanes = Lanes::default();
        for (i, factory) in handlers.iter().enumerate() {
            lanes.open(Value::from(i), factory());
        }
        Ok(Self { lanes })
    }
}

fn split(lanes: &mut Lanes, item: Item) -> Result<(), OpError> {
    let Item { key, value } = item;
    let Value::List(parts) = value else {
        return Err(OpError::Exec(format!(
            "unzip expects list values, got {} for key '{key}'",
            value.type_name()
        )));
    };
    let width = lanes.len();
    for (lane, part) in parts.into_iter().take(width).enumerate() {
        lanes.send(lane, Item::new(key.clone(), part))?;
    }
    Ok(())
}

impl Operation for Unzip {
    fn name(&self) -> &'static str {
        "unzip"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::buffering(self.name())
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        split(&mut self.lanes, signal.take_item())?;
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
        let mut lanes = self.lanes;
        stream::deferred(input, move |input| {
            for item in input {
                split(&mut lanes, item?)?;
            }
            lanes.finish()
        })
    }

    fn destroy(&mut self) {
        self.lanes.destroy();
    }
}
