//! `Flatten(depth)`: list values expand into their elements.
//!
//! Each element becomes an item keyed by its index in the list it came from.
//! Nested lists expand further until `depth` levels have been opened
//! (`None` opens every level). Non-list values pass through unchanged.

use lazypipe_core::flow::{Flow, Signal};
use lazypipe_core::producer::VecProducer;
use lazypipe_core::{Item, Value};

use crate::plan::StagePlan;
use crate::stream::ItemStream;
use crate::traits::{OpError, Operation};

pub struct Flatten {
    depth: Option<usize>,
}

impl Flatten {
    pub fn new(depth: Option<usize>) -> Result<Self, OpError> {
        if depth == Some(0) {
            return Err(OpError::Config("flatten depth must be at least 1".into()));
        }
        Ok(Self { depth })
    }
}

fn expand(item: Item, depth: Option<usize>, out: &mut Vec<Item>) {
    match item.value {
        Value::List(elements) if depth != Some(0) => {
            let depth = depth.map(|d| d - 1);
            for (i, element) in elements.into_iter().enumerate() {
                expand(Item::new(i, element), depth, out);
            }
        }
        value => out.push(Item {
            key: item.key,
            value,
        }),
    }
}

impl Operation for Flatten {
    fn name(&self) -> &'static str {
        "flatten"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::streaming(self.name()).with_verbs(&["continue_with"])
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        if !matches!(signal.item().value, Value::List(_)) {
            return Ok(Flow::Forward);
        }
        let mut expanded = Vec::new();
        expand(signal.take_item(), self.depth, &mut expanded);
        if !expanded.is_empty() {
            let next = signal.here().next();
            signal.continue_with(Box::new(VecProducer::new(expanded)), next)?;
        }
        Ok(Flow::Consumed)
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let depth = self.depth;
        Box::new(input.flat_map(move |r| -> Box<dyn Iterator<Item = Result<Item, OpError>>> {
            match r {
                Ok(item) => {
                    let mut expanded = Vec::new();
                    expand(item, depth, &mut expanded);
                    Box::new(expanded.into_iter().map(Ok))
                }
                Err(e) => Box::new(std::iter::once(Err(e))),
            }
        }))
    }
}
