//! `Tail(n)`: the last `n` items in original order.

use lazypipe_core::flow::{Flow, Signal};
use lazypipe_core::producer::VecProducer;
use lazypipe_core::Item;
use lazypipe_mem::CircularBuffer;

use crate::plan::StagePlan;
use crate::stream::{self, ItemStream};
use crate::traits::{OpError, Operation};

pub struct Tail {
    n: usize,
    /// `None` for `n == 0`: nothing is ever kept.
    ring: Option<CircularBuffer<Item>>,
}

impl Tail {
    pub fn new(n: usize) -> Result<Self, OpError> {
        let ring = match n {
            0 => None,
            n => Some(CircularBuffer::new(n)?),
        };
        Ok(Self { n, ring })
    }
}

impl Operation for Tail {
    fn name(&self) -> &'static str {
        "tail"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::bounded(self.name(), self.n).with_verbs(&["limit_reached", "restart_with"])
    }

    /// `Tail(0)` needs no input at all.
    fn prepare(&mut self, signal: &mut Signal) -> Result<(), OpError> {
        if self.ring.is_none() {
            let here = signal.here();
            signal.limit_reached(here)?;
        }
        Ok(())
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        if let Some(ring) = self.ring.as_mut() {
            ring.push(signal.take_item());
        }
        Ok(Flow::Consumed)
    }

    fn streaming_finished(&mut self, signal: &mut Signal) -> Result<(), OpError> {
        let Some(ring) = self.ring.take() else {
            return Ok(());
        };
        if ring.is_empty() {
            return Ok(());
        }
        let next = signal.here().next();
        signal.restart_with(Box::new(VecProducer::new(ring.into_vec())), next)?;
        Ok(())
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let Some(mut ring) = self.ring else {
            return stream::empty();
        };
        stream::deferred(input, move |input| {
            for item in input {
                ring.push(item?);
            }
            Ok(ring.into_vec())
        })
    }

    fn destroy(&mut self) {
        self.ring = None;
    }
}
