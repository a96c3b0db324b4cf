//! Run-shaped stages: fixed-size chunks and adjacent-label groups.

use lazypipe_core::flow::{Flow, Signal};
use lazypipe_core::producer::VecProducer;
use lazypipe_core::strategy::SharedDiscriminator;
use lazypipe_core::{Item, Value};

use crate::plan::StagePlan;
use crate::stream::ItemStream;
use crate::traits::{OpError, Operation};

/// Consecutive values grouped into lists of `size`, keyed by chunk index.
/// The last chunk may be shorter.
pub struct Chunk {
    size: usize,
    state: ChunkState,
}

#[derive(Default)]
struct ChunkState {
    buffer: Vec<Value>,
    index: i64,
}

impl ChunkState {
    fn push(&mut self, value: Value, size: usize) -> Option<Item> {
        self.buffer.push(value);
        if self.buffer.len() < size {
            return None;
        }
        Some(self.emit())
    }

    fn emit(&mut self) -> Item {
        let item = Item::new(self.index, Value::List(std::mem::take(&mut self.buffer)));
        self.index += 1;
        item
    }

    fn remainder(&mut self) -> Option<Item> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.emit())
        }
    }
}

impl Chunk {
    pub fn new(size: usize) -> Result<Self, OpError> {
        if size == 0 {
            return Err(OpError::Config("chunk size must be at least 1".into()));
        }
        Ok(Self {
            size,
            state: ChunkState::default(),
        })
    }
}

impl Operation for Chunk {
    fn name(&self) -> &'static str {
        "chunk"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::bounded(self.name(), self.size)
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        let value = std::mem::take(&mut signal.item_mut().value);
        match self.state.push(value, self.size) {
            Some(chunk) => {
                signal.replace_item(chunk);
                Ok(Flow::Forward)
            }
            None => Ok(Flow::Consumed),
        }
    }

    fn streaming_finished(&mut self, signal: &mut Signal) -> Result<(), OpError> {
        if let Some(rest) = self.state.remainder() {
            let next = signal.here().next();
            signal.restart_with(Box::new(VecProducer::new(vec![rest])), next)?;
        }
        Ok(())
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let size = self.size;
        let mut state = self.state;
        let mut input = input.fuse();
        let mut done = false;
        Box::new(std::iter::from_fn(move || {
            if done {
                return None;
            }
            loop {
                match input.next() {
                    Some(Ok(item)) => {
                        if let Some(chunk) = state.push(item.value, size) {
                            return Some(Ok(chunk));
                        }
                    }
                    Some(Err(e)) => return Some(Err(e)),
                    None => {
                        done = true;
                        return state.remainder().map(Ok);
                    }
                }
            }
        }))
    }

    fn destroy(&mut self) {
        self.state.buffer = Vec::new();
    }
}

/// Runs of items sharing a label, emitted as `label => [values]`.
pub struct GroupAdjacent {
    discriminator: SharedDiscriminator,
    run: Option<(Value, Vec<Value>)>,
}

impl GroupAdjacent {
    pub fn new(discriminator: SharedDiscriminator) -> Self {
        Self {
            discriminator,
            run: None,
        }
    }
}

/// Add `item` to the current run. Returns the finished run on a label change.
fn extend_run(
    run: &mut Option<(Value, Vec<Value>)>,
    discriminator: &SharedDiscriminator,
    item: Item,
) -> Option<Item> {
    let label = discriminator.classify(&item.value, &item.key).into_label();
    match run {
        Some((current, values)) if *current == label => {
            values.push(item.value);
            None
        }
        _ => run
            .replace((label, vec![item.value]))
            .map(|(label, values)| Item::new(label, Value::List(values))),
    }
}

impl Operation for GroupAdjacent {
    fn name(&self) -> &'static str {
        "group_adjacent"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::streaming(self.name()).with_verbs(&["restart_with"])
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        let item = signal.take_item();
        match extend_run(&mut self.run, &self.discriminator, item) {
            Some(finished) => {
                signal.replace_item(finished);
                Ok(Flow::Forward)
            }
            None => Ok(Flow::Consumed),
        }
    }

    fn streaming_finished(&mut self, signal: &mut Signal) -> Result<(), OpError> {
        if let Some((label, values)) = self.run.take() {
            let next = signal.here().next();
            let last = Item::new(label, Value::List(values));
            signal.restart_with(Box::new(VecProducer::new(vec![last])), next)?;
        }
        Ok(())
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let discriminator = self.discriminator;
        let mut run = self.run;
        let mut input = input.fuse();
        Box::new(std::iter::from_fn(move || loop {
            match input.next() {
                Some(Ok(item)) => {
                    if let Some(finished) = extend_run(&mut run, &discriminator, item) {
                        return Some(Ok(finished));
                    }
                }
                Some(Err(e)) => return Some(Err(e)),
                None => {
                    return run
                        .take()
                        .map(|(label, values)| Ok(Item::new(label, Value::List(values))))
                }
            }
        }))
    }

    fn destroy(&mut self) {
        self.run = None;
    }
}
