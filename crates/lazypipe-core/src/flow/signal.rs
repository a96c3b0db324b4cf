use crate::error::{Error, Result};
use crate::id::StageId;
use crate::item::Item;
use crate::producer::BoxProducer;

use super::{Pipe, Source};

/// Counts of control-flow events during one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalCounters {
    pub restarts: u64,
    pub continuations: u64,
    pub resumptions: u64,
    pub limits: u64,
    pub forgets: u64,
    pub push_backs: u64,
}

/// Per-run control object.
///
/// Owns the live item, the [`Pipe`] cursors and the [`Source`] feeds. Stages
/// reshape the run only through the verbs below; the driver uses the
/// remaining methods to pull, walk and settle.
#[derive(Debug)]
pub struct Signal {
    item: Item,
    pipe: Pipe,
    source: Source,
    here: StageId,
    stopped: bool,
    resourced: bool,
    forgotten: Vec<StageId>,
    counters: SignalCounters,
}

impl Signal {
    pub fn new(stages: usize, source: Source) -> Self {
        Self {
            item: Item::default(),
            pipe: Pipe::new(stages),
            source,
            here: StageId::new(0),
            stopped: false,
            resourced: false,
            forgotten: Vec::new(),
            counters: SignalCounters::default(),
        }
    }

    // ---- item access ----

    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn item_mut(&mut self) -> &mut Item {
        &mut self.item
    }

    /// Move the live item out, leaving a `Null => Null` placeholder.
    pub fn take_item(&mut self) -> Item {
        std::mem::take(&mut self.item)
    }

    pub fn replace_item(&mut self, item: Item) -> Item {
        std::mem::replace(&mut self.item, item)
    }

    /// The stage currently being called.
    pub fn here(&self) -> StageId {
        self.here
    }

    pub fn head(&self) -> StageId {
        self.pipe.head()
    }

    pub fn terminal(&self) -> StageId {
        self.pipe.terminal()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn counters(&self) -> SignalCounters {
        self.counters
    }

    // ---- verbs ----

    /// End the run now. Nothing is finalized afterwards.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// No stage before `op` needs more input: make `op` the head and drop
    /// every pending feed and frame. The run then ends naturally, so `op`
    /// and everything after it are still finalized.
    pub fn limit_reached(&mut self, op: StageId) -> Result<()> {
        self.pipe.set_head(op)?;
        self.pipe.clear_frames();
        self.source.drain();
        self.counters.limits += 1;
        Ok(())
    }

    /// Replace all remaining input with `producer`, entering at `next`.
    pub fn restart_with(&mut self, producer: BoxProducer, next: StageId) -> Result<()> {
        self.pipe.set_head(next)?;
        self.pipe.clear_frames();
        self.source.replace(producer);
        self.resourced = true;
        self.counters.restarts += 1;
        Ok(())
    }

    /// Inject `producer` entering at `next`; once it runs dry the current
    /// feed and head resume where they left off.
    pub fn continue_with(&mut self, producer: BoxProducer, next: StageId) -> Result<()> {
        self.pipe.push_frame(next)?;
        self.source.suspend_and_replace(producer);
        self.resourced = true;
        self.counters.continuations += 1;
        Ok(())
    }

    /// Route every following raw item straight to `op` until `restore_head`.
    pub fn swap_head(&mut self, op: StageId) -> Result<()> {
        self.pipe.swap_head(op)
    }

    pub fn restore_head(&mut self) -> Result<()> {
        self.pipe.restore_head()
    }

    /// Splice `op` out of the chain. Applied by the driver once the current
    /// call returns.
    pub fn forget(&mut self, op: StageId) -> Result<()> {
        if op >= self.pipe.terminal() {
            return Err(Error::Structural(format!(
                "cannot forget {op}: it is not a stage"
            )));
        }
        if !self.forgotten.contains(&op) {
            self.forgotten.push(op);
        }
        Ok(())
    }

    /// Re-deliver `item` on the next pull.
    pub fn push_back(&mut self, item: Item) {
        self.source.push_back(item);
        self.counters.push_backs += 1;
    }

    // ---- driver side ----

    /// Next item from the active feed, resuming suspended feeds as they run
    /// dry. `None` means the stream is exhausted.
    pub fn pull(&mut self) -> Result<Option<Item>> {
        loop {
            if let Some(item) = self.source.next_item() {
                return Ok(Some(item));
            }
            if !self.pipe.has_frames() && self.source.depth() == 0 {
                return Ok(None);
            }
            self.restore_from_stack()?;
        }
    }

    /// Pop the frame and feed stacks together. Returns whether both are now
    /// empty.
    pub fn restore_from_stack(&mut self) -> Result<bool> {
        if self.pipe.depth() != self.source.depth() {
            return Err(Error::Structural(format!(
                "frame stack ({}) and feed stack ({}) out of step",
                self.pipe.depth(),
                self.source.depth()
            )));
        }
        if self.pipe.pop_frame().is_none() {
            return Err(Error::Structural("nothing to restore".into()));
        }
        self.source.pop_suspended()?;
        self.counters.resumptions += 1;
        Ok(!self.pipe.has_frames())
    }

    pub fn enter(&mut self, here: StageId) {
        self.here = here;
    }

    pub fn begin(&mut self, item: Item) {
        self.item = item;
    }

    /// Whether a verb installed a new feed since the last call.
    pub fn take_resourced(&mut self) -> bool {
        std::mem::take(&mut self.resourced)
    }

    pub fn take_forgotten(&mut self) -> Vec<StageId> {
        std::mem::take(&mut self.forgotten)
    }

    pub fn splice_out(&mut self, id: StageId) -> Result<()> {
        self.pipe.splice_out(id)?;
        self.counters.forgets += 1;
        Ok(())
    }

    pub fn release(&mut self) {
        self.source.drain();
        self.pipe.clear_frames();
        self.item = Item::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::VecProducer;
    use crate::value::Value;

    fn signal(stages: usize, values: &[i64]) -> Signal {
        Signal::new(
            stages,
            Source::new(Box::new(VecProducer::from_values(values.to_vec()))),
        )
    }

    fn pull_value(s: &mut Signal) -> Option<Value> {
        s.pull().unwrap().map(|item| item.value)
    }

    #[test]
    fn continue_with_resumes_the_outer_feed() {
        let mut s = signal(3, &[1, 2]);
        assert_eq!(pull_value(&mut s), Some(Value::I64(1)));
        s.continue_with(
            Box::new(VecProducer::from_values([10, 11])),
            StageId::new(2),
        )
        .unwrap();
        assert!(s.take_resourced());
        assert_eq!(s.head(), StageId::new(2));
        assert_eq!(pull_value(&mut s), Some(Value::I64(10)));
        assert_eq!(pull_value(&mut s), Some(Value::I64(11)));
        assert_eq!(pull_value(&mut s), Some(Value::I64(2)));
        assert_eq!(s.head(), StageId::new(0));
        assert_eq!(pull_value(&mut s), None);
        assert_eq!(s.counters().resumptions, 1);
    }

    #[test]
    fn restart_with_discards_parked_feeds() {
        let mut s = signal(3, &[1, 2]);
        s.pull().unwrap();
        s.continue_with(Box::new(VecProducer::from_values([10])), StageId::new(1))
            .unwrap();
        s.restart_with(Box::new(VecProducer::from_values([7])), StageId::new(3))
            .unwrap();
        assert_eq!(pull_value(&mut s), Some(Value::I64(7)));
        assert_eq!(pull_value(&mut s), None);
        assert_eq!(s.head(), StageId::new(3));
    }

    #[test]
    fn limit_reached_drops_remaining_input() {
        let mut s = signal(2, &[1, 2, 3]);
        s.pull().unwrap();
        s.limit_reached(StageId::new(1)).unwrap();
        assert_eq!(s.head(), StageId::new(1));
        assert_eq!(pull_value(&mut s), None);
    }

    #[test]
    fn restore_with_nothing_parked_is_structural() {
        let mut s = signal(1, &[]);
        assert!(s.restore_from_stack().unwrap_err().is_structural());
    }

    #[test]
    fn forget_rejects_the_terminal() {
        let mut s = signal(2, &[]);
        assert!(s.forget(StageId::new(2)).unwrap_err().is_structural());
        s.forget(StageId::new(1)).unwrap();
        s.forget(StageId::new(1)).unwrap();
        assert_eq!(s.take_forgotten(), vec![StageId::new(1)]);
    }

    #[test]
    fn push_back_is_seen_first() {
        let mut s = signal(1, &[1, 2]);
        let item = s.pull().unwrap().unwrap();
        s.push_back(item);
        assert_eq!(pull_value(&mut s), Some(Value::I64(1)));
        assert_eq!(pull_value(&mut s), Some(Value::I64(2)));
    }
}
