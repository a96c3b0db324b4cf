use crate::error::{Error, Result};
use crate::item::Item;
use crate::producer::{BoxProducer, EmptyProducer, ItemIter};

enum FeedState {
    /// The producer has not been opened yet.
    NotReady,
    Ready(ItemIter),
}

/// One producer plus its iteration state and look-ahead buffer.
struct Feed {
    producer: BoxProducer,
    state: FeedState,
    pushed_back: Vec<Item>,
}

impl Feed {
    fn new(producer: BoxProducer) -> Self {
        Self {
            producer,
            state: FeedState::NotReady,
            pushed_back: Vec::new(),
        }
    }

    fn next(&mut self) -> Option<Item> {
        if let Some(item) = self.pushed_back.pop() {
            return Some(item);
        }
        if let FeedState::NotReady = self.state {
            self.state = FeedState::Ready(self.producer.open());
        }
        match &mut self.state {
            FeedState::Ready(iter) => iter.next(),
            FeedState::NotReady => None,
        }
    }

    fn release(mut self) {
        self.state = FeedState::NotReady;
        self.pushed_back.clear();
        self.producer.release();
    }
}

/// Feed state machine: one active feed plus a stack of suspended ones.
///
/// The suspended stack moves in lockstep with the pipe's frame stack. A slot
/// may hold `None` when a sub-stream was injected while no feed was active.
#[derive(Default)]
pub struct Source {
    active: Option<Feed>,
    suspended: Vec<Option<Feed>>,
}

impl Source {
    pub fn new(producer: BoxProducer) -> Self {
        Self {
            active: Some(Feed::new(producer)),
            suspended: Vec::new(),
        }
    }

    /// No feed at all; items arrive through `push_back`.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Whether the active feed has been opened.
    pub fn is_ready(&self) -> bool {
        matches!(
            self.active,
            Some(Feed {
                state: FeedState::Ready(_),
                ..
            })
        )
    }

    pub fn depth(&self) -> usize {
        self.suspended.len()
    }

    pub fn next_item(&mut self) -> Option<Item> {
        self.active.as_mut()?.next()
    }

    pub fn has_next(&mut self) -> bool {
        match self.active.as_mut() {
            None => false,
            Some(feed) => match feed.next() {
                Some(item) => {
                    feed.pushed_back.push(item);
                    true
                }
                None => false,
            },
        }
    }

    /// Re-deliver `item` on the next pull from the active feed.
    pub fn push_back(&mut self, item: Item) {
        self.active
            .get_or_insert_with(|| Feed::new(Box::new(EmptyProducer)))
            .pushed_back
            .push(item);
    }

    /// Drop every feed and install `producer` as the only one.
    pub fn replace(&mut self, producer: BoxProducer) {
        self.drain();
        self.active = Some(Feed::new(producer));
    }

    /// Park the active feed and install `producer` on top of it.
    pub fn suspend_and_replace(&mut self, producer: BoxProducer) {
        self.suspended.push(self.active.take());
        self.active = Some(Feed::new(producer));
    }

    /// Release the active feed and resume the most recently parked one.
    pub fn pop_suspended(&mut self) -> Result<()> {
        match self.suspended.pop() {
            Some(parked) => {
                if let Some(feed) = std::mem::replace(&mut self.active, parked) {
                    feed.release();
                }
                Ok(())
            }
            None => Err(Error::Structural("no suspended feed to resume".into())),
        }
    }

    /// Release every feed.
    pub fn drain(&mut self) {
        if let Some(feed) = self.active.take() {
            feed.release();
        }
        for feed in self.suspended.drain(..).flatten() {
            feed.release();
        }
    }
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("active", &self.active.as_ref().map(|feed| feed.producer.name()))
            .field("ready", &self.is_ready())
            .field("suspended", &self.suspended.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::VecProducer;
    use crate::value::Value;

    fn source(values: &[i64]) -> Source {
        Source::new(Box::new(VecProducer::from_values(values.to_vec())))
    }

    #[test]
    fn opens_lazily() {
        let mut s = source(&[1]);
        assert!(!s.is_ready());
        assert!(s.has_next());
        assert!(s.is_ready());
        assert_eq!(s.next_item().map(|i| i.value), Some(Value::I64(1)));
        assert!(!s.has_next());
    }

    #[test]
    fn pushed_back_items_come_first() {
        let mut s = source(&[1, 2]);
        let first = s.next_item().unwrap();
        s.push_back(first);
        assert_eq!(s.next_item().map(|i| i.value), Some(Value::I64(1)));
        assert_eq!(s.next_item().map(|i| i.value), Some(Value::I64(2)));
    }

    #[test]
    fn suspension_resumes_the_parked_feed() {
        let mut s = source(&[1, 2]);
        s.next_item();
        s.suspend_and_replace(Box::new(VecProducer::from_values([10])));
        assert_eq!(s.next_item().map(|i| i.value), Some(Value::I64(10)));
        assert_eq!(s.next_item(), None);
        s.pop_suspended().unwrap();
        assert_eq!(s.next_item().map(|i| i.value), Some(Value::I64(2)));
        assert!(s.pop_suspended().unwrap_err().is_structural());
    }

    #[test]
    fn detached_source_accepts_pushes() {
        let mut s = Source::detached();
        assert!(!s.has_next());
        s.push_back(Item::new(0, 5));
        assert!(s.has_next());
        assert_eq!(s.next_item().map(|i| i.value), Some(Value::I64(5)));
    }
}
