//! Restartable item producers feeding a [`Source`](crate::flow::Source).

use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::item::Item;
use crate::value::Value;

/// Iterator handed out by [`Producer::open`].
pub type ItemIter = Box<dyn Iterator<Item = Item>>;

/// A restartable factory of key/value sequences.
///
/// `open` may be called more than once; each call starts a fresh pass.
pub trait Producer {
    fn name(&self) -> &'static str;

    fn open(&mut self) -> ItemIter;

    /// Cheap count if the producer knows it.
    fn len_hint(&self) -> Option<usize> {
        None
    }

    fn is_empty(&self) -> Option<bool> {
        self.len_hint().map(|n| n == 0)
    }

    /// Drop whatever the producer holds. Must tolerate repeated calls.
    fn release(&mut self) {}
}

pub type BoxProducer = Box<dyn Producer>;

impl fmt::Debug for dyn Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Producer({})", self.name())
    }
}

/// Materialized items, shared between passes.
#[derive(Debug, Clone)]
pub struct VecProducer {
    items: Rc<[Item]>,
}

impl VecProducer {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// Values keyed by position.
    pub fn from_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(crate::item::indexed(values))
    }
}

struct SharedIter {
    items: Rc<[Item]>,
    pos: usize,
}

impl Iterator for SharedIter {
    type Item = Item;

    fn next(&mut self) -> Option<Item> {
        let item = self.items.get(self.pos)?.clone();
        self.pos += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.items.len().saturating_sub(self.pos);
        (left, Some(left))
    }
}

impl Producer for VecProducer {
    fn name(&self) -> &'static str {
        "vec"
    }

    fn open(&mut self) -> ItemIter {
        Box::new(SharedIter {
            items: Rc::clone(&self.items),
            pos: 0,
        })
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }

    fn release(&mut self) {
        self.items = Rc::from(Vec::new());
    }
}

/// Arithmetic progression `start, start+step, ...` stopping before `end`.
#[derive(Debug, Clone, Copy)]
pub struct RangeProducer {
    start: i64,
    end: i64,
    step: i64,
}

impl RangeProducer {
    pub fn new(start: i64, end: i64, step: i64) -> Result<Self> {
        if step == 0 {
            return Err(Error::Config("range step must be non-zero".into()));
        }
        Ok(Self { start, end, step })
    }

    fn count(&self) -> usize {
        let span = if self.step > 0 {
            self.end.saturating_sub(self.start)
        } else {
            self.start.saturating_sub(self.end)
        };
        if span <= 0 {
            return 0;
        }
        let step = self.step.unsigned_abs();
        ((span as u64 + step - 1) / step) as usize
    }
}

impl Producer for RangeProducer {
    fn name(&self) -> &'static str {
        "range"
    }

    fn open(&mut self) -> ItemIter {
        let Self { start, step, .. } = *self;
        let n = self.count();
        Box::new((0..n).map(move |i| Item::new(i, start + step * i as i64)))
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.count())
    }
}

/// Closure factory: every `open` calls the closure for a fresh iterator.
pub struct FnProducer<F> {
    factory: Option<F>,
}

impl<F> FnProducer<F>
where
    F: FnMut() -> ItemIter,
{
    pub fn new(factory: F) -> Self {
        Self {
            factory: Some(factory),
        }
    }
}

impl<F> Producer for FnProducer<F>
where
    F: FnMut() -> ItemIter,
{
    fn name(&self) -> &'static str {
        "fn"
    }

    fn open(&mut self) -> ItemIter {
        match self.factory.as_mut() {
            Some(f) => f(),
            None => Box::new(std::iter::empty()),
        }
    }

    fn release(&mut self) {
        self.factory = None;
    }
}

/// A single-pass iterator. Opening it again yields nothing.
pub struct OnceProducer {
    iter: Option<ItemIter>,
}

impl OnceProducer {
    pub fn new<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Item>,
        I::IntoIter: 'static,
    {
        Self {
            iter: Some(Box::new(iter.into_iter())),
        }
    }
}

impl Producer for OnceProducer {
    fn name(&self) -> &'static str {
        "once"
    }

    fn open(&mut self) -> ItemIter {
        self.iter
            .take()
            .unwrap_or_else(|| Box::new(std::iter::empty()))
    }

    fn release(&mut self) {
        self.iter = None;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyProducer;

impl Producer for EmptyProducer {
    fn name(&self) -> &'static str {
        "empty"
    }

    fn open(&mut self) -> ItemIter {
        Box::new(std::iter::empty())
    }

    fn len_hint(&self) -> Option<usize> {
        Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(p: &mut dyn Producer) -> Vec<Value> {
        p.open().map(|item| item.value).collect()
    }

    #[test]
    fn vec_producer_restarts() {
        let mut p = VecProducer::from_values([1, 2, 3]);
        assert_eq!(values(&mut p), values(&mut p));
        assert_eq!(p.len_hint(), Some(3));
        p.release();
        p.release();
        assert_eq!(p.is_empty(), Some(true));
    }

    #[test]
    fn range_counts_both_directions() {
        let mut up = RangeProducer::new(0, 10, 3).unwrap();
        assert_eq!(up.len_hint(), Some(4));
        assert_eq!(
            values(&mut up),
            vec![Value::I64(0), Value::I64(3), Value::I64(6), Value::I64(9)]
        );

        let mut down = RangeProducer::new(5, 0, -2).unwrap();
        assert_eq!(
            values(&mut down),
            vec![Value::I64(5), Value::I64(3), Value::I64(1)]
        );

        assert_eq!(RangeProducer::new(3, 3, 1).unwrap().len_hint(), Some(0));
        assert!(RangeProducer::new(0, 1, 0).is_err());
    }

    #[test]
    fn once_producer_is_single_pass() {
        let mut p = OnceProducer::new(vec![Item::new(0, "x")]);
        assert_eq!(values(&mut p).len(), 1);
        assert!(values(&mut p).is_empty());
    }
}
