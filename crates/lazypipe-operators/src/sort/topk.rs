//! `TopK(k, cmp)`: the `k` best items, best first.
//!
//! Equivalent to a stable sort followed by taking `k`, in O(N log K): each
//! item is tagged with its arrival number so ties keep arrival order.

use std::cmp::Ordering;

use lazypipe_core::flow::{Flow, Signal};
use lazypipe_core::producer::VecProducer;
use lazypipe_core::strategy::SharedComparator;
use lazypipe_core::Item;
use lazypipe_mem::BoundedTopK;

use crate::plan::StagePlan;
use crate::stream::{self, ItemStream};
use crate::traits::{OpError, Operation};

type Ranked = (u64, Item);
type RankFn = Box<dyn Fn(&Ranked, &Ranked) -> Ordering>;

fn rank_fn(cmp: SharedComparator) -> RankFn {
    Box::new(move |a: &Ranked, b: &Ranked| {
        cmp.compare(&a.1.value, &b.1.value, &a.1.key, &b.1.key)
            .then(a.0.cmp(&b.0))
    })
}

/// Selection state shared by the push and pull paths.
struct Selection {
    kept: BoundedTopK<Ranked, RankFn>,
    arrivals: u64,
}

impl Selection {
    fn new(k: usize, cmp: &SharedComparator) -> Result<Self, OpError> {
        Ok(Self {
            kept: BoundedTopK::new(k, rank_fn(cmp.clone()))?,
            arrivals: 0,
        })
    }

    fn offer(&mut self, item: Item) {
        self.kept.push((self.arrivals, item));
        self.arrivals += 1;
    }

    fn into_items(self) -> Vec<Item> {
        self.kept
            .into_sorted()
            .into_iter()
            .map(|(_, item)| item)
            .collect()
    }
}

pub struct TopK {
    k: usize,
    comparator: SharedComparator,
    selection: Option<Selection>,
}

impl TopK {
    pub fn new(k: usize, comparator: SharedComparator) -> Result<Self, OpError> {
        let selection = Selection::new(k, &comparator)?;
        Ok(Self {
            k,
            comparator,
            selection: Some(selection),
        })
    }
}

impl Operation for TopK {
    fn name(&self) -> &'static str {
        "top_k"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::bounded(self.name(), self.k)
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        let selection = self
            .selection
            .as_mut()
            .ok_or_else(|| OpError::Exec("top_k received an item after finishing".into()))?;
        selection.offer(signal.take_item());
        Ok(Flow::Consumed)
    }

    fn streaming_finished(&mut self, signal: &mut Signal) -> Result<(), OpError> {
        let Some(selection) = self.selection.take() else {
            return Ok(());
        };
        let items = selection.into_items();
        if items.is_empty() {
            return Ok(());
        }
        let next = signal.here().next();
        signal.restart_with(Box::new(VecProducer::new(items)), next)?;
        Ok(())
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let Self {
            k,
            comparator,
            selection,
        } = *self;
        stream::deferred(input, move |input| {
            let mut selection = match selection {
                Some(s) => s,
                None => Selection::new(k, &comparator)?,
            };
            for item in input {
                selection.offer(item?);
            }
            Ok(selection.into_items())
        })
    }

    fn destroy(&mut self) {
        self.selection = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazypipe_core::item::indexed;
    use lazypipe_core::strategy::ByValue;
    use lazypipe_core::Value;
    use std::rc::Rc;

    fn values(items: Vec<Item>) -> Vec<Value> {
        items.into_iter().map(|i| i.value).collect()
    }

    #[test]
    fn ties_keep_arrival_order() {
        let cmp: SharedComparator = Rc::new(ByValue);
        let mut sel = Selection::new(2, &cmp).unwrap();
        for item in [Item::new("a", 1), Item::new("b", 1), Item::new("c", 1)] {
            sel.offer(item);
        }
        let keys: Vec<Value> = sel.into_items().into_iter().map(|i| i.key).collect();
        assert_eq!(keys, vec![Value::from("a"), Value::from("b")]);
    }

    #[test]
    fn pull_path_selects_best_first() {
        let stage = Box::new(TopK::new(3, Rc::new(ByValue)).unwrap());
        let out = stream::collect_all(
            stage.transform(stream::from_items(indexed([5, 3, 8, 1, 9, 2]))),
        )
        .unwrap();
        assert_eq!(values(out), vec![Value::I64(1), Value::I64(2), Value::I64(3)]);
    }

    #[test]
    fn zero_k_fails_at_construction() {
        assert!(matches!(
            TopK::new(0, Rc::new(ByValue)),
            Err(OpError::Buffer(_))
        ));
    }
}
