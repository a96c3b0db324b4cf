//! `Segregate(cmp, max_buckets, bucket_size)`: bucket clustering.
//!
//! Items are sorted into equivalence classes under the comparator. At
//! end-of-stream every bucket is emitted in order as
//! `bucket index => [member values]`.

use std::cmp::Ordering;

use lazypipe_core::flow::{Flow, Signal};
use lazypipe_core::producer::VecProducer;
use lazypipe_core::strategy::SharedComparator;
use lazypipe_core::{Item, Value};
use lazypipe_mem::{Bucket, Segregator};

use crate::plan::StagePlan;
use crate::stream::{self, ItemStream};
use crate::traits::{OpError, Operation};

type PivotFn = Box<dyn Fn(&Item, &Item) -> Ordering>;

fn pivot_fn(cmp: SharedComparator) -> PivotFn {
    Box::new(move |a: &Item, b: &Item| cmp.compare(&a.value, &b.value, &a.key, &b.key))
}

fn emit(buckets: Vec<Bucket<Item>>) -> Vec<Item> {
    buckets
        .into_iter()
        .enumerate()
        .map(|(i, bucket)| {
            let values = bucket.into_members().into_iter().map(|m| m.value).collect();
            Item::new(i, Value::List(values))
        })
        .collect()
}

pub struct Segregate {
    max_buckets: Option<usize>,
    bucket_size: Option<usize>,
    buckets: Option<Segregator<Item, PivotFn>>,
}

impl Segregate {
    pub fn new(
        comparator: SharedComparator,
        max_buckets: Option<usize>,
        bucket_size: Option<usize>,
    ) -> Result<Self, OpError> {
        let buckets = Segregator::new(pivot_fn(comparator), max_buckets, bucket_size)?;
        Ok(Self {
            max_buckets,
            bucket_size,
            buckets: Some(buckets),
        })
    }
}

impl Operation for Segregate {
    fn name(&self) -> &'static str {
        "segregate"
    }

    fn plan(&self) -> StagePlan {
        match (self.max_buckets, self.bucket_size) {
            (Some(b), Some(s)) => StagePlan::bounded(self.name(), b.saturating_mul(s)),
            _ => StagePlan::buffering(self.name()),
        }
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        let buckets = self
            .buckets
            .as_mut()
            .ok_or_else(|| OpError::Exec("segregate received an item after finishing".into()))?;
        buckets.insert(signal.take_item());
        Ok(Flow::Consumed)
    }

    fn streaming_finished(&mut self, signal: &mut Signal) -> Result<(), OpError> {
        let Some(buckets) = self.buckets.take() else {
            return Ok(());
        };
        if buckets.is_empty() {
            return Ok(());
        }
        let items = emit(buckets.into_buckets());
        let next = signal.here().next();
        signal.restart_with(Box::new(VecProducer::new(items)), next)?;
        Ok(())
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let Some(mut buckets) = self.buckets else {
            return stream::empty();
        };
        stream::deferred(input, move |input| {
            for item in input {
                buckets.insert(item?);
            }
            Ok(emit(buckets.into_buckets()))
        })
    }

    fn destroy(&mut self) {
        self.buckets = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazypipe_core::item::indexed;
    use std::rc::Rc;

    fn by_tens() -> SharedComparator {
        Rc::new(|a: &Value, b: &Value, _ka: &Value, _kb: &Value| {
            let tens = |v: &Value| v.as_i64().map(|n| n / 10);
            tens(a).cmp(&tens(b))
        })
    }

    #[test]
    fn emits_buckets_in_order_with_member_values() {
        let stage = Box::new(Segregate::new(by_tens(), None, None).unwrap());
        let out = stream::collect_all(stage.transform(stream::from_items(indexed([
            12, 3, 15, 7, 30,
        ]))))
        .unwrap();
        assert_eq!(
            out,
            vec![
                Item::new(0, Value::List(vec![Value::I64(3), Value::I64(7)])),
                Item::new(1, Value::List(vec![Value::I64(12), Value::I64(15)])),
                Item::new(2, Value::List(vec![Value::I64(30)])),
            ]
        );
    }

    #[test]
    fn zero_caps_fail_at_construction() {
        assert!(Segregate::new(by_tens(), Some(0), None).is_err());
        assert!(Segregate::new(by_tens(), None, Some(0)).is_err());
    }
}
