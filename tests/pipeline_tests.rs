//! End-to-end behaviour of the push-driven engine through the builder API.

use std::cell::Cell;
use std::rc::Rc;

use lazypipe_core::prelude::{EngineConfig, Item, ItemIter, Value, VecProducer};
use lazypipe_core::producer::FnProducer;
use lazypipe_core::strategy::{value_filter, ByValue};
use lazypipe_exec::{Engine, ExecError, Pipeline};
use lazypipe_operators::filter::Find;
use lazypipe_operators::limit::Limit;
use lazypipe_operators::sort::Reverse;
use lazypipe_operators::traits::BoxOperation;

fn ints(xs: &[i64]) -> Vec<Value> {
    xs.iter().copied().map(Value::I64).collect()
}

/// A source of `0..n` that counts how many items were actually pulled.
fn counting_source(n: i64, pulled: Rc<Cell<usize>>) -> FnProducer<impl FnMut() -> ItemIter> {
    FnProducer::new(move || {
        let pulled = Rc::clone(&pulled);
        Box::new((0..n).map(move |i| {
            pulled.set(pulled.get() + 1);
            Item::new(i, i)
        })) as ItemIter
    })
}

#[test]
fn top_k_keeps_the_smallest_in_order() {
    let out = Pipeline::from_values([5, 3, 8, 1, 9, 2])
        .top_k(3, ByValue)
        .unwrap()
        .values()
        .unwrap();
    assert_eq!(out, ints(&[1, 2, 3]));
}

#[test]
fn top_k_with_fewer_items_than_k_sorts_them_all() {
    let out = Pipeline::from_values([4, 2])
        .top_k(5, ByValue)
        .unwrap()
        .values()
        .unwrap();
    assert_eq!(out, ints(&[2, 4]));
}

#[test]
fn tail_keeps_the_last_items_with_their_keys() {
    let out = Pipeline::from_values(["a", "b", "c", "d", "e"])
        .tail(3)
        .unwrap()
        .to_vec()
        .unwrap();
    assert_eq!(
        out,
        vec![Item::new(2, "c"), Item::new(3, "d"), Item::new(4, "e")]
    );
}

#[test]
fn segregate_partitions_into_ordered_buckets() {
    let tens = |v: &Value| v.as_i64().unwrap_or(0) / 10;
    let by_tens = move |a: &Value, b: &Value, _ka: &Value, _kb: &Value| tens(a).cmp(&tens(b));
    let out = Pipeline::from_values([25, 3, 14, 21, 7, 29])
        .segregate(by_tens, None, None)
        .unwrap()
        .to_vec()
        .unwrap();
    assert_eq!(
        out,
        vec![
            Item::new(0, Value::List(ints(&[3, 7]))),
            Item::new(1, Value::List(ints(&[14]))),
            Item::new(2, Value::List(ints(&[25, 21, 29]))),
        ]
    );
}

#[test]
fn limit_never_pulls_past_its_count() {
    let pulled = Rc::new(Cell::new(0));
    let out = Pipeline::new(counting_source(100, Rc::clone(&pulled)))
        .limit(3)
        .values()
        .unwrap();
    assert_eq!(out, ints(&[0, 1, 2]));
    assert_eq!(pulled.get(), 3);
}

#[test]
fn limit_zero_pulls_nothing() {
    let pulled = Rc::new(Cell::new(0));
    let out = Pipeline::new(counting_source(100, Rc::clone(&pulled)))
        .limit(0)
        .to_vec()
        .unwrap();
    assert!(out.is_empty());
    assert_eq!(pulled.get(), 0);
}

#[test]
fn limit_downstream_of_a_buffer_still_stops_the_buffer_output() {
    let out = Pipeline::from_values([4, 1, 3, 2])
        .sort(ByValue)
        .limit(2)
        .values()
        .unwrap();
    assert_eq!(out, ints(&[1, 2]));
}

#[test]
fn skip_then_limit_composes() {
    let pulled = Rc::new(Cell::new(0));
    let out = Pipeline::new(counting_source(50, Rc::clone(&pulled)))
        .skip(2)
        .limit(2)
        .values()
        .unwrap();
    assert_eq!(out, ints(&[2, 3]));
    assert_eq!(pulled.get(), 4);
}

#[test]
fn prepend_and_append_wrap_the_stream() {
    let out = Pipeline::from_values([1, 2])
        .prepend(VecProducer::from_values([10, 11]))
        .append(VecProducer::from_values([99]))
        .values()
        .unwrap();
    assert_eq!(out, ints(&[10, 11, 1, 2, 99]));
}

#[test]
fn find_stops_the_source() {
    let pulled = Rc::new(Cell::new(0));
    let hit = Pipeline::new(counting_source(1000, Rc::clone(&pulled)))
        .find(|v: &Value, _k: &Value| v.as_i64() == Some(4))
        .unwrap();
    assert_eq!(hit, Some(Item::new(4, 4)));
    assert_eq!(pulled.get(), 5);
}

#[test]
fn find_mid_chain_feeds_later_stages_on_both_paths() {
    let build = || {
        Pipeline::from_values([1, 5, 2, 7])
            .then(Find::new(value_filter(|v| v.as_i64().map_or(false, |n| n > 2))))
            .count()
    };
    let pushed = build().to_vec().unwrap();
    let pulled = build().stream().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(pushed, vec![Item::new(0, 1)]);
    assert_eq!(pulled, pushed);

    let run = build().run().unwrap();
    assert!(!run.metrics.stopped_early);
}

#[test]
fn step_limit_aborts_the_run() {
    let mut config = EngineConfig::default();
    config.max_steps = Some(5);
    let err = Pipeline::range(0, 100, 1)
        .unwrap()
        .with_config(config)
        .to_vec()
        .unwrap_err();
    assert!(matches!(err, ExecError::StepLimit(5)));
}

#[test]
fn engine_is_an_iterator_and_stays_done_after_an_error() {
    let mut config = EngineConfig::default();
    config.max_steps = Some(2);
    let mut engine = Pipeline::from_values([1, 2, 3, 4])
        .with_config(config)
        .engine()
        .unwrap();
    assert_eq!(engine.next().map(|r| r.map(|i| i.value)).transpose().unwrap(), Some(Value::I64(1)));
    assert_eq!(engine.next().map(|r| r.map(|i| i.value)).transpose().unwrap(), Some(Value::I64(2)));
    assert!(matches!(engine.next(), Some(Err(ExecError::StepLimit(2)))));
    assert!(engine.next().is_none());
    assert!(engine.is_done());
}

#[test]
fn detached_engine_accepts_fed_items_and_destroys_twice() {
    let stages: Vec<BoxOperation> = vec![Box::new(Limit::new(2)), Box::new(Reverse::default())];
    let mut engine = Engine::detached(stages, EngineConfig::default());
    assert!(engine.feed(Item::new(0, "x")).unwrap().is_empty());
    assert!(engine.feed(Item::new(1, "y")).unwrap().is_empty());
    assert!(engine.feed(Item::new(2, "z")).unwrap().is_empty());
    let out = engine.finish().unwrap();
    assert_eq!(out, vec![Item::new(1, "y"), Item::new(0, "x")]);

    engine.destroy();
    engine.destroy();
    assert!(matches!(
        engine.feed(Item::new(3, "w")),
        Err(ExecError::Destroyed)
    ));
}

#[test]
fn run_output_carries_a_reproducible_manifest() {
    let build = || Pipeline::from_values([3, 1, 2]).sort(ByValue);
    let a = build().run().unwrap();
    let b = build().run().unwrap();
    assert_eq!(a.manifest.plan_hash, b.manifest.plan_hash);
    assert_eq!(a.manifest.outputs_digest, b.manifest.outputs_digest);
    assert_ne!(a.manifest.id, b.manifest.id);
    assert_eq!(a.metrics.items_emitted, 3);
    assert_eq!(a.metrics.restarts, 1);
}
