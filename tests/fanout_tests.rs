//! Fork, Dispatch, Unzip and Route through the engine and the pull path.

use std::rc::Rc;

use lazypipe_core::strategy::{value_mapper, Mapper};
use lazypipe_core::{Item, Value};
use lazypipe_exec::{sub_pipeline, ExecError, Pipeline};
use lazypipe_operators::builtin;
use lazypipe_operators::fanout::handler;
use lazypipe_operators::limit::Skip;
use lazypipe_operators::traits::BoxOperation;
use lazypipe_operators::{HandlerFactory, OpError};

fn ints(xs: &[i64]) -> Vec<Value> {
    xs.iter().copied().map(Value::I64).collect()
}

fn parity() -> impl Fn(&Value, &Value) -> Value {
    |v: &Value, _k: &Value| match v.as_i64() {
        Some(n) if n % 2 == 0 => Value::from("even"),
        _ => Value::from("odd"),
    }
}

#[test]
fn fork_partitions_by_label_in_first_seen_order() {
    let out = Pipeline::from_values([2, 1, 4, 3, 6])
        .fork(parity(), handler::collect())
        .to_vec()
        .unwrap();
    assert_eq!(
        out,
        vec![
            Item::new("even", Value::List(ints(&[2, 4, 6]))),
            Item::new("odd", Value::List(ints(&[1, 3]))),
        ]
    );
}

#[test]
fn fork_over_empty_input_emits_nothing() {
    let out = Pipeline::from_values(Vec::<i64>::new())
        .fork(parity(), handler::collect())
        .to_vec()
        .unwrap();
    assert!(out.is_empty());
}

#[test]
fn fork_handlers_can_reduce() {
    let out = Pipeline::from_values(1..=6)
        .fork(parity(), handler::count())
        .values()
        .unwrap();
    assert_eq!(out, ints(&[3, 3]));
}

#[test]
fn dispatch_uses_declared_branches() {
    let branches: Vec<(Value, HandlerFactory)> = vec![
        (Value::from("odd"), handler::count()),
        (Value::from("even"), handler::collect()),
    ];
    let out = Pipeline::from_values([1, 2, 3, 4, 5])
        .dispatch(parity(), branches)
        .unwrap()
        .to_vec()
        .unwrap();
    assert_eq!(
        out,
        vec![
            Item::new("odd", 3),
            Item::new("even", Value::List(ints(&[2, 4]))),
        ]
    );
}

#[test]
fn dispatch_rejects_an_unmapped_label() {
    let err = Pipeline::from_values([2, 4, 5])
        .dispatch(parity(), vec![(Value::from("even"), handler::collect())])
        .unwrap()
        .to_vec()
        .unwrap_err();
    match err {
        ExecError::Op(OpError::UnmappedLabel(label)) => assert_eq!(label, Value::from("odd")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn dispatch_rejects_duplicate_labels_at_construction() {
    let result = Pipeline::from_values([1]).dispatch(
        parity(),
        vec![
            (Value::from("odd"), handler::collect()),
            (Value::from("odd"), handler::count()),
        ],
    );
    assert!(matches!(result, Err(ExecError::Op(OpError::Config(_)))));
}

#[test]
fn boolean_labels_become_integers() {
    let out = Pipeline::from_values([5, 10, 15])
        .fork(
            |v: &Value, _k: &Value| Value::Bool(v.as_i64().map_or(false, |n| n > 7)),
            handler::collect(),
        )
        .to_vec()
        .unwrap();
    assert_eq!(
        out,
        vec![
            Item::new(0, Value::List(ints(&[5]))),
            Item::new(1, Value::List(ints(&[10, 15]))),
        ]
    );
}

#[test]
fn unzip_splits_list_values_positionally() {
    let rows = vec![
        Value::List(vec![1.into(), "a".into()]),
        Value::List(vec![2.into(), "b".into(), "ignored".into()]),
        Value::List(vec![3.into()]),
    ];
    let out = Pipeline::from_values(rows)
        .unzip(vec![builtin::handler("sum").unwrap(), handler::collect()])
        .unwrap()
        .to_vec()
        .unwrap();
    assert_eq!(
        out,
        vec![
            Item::new(0, 6),
            Item::new(1, Value::List(vec!["a".into(), "b".into()])),
        ]
    );
}

#[test]
fn unzip_rejects_scalar_values() {
    let err = Pipeline::from_values([1])
        .unzip(vec![handler::collect()])
        .unwrap()
        .to_vec()
        .unwrap_err();
    assert!(matches!(err, ExecError::Op(OpError::Exec(_))));
}

#[test]
fn route_maps_each_item_by_its_branch() {
    let branches: Vec<(Value, Rc<dyn Mapper>)> = vec![
        (Value::from("even"), value_mapper(|v| Value::I64(v.as_i64().unwrap_or(0) / 2))),
        (Value::from("odd"), value_mapper(|v| Value::I64(v.as_i64().unwrap_or(0) * 3 + 1))),
    ];
    let out = Pipeline::from_values([6, 7, 8])
        .route(parity(), branches)
        .unwrap()
        .values()
        .unwrap();
    assert_eq!(out, ints(&[3, 22, 4]));
}

#[test]
fn fork_into_sub_pipelines() {
    let skip_first = sub_pipeline(|| vec![Box::new(Skip::new(1)) as BoxOperation]);
    let out = Pipeline::from_values([1, 2, 3, 4, 5, 6])
        .fork(parity(), skip_first)
        .values()
        .unwrap();
    assert_eq!(
        out,
        vec![Value::List(ints(&[3, 5])), Value::List(ints(&[4, 6]))]
    );
}

#[test]
fn fan_out_push_and_pull_agree() {
    let build = || {
        Pipeline::from_values([9, 4, 7, 2, 2, 5])
            .fork(parity(), handler::pairs())
    };
    let pushed = build().to_vec().unwrap();
    let pulled: Vec<Item> = build().stream().collect::<Result<_, _>>().unwrap();
    assert_eq!(pushed, pulled);
}
