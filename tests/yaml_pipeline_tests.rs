//! YAML documents planned, lowered and run end to end.

use lazypipe_core::config::EngineConfig;
use lazypipe_core::producer::VecProducer;
use lazypipe_core::{Item, Value};
use lazypipe_exec::{ExecError, Pipeline};
use lazypipe_planner::{parse_yaml_pipeline, plan_yaml, PlanError};

fn run(yaml: &str) -> Result<Vec<Item>, ExecError> {
    let program = plan_yaml(yaml)?;
    Pipeline::from_program(&program, None, EngineConfig::default())?.to_vec()
}

fn ints(xs: &[i64]) -> Vec<Value> {
    xs.iter().copied().map(Value::I64).collect()
}

#[test]
fn sort_then_limit_is_planned_as_top_k() {
    let program = plan_yaml(
        r#"
source: { values: [5, 3, 8, 1, 9, 2] }
steps:
  - op: sort
  - op: limit
    n: 3
"#,
    )
    .unwrap();
    assert_eq!(program.bindings.len(), 1);
    assert_eq!(program.bindings[0].key, "top_k");
    assert_eq!(program.rewrites.len(), 1);

    let out = Pipeline::from_program(&program, None, EngineConfig::default())
        .unwrap()
        .values()
        .unwrap();
    assert_eq!(out, ints(&[1, 2, 3]));
}

#[test]
fn filter_map_and_fork_with_a_reducing_handler() {
    let out = run(
        r#"
source: { range: { start: 1, end: 7 } }
steps:
  - op: filter
    expr: "value > 1"
  - op: map
    expr: "value * 10"
  - op: fork
    by: parity
    handler: sum
"#,
    )
    .unwrap();
    assert_eq!(out, vec![Item::new("even", 120), Item::new("odd", 80)]);
}

#[test]
fn tail_and_segregate_from_yaml() {
    let out = run(
        r#"
source: { values: [a, b, c, d, e] }
steps:
  - op: tail
    n: 3
"#,
    )
    .unwrap();
    assert_eq!(
        out,
        vec![Item::new(2, "c"), Item::new(3, "d"), Item::new(4, "e")]
    );

    let buckets = run(
        r#"
source: { values: [3, 1, 3, 2, 1] }
steps:
  - op: segregate
"#,
    )
    .unwrap();
    assert_eq!(
        buckets.into_iter().map(|i| i.value).collect::<Vec<_>>(),
        vec![
            Value::List(ints(&[1, 1])),
            Value::List(ints(&[2])),
            Value::List(ints(&[3, 3])),
        ]
    );
}

#[test]
fn input_replaces_the_declared_source() {
    let program = plan_yaml(
        r#"
source: { values: [1, 2, 3] }
steps:
  - op: reverse
"#,
    )
    .unwrap();
    let input = Box::new(VecProducer::from_values([7, 8]));
    let out = Pipeline::from_program(&program, Some(input), EngineConfig::default())
        .unwrap()
        .values()
        .unwrap();
    assert_eq!(out, ints(&[8, 7]));
}

#[test]
fn config_block_reaches_the_engine() {
    let err = run(
        r#"
config: { max_steps: 3 }
source: { range: { start: 0, end: 100 } }
steps: []
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ExecError::StepLimit(3)));
}

#[test]
fn dispatch_branches_from_yaml() {
    let out = run(
        r#"
source: { values: [1, 2, 3, 4] }
steps:
  - op: dispatch
    by: parity
    branches:
      - { label: odd, handler: count }
      - { label: even }
"#,
    )
    .unwrap();
    assert_eq!(
        out,
        vec![
            Item::new("odd", 2),
            Item::new("even", Value::List(ints(&[2, 4]))),
        ]
    );
}

#[test]
fn invalid_documents_fail_at_planning() {
    assert!(parse_yaml_pipeline("steps: [{op: limit}]").is_err());
    assert!(matches!(
        plan_yaml("steps: [{op: chunk, size: 0}]"),
        Err(PlanError::Stage { index: 0, .. })
    ));
    assert!(matches!(
        plan_yaml("steps: [{op: filter, expr: \"nope(1)\"}]"),
        Err(PlanError::Stage { .. })
    ));
}

#[test]
fn push_and_pull_agree_on_a_planned_program() {
    let program = plan_yaml(
        r#"
source: { values: [4, 8, 15, 16, 23, 42] }
steps:
  - op: skip
    n: 1
  - op: group_adjacent
    by: parity
  - op: flatten
  - op: top_k
    k: 4
    desc: true
"#,
    )
    .unwrap();
    let pushed = Pipeline::from_program(&program, None, EngineConfig::default())
        .unwrap()
        .to_vec()
        .unwrap();
    let pulled: Vec<Item> = Pipeline::from_program(&program, None, EngineConfig::default())
        .unwrap()
        .stream()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(pushed, pulled);
    assert_eq!(
        pushed.into_iter().map(|i| i.value).collect::<Vec<_>>(),
        ints(&[42, 23, 16, 15])
    );
}
