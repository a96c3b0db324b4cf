//! Lowering: document → rewritten steps → checked stage bindings.

use tracing::debug;

use lazypipe_operators::registry;

use crate::dsl::yaml::{parse_yaml_pipeline, PipelineDoc};
use crate::error::PlanError;
use crate::physical::{PhysicalProgram, StageBinding};
use crate::rules;

pub fn lower_to_physical(doc: PipelineDoc) -> Result<PhysicalProgram, PlanError> {
    let (steps, rewrites) = rules::optimize(doc.steps);
    let mut bindings = Vec::with_capacity(steps.len());
    for (index, step) in steps.iter().enumerate() {
        let key = step.key();
        let config = step.to_config()?;
        // Build once and drop: surfaces bad arguments and strategy arity now.
        registry::build(key, &config).map_err(|source| PlanError::Stage {
            index,
            key: key.to_string(),
            source,
        })?;
        bindings.push(StageBinding {
            key: key.to_string(),
            config,
        });
    }
    for note in &rewrites {
        debug!(rewrite = %note, "applied rewrite");
    }
    let program = PhysicalProgram {
        config: doc.config,
        source: doc.source,
        bindings,
        rewrites,
    };
    program.producer()?;
    Ok(program)
}

/// Parse and lower in one go.
pub fn plan_yaml(yaml_src: &str) -> Result<PhysicalProgram, PlanError> {
    lower_to_physical(parse_yaml_pipeline(yaml_src)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazypipe_operators::OpError;

    #[test]
    fn lowers_steps_to_bindings() {
        let program = plan_yaml(
            r#"
source: { values: [3, 1, 2] }
steps:
  - { op: map, expr: "value * 2" }
  - { op: sort }
  - { op: limit, n: 2 }
"#,
        )
        .unwrap();
        let keys: Vec<&str> = program.bindings.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["map", "top_k"]);
        assert_eq!(program.rewrites.len(), 1);
        assert_eq!(program.producer().unwrap().len_hint(), Some(3));
    }

    #[test]
    fn wrong_arity_is_a_contract_error() {
        let err = plan_yaml("steps: [{op: group, by: \"mod(1, 2)\"}]").unwrap_err();
        match err {
            PlanError::Stage { index, source, .. } => {
                assert_eq!(index, 0);
                assert!(matches!(source, OpError::Contract(_)));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn bad_arguments_fail_before_running() {
        assert!(matches!(
            plan_yaml("steps: [{op: chunk, size: 0}]"),
            Err(PlanError::Stage { .. })
        ));
        assert!(matches!(
            plan_yaml("source: {range: {start: 0, end: 3, step: 0}}\nsteps: []"),
            Err(PlanError::Source(_))
        ));
    }

    #[test]
    fn plan_hash_ignores_run_config() {
        let a = plan_yaml("config: {max_steps: 1}\nsteps: [{op: reverse}]").unwrap();
        let b = plan_yaml("steps: [{op: reverse}]").unwrap();
        assert_eq!(a.plan_hash().unwrap(), b.plan_hash().unwrap());
    }
}
