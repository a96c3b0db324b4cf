//! YAML pipeline documents for *linear* pipelines.
//!
//! Example:
//! ```yaml
//! config: { max_steps: 10000 }
//! source: { values: [5, 3, 8, 1, 9, 2] }
//! steps:
//!   - op: filter
//!     expr: "value > 1"
//!   - op: sort
//!     by: value
//!   - op: limit
//!     n: 3
//!   - op: fork
//!     by: parity
//!     handler: collect
//! ```
//!
//! Strategy fields (`expr`, `by`, `with`, `handler`) name built-ins using
//! call syntax, e.g. `mod(3)` or `tail(2)`.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use lazypipe_core::config::ConfigOverrides;

use crate::error::PlanError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDoc {
    #[serde(default)]
    pub config: ConfigOverrides,
    /// Written as a single-key map, e.g. `source: { range: { start: 0, end: 5 } }`.
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub source: Option<SourceSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSpec {
    /// Values keyed by position.
    Values(Vec<Json>),
    Items(Vec<ItemSpec>),
    Range {
        start: i64,
        end: i64,
        #[serde(default = "one")]
        step: i64,
    },
}

fn one() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSpec {
    pub key: Json,
    pub value: Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteBranch {
    pub label: Json,
    pub map: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchBranch {
    pub label: Json,
    #[serde(default = "collect")]
    pub handler: String,
}

fn collect() -> String {
    "collect".into()
}

fn by_value() -> String {
    "value".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Filter {
        expr: String,
    },
    Map {
        expr: String,
    },
    MapKeys {
        expr: String,
    },
    Flip,
    Reindex,
    Limit {
        n: usize,
    },
    Skip {
        n: usize,
    },
    TakeWhile {
        expr: String,
    },
    SkipWhile {
        expr: String,
    },
    Find {
        expr: String,
    },
    Flatten {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        depth: Option<usize>,
    },
    Chunk {
        size: usize,
    },
    GroupAdjacent {
        by: String,
    },
    Prepend {
        values: Vec<Json>,
    },
    Append {
        values: Vec<Json>,
    },
    Route {
        by: String,
        branches: Vec<RouteBranch>,
    },
    Sort {
        #[serde(default = "by_value")]
        by: String,
        #[serde(default)]
        desc: bool,
    },
    Reverse,
    Group {
        by: String,
    },
    Reduce {
        with: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        init: Option<Json>,
    },
    Count,
    TopK {
        k: usize,
        #[serde(default = "by_value")]
        by: String,
        #[serde(default)]
        desc: bool,
    },
    Tail {
        n: usize,
    },
    Segregate {
        #[serde(default = "by_value")]
        by: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_buckets: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bucket_size: Option<usize>,
    },
    Fork {
        by: String,
        #[serde(default = "collect")]
        handler: String,
    },
    Dispatch {
        by: String,
        branches: Vec<DispatchBranch>,
    },
    Unzip {
        handlers: Vec<String>,
    },
}

impl Step {
    /// Registry key; the same string as the `op` tag.
    pub fn key(&self) -> &'static str {
        match self {
            Step::Filter { .. } => "filter",
            Step::Map { .. } => "map",
            Step::MapKeys { .. } => "map_keys",
            Step::Flip => "flip",
            Step::Reindex => "reindex",
            Step::Limit { .. } => "limit",
            Step::Skip { .. } => "skip",
            Step::TakeWhile { .. } => "take_while",
            Step::SkipWhile { .. } => "skip_while",
            Step::Find { .. } => "find",
            Step::Flatten { .. } => "flatten",
            Step::Chunk { .. } => "chunk",
            Step::GroupAdjacent { .. } => "group_adjacent",
            Step::Prepend { .. } => "prepend",
            Step::Append { .. } => "append",
            Step::Route { .. } => "route",
            Step::Sort { .. } => "sort",
            Step::Reverse => "reverse",
            Step::Group { .. } => "group",
            Step::Reduce { .. } => "reduce",
            Step::Count => "count",
            Step::TopK { .. } => "top_k",
            Step::Tail { .. } => "tail",
            Step::Segregate { .. } => "segregate",
            Step::Fork { .. } => "fork",
            Step::Dispatch { .. } => "dispatch",
            Step::Unzip { .. } => "unzip",
        }
    }

    /// The step's fields as a JSON object, without the `op` tag.
    pub fn to_config(&self) -> Result<Json, PlanError> {
        let mut json = serde_json::to_value(self)?;
        if let Some(fields) = json.as_object_mut() {
            fields.remove("op");
        }
        Ok(json)
    }
}

pub fn parse_yaml_pipeline(yaml_src: &str) -> Result<PipelineDoc, PlanError> {
    Ok(serde_yaml::from_str(yaml_src)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_full_document() {
        let doc = parse_yaml_pipeline(
            r#"
config:
  max_steps: 50
source:
  range: { start: 0, end: 10 }
steps:
  - op: filter
    expr: "value > 2"
  - op: flip
  - op: sort
    desc: true
  - op: dispatch
    by: parity
    branches:
      - { label: even, handler: sum }
      - { label: odd }
"#,
        )
        .unwrap();
        assert_eq!(doc.config.max_steps, Some(50));
        assert_eq!(
            doc.source,
            Some(SourceSpec::Range {
                start: 0,
                end: 10,
                step: 1
            })
        );
        assert_eq!(doc.steps.len(), 4);
        assert_eq!(doc.steps[1], Step::Flip);
        assert_eq!(
            doc.steps[2],
            Step::Sort {
                by: "value".into(),
                desc: true
            }
        );
        match &doc.steps[3] {
            Step::Dispatch { branches, .. } => assert_eq!(branches[1].handler, "collect"),
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn sources_are_single_key_maps() {
        let doc = parse_yaml_pipeline(
            r#"
source:
  values:
    - 3
    - x
steps: []
"#,
        )
        .unwrap();
        assert_eq!(doc.source, Some(SourceSpec::Values(vec![json!(3), json!("x")])));

        let doc = parse_yaml_pipeline("source: { items: [{ key: a, value: 1 }] }").unwrap();
        assert_eq!(
            doc.source,
            Some(SourceSpec::Items(vec![ItemSpec {
                key: json!("a"),
                value: json!(1),
            }]))
        );

        assert_eq!(parse_yaml_pipeline("steps: []").unwrap().source, None);
        assert!(parse_yaml_pipeline("source: { lines: [1] }").is_err());
    }

    #[test]
    fn config_drops_the_tag_and_empty_options() {
        let step = Step::Reduce {
            with: "sum".into(),
            init: None,
        };
        assert_eq!(step.to_config().unwrap(), json!({"with": "sum"}));
        assert_eq!(step.key(), "reduce");
    }

    #[test]
    fn unknown_ops_and_fields_are_rejected() {
        assert!(parse_yaml_pipeline("steps: [{op: explode}]").is_err());
        assert!(parse_yaml_pipeline("config: {mem_cap: 1}\nsteps: []").is_err());
    }
}
