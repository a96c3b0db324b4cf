//! Build stages from a key and a JSON config.
//!
//! This is the table the planner's stage bindings resolve against. Strategy
//! fields are strings understood by [`crate::builtin`].

use lazypipe_core::producer::VecProducer;
use lazypipe_core::Value;
use serde_json::Value as Json;

use crate::builtin;
use crate::chunk::{Chunk, GroupAdjacent};
use crate::concat::{Append, Prepend};
use crate::fanout::{Dispatch, Fork, Route, Unzip};
use crate::filter::{Filter, Find, SkipWhile, TakeWhile};
use crate::flatten::Flatten;
use crate::group::{Group, Reduce};
use crate::limit::{Limit, Skip};
use crate::map::{Flip, Map, MapKeys, Reindex};
use crate::segregate::Segregate;
use crate::sort::{Reverse, Sort, TopK};
use crate::traits::{BoxOperation, OpError};
use crate::window::Tail;

/// Every key [`build`] understands.
pub const KEYS: &[&str] = &[
    "filter",
    "map",
    "map_keys",
    "flip",
    "reindex",
    "limit",
    "skip",
    "take_while",
    "skip_while",
    "find",
    "flatten",
    "chunk",
    "group_adjacent",
    "prepend",
    "append",
    "route",
    "sort",
    "reverse",
    "group",
    "reduce",
    "count",
    "top_k",
    "tail",
    "segregate",
    "fork",
    "dispatch",
    "unzip",
];

pub fn is_known(key: &str) -> bool {
    KEYS.contains(&key)
}

pub fn build(key: &str, config: &Json) -> Result<BoxOperation, OpError> {
    let op: BoxOperation = match key {
        "filter" => Box::new(Filter::new(builtin::filter(str_field(key, config, "expr")?)?)),
        "map" => Box::new(Map {
            mapper: builtin::mapper(str_field(key, config, "expr")?)?,
        }),
        "map_keys" => Box::new(MapKeys {
            mapper: builtin::mapper(str_field(key, config, "expr")?)?,
        }),
        "flip" => Box::new(Flip),
        "reindex" => Box::new(Reindex::default()),
        "limit" => Box::new(Limit::new(usize_field(key, config, "n")?)),
        "skip" => Box::new(Skip::new(usize_field(key, config, "n")?)),
        "take_while" => Box::new(TakeWhile {
            predicate: builtin::filter(str_field(key, config, "expr")?)?,
        }),
        "skip_while" => Box::new(SkipWhile {
            predicate: builtin::filter(str_field(key, config, "expr")?)?,
        }),
        "find" => Box::new(Find::new(builtin::filter(str_field(key, config, "expr")?)?)),
        "flatten" => Box::new(Flatten::new(opt_usize(key, config, "depth")?)?),
        "chunk" => Box::new(Chunk::new(usize_field(key, config, "size")?)?),
        "group_adjacent" => Box::new(GroupAdjacent::new(builtin::discriminator(str_field(
            key, config, "by",
        )?)?)),
        "prepend" => Box::new(Prepend::new(Box::new(values_field(key, config)?))),
        "append" => Box::new(Append::new(Box::new(values_field(key, config)?))),
        "route" => {
            let d = builtin::discriminator(str_field(key, config, "by")?)?;
            let mut branches = Vec::new();
            for branch in array_field(key, config, "branches")? {
                let label = label_field(key, branch)?;
                branches.push((label, builtin::mapper(str_field(key, branch, "map")?)?));
            }
            Box::new(Route::new(d, branches)?)
        }
        "sort" => Box::new(Sort::new(builtin::comparator(
            opt_str(config, "by").unwrap_or("value"),
            bool_field(config, "desc"),
        )?)),
        "reverse" => Box::new(Reverse::default()),
        "group" => Box::new(Group::new(builtin::discriminator(str_field(
            key, config, "by",
        )?)?)),
        "reduce" => {
            let (reducer, natural) = builtin::reducer(str_field(key, config, "with")?)?;
            let init = config.get("init").cloned().map_or(natural, Value::from);
            Box::new(Reduce::new(reducer, init))
        }
        "count" => Box::new(Reduce::count()),
        "top_k" => Box::new(TopK::new(
            usize_field(key, config, "k")?,
            builtin::comparator(opt_str(config, "by").unwrap_or("value"), bool_field(config, "desc"))?,
        )?),
        "tail" => Box::new(Tail::new(usize_field(key, config, "n")?)?),
        "segregate" => Box::new(Segregate::new(
            builtin::comparator(opt_str(config, "by").unwrap_or("value"), false)?,
            opt_usize(key, config, "max_buckets")?,
            opt_usize(key, config, "bucket_size")?,
        )?),
        "fork" => Box::new(Fork::new(
            builtin::discriminator(str_field(key, config, "by")?)?,
            builtin::handler(opt_str(config, "handler").unwrap_or("collect"))?,
        )),
        "dispatch" => {
            let d = builtin::discriminator(str_field(key, config, "by")?)?;
            let mut branches = Vec::new();
            for branch in array_field(key, config, "branches")? {
                let label = label_field(key, branch)?;
                let handler = builtin::handler(opt_str(branch, "handler").unwrap_or("collect"))?;
                branches.push((label, handler));
            }
            Box::new(Dispatch::new(d, branches)?)
        }
        "unzip" => {
            let mut handlers = Vec::new();
            for spec in array_field(key, config, "handlers")? {
                let spec = spec.as_str().ok_or_else(|| {
                    OpError::Config("unzip: every handler must be a string".into())
                })?;
                handlers.push(builtin::handler(spec)?);
            }
            Box::new(Unzip::new(handlers)?)
        }
        other => return Err(OpError::Config(format!("unknown stage key '{other}'"))),
    };
    Ok(op)
}

fn opt_str<'a>(config: &'a Json, field: &str) -> Option<&'a str> {
    config.get(field).and_then(Json::as_str)
}

fn str_field<'a>(key: &str, config: &'a Json, field: &str) -> Result<&'a str, OpError> {
    opt_str(config, field)
        .ok_or_else(|| OpError::Config(format!("{key}: missing string field '{field}'")))
}

fn bool_field(config: &Json, field: &str) -> bool {
    config.get(field).and_then(Json::as_bool).unwrap_or(false)
}

fn opt_usize(key: &str, config: &Json, field: &str) -> Result<Option<usize>, OpError> {
    match config.get(field) {
        None | Some(Json::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                OpError::Config(format!("{key}: '{field}' must be a non-negative integer"))
            }),
    }
}

fn usize_field(key: &str, config: &Json, field: &str) -> Result<usize, OpError> {
    opt_usize(key, config, field)?
        .ok_or_else(|| OpError::Config(format!("{key}: missing integer field '{field}'")))
}

fn array_field<'a>(key: &str, config: &'a Json, field: &str) -> Result<&'a [Json], OpError> {
    config
        .get(field)
        .and_then(Json::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| OpError::Config(format!("{key}: missing list field '{field}'")))
}

fn label_field(key: &str, branch: &Json) -> Result<Value, OpError> {
    branch
        .get("label")
        .cloned()
        .map(Value::from)
        .ok_or_else(|| OpError::Config(format!("{key}: every branch needs a 'label'")))
}

fn values_field(key: &str, config: &Json) -> Result<VecProducer, OpError> {
    let values = array_field(key, config, "values")?;
    Ok(VecProducer::from_values(
        values.iter().cloned().map(Value::from),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{self, collect_all};
    use lazypipe_core::item::indexed;
    use serde_json::json;

    fn pull(key: &str, config: Json, input: Vec<i64>) -> Vec<Value> {
        let op = build(key, &config).unwrap();
        collect_all(op.transform(stream::from_items(indexed(input))))
            .unwrap()
            .into_iter()
            .map(|item| item.value)
            .collect()
    }

    #[test]
    fn every_listed_key_is_dispatched() {
        for key in KEYS {
            match build(key, &json!({})) {
                Err(OpError::Config(msg)) => assert!(!msg.contains("unknown stage key"), "{key}"),
                _ => {}
            }
        }
        assert!(matches!(
            build("explode", &json!({})),
            Err(OpError::Config(_))
        ));
    }

    #[test]
    fn builds_streaming_stages() {
        assert_eq!(
            pull("filter", json!({"expr": "value > 2"}), vec![1, 3, 2, 5]),
            vec![Value::I64(3), Value::I64(5)]
        );
        assert_eq!(
            pull("map", json!({"expr": "value * 10"}), vec![1, 2]),
            vec![Value::I64(10), Value::I64(20)]
        );
    }

    #[test]
    fn builds_buffering_stages() {
        assert_eq!(
            pull("sort", json!({"by": "value", "desc": true}), vec![2, 9, 4]),
            vec![Value::I64(9), Value::I64(4), Value::I64(2)]
        );
        assert_eq!(
            pull("reduce", json!({"with": "sum", "init": 100}), vec![1, 2, 3]),
            vec![Value::I64(106)]
        );
    }

    #[test]
    fn dispatch_branches_come_from_config() {
        let out = pull(
            "dispatch",
            json!({
                "by": "parity",
                "branches": [
                    {"label": "even", "handler": "sum"},
                    {"label": "odd", "handler": "count"}
                ]
            }),
            vec![1, 2, 3, 4, 5],
        );
        assert_eq!(out, vec![Value::I64(6), Value::I64(3)]);
    }

    #[test]
    fn missing_fields_are_config_errors() {
        assert!(matches!(build("limit", &json!({})), Err(OpError::Config(_))));
        assert!(matches!(
            build("limit", &json!({"n": -1})),
            Err(OpError::Config(_))
        ));
        assert!(matches!(
            build("fork", &json!({"by": "value", "handler": "tail"})),
            Err(OpError::Contract(_))
        ));
    }
}
