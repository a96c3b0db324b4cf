//! Named built-in strategies for declarative pipelines.
//!
//! Names use call syntax, `name` or `name(arg, ...)`. Each family has an
//! arity table; a known name called with the wrong number of arguments is a
//! contract error, raised here before any item flows.

use std::cmp::Ordering;
use std::rc::Rc;

use lazypipe_core::strategy::{
    ByKey, ByValue, Reversed, SharedComparator, SharedDiscriminator, SharedFilter, SharedMapper,
    SharedReducer,
};
use lazypipe_core::Value;

use crate::expr::{Arith, Predicate};
use crate::fanout::handler::{self, HandlerFactory};
use crate::traits::OpError;

/// A parsed `name(args)` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Value>,
}

impl Call {
    pub fn parse(spec: &str) -> Result<Self, OpError> {
        let spec = spec.trim();
        let Some(open) = spec.find('(') else {
            return Ok(Self {
                name: spec.to_string(),
                args: Vec::new(),
            });
        };
        let inner = spec[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| OpError::Config(format!("unbalanced call syntax: {spec}")))?;
        let args = if inner.trim().is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(crate::expr::parse_literal).collect()
        };
        Ok(Self {
            name: spec[..open].trim().to_string(),
            args,
        })
    }

    fn expect_arity(&self, family: &str, table: &[(&str, usize)]) -> Result<(), OpError> {
        match table.iter().find(|(name, _)| *name == self.name) {
            Some((_, arity)) if *arity == self.args.len() => Ok(()),
            Some((name, arity)) => Err(OpError::Contract(format!(
                "{family} '{name}' takes {arity} argument(s), got {}",
                self.args.len()
            ))),
            None => Err(OpError::Config(format!("unknown {family} '{}'", self.name))),
        }
    }

    fn usize_arg(&self, i: usize) -> Result<usize, OpError> {
        self.args
            .get(i)
            .and_then(Value::as_i64)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| {
                OpError::Config(format!("{}: argument {i} must be a non-negative integer", self.name))
            })
    }
}

const COMPARATORS: &[(&str, usize)] = &[("value", 0), ("key", 0), ("len", 0)];

pub fn comparator(spec: &str, descending: bool) -> Result<SharedComparator, OpError> {
    let call = Call::parse(spec)?;
    call.expect_arity("comparator", COMPARATORS)?;
    let cmp: SharedComparator = match call.name.as_str() {
        "value" => Rc::new(ByValue),
        "key" => Rc::new(ByKey),
        _ => Rc::new(|a: &Value, b: &Value, _ka: &Value, _kb: &Value| {
            length(a).cmp(&length(b))
        }),
    };
    Ok(if descending {
        Rc::new(Reversed(cmp))
    } else {
        cmp
    })
}

const DISCRIMINATORS: &[(&str, usize)] = &[
    ("value", 0),
    ("key", 0),
    ("parity", 0),
    ("sign", 0),
    ("type", 0),
    ("mod", 1),
];

/// A named discriminator, or a predicate expression whose boolean result
/// becomes the label.
pub fn discriminator(spec: &str) -> Result<SharedDiscriminator, OpError> {
    if Predicate::looks_like(spec) {
        let p = Predicate::parse(spec)?;
        return Ok(Rc::new(move |v: &Value, k: &Value| Value::Bool(p.eval(v, k))));
    }
    let call = Call::parse(spec)?;
    call.expect_arity("discriminator", DISCRIMINATORS)?;
    let d: SharedDiscriminator = match call.name.as_str() {
        "value" => Rc::new(|v: &Value, _k: &Value| v.clone()),
        "key" => Rc::new(|_v: &Value, k: &Value| k.clone()),
        "parity" => Rc::new(|v: &Value, _k: &Value| match v.as_i64() {
            Some(n) if n % 2 == 0 => Value::from("even"),
            Some(_) => Value::from("odd"),
            None => Value::Null,
        }),
        "sign" => Rc::new(|v: &Value, _k: &Value| match v.as_f64() {
            Some(n) if n < 0.0 => Value::from("negative"),
            Some(n) if n > 0.0 => Value::from("positive"),
            Some(_) => Value::from("zero"),
            None => Value::Null,
        }),
        "type" => Rc::new(|v: &Value, _k: &Value| Value::from(v.type_name())),
        _ => {
            let m = call.usize_arg(0)? as i64;
            if m == 0 {
                return Err(OpError::Config("mod(n) needs n >= 1".into()));
            }
            Rc::new(move |v: &Value, _k: &Value| match v.as_i64() {
                Some(n) => Value::I64(n.rem_euclid(m)),
                None => Value::Null,
            })
        }
    };
    Ok(d)
}

const FILTERS: &[(&str, usize)] = &[("truthy", 0), ("even", 0), ("odd", 0), ("not_null", 0)];

pub fn filter(spec: &str) -> Result<SharedFilter, OpError> {
    if Predicate::looks_like(spec) {
        let p = Predicate::parse(spec)?;
        return Ok(Rc::new(move |v: &Value, k: &Value| p.eval(v, k)));
    }
    let call = Call::parse(spec)?;
    call.expect_arity("filter", FILTERS)?;
    let f: SharedFilter = match call.name.as_str() {
        "truthy" => Rc::new(|v: &Value, _k: &Value| v.is_truthy()),
        "even" => Rc::new(|v: &Value, _k: &Value| v.as_i64().map_or(false, |n| n % 2 == 0)),
        "odd" => Rc::new(|v: &Value, _k: &Value| v.as_i64().map_or(false, |n| n % 2 != 0)),
        _ => Rc::new(|v: &Value, _k: &Value| !v.is_null()),
    };
    Ok(f)
}

const MAPPERS: &[(&str, usize)] = &[
    ("value", 0),
    ("key", 0),
    ("negate", 0),
    ("len", 0),
    ("to_string", 0),
    ("pair", 0),
];

pub fn mapper(spec: &str) -> Result<SharedMapper, OpError> {
    if Arith::looks_like(spec) {
        let a = Arith::parse(spec)?;
        return Ok(Rc::new(move |v: &Value, k: &Value| a.eval(v, k)));
    }
    let call = Call::parse(spec)?;
    call.expect_arity("mapper", MAPPERS)?;
    let m: SharedMapper = match call.name.as_str() {
        "value" => Rc::new(|v: &Value, _k: &Value| v.clone()),
        "key" => Rc::new(|_v: &Value, k: &Value| k.clone()),
        "negate" => Rc::new(|v: &Value, _k: &Value| match v {
            Value::I64(n) => n.checked_neg().map_or(Value::Null, Value::I64),
            Value::F64(f) => Value::F64(-f),
            Value::Bool(b) => Value::Bool(!b),
            _ => Value::Null,
        }),
        "len" => Rc::new(|v: &Value, _k: &Value| {
            length(v).map_or(Value::Null, |n| Value::I64(n as i64))
        }),
        "to_string" => Rc::new(|v: &Value, _k: &Value| Value::Str(v.to_string())),
        _ => Rc::new(|v: &Value, k: &Value| Value::List(vec![k.clone(), v.clone()])),
    };
    Ok(m)
}

const REDUCERS: &[(&str, usize)] = &[
    ("sum", 0),
    ("count", 0),
    ("min", 0),
    ("max", 0),
    ("concat", 0),
];

/// A reducer together with its natural initial accumulator.
pub fn reducer(spec: &str) -> Result<(SharedReducer, Value), OpError> {
    let call = Call::parse(spec)?;
    call.expect_arity("reducer", REDUCERS)?;
    Ok(match call.name.as_str() {
        "sum" => (Rc::new(sum) as SharedReducer, Value::I64(0)),
        "count" => (Rc::new(count) as SharedReducer, Value::I64(0)),
        "min" => (Rc::new(min) as SharedReducer, Value::Null),
        "max" => (Rc::new(max) as SharedReducer, Value::Null),
        _ => (Rc::new(concat) as SharedReducer, Value::Null),
    })
}

const HANDLERS: &[(&str, usize)] = &[
    ("collect", 0),
    ("pairs", 0),
    ("count", 0),
    ("sum", 0),
    ("min", 0),
    ("max", 0),
    ("concat", 0),
    ("tail", 1),
];

pub fn handler(spec: &str) -> Result<HandlerFactory, OpError> {
    let call = Call::parse(spec)?;
    call.expect_arity("handler", HANDLERS)?;
    match call.name.as_str() {
        "collect" => Ok(handler::collect()),
        "pairs" => Ok(handler::pairs()),
        "tail" => handler::tail(call.usize_arg(0)?),
        name => {
            let (r, init) = reducer(name)?;
            Ok(handler::reduce(r, init))
        }
    }
}

fn length(v: &Value) -> Option<usize> {
    match v {
        Value::Str(s) => Some(s.chars().count()),
        Value::List(items) => Some(items.len()),
        Value::Bin(bytes) => Some(bytes.len()),
        _ => None,
    }
}

pub fn sum(acc: Value, v: &Value, _k: &Value) -> Value {
    crate::expr::apply_arith(&acc, crate::expr::ArithOp::Add, v)
}

pub fn count(acc: Value, _v: &Value, _k: &Value) -> Value {
    Value::I64(acc.as_i64().unwrap_or(0) + 1)
}

pub fn min(acc: Value, v: &Value, _k: &Value) -> Value {
    if acc.is_null() || v.cmp(&acc) == Ordering::Less {
        v.clone()
    } else {
        acc
    }
}

pub fn max(acc: Value, v: &Value, _k: &Value) -> Value {
    if acc.is_null() || v.cmp(&acc) == Ordering::Greater {
        v.clone()
    } else {
        acc
    }
}

/// Strings concatenate; anything else collects into a list.
pub fn concat(acc: Value, v: &Value, _k: &Value) -> Value {
    match (acc, v) {
        (Value::Null, Value::Str(s)) => Value::Str(s.clone()),
        (Value::Str(mut a), Value::Str(b)) => {
            a.push_str(b);
            Value::Str(a)
        }
        (Value::Null, other) => Value::List(vec![other.clone()]),
        (Value::List(mut items), other) => {
            items.push(other.clone());
            Value::List(items)
        }
        (other, next) => Value::List(vec![other, next.clone()]),
    }
}
