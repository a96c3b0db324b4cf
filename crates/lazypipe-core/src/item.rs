//! The unit flowing through a pipeline.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// One key/value pair.
///
/// Stages edit the live item in place through the signal; anything kept past
/// the current step must be cloned or taken out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub key: Value,
    pub value: Value,
}

impl Item {
    pub fn new(key: impl Into<Value>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn into_pair(self) -> (Value, Value) {
        (self.key, self.value)
    }

    /// `[key, value]` as a two-element list.
    pub fn into_list(self) -> Value {
        Value::List(vec![self.key, self.value])
    }
}

impl From<(Value, Value)> for Item {
    fn from((key, value): (Value, Value)) -> Self {
        Self { key, value }
    }
}

/// Items keyed by position: `0, 1, 2, ...`.
pub fn indexed<I, V>(values: I) -> Vec<Item>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| Item::new(i, v))
        .collect()
}
