//! Sinks buffering stages fill before re-emitting through a new source.

use std::collections::BTreeMap;

use crate::item::Item;
use crate::producer::VecProducer;
use crate::value::Value;

pub trait Collector {
    /// Store `value` under `key`, overwriting an existing entry in place.
    fn set(&mut self, key: Value, value: Value);

    /// Append `value` under the next free integer key.
    fn add(&mut self, value: Value);
}

/// Ordered key/value collector. Keys keep their first-insertion position.
#[derive(Debug, Default)]
pub struct ItemCollector {
    items: Vec<Item>,
    index: BTreeMap<Value, usize>,
    next_key: i64,
}

impl ItemCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get_mut(&mut self, key: &Value) -> Option<&mut Value> {
        let pos = *self.index.get(key)?;
        self.items.get_mut(pos).map(|item| &mut item.value)
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    pub fn into_producer(self) -> VecProducer {
        VecProducer::new(self.items)
    }
}

impl Collector for ItemCollector {
    fn set(&mut self, key: Value, value: Value) {
        if let Value::I64(n) = key {
            self.next_key = self.next_key.max(n.saturating_add(1));
        }
        match self.index.get(&key) {
            Some(&pos) => self.items[pos].value = value,
            None => {
                self.index.insert(key.clone(), self.items.len());
                self.items.push(Item { key, value });
            }
        }
    }

    fn add(&mut self, value: Value) {
        let key = Value::I64(self.next_key);
        self.set(key, value);
    }
}

/// Plain list of values; keys are discarded.
impl Collector for Vec<Value> {
    fn set(&mut self, _key: Value, value: Value) {
        self.push(value);
    }

    fn add(&mut self, value: Value) {
        self.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overwrites_in_place_and_add_continues_numbering() {
        let mut c = ItemCollector::new();
        c.set(Value::from("a"), Value::I64(1));
        c.set(Value::I64(4), Value::I64(2));
        c.set(Value::from("a"), Value::I64(3));
        c.add(Value::I64(9));

        let items = c.into_items();
        assert_eq!(
            items,
            vec![
                Item::new("a", 3),
                Item::new(4, 2),
                Item::new(5, 9),
            ]
        );
    }
}
