//! Strategy traits: the narrow value-level collaborators stages are built from.
//!
//! Every trait is blanket-implemented for closures of the matching arity, so
//! `Filter` accepts `|v: &Value, k: &Value| ...` directly.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::value::Value;

pub trait Filter {
    fn test(&self, value: &Value, key: &Value) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&Value, &Value) -> bool,
{
    fn test(&self, value: &Value, key: &Value) -> bool {
        self(value, key)
    }
}

pub trait Mapper {
    fn map(&self, value: &Value, key: &Value) -> Value;
}

impl<F> Mapper for F
where
    F: Fn(&Value, &Value) -> Value,
{
    fn map(&self, value: &Value, key: &Value) -> Value {
        self(value, key)
    }
}

/// Classifies an item into a label.
pub trait Discriminator {
    fn classify(&self, value: &Value, key: &Value) -> Value;
}

impl<F> Discriminator for F
where
    F: Fn(&Value, &Value) -> Value,
{
    fn classify(&self, value: &Value, key: &Value) -> Value {
        self(value, key)
    }
}

/// `Less` means the first item ranks before the second.
pub trait Comparator {
    fn compare(&self, v1: &Value, v2: &Value, k1: &Value, k2: &Value) -> Ordering;
}

impl<F> Comparator for F
where
    F: Fn(&Value, &Value, &Value, &Value) -> Ordering,
{
    fn compare(&self, v1: &Value, v2: &Value, k1: &Value, k2: &Value) -> Ordering {
        self(v1, v2, k1, k2)
    }
}

pub trait Reducer {
    fn reduce(&self, acc: Value, value: &Value, key: &Value) -> Value;
}

impl<F> Reducer for F
where
    F: Fn(Value, &Value, &Value) -> Value,
{
    fn reduce(&self, acc: Value, value: &Value, key: &Value) -> Value {
        self(acc, value, key)
    }
}

/// Side-effecting observer.
pub trait Consumer {
    fn consume(&mut self, value: &Value, key: &Value);
}

impl<F> Consumer for F
where
    F: FnMut(&Value, &Value),
{
    fn consume(&mut self, value: &Value, key: &Value) {
        self(value, key)
    }
}

pub type SharedFilter = Rc<dyn Filter>;
pub type SharedMapper = Rc<dyn Mapper>;
pub type SharedDiscriminator = Rc<dyn Discriminator>;
pub type SharedComparator = Rc<dyn Comparator>;
pub type SharedReducer = Rc<dyn Reducer>;

/// Orders by value, ascending.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByValue;

impl Comparator for ByValue {
    fn compare(&self, v1: &Value, v2: &Value, _k1: &Value, _k2: &Value) -> Ordering {
        v1.cmp(v2)
    }
}

/// Orders by key, ascending.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByKey;

impl Comparator for ByKey {
    fn compare(&self, _v1: &Value, _v2: &Value, k1: &Value, k2: &Value) -> Ordering {
        k1.cmp(k2)
    }
}

/// Inverts another comparator.
#[derive(Clone)]
pub struct Reversed(pub SharedComparator);

impl Comparator for Reversed {
    fn compare(&self, v1: &Value, v2: &Value, k1: &Value, k2: &Value) -> Ordering {
        self.0.compare(v1, v2, k1, k2).reverse()
    }
}

/// Wraps a one-argument value predicate.
pub fn value_filter<F>(f: F) -> SharedFilter
where
    F: Fn(&Value) -> bool + 'static,
{
    Rc::new(move |v: &Value, _k: &Value| f(v))
}

/// Wraps a one-argument value transform.
pub fn value_mapper<F>(f: F) -> SharedMapper
where
    F: Fn(&Value) -> Value + 'static,
{
    Rc::new(move |v: &Value, _k: &Value| f(v))
}

pub fn value_discriminator<F>(f: F) -> SharedDiscriminator
where
    F: Fn(&Value) -> Value + 'static,
{
    Rc::new(move |v: &Value, _k: &Value| f(v))
}

/// Compares values with a two-argument function, ignoring keys.
pub fn value_comparator<F>(f: F) -> SharedComparator
where
    F: Fn(&Value, &Value) -> Ordering + 'static,
{
    Rc::new(move |a: &Value, b: &Value, _ka: &Value, _kb: &Value| f(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_satisfy_the_traits() {
        let even = |v: &Value, _k: &Value| v.as_i64().map_or(false, |n| n % 2 == 0);
        assert!(even.test(&Value::I64(4), &Value::Null));

        let sum = |acc: Value, v: &Value, _k: &Value| {
            Value::I64(acc.as_i64().unwrap_or(0) + v.as_i64().unwrap_or(0))
        };
        assert_eq!(sum.reduce(Value::I64(2), &Value::I64(3), &Value::Null), Value::I64(5));
    }

    #[test]
    fn reversed_flips_order() {
        let desc = Reversed(Rc::new(ByValue));
        assert_eq!(
            desc.compare(&Value::I64(1), &Value::I64(2), &Value::Null, &Value::Null),
            Ordering::Greater
        );
        assert_eq!(
            ByKey.compare(&Value::Null, &Value::Null, &Value::I64(1), &Value::I64(2)),
            Ordering::Less
        );
    }
}
