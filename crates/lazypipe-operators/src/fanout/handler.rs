//! Fan-out handlers and their factories.
//!
//! A handler receives the items routed to one label and produces a single
//! result value when the stream ends. Fan-out stages create handlers through
//! a [`HandlerFactory`], one per label (or per position for unzip).

use std::rc::Rc;

use lazypipe_core::strategy::SharedReducer;
use lazypipe_core::{Item, Value};
use lazypipe_mem::CircularBuffer;

use crate::traits::OpError;

pub trait Handler {
    fn accept(&mut self, item: Item) -> Result<(), OpError>;

    /// Flush and return the result. Called once, at end-of-stream.
    fn finish(&mut self) -> Result<Value, OpError>;

    /// Drop whatever is still held. Must tolerate repeated calls.
    fn destroy(&mut self) {}
}

pub type HandlerFactory = Rc<dyn Fn() -> Box<dyn Handler>>;

/// Values in arrival order.
#[derive(Default)]
struct Collect(Vec<Value>);

impl Handler for Collect {
    fn accept(&mut self, item: Item) -> Result<(), OpError> {
        self.0.push(item.value);
        Ok(())
    }

    fn finish(&mut self) -> Result<Value, OpError> {
        Ok(Value::List(std::mem::take(&mut self.0)))
    }

    fn destroy(&mut self) {
        self.0 = Vec::new();
    }
}

/// `[key, value]` pairs in arrival order.
#[derive(Default)]
struct Pairs(Vec<Value>);

impl Handler for Pairs {
    fn accept(&mut self, item: Item) -> Result<(), OpError> {
        self.0.push(item.into_list());
        Ok(())
    }

    fn finish(&mut self) -> Result<Value, OpError> {
        Ok(Value::List(std::mem::take(&mut self.0)))
    }

    fn destroy(&mut self) {
        self.0 = Vec::new();
    }
}

struct Fold {
    reducer: SharedReducer,
    acc: Value,
}

impl Handler for Fold {
    fn accept(&mut self, item: Item) -> Result<(), OpError> {
        let acc = std::mem::take(&mut self.acc);
        self.acc = self.reducer.reduce(acc, &item.value, &item.key);
        Ok(())
    }

    fn finish(&mut self) -> Result<Value, OpError> {
        Ok(std::mem::take(&mut self.acc))
    }
}

/// Last `n` values in arrival order.
struct Last(CircularBuffer<Value>);

impl Handler for Last {
    fn accept(&mut self, item: Item) -> Result<(), OpError> {
        self.0.push(item.value);
        Ok(())
    }

    fn finish(&mut self) -> Result<Value, OpError> {
        Ok(Value::List(self.0.iter().cloned().collect()))
    }

    fn destroy(&mut self) {
        self.0.clear();
    }
}

pub fn collect() -> HandlerFactory {
    Rc::new(|| Box::new(Collect::default()) as Box<dyn Handler>)
}

pub fn pairs() -> HandlerFactory {
    Rc::new(|| Box::new(Pairs::default()) as Box<dyn Handler>)
}

pub fn reduce(reducer: SharedReducer, init: Value) -> HandlerFactory {
    Rc::new(move || {
        Box::new(Fold {
            reducer: Rc::clone(&reducer),
            acc: init.clone(),
        }) as Box<dyn Handler>
    })
}

pub fn count() -> HandlerFactory {
    reduce(Rc::new(crate::builtin::count), Value::I64(0))
}

/// Fails for `n == 0`.
pub fn tail(n: usize) -> Result<HandlerFactory, OpError> {
    CircularBuffer::<Value>::new(n)?;
    Ok(Rc::new(move || -> Box<dyn Handler> {
        match CircularBuffer::new(n) {
            Ok(ring) => Box::new(Last(ring)),
            Err(_) => Box::new(Collect::default()),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(factory: &HandlerFactory, values: &[i64]) -> Value {
        let mut h = factory();
        for (i, v) in values.iter().enumerate() {
            h.accept(Item::new(i, *v)).unwrap();
        }
        let out = h.finish().unwrap();
        h.destroy();
        h.destroy();
        out
    }

    #[test]
    fn builtin_handlers() {
        assert_eq!(
            run(&collect(), &[1, 2]),
            Value::List(vec![Value::I64(1), Value::I64(2)])
        );
        assert_eq!(run(&count(), &[4, 4, 4]), Value::I64(3));
        assert_eq!(
            run(&tail(2).unwrap(), &[1, 2, 3]),
            Value::List(vec![Value::I64(2), Value::I64(3)])
        );
        assert_eq!(
            run(&pairs(), &[7]),
            Value::List(vec![Value::List(vec![Value::I64(0), Value::I64(7)])])
        );
    }

    #[test]
    fn factories_make_independent_handlers() {
        let f = collect();
        let mut a = f();
        let mut b = f();
        a.accept(Item::new(0, 1)).unwrap();
        assert_eq!(b.finish().unwrap(), Value::List(vec![]));
        assert_eq!(a.finish().unwrap(), Value::List(vec![Value::I64(1)]));
    }

    #[test]
    fn zero_tail_is_rejected() {
        assert!(tail(0).is_err());
    }
}
