//! Discriminator-driven fan-out: fork, dispatch, unzip, route.
//!
//! Labels pass through [`Value::into_label`] before lookup, so a predicate
//! discriminator's `true`/`false` routes to labels `1`/`0`.

pub mod dispatch;
pub mod fork;
pub mod handler;
pub mod route;
pub mod unzip;

use std::collections::BTreeMap;

use lazypipe_core::{Item, Value};

use crate::traits::OpError;
use handler::Handler;

pub use dispatch::Dispatch;
pub use fork::Fork;
pub use route::Route;
pub use unzip::Unzip;

/// Labelled handlers in creation order.
#[derive(Default)]
pub(crate) struct Lanes {
    lanes: Vec<(Value, Box<dyn Handler>)>,
    index: BTreeMap<Value, usize>,
}

impl Lanes {
    pub(crate) fn len(&self) -> usize {
        self.lanes.len()
    }

    pub(crate) fn position(&self, label: &Value) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Append a lane. Returns `false` (and keeps the old lane) on a duplicate label.
    pub(crate) fn open(&mut self, label: Value, handler: Box<dyn Handler>) -> bool {
        if self.index.contains_key(&label) {
            return false;
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(label = %label, lane = self.lanes.len(), "fan-out: opened lane");
        self.index.insert(label.clone(), self.lanes.len());
        self.lanes.push((label, handler));
        true
    }

    pub(crate) fn send(&mut self, lane: usize, item: Item) -> Result<(), OpError> {
        match self.lanes.get_mut(lane) {
            Some((_, handler)) => handler.accept(item),
            None => Err(OpError::Exec(format!("no fan-out lane {lane}"))),
        }
    }

    /// Finish every handler, in lane order, as `label => result` items.
    pub(crate) fn finish(&mut self) -> Result<Vec<Item>, OpError> {
        let mut out = Vec::with_capacity(self.lanes.len());
        for (label, handler) in &mut self.lanes {
            out.push(Item::new(label.clone(), handler.finish()?));
        }
        self.destroy();
        Ok(out)
    }

    pub(crate) fn destroy(&mut self) {
        for (_, handler) in &mut self.lanes {
            handler.destroy();
        }
        self.lanes.clear();
        self.index.clear();
    }
}
