//! Per-item rewrites: map values or keys, flip, reindex, observe.

use std::cell::RefCell;
use std::rc::Rc;

use lazypipe_core::flow::{Flow, Signal};
use lazypipe_core::strategy::{Consumer, SharedMapper};
use lazypipe_core::{Item, Value};

use crate::plan::StagePlan;
use crate::stream::{self, ItemStream};
use crate::traits::{OpError, Operation};

pub struct Map {
    pub mapper: SharedMapper,
}

impl Operation for Map {
    fn name(&self) -> &'static str {
        "map"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::streaming(self.name())
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        let item = signal.item_mut();
        item.value = self.mapper.map(&item.value, &item.key);
        Ok(Flow::Forward)
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let mapper = self.mapper;
        stream::map_ok(input, move |mut item| {
            item.value = mapper.map(&item.value, &item.key);
            Ok(item)
        })
    }
}

pub struct MapKeys {
    pub mapper: SharedMapper,
}

impl Operation for MapKeys {
    fn name(&self) -> &'static str {
        "map_keys"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::streaming(self.name())
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        let item = signal.item_mut();
        item.key = self.mapper.map(&item.value, &item.key);
        Ok(Flow::Forward)
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let mapper = self.mapper;
        stream::map_ok(input, move |mut item| {
            item.key = mapper.map(&item.value, &item.key);
            Ok(item)
        })
    }
}

/// Swap key and value.
pub struct Flip;

fn flip(item: &mut Item) {
    std::mem::swap(&mut item.key, &mut item.value);
}

impl Operation for Flip {
    fn name(&self) -> &'static str {
        "flip"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::streaming(self.name())
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        flip(signal.item_mut());
        Ok(Flow::Forward)
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        stream::map_ok(input, |mut item| {
            flip(&mut item);
            Ok(item)
        })
    }
}

/// Replace keys with `0, 1, 2, ...` in arrival order.
#[derive(Default)]
pub struct Reindex {
    next: i64,
}

impl Operation for Reindex {
    fn name(&self) -> &'static str {
        "reindex"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::streaming(self.name())
    }

    fn prepare(&mut self, _signal: &mut Signal) -> Result<(), OpError> {
        self.next = 0;
        Ok(())
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        signal.item_mut().key = Value::I64(self.next);
        self.next += 1;
        Ok(Flow::Forward)
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let mut next = 0i64;
        stream::map_ok(input, move |mut item| {
            item.key = Value::I64(next);
            next += 1;
            Ok(item)
        })
    }
}

/// Observe every item without changing it.
pub struct Each {
    pub consumer: Rc<RefCell<dyn Consumer>>,
}

impl Operation for Each {
    fn name(&self) -> &'static str {
        "each"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::streaming(self.name())
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        let item = signal.item();
        self.consumer.borrow_mut().consume(&item.value, &item.key);
        Ok(Flow::Forward)
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let consumer = self.consumer;
        stream::map_ok(input, move |item| {
            consumer.borrow_mut().consume(&item.value, &item.key);
            Ok(item)
        })
    }
}
