//! `Route(d, branches)`: per-label value mapping, streaming.

use lazypipe_core::flow::{Flow, Signal};
use lazypipe_core::strategy::{SharedDiscriminator, SharedMapper};
use lazypipe_core::{Item, Value};

use crate::plan::StagePlan;
use crate::stream::{self, ItemStream};
use crate::traits::{OpError, Operation};

struct Branches {
    discriminator: SharedDiscriminator,
    branches: Vec<(Value, SharedMapper)>,
}

impl Branches {
    fn apply(&self, item: &mut Item) -> Result<(), OpError> {
        let label = self
            .discriminator
            .classify(&item.value, &item.key)
            .into_label();
        let (_, mapper) = self
            .branches
            .iter()
            .find(|(l, _)| *l == label)
            .ok_or(OpError::UnmappedLabel(label))?;
        item.value = mapper.map(&item.value, &item.key);
        Ok(())
    }
}

pub struct Route {
    branches: Branches,
}

impl Route {
    pub fn new(
        discriminator: SharedDiscriminator,
        branches: Vec<(Value, SharedMapper)>,
    ) -> Result<Self, OpError> {
        if branches.is_empty() {
            return Err(OpError::Config("route needs at least one branch".into()));
        }
        let mut declared: Vec<(Value, SharedMapper)> = Vec::with_capacity(branches.len());
        for (label, mapper) in branches {
            let label = label.into_label();
            if declared.iter().any(|(l, _)| *l == label) {
                return Err(OpError::Config(format!("route label '{label}' declared twice")));
            }
            declared.push((label, mapper));
        }
        Ok(Self {
            branches: Branches {
                discriminator,
                branches: declared,
            },
        })
    }
}

impl Operation for Route {
    fn name(&self) -> &'static str {
        "route"
    }

    fn plan(&self) -> StagePlan {
        StagePlan::streaming(self.name())
    }

    fn handle(&mut self, signal: &mut Signal) -> Result<Flow, OpError> {
        self.branches.apply(signal.item_mut())?;
        Ok(Flow::Forward)
    }

    fn transform(self: Box<Self>, input: ItemStream) -> ItemStream {
        let branches = self.branches;
        stream::map_ok(input, move |mut item| {
            branches.apply(&mut item)?;
            Ok(item)
        })
    }
}
