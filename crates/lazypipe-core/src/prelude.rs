//! Convenient re-exports for downstream crates.

pub use crate::collector::{Collector, ItemCollector};
pub use crate::config::{ConfigOverrides, EngineConfig};
pub use crate::error::{Error, Result};
pub use crate::flow::{Flow, Signal};
pub use crate::id::StageId;
pub use crate::item::Item;
pub use crate::manifest::{ManifestId, RunManifest};
pub use crate::producer::{BoxProducer, ItemIter, Producer, VecProducer};
pub use crate::strategy::{
    Comparator, Consumer, Discriminator, Filter, Mapper, Reducer, SharedComparator,
    SharedDiscriminator, SharedFilter, SharedMapper, SharedReducer,
};
pub use crate::value::Value;
