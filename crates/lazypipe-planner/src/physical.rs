//! Physical program: a source plus ordered stage bindings.
//!
//! exec combines this with the operator registry to create concrete stage
//! instances, one per binding, in order.

use serde::{Deserialize, Serialize};

use lazypipe_core::config::ConfigOverrides;
use lazypipe_core::hash::{hash_serde, Hash256};
use lazypipe_core::item::Item;
use lazypipe_core::producer::{BoxProducer, EmptyProducer, RangeProducer, VecProducer};
use lazypipe_core::Value;

use crate::dsl::yaml::SourceSpec;
use crate::error::PlanError;

/// A registry key (e.g. "filter", "top_k") and the JSON config it is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageBinding {
    pub key: String,
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicalProgram {
    pub config: ConfigOverrides,
    pub source: Option<SourceSpec>,
    pub bindings: Vec<StageBinding>,
    /// Rewrites applied while lowering, for `explain`.
    #[serde(default)]
    pub rewrites: Vec<String>,
}

impl PhysicalProgram {
    /// Hash of what determines the output: source and bindings. Run-time
    /// config is left out.
    pub fn plan_hash(&self) -> Result<Hash256, PlanError> {
        Ok(hash_serde(&(&self.source, &self.bindings))?)
    }

    /// The declared source, or an empty one.
    pub fn producer(&self) -> Result<BoxProducer, PlanError> {
        Ok(match &self.source {
            None => Box::new(EmptyProducer),
            Some(SourceSpec::Values(values)) => Box::new(VecProducer::from_values(
                values.iter().cloned().map(Value::from),
            )),
            Some(SourceSpec::Items(items)) => Box::new(VecProducer::new(
                items
                    .iter()
                    .map(|i| Item::new(Value::from(i.key.clone()), Value::from(i.value.clone())))
                    .collect(),
            )),
            Some(SourceSpec::Range { start, end, step }) => Box::new(
                RangeProducer::new(*start, *end, *step)
                    .map_err(|e| PlanError::Source(e.to_string()))?,
            ),
        })
    }
}
