//! Nested sub-pipelines as fan-out handlers.
//!
//! Each label (or unzip position) gets its own detached [`Engine`] built
//! from a fresh stage chain. Routed items are fed in one by one; at
//! end-of-stream the nested run is finished and the values it emitted
//! become the handler's result list.

use std::rc::Rc;

use lazypipe_core::config::EngineConfig;
use lazypipe_core::{Item, Value};
use lazypipe_operators::fanout::handler::{Handler, HandlerFactory};
use lazypipe_operators::traits::BoxOperation;
use lazypipe_operators::OpError;

use crate::engine::Engine;

struct SubPipeline {
    engine: Engine,
    emitted: Vec<Value>,
}

fn nested(e: crate::ExecError) -> OpError {
    OpError::Exec(format!("sub-pipeline: {e}"))
}

impl Handler for SubPipeline {
    fn accept(&mut self, item: Item) -> Result<(), OpError> {
        let out = self.engine.feed(item).map_err(nested)?;
        self.emitted.extend(out.into_iter().map(|item| item.value));
        Ok(())
    }

    fn finish(&mut self) -> Result<Value, OpError> {
        let rest = self.engine.finish().map_err(nested)?;
        self.emitted.extend(rest.into_iter().map(|item| item.value));
        self.engine.destroy();
        Ok(Value::List(std::mem::take(&mut self.emitted)))
    }

    fn destroy(&mut self) {
        self.engine.destroy();
        self.emitted = Vec::new();
    }
}

/// A handler factory running `build()`'s stages for every label.
pub fn sub_pipeline<F>(build: F) -> HandlerFactory
where
    F: Fn() -> Vec<BoxOperation> + 'static,
{
    Rc::new(move || {
        Box::new(SubPipeline {
            engine: Engine::detached(build(), EngineConfig::default()),
            emitted: Vec::new(),
        }) as Box<dyn Handler>
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Pipeline;
    use lazypipe_core::strategy::value_discriminator;
    use lazypipe_operators::fanout::Fork;
    use lazypipe_operators::limit::Limit;
    use lazypipe_operators::sort::Reverse;

    #[test]
    fn each_label_runs_its_own_chain() {
        let factory = sub_pipeline(|| {
            vec![
                Box::new(Limit::new(2)) as BoxOperation,
                Box::new(Reverse::default()),
            ]
        });
        let out = Pipeline::from_values(1..=7)
            .then(Fork::new(
                value_discriminator(|v| Value::I64(v.as_i64().unwrap_or(0) % 3)),
                factory,
            ))
            .values()
            .unwrap();
        assert_eq!(
            out,
            vec![
                Value::List(vec![Value::I64(4), Value::I64(1)]),
                Value::List(vec![Value::I64(5), Value::I64(2)]),
                Value::List(vec![Value::I64(6), Value::I64(3)]),
            ]
        );
    }
}
