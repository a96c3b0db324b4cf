//! Pipeline builder: a producer plus a chain of stages.

use std::cell::RefCell;
use std::rc::Rc;

use lazypipe_core::config::EngineConfig;
use lazypipe_core::hash::{hash_serde, Hash256};
use lazypipe_core::manifest::RunManifest;
use lazypipe_core::producer::{BoxProducer, Producer, RangeProducer, VecProducer};
use lazypipe_core::strategy::{
    Comparator, Consumer, Discriminator, Filter as FilterFn, Mapper, Reducer, SharedFilter,
};
use lazypipe_core::{Item, Value};
use lazypipe_operators::chunk::{Chunk, GroupAdjacent};
use lazypipe_operators::concat::{Append, Prepend};
use lazypipe_operators::fanout::{Dispatch, Fork, Route, Unzip};
use lazypipe_operators::filter::{Filter, Find, SkipWhile, TakeWhile};
use lazypipe_operators::flatten::Flatten;
use lazypipe_operators::group::{Group, Reduce};
use lazypipe_operators::limit::{Limit, Skip};
use lazypipe_operators::map::{Each, Flip, Map, MapKeys, Reindex};
use lazypipe_operators::registry;
use lazypipe_operators::segregate::Segregate;
use lazypipe_operators::sort::{Reverse, Sort, TopK};
use lazypipe_operators::stream::ItemStream;
use lazypipe_operators::traits::{BoxOperation, Operation};
use lazypipe_operators::window::Tail;
use lazypipe_operators::{HandlerFactory, StagePlan};
use lazypipe_planner::PhysicalProgram;

use crate::engine::Engine;
use crate::error::ExecError;
use crate::metrics::RunMetrics;

/// Everything a completed push run produced.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub items: Vec<Item>,
    pub metrics: RunMetrics,
    pub manifest: RunManifest,
}

pub struct Pipeline {
    source: BoxProducer,
    stages: Vec<BoxOperation>,
    config: EngineConfig,
    plan_hash: Option<Hash256>,
}

impl Pipeline {
    pub fn new(source: impl Producer + 'static) -> Self {
        Self::from_boxed(Box::new(source))
    }

    pub fn from_boxed(source: BoxProducer) -> Self {
        Self {
            source,
            stages: Vec::new(),
            config: EngineConfig::default(),
            plan_hash: None,
        }
    }

    /// Values keyed by position.
    pub fn from_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(VecProducer::from_values(values))
    }

    pub fn from_items(items: Vec<Item>) -> Self {
        Self::new(VecProducer::new(items))
    }

    pub fn range(start: i64, end: i64, step: i64) -> Result<Self, ExecError> {
        Ok(Self::new(RangeProducer::new(start, end, step)?))
    }

    /// Instantiate a lowered program. `input` overrides the program's own
    /// source; the program's `config:` block is overlaid on `base`.
    pub fn from_program(
        program: &PhysicalProgram,
        input: Option<BoxProducer>,
        base: EngineConfig,
    ) -> Result<Self, ExecError> {
        let source = match input {
            Some(p) => p,
            None => program.producer()?,
        };
        let mut pipeline = Self::from_boxed(source);
        for binding in &program.bindings {
            pipeline.stages.push(registry::build(&binding.key, &binding.config)?);
        }
        pipeline.config = base;
        pipeline.config.overlay(&program.config);
        pipeline.plan_hash = Some(program.plan_hash()?);
        Ok(pipeline)
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn then(self, op: impl Operation + 'static) -> Self {
        self.then_boxed(Box::new(op))
    }

    pub fn then_boxed(mut self, op: BoxOperation) -> Self {
        self.stages.push(op);
        self
    }

    // ---- streaming stages ----

    pub fn filter(self, f: impl FilterFn + 'static) -> Self {
        self.then(Filter::new(Rc::new(f)))
    }

    pub fn map(self, m: impl Mapper + 'static) -> Self {
        self.then(Map {
            mapper: Rc::new(m),
        })
    }

    pub fn map_keys(self, m: impl Mapper + 'static) -> Self {
        self.then(MapKeys {
            mapper: Rc::new(m),
        })
    }

    pub fn flip(self) -> Self {
        self.then(Flip)
    }

    pub fn reindex(self) -> Self {
        self.then(Reindex::default())
    }

    pub fn each(self, c: impl Consumer + 'static) -> Self {
        self.then(Each {
            consumer: Rc::new(RefCell::new(c)),
        })
    }

    pub fn limit(self, n: usize) -> Self {
        self.then(Limit::new(n))
    }

    pub fn skip(self, n: usize) -> Self {
        self.then(Skip::new(n))
    }

    pub fn take_while(self, f: impl FilterFn + 'static) -> Self {
        self.then(TakeWhile {
            predicate: Rc::new(f),
        })
    }

    pub fn skip_while(self, f: impl FilterFn + 'static) -> Self {
        self.then(SkipWhile {
            predicate: Rc::new(f),
        })
    }

    pub fn flatten(self, depth: Option<usize>) -> Result<Self, ExecError> {
        Ok(self.then(Flatten::new(depth)?))
    }

    pub fn chunk(self, size: usize) -> Result<Self, ExecError> {
        Ok(self.then(Chunk::new(size)?))
    }

    pub fn group_adjacent(self, d: impl Discriminator + 'static) -> Self {
        self.then(GroupAdjacent::new(Rc::new(d)))
    }

    pub fn prepend(self, p: impl Producer + 'static) -> Self {
        self.then(Prepend::new(Box::new(p)))
    }

    pub fn append(self, p: impl Producer + 'static) -> Self {
        self.then(Append::new(Box::new(p)))
    }

    pub fn route(
        self,
        d: impl Discriminator + 'static,
        branches: Vec<(Value, Rc<dyn Mapper>)>,
    ) -> Result<Self, ExecError> {
        Ok(self.then(Route::new(Rc::new(d), branches)?))
    }

    // ---- buffering stages ----

    pub fn sort(self, c: impl Comparator + 'static) -> Self {
        self.then(Sort::new(Rc::new(c)))
    }

    pub fn reverse(self) -> Self {
        self.then(Reverse::default())
    }

    pub fn group(self, d: impl Discriminator + 'static) -> Self {
        self.then(Group::new(Rc::new(d)))
    }

    pub fn reduce(self, r: impl Reducer + 'static, init: impl Into<Value>) -> Self {
        self.then(Reduce::new(Rc::new(r), init.into()))
    }

    pub fn count(self) -> Self {
        self.then(Reduce::count())
    }

    pub fn top_k(self, k: usize, c: impl Comparator + 'static) -> Result<Self, ExecError> {
        Ok(self.then(TopK::new(k, Rc::new(c))?))
    }

    pub fn tail(self, n: usize) -> Result<Self, ExecError> {
        Ok(self.then(Tail::new(n)?))
    }

    pub fn segregate(
        self,
        c: impl Comparator + 'static,
        max_buckets: Option<usize>,
        bucket_size: Option<usize>,
    ) -> Result<Self, ExecError> {
        Ok(self.then(Segregate::new(Rc::new(c), max_buckets, bucket_size)?))
    }

    pub fn fork(self, d: impl Discriminator + 'static, factory: HandlerFactory) -> Self {
        self.then(Fork::new(Rc::new(d), factory))
    }

    pub fn dispatch(
        self,
        d: impl Discriminator + 'static,
        branches: Vec<(Value, HandlerFactory)>,
    ) -> Result<Self, ExecError> {
        Ok(self.then(Dispatch::new(Rc::new(d), branches)?))
    }

    pub fn unzip(self, handlers: Vec<HandlerFactory>) -> Result<Self, ExecError> {
        Ok(self.then(Unzip::new(handlers)?))
    }

    // ---- consumption ----

    pub fn plans(&self) -> Vec<StagePlan> {
        self.stages.iter().map(|s| s.plan()).collect()
    }

    /// The program hash when built from one, else a hash of the stage plans.
    pub fn plan_hash(&self) -> Result<Hash256, ExecError> {
        match self.plan_hash {
            Some(h) => Ok(h),
            None => Ok(hash_serde(&self.plans())?),
        }
    }

    /// Hand the chain to a push-driven engine.
    pub fn engine(self) -> Result<Engine, ExecError> {
        let plan_hash = self.plan_hash()?;
        Ok(Engine::new(self.stages, self.source, self.config).with_plan_hash(plan_hash))
    }

    /// Push-driven run to completion.
    pub fn run(self) -> Result<RunOutput, ExecError> {
        let mut engine = self.engine()?;
        let items = engine.finish()?;
        Ok(RunOutput {
            items,
            metrics: engine.metrics(),
            manifest: engine.manifest(),
        })
    }

    /// Pull path: every stage's `transform` folded over the producer.
    pub fn stream(self) -> impl Iterator<Item = Result<Item, ExecError>> {
        let Self {
            mut source, stages, ..
        } = self;
        let input: ItemStream = Box::new(source.open().map(Ok));
        stages
            .into_iter()
            .fold(input, |s, stage| stage.transform(s))
            .map(|r| r.map_err(ExecError::from))
    }

    pub fn to_vec(self) -> Result<Vec<Item>, ExecError> {
        self.engine()?.finish()
    }

    pub fn values(self) -> Result<Vec<Value>, ExecError> {
        Ok(self.to_vec()?.into_iter().map(|item| item.value).collect())
    }

    pub fn first(self) -> Result<Option<Item>, ExecError> {
        let mut engine = self.limit(1).engine()?;
        engine.next_item()
    }

    /// First item matching `f`. The run ends as soon as it is found.
    pub fn find(self, f: impl FilterFn + 'static) -> Result<Option<Item>, ExecError> {
        let predicate: SharedFilter = Rc::new(f);
        let mut engine = self.then(Find::ending_run(predicate)).engine()?;
        engine.next_item()
    }

    pub fn has(self, f: impl FilterFn + 'static) -> Result<bool, ExecError> {
        Ok(self.find(f)?.is_some())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("source", &self.source.name())
            .field(
                "stages",
                &self.stages.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("config", &self.config)
            .finish()
    }
}
