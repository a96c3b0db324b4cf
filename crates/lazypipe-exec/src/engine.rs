//! Engine: the push-driven driver loop.
//!
//! One driver step pulls an item from the signal's source, delivers it to
//! the head stage and walks it down the chain until a stage consumes it or
//! it reaches the terminal (and is emitted). When the source runs dry the
//! engine asks stages to finish, starting at the head, until one of them
//! installs a new source (streaming resumes) or the terminal is reached.
//!
//! Forgotten stages are spliced out after the call that forgot them
//! returns, so a stage is never removed while it is running.

use tracing::{debug, trace, warn};

use lazypipe_core::config::EngineConfig;
use lazypipe_core::flow::{Flow, Signal, Source};
use lazypipe_core::hash::{Hash256, ItemDigest};
use lazypipe_core::id::StageId;
use lazypipe_core::manifest::{now_ms, RunManifest};
use lazypipe_core::producer::BoxProducer;
use lazypipe_core::Item;
use lazypipe_operators::traits::BoxOperation;

use crate::error::ExecError;
use crate::metrics::RunMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Stages not prepared yet.
    Idle,
    Streaming,
    /// Source exhausted; `streaming_finished` is due at this stage.
    Finishing(StageId),
    Done,
}

pub struct Engine {
    stages: Vec<BoxOperation>,
    signal: Signal,
    phase: Phase,
    config: EngineConfig,
    steps: u64,
    emitted: u64,
    digest: ItemDigest,
    plan_hash: Hash256,
    started_ms: u64,
    destroyed: bool,
}

impl Engine {
    pub fn new(stages: Vec<BoxOperation>, source: BoxProducer, config: EngineConfig) -> Self {
        Self::with_source(stages, Source::new(source), config)
    }

    /// An engine with no producer; items arrive one at a time via [`Engine::feed`].
    pub fn detached(stages: Vec<BoxOperation>, config: EngineConfig) -> Self {
        Self::with_source(stages, Source::detached(), config)
    }

    fn with_source(stages: Vec<BoxOperation>, source: Source, config: EngineConfig) -> Self {
        let signal = Signal::new(stages.len(), source);
        Self {
            stages,
            signal,
            phase: Phase::Idle,
            config,
            steps: 0,
            emitted: 0,
            digest: ItemDigest::new(),
            plan_hash: Hash256([0; 32]),
            started_ms: 0,
            destroyed: false,
        }
    }

    /// Hash recorded in the manifest.
    pub fn with_plan_hash(mut self, plan_hash: Hash256) -> Self {
        self.plan_hash = plan_hash;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Stages still in the chain.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    pub fn metrics(&self) -> RunMetrics {
        RunMetrics::collect(
            self.signal.counters(),
            self.steps,
            self.emitted,
            self.signal.is_stopped(),
        )
    }

    /// Drive until the next item is emitted. `Ok(None)` once the run is over.
    ///
    /// An error terminates the run: every stage is destroyed and later calls
    /// return `Ok(None)`.
    pub fn next_item(&mut self) -> Result<Option<Item>, ExecError> {
        match self.advance() {
            Ok(item) => Ok(item),
            Err(e) => {
                warn!(error = %e, "run aborted");
                self.phase = Phase::Done;
                self.release();
                Err(e)
            }
        }
    }

    /// Push one item into a detached engine and drive it as far as it goes
    /// without finishing any stage. Returns whatever reached the terminal.
    pub fn feed(&mut self, item: Item) -> Result<Vec<Item>, ExecError> {
        if self.destroyed {
            return Err(ExecError::Destroyed);
        }
        if self.phase == Phase::Idle {
            self.start()?;
        }
        if self.phase != Phase::Streaming || self.signal.is_stopped() {
            return Ok(Vec::new());
        }
        self.signal.push_back(item);
        let mut out = Vec::new();
        while let Some(next) = self.signal.pull()? {
            if let Some(emitted) = self.deliver(next)? {
                out.push(self.emit(emitted)?);
            }
            if self.signal.is_stopped() {
                break;
            }
        }
        Ok(out)
    }

    /// Run to completion and collect every remaining item.
    pub fn finish(&mut self) -> Result<Vec<Item>, ExecError> {
        if self.destroyed {
            return Err(ExecError::Destroyed);
        }
        let mut out = Vec::new();
        while let Some(item) = self.next_item()? {
            out.push(item);
        }
        Ok(out)
    }

    /// Abandon the run now. Nothing is finalized.
    pub fn stop(&mut self) {
        self.signal.stop();
    }

    /// Release every stage, handler and producer. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        self.phase = Phase::Done;
        self.release();
        self.destroyed = true;
    }

    /// Manifest for what has run so far. Takes the output digest, so call
    /// it once, after the run.
    pub fn manifest(&mut self) -> RunManifest {
        let digest = std::mem::replace(&mut self.digest, ItemDigest::new());
        RunManifest::new(self.plan_hash, self.started_ms).finish(
            now_ms(),
            self.emitted,
            Some(digest.finish()),
        )
    }

    // ---- driver ----

    fn advance(&mut self) -> Result<Option<Item>, ExecError> {
        loop {
            match self.phase {
                Phase::Done => return Ok(None),
                Phase::Idle => self.start()?,
                Phase::Streaming => {
                    if self.signal.is_stopped() {
                        self.complete();
                        continue;
                    }
                    match self.signal.pull()? {
                        Some(item) => {
                            if let Some(out) = self.deliver(item)? {
                                return self.emit(out).map(Some);
                            }
                        }
                        None => {
                            let head = self.signal.head();
                            debug!(%head, "input exhausted, finishing stages");
                            self.phase = Phase::Finishing(head);
                        }
                    }
                }
                Phase::Finishing(at) => self.finish_stage(at)?,
            }
        }
    }

    fn start(&mut self) -> Result<(), ExecError> {
        self.started_ms = now_ms();
        debug!(stages = self.stages.len(), "run started");
        for (i, stage) in self.stages.iter_mut().enumerate() {
            self.signal.enter(StageId::new(i));
            stage.prepare(&mut self.signal)?;
        }
        self.signal.take_resourced();
        self.settle(StageId::new(0))?;
        self.phase = Phase::Streaming;
        Ok(())
    }

    /// Walk one item from the head. Returns it if it reached the terminal.
    fn deliver(&mut self, item: Item) -> Result<Option<Item>, ExecError> {
        self.steps += 1;
        if let Some(max) = self.config.max_steps {
            if self.steps > max {
                return Err(ExecError::StepLimit(max));
            }
        }
        if self.config.trace_items {
            trace!(step = self.steps, key = %item.key, value = %item.value, "deliver");
        }
        self.signal.begin(item);
        let mut pos = self.signal.head();
        loop {
            if pos >= self.signal.terminal() {
                return Ok(Some(self.signal.take_item()));
            }
            self.signal.enter(pos);
            let stage = stage_at(&mut self.stages, pos)?;
            let name = stage.name();
            let flow = stage.handle(&mut self.signal)?;
            if self.signal.take_resourced() {
                debug!(stage = name, head = %self.signal.head(), "stage installed a new feed");
            }
            pos = self.settle(pos)?;
            if flow == Flow::Consumed {
                return Ok(None);
            }
        }
    }

    fn finish_stage(&mut self, at: StageId) -> Result<(), ExecError> {
        if self.signal.is_stopped() || at >= self.signal.terminal() {
            self.complete();
            return Ok(());
        }
        self.signal.take_resourced();
        self.signal.enter(at);
        let stage = stage_at(&mut self.stages, at)?;
        let name = stage.name();
        stage.streaming_finished(&mut self.signal)?;
        let resourced = self.signal.take_resourced();
        let next = self.settle(at)?;
        if resourced {
            debug!(stage = name, head = %self.signal.head(), "stage restarted the source");
            self.phase = Phase::Streaming;
        } else {
            self.phase = Phase::Finishing(next);
        }
        Ok(())
    }

    /// Splice out whatever was forgotten during the last call. Returns the
    /// position of the stage that followed `pos` before the removals.
    fn settle(&mut self, pos: StageId) -> Result<StageId, ExecError> {
        let mut next = pos.get() + 1;
        let mut forgotten = self.signal.take_forgotten();
        forgotten.sort_unstable_by(|a, b| b.cmp(a));
        for id in forgotten {
            if id.get() >= self.stages.len() {
                return Err(lazypipe_core::Error::Structural(format!(
                    "forgotten {id} is not in the chain"
                ))
                .into());
            }
            let mut stage = self.stages.remove(id.get());
            stage.destroy();
            self.signal.splice_out(id)?;
            debug!(stage = stage.name(), at = %id, "stage spliced out");
            if id.get() < next {
                next -= 1;
            }
        }
        Ok(StageId::new(next))
    }

    fn emit(&mut self, item: Item) -> Result<Item, ExecError> {
        self.emitted += 1;
        self.digest.update(&item)?;
        Ok(item)
    }

    fn complete(&mut self) {
        self.phase = Phase::Done;
        let metrics = self.metrics();
        debug!(
            emitted = metrics.items_emitted,
            stopped = metrics.stopped_early,
            "run finished"
        );
        if self.config.emit_metrics {
            metrics.emit();
        }
        self.release();
    }

    fn release(&mut self) {
        for stage in &mut self.stages {
            stage.destroy();
        }
        self.signal.release();
    }
}

fn stage_at(stages: &mut [BoxOperation], id: StageId) -> Result<&mut BoxOperation, ExecError> {
    match stages.get_mut(id.get()) {
        Some(stage) => Ok(stage),
        None => Err(lazypipe_core::Error::Structural(format!("no stage at {id}")).into()),
    }
}

impl Iterator for Engine {
    type Item = Result<Item, ExecError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_item().transpose()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("stages", &self.stage_names())
            .field("phase", &self.phase)
            .field("steps", &self.steps)
            .field("emitted", &self.emitted)
            .finish()
    }
}
