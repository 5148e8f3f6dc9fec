//! Instrumentation hooks for pipeline stages.
//!
//! Components call into an optional [`PipelineObserver`]; with none
//! installed the pipeline runs unchanged. [`TracingObserver`] forwards
//! stage events to `tracing`.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::Result;

/// Named step of ingestion or query execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    BuildSchema,
    Ingest,
    ReplaceIndex,
    Upload,
    ResolveIntent,
    EmbedQuery,
    Search,
    Generate,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::BuildSchema => "build_schema",
            Stage::Ingest => "ingest",
            Stage::ReplaceIndex => "replace_index",
            Stage::Upload => "upload",
            Stage::ResolveIntent => "resolve_intent",
            Stage::EmbedQuery => "embed_query",
            Stage::Search => "search",
            Stage::Generate => "generate",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Ok,
    Failed { kind: &'static str, message: String },
}

/// Cross-cutting observer invoked around pipeline stages.
pub trait PipelineObserver: Send + Sync {
    fn stage_started(&self, _stage: Stage) {}

    fn stage_finished(&self, _stage: Stage, _elapsed: Duration, _outcome: &StageOutcome) {}
}

/// Observer that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Observer that emits `tracing` events per stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn stage_started(&self, stage: Stage) {
        debug!(stage = stage.as_str(), "Stage started");
    }

    fn stage_finished(&self, stage: Stage, elapsed: Duration, outcome: &StageOutcome) {
        let duration_ms = elapsed.as_millis() as u64;
        match outcome {
            StageOutcome::Ok => debug!(
                stage = stage.as_str(),
                duration_ms,
                success = true,
                "Stage finished"
            ),
            StageOutcome::Failed { kind, message } => warn!(
                stage = stage.as_str(),
                duration_ms,
                success = false,
                error_kind = *kind,
                error = %message,
                "Stage failed"
            ),
        }
    }
}

/// Recorded stage event, see [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageEvent {
    Started(Stage),
    Finished(Stage, StageOutcome),
}

/// Observer that keeps every event in memory, for assertions in tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<StageEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StageEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Stages that finished, in order.
    pub fn finished_stages(&self) -> Vec<Stage> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                StageEvent::Finished(stage, _) => Some(stage),
                StageEvent::Started(_) => None,
            })
            .collect()
    }

    fn push(&self, event: StageEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl PipelineObserver for RecordingObserver {
    fn stage_started(&self, stage: Stage) {
        self.push(StageEvent::Started(stage));
    }

    fn stage_finished(&self, stage: Stage, _elapsed: Duration, outcome: &StageOutcome) {
        self.push(StageEvent::Finished(stage, outcome.clone()));
    }
}

/// Run `fut` as `stage`, reporting start and finish to `observer` if set.
pub async fn observe<T, F>(
    observer: Option<&Arc<dyn PipelineObserver>>,
    stage: Stage,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let Some(observer) = observer else {
        return fut.await;
    };

    observer.stage_started(stage);
    let start = Instant::now();
    let result = fut.await;
    let outcome = match &result {
        Ok(_) => StageOutcome::Ok,
        Err(e) => StageOutcome::Failed {
            kind: e.kind(),
            message: e.to_string(),
        },
    };
    observer.stage_finished(stage, start.elapsed(), &outcome);
    result
}
