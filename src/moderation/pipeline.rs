//! Stage pipeline.
//!
//! Every event runs through the stages in construction order. A stage is
//! skipped when its declared requirements or its own predicate do not hold;
//! a stage returning [`Flow::Stop`] ends processing of the event.

use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{error, trace};

use super::context::EventContext;
use super::gate::{self, Requirement};

/// What the pipeline does after a stage ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// One moderation step.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Preconditions checked by the gate before [`Stage::applies`].
    fn requirements(&self) -> &'static [Requirement] {
        &[]
    }

    /// Stage-specific predicate on the event.
    fn applies(&self, _ctx: &EventContext) -> bool {
        true
    }

    async fn handle(&self, ctx: &EventContext) -> anyhow::Result<Flow>;
}

/// How dispatching an event ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A stage returned [`Flow::Stop`].
    Stopped(&'static str),
    /// Every stage ran or was skipped.
    Exhausted,
    /// A stage failed; the event was dropped.
    Failed(&'static str),
    /// Shutdown began before the event was fully processed.
    Cancelled,
}

/// Ordered list of stages.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    #[must_use]
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run `ctx` through the stages. Never fails; stage errors and panics
    /// are logged and end processing of this event only.
    pub async fn dispatch(&self, ctx: &EventContext) -> DispatchOutcome {
        for stage in &self.stages {
            if ctx.cancel.is_cancelled() {
                return DispatchOutcome::Cancelled;
            }

            let name = stage.name();
            if !gate::allows(stage.requirements(), ctx) {
                trace!("Stage {} gated out for chat {}", name, ctx.chat_id);
                continue;
            }
            if !stage.applies(ctx) {
                continue;
            }

            let result = AssertUnwindSafe(stage.handle(ctx)).catch_unwind().await;
            match result {
                Ok(Ok(Flow::Continue)) => {}
                Ok(Ok(Flow::Stop)) => return DispatchOutcome::Stopped(name),
                Ok(Err(e)) => {
                    error!(
                        chat_id = ctx.chat_id,
                        user_id = ctx.sender.user_id,
                        message_id = ?ctx.message_id,
                        stage = name,
                        "Stage failed: {:#}",
                        e
                    );
                    return DispatchOutcome::Failed(name);
                }
                Err(_) => {
                    error!(
                        chat_id = ctx.chat_id,
                        user_id = ctx.sender.user_id,
                        message_id = ?ctx.message_id,
                        stage = name,
                        "Stage panicked"
                    );
                    return DispatchOutcome::Failed(name);
                }
            }
        }

        DispatchOutcome::Exhausted
    }
}
