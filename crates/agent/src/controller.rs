//! The turn controller — the state machine driving one session.
//!
//! Each step assembles a prompt, calls the model once and appends its
//! answer. An answer with tool calls is dispatched, its results appended,
//! and the skill pool reconciled; the loop then goes back to the model.
//! An answer without tool calls ends the turn.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use skillloop_core::error::{Error, Result};
use skillloop_core::event::{DomainEvent, EventBus};
use skillloop_core::message::ConversationEntry;
use skillloop_core::provider::{Provider, ProviderRequest};
use skillloop_core::session::{SessionPatch, SessionState};
use skillloop_core::skill::{SkillMutation, SkillPatch};
use skillloop_core::tool::ToolRegistry;
use tracing::{debug, info, warn};

use crate::assembler::PromptAssembler;
use crate::dispatcher::{DEFAULT_TOOL_TIMEOUT, ToolDispatcher};
use crate::reconciler::OutputReconciler;

/// What a single step ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The model answered without tool calls; the turn is over.
    Finished,
    /// Tools ran and the pool was reconciled; the model must be called again.
    Continue,
}

pub struct TurnController {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    tools: Arc<ToolRegistry>,
    assembler: PromptAssembler,
    tool_timeout: Duration,
    reconciler: OutputReconciler,
    event_bus: Arc<EventBus>,
    /// Caller guard on model calls per turn; `None` = unbounded.
    max_iterations: Option<u32>,
}

impl TurnController {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        assembler: PromptAssembler,
    ) -> Self {
        let event_bus = Arc::new(EventBus::default());
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            tools,
            assembler,
            reconciler: OutputReconciler::default(),
            event_bus,
            max_iterations: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Abort a turn with [`Error::IterationLimit`] after `max` model calls.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = Some(max);
        self
    }

    /// Upper bound on any single tool call.
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Name of the tool whose results may mutate the skill pool.
    pub fn with_management_tool(mut self, name: impl Into<String>) -> Self {
        self.reconciler = OutputReconciler::new(name);
        self
    }

    /// Publish events on a shared bus instead of a private one.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        self.event_bus.clone()
    }

    /// One model call, plus dispatch and reconciliation if it asked for tools.
    ///
    /// Only a provider failure is returned as an error. The log only grows.
    pub async fn step(&self, state: &mut SessionState) -> Result<StepOutcome> {
        let prompt = self.assembler.assemble(state);

        let request = ProviderRequest {
            model: self.model.clone(),
            system_prompt: prompt.system_prompt,
            history: prompt.history,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.tools.definitions(),
        };

        let response = self.provider.complete(request).await?;
        let message = response.message;

        self.event_bus.publish(DomainEvent::ResponseGenerated {
            model: response.model,
            tool_calls: message.tool_calls.len(),
            tokens_used: response.usage.map(|u| u.total_tokens),
            timestamp: Utc::now(),
        });

        if !message.has_tool_calls() {
            state.apply(SessionPatch::entries(vec![message.into()]));
            return Ok(StepOutcome::Finished);
        }

        debug!(tool_count = message.tool_calls.len(), "Model requested tools");
        let requests = message.tool_calls.clone();
        state.apply(SessionPatch::entries(vec![message.into()]));

        let results = self.dispatcher().dispatch(&requests).await;
        state.apply(SessionPatch::entries(
            results.into_iter().map(ConversationEntry::from).collect(),
        ));

        let skills = self.reconciler.reconcile(state);
        if !skills.is_empty() {
            self.publish_skill_changes(state, &skills);
            state.apply(SessionPatch::skills(skills));
            debug!(active = state.skills.len(), "Skill pool updated");
        }

        Ok(StepOutcome::Continue)
    }

    /// Step until the model answers without tool calls; returns that answer.
    pub async fn run_turn(&self, state: &mut SessionState) -> Result<String> {
        info!(entries = state.log.len(), skills = state.skills.len(), "Starting turn");

        let mut iterations: u32 = 0;
        loop {
            if let Some(limit) = self.max_iterations
                && iterations >= limit
            {
                warn!(limit, "Turn hit the iteration limit");
                return Err(Error::IterationLimit { limit });
            }

            iterations += 1;
            debug!(iteration = iterations, "Turn step");

            if self.step(state).await? == StepOutcome::Finished {
                break;
            }
        }

        self.event_bus.publish(DomainEvent::TurnCompleted {
            iterations,
            timestamp: Utc::now(),
        });

        let answer = state
            .log
            .last_assistant()
            .map(|msg| msg.content.clone())
            .unwrap_or_default();
        Ok(answer)
    }

    /// Append a user entry, then run a turn.
    pub async fn submit(&self, state: &mut SessionState, user_text: &str) -> Result<String> {
        state.apply(SessionPatch::entries(vec![ConversationEntry::user(user_text)]));
        self.run_turn(state).await
    }

    /// A dispatcher carrying the current timeout and event bus.
    fn dispatcher(&self) -> ToolDispatcher {
        ToolDispatcher::new(self.tools.clone())
            .with_timeout(self.tool_timeout)
            .with_event_bus(self.event_bus.clone())
    }

    fn publish_skill_changes(&self, state: &SessionState, patch: &SkillPatch) {
        for mutation in patch.iter() {
            let event = match mutation {
                SkillMutation::Activate { name, .. } => DomainEvent::SkillActivated {
                    name: name.clone(),
                    timestamp: Utc::now(),
                },
                SkillMutation::Deactivate { name } if state.skills.contains(name) => {
                    DomainEvent::SkillDeactivated {
                        name: name.clone(),
                        timestamp: Utc::now(),
                    }
                }
                SkillMutation::Deactivate { .. } => continue,
            };
            self.event_bus.publish(event);
        }
    }
}
