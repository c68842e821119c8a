//! Tool dispatch — one correlated result per request, whatever happens.
//!
//! All requests of one assistant entry run concurrently. Unknown tools,
//! tool errors and timeouts are rendered into the result text; nothing
//! escapes this boundary.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use skillloop_core::error::ToolError;
use skillloop_core::event::{DomainEvent, EventBus};
use skillloop_core::message::{ToolCallRequest, ToolResultEntry};
use skillloop_core::tool::ToolRegistry;
use tracing::{debug, warn};

/// Per-call limit when none is configured.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(120);

pub struct ToolDispatcher {
    tools: Arc<ToolRegistry>,
    timeout: Duration,
    event_bus: Option<Arc<EventBus>>,
}

impl ToolDispatcher {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self {
            tools,
            timeout: DEFAULT_TOOL_TIMEOUT,
            event_bus: None,
        }
    }

    /// Upper bound on any single tool call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Run every request and return exactly one result per request, each
    /// tagged with the request's id.
    pub async fn dispatch(&self, requests: &[ToolCallRequest]) -> Vec<ToolResultEntry> {
        debug!(count = requests.len(), "Dispatching tool calls");
        join_all(requests.iter().map(|request| self.run_one(request))).await
    }

    async fn run_one(&self, request: &ToolCallRequest) -> ToolResultEntry {
        let start = Instant::now();
        let (success, content) = self.invoke(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        debug!(
            tool = %request.name,
            call_id = %request.id,
            success,
            duration_ms,
            "Tool call finished"
        );

        if let Some(bus) = &self.event_bus {
            bus.publish(DomainEvent::ToolExecuted {
                tool_name: request.name.clone(),
                correlation_id: request.id.clone(),
                success,
                duration_ms,
                timestamp: Utc::now(),
            });
        }

        ToolResultEntry::new(request.id.clone(), content)
    }

    async fn invoke(&self, request: &ToolCallRequest) -> (bool, String) {
        let Some(tool) = self.tools.get(&request.name) else {
            warn!(tool = %request.name, call_id = %request.id, "Unknown tool requested");
            return (false, format!("Error: {}", ToolError::NotFound(request.name.clone())));
        };

        let arguments = serde_json::Value::Object(request.args.clone());
        match tokio::time::timeout(self.timeout, tool.execute(arguments)).await {
            Ok(Ok(output)) => (output.success, output.output),
            Ok(Err(e)) => {
                warn!(tool = %request.name, call_id = %request.id, error = %e, "Tool execution failed");
                (false, format!("Error: {e}"))
            }
            Err(_) => {
                warn!(tool = %request.name, call_id = %request.id, "Tool call timed out");
                (
                    false,
                    format!(
                        "Error: Tool '{}' timed out after {}",
                        request.name,
                        format_timeout(self.timeout)
                    ),
                )
            }
        }
    }
}

/// Whole seconds as `30s`, anything finer as `0.25s`.
fn format_timeout(timeout: Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}s", timeout.as_secs_f32())
    }
}
