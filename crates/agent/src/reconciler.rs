//! Output reconciliation — turns skill-management results into pool changes.
//!
//! After a dispatch batch, the reconciler finds the assistant entry that
//! requested it, picks out the skill-management calls, and reads only
//! their results from the trailing block of tool results. Every other tool
//! result in the batch is left unread.

use std::collections::HashMap;

use skillloop_core::message::{AssistantMessage, ConversationEntry, ConversationLog};
use skillloop_core::session::SessionState;
use skillloop_core::skill::{ACTIVATION_MARKER, SkillAction, SkillPatch, deactivation_marker};
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub struct OutputReconciler {
    management_tool: String,
}

impl Default for OutputReconciler {
    fn default() -> Self {
        Self::new("manage_skill")
    }
}

impl OutputReconciler {
    /// `management_tool` is the tool name whose results may mutate the pool.
    pub fn new(management_tool: impl Into<String>) -> Self {
        Self {
            management_tool: management_tool.into(),
        }
    }

    /// Derive the skill patch for the most recent dispatch batch.
    ///
    /// Never fails: anything unexpected (no origin, malformed markers,
    /// results without a matching request) yields no mutation.
    pub fn reconcile(&self, state: &SessionState) -> SkillPatch {
        let mut patch = SkillPatch::new();

        let Some(origin) = Self::origin(&state.log) else {
            trace!("No originating assistant entry; nothing to reconcile");
            return patch;
        };

        let pending = self.correlation_map(origin);
        if pending.is_empty() {
            return patch;
        }

        let batch = state
            .log
            .iter()
            .rev()
            .map_while(ConversationEntry::as_tool_result);

        // Walking backwards; collect, then apply in log order.
        let mut matched: Vec<(&str, SkillAction, &str)> = Vec::new();
        for result in batch {
            if let Some((name, action)) = pending.get(result.correlation_id.as_str()) {
                matched.push((*name, *action, result.content.as_str()));
            }
        }

        for (name, action, content) in matched.into_iter().rev() {
            match action {
                SkillAction::Activate => match content.strip_prefix(ACTIVATION_MARKER) {
                    Some(protocol) => {
                        debug!(skill = %name, "Skill activation reconciled");
                        patch.activate(name, protocol);
                    }
                    None => debug!(skill = %name, "Activation result carried no marker"),
                },
                SkillAction::Deactivate => {
                    if content.trim() == deactivation_marker(name) {
                        debug!(skill = %name, "Skill deactivation reconciled");
                        patch.deactivate(name);
                    } else {
                        debug!(skill = %name, "Deactivation result carried no marker");
                    }
                }
            }
        }

        patch
    }

    /// The assistant entry whose requests produced the trailing results.
    ///
    /// Tool results and system entries are passed over; reaching a user
    /// entry first means there is no origin.
    fn origin(log: &ConversationLog) -> Option<&AssistantMessage> {
        for entry in log.iter().rev() {
            match entry {
                ConversationEntry::ToolResult(_) | ConversationEntry::System { .. } => continue,
                ConversationEntry::Assistant(msg) => {
                    return msg.has_tool_calls().then_some(msg);
                }
                ConversationEntry::User { .. } => return None,
            }
        }
        None
    }

    /// correlation id → (skill name, action), for management calls only.
    fn correlation_map<'a>(
        &self,
        origin: &'a AssistantMessage,
    ) -> HashMap<&'a str, (&'a str, SkillAction)> {
        origin
            .tool_calls
            .iter()
            .filter(|call| call.name == self.management_tool)
            .filter_map(|call| {
                let name = call.str_arg("skill_name")?.trim();
                if name.is_empty() {
                    return None;
                }
                let action = SkillAction::from_arg(call.args.get("action"))?;
                Some((call.id.as_str(), (name, action)))
            })
            .collect()
    }
}
