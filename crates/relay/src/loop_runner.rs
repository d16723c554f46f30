//! The relay loop implementation.

use mordomo_core::conversation::{Conversation, RelayOutcome, Turn};
use mordomo_core::provider::{Provider, ProviderRequest};
use mordomo_core::tool::ToolRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reply sent when the model keeps requesting tools past the round bound.
pub const EXHAUSTED_REPLY: &str =
    "Desculpe, Senhor, não consegui concluir essa tarefa. Poderia reformular o pedido?";

/// Reply substituted when the model ends the turn with no text at all
/// (e.g. a safety-blocked candidate). Telegram rejects empty messages.
pub const EMPTY_REPLY: &str =
    "Desculpe, Senhor, fiquei sem resposta desta vez. Poderia reformular?";

/// The loop that orchestrates model calls and tool execution for one user
/// turn.
pub struct RelayLoop {
    provider: Arc<dyn Provider>,

    tools: Arc<ToolRegistry>,

    /// Static persona instruction sent with every request.
    system_instruction: String,

    temperature: f32,

    /// Upper bound on provider rounds per user turn. Past it the loop fails
    /// closed with [`EXHAUSTED_REPLY`].
    max_tool_rounds: u32,
}

impl RelayLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        system_instruction: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            tools,
            system_instruction: system_instruction.into(),
            temperature: 0.7,
            max_tool_rounds: 8,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tool_rounds(mut self, max: u32) -> Self {
        self.max_tool_rounds = max.max(1);
        self
    }

    /// Drive one user turn to completion.
    ///
    /// Appends `Turn::User`, then alternates provider calls and tool
    /// execution until the model answers in plain text or the round bound is
    /// hit. A provider failure propagates and leaves the unanswered `User`
    /// turn in the log; an unknown tool name propagates and leaves the log
    /// ending at the offending `ToolCall`.
    pub async fn run(
        &self,
        conversation: &mut Conversation,
        user_text: &str,
    ) -> mordomo_core::Result<RelayOutcome> {
        info!(
            chat_id = %conversation.chat_id,
            turns = conversation.turns.len(),
            "Relaying user turn"
        );

        conversation.push(Turn::user(user_text));

        let descriptors = self.tools.descriptors();
        let mut attachment: Option<PathBuf> = None;

        for round in 1..=self.max_tool_rounds {
            debug!(chat_id = %conversation.chat_id, round, "Relay round");

            let request = ProviderRequest {
                system_instruction: self.system_instruction.clone(),
                turns: conversation.turns.clone(),
                tools: descriptors.clone(),
                temperature: self.temperature,
            };

            let reply = self.provider.complete(request).await?;

            if reply.is_final() {
                let mut text = reply.text;
                // An attachment with no text gets its caption from the
                // delivery adapter; a bare empty reply gets the fallback.
                if text.trim().is_empty() && attachment.is_none() {
                    warn!(chat_id = %conversation.chat_id, "Model returned an empty final reply");
                    text = EMPTY_REPLY.into();
                }
                if !text.trim().is_empty() {
                    conversation.push(Turn::model(text.as_str()));
                }
                return Ok(RelayOutcome {
                    reply: text,
                    attachment,
                });
            }

            // The model may speak and request tools in the same round.
            if !reply.text.trim().is_empty() {
                conversation.push(Turn::model(reply.text.as_str()));
            }

            for call in reply.tool_calls {
                debug!(chat_id = %conversation.chat_id, tool = %call.name, "Executing tool");

                conversation.push(Turn::ToolCall {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                });

                // An unknown name propagates here; the log stays ended at
                // the ToolCall turn.
                let output = self.tools.dispatch(&call.name, call.arguments).await?;

                if let Some(path) = output.file_path() {
                    attachment = Some(path.to_path_buf());
                }

                conversation.push(Turn::ToolResult {
                    name: call.name,
                    output,
                });
            }
        }

        warn!(
            chat_id = %conversation.chat_id,
            rounds = self.max_tool_rounds,
            "Tool round bound reached, failing closed"
        );

        conversation.push(Turn::model(EXHAUSTED_REPLY));
        Ok(RelayOutcome {
            reply: EXHAUSTED_REPLY.into(),
            attachment,
        })
    }
}
