//! The `run` command — the long-polling Telegram bot.
//!
//! Composition root: wires config, provider, tools, note store, relay loop,
//! and the Telegram channel together, then dispatches updates until the
//! process is stopped.

use anyhow::Context;
use mordomo_channels::{deliver, TelegramChannel, TelegramConfig};
use mordomo_config::AppConfig;
use mordomo_core::channel::{Channel, ChatId, IncomingMessage, PresenceAction};
use mordomo_core::tool::ToolRegistry;
use mordomo_memory::NoteStore;
use mordomo_providers::GeminiProvider;
use mordomo_relay::{RelayLoop, SessionMap};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const GREETING: &str = "Olá, Senhor. Mordomo ao seu dispor. Como posso ajudar?";
const APOLOGY: &str =
    "Desculpe, Senhor, estou com dificuldades técnicas no momento. Tente novamente em instantes.";
const PDF_USAGE: &str = "Uso: /pdf <o que o documento deve conter>";
const SPREADSHEET_USAGE: &str = "Uso: /planilha <o que a planilha deve conter>";

/// What the dispatcher does with an incoming text.
#[derive(Debug, PartialEq)]
enum Directive {
    /// Whitespace-only input; nothing reaches the relay loop.
    Ignore,
    /// `/start` — reset the conversation and greet.
    Start,
    /// A slash command missing its argument; reply with the usage line.
    Usage(&'static str),
    /// Relay this prompt to the model.
    Relay(String),
}

/// The argument after a slash command, or `None` if `text` is not that
/// command. `/pdf resumo` matches `/pdf`; `/pdfxyz` does not.
fn command_argument<'a>(text: &'a str, command: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(command)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn interpret(text: &str) -> Directive {
    let text = text.trim();
    if text.is_empty() {
        return Directive::Ignore;
    }

    if text == "/start" {
        return Directive::Start;
    }

    if let Some(rest) = command_argument(text, "/pdf") {
        if rest.is_empty() {
            return Directive::Usage(PDF_USAGE);
        }
        return Directive::Relay(format!(
            "Gere um documento PDF usando a ferramenta gerar_pdf. Pedido: {rest}"
        ));
    }

    if let Some(rest) = command_argument(text, "/planilha") {
        if rest.is_empty() {
            return Directive::Usage(SPREADSHEET_USAGE);
        }
        return Directive::Relay(format!(
            "Gere uma planilha usando a ferramenta gerar_planilha. Pedido: {rest}"
        ));
    }

    Directive::Relay(text.to_string())
}

struct Dispatcher {
    channel: Arc<TelegramChannel>,
    relay: Arc<RelayLoop>,
    sessions: Arc<SessionMap>,
}

impl Dispatcher {
    async fn handle(&self, message: IncomingMessage) {
        let chat_id = message.chat_id;

        if !self.channel.is_allowed(&message.sender_id) {
            debug!(chat_id = %chat_id, sender = %message.sender_id, "Sender not allowed, ignoring");
            return;
        }

        match interpret(&message.text) {
            Directive::Ignore => {}
            Directive::Start => {
                self.sessions.reset(chat_id).await;
                if let Err(e) = self.channel.send_text(chat_id, GREETING).await {
                    error!(chat_id = %chat_id, error = %e, "Failed to send greeting");
                }
            }
            Directive::Usage(usage) => {
                if let Err(e) = self.channel.send_text(chat_id, usage).await {
                    error!(chat_id = %chat_id, error = %e, "Failed to send usage line");
                }
            }
            Directive::Relay(prompt) => self.relay_turn(chat_id, &prompt).await,
        }
    }

    async fn relay_turn(&self, chat_id: ChatId, prompt: &str) {
        if let Err(e) = self
            .channel
            .send_presence(chat_id, PresenceAction::Typing)
            .await
        {
            debug!(chat_id = %chat_id, error = %e, "Presence action failed");
        }

        let conversation = self.sessions.get(chat_id).await;
        let mut conversation = conversation.lock().await;

        match self.relay.run(&mut conversation, prompt).await {
            Ok(outcome) => {
                if let Err(e) = deliver(self.channel.as_ref(), chat_id, &outcome).await {
                    error!(chat_id = %chat_id, error = %e, "Delivery failed");
                }
            }
            Err(e) => {
                // Raw detail stays in the logs; the user gets a fixed apology.
                error!(chat_id = %chat_id, error = %e, "Relay turn failed");
                if let Err(e) = self.channel.send_text(chat_id, APOLOGY).await {
                    error!(chat_id = %chat_id, error = %e, "Failed to send apology");
                }
            }
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    config.validate().context("validating configuration")?;

    let telegram_token = config.telegram_token()?.to_string();
    let google_api_key = config.google_api_key()?.to_string();

    let provider = GeminiProvider::new(google_api_key, &config.model)?;
    let notes = Arc::new(NoteStore::new(config.notes_path()));
    let registry: ToolRegistry = mordomo_tools::build_registry(
        config.tavily_api_key.as_deref(),
        notes,
        config.output_dir(),
    )?;

    let relay = RelayLoop::new(
        Arc::new(provider),
        Arc::new(registry),
        config.system_instruction(),
    )
    .with_temperature(config.temperature)
    .with_max_tool_rounds(config.max_tool_rounds);

    let channel = TelegramChannel::new(TelegramConfig {
        bot_token: telegram_token,
        allowed_users: config.allowed_users.clone(),
    })?;

    let dispatcher = Arc::new(Dispatcher {
        channel: Arc::new(channel),
        relay: Arc::new(relay),
        sessions: Arc::new(SessionMap::new()),
    });

    let mut updates = dispatcher.channel.start().await?;
    info!(model = %config.model, "Mordomo is listening");

    while let Some(update) = updates.recv().await {
        match update {
            Ok(message) => {
                // Each update runs on its own task; the session lock keeps
                // turns within one chat serialized.
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    dispatcher.handle(message).await;
                });
            }
            Err(e) => warn!(error = %e, "Channel reported an error"),
        }
    }

    info!("Update stream closed, shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_is_ignored() {
        assert_eq!(interpret("   "), Directive::Ignore);
        assert_eq!(interpret(""), Directive::Ignore);
    }

    #[test]
    fn start_resets() {
        assert_eq!(interpret("/start"), Directive::Start);
    }

    #[test]
    fn bare_pdf_command_gets_usage() {
        assert_eq!(interpret("/pdf"), Directive::Usage(PDF_USAGE));
        assert_eq!(interpret("/pdf   "), Directive::Usage(PDF_USAGE));
    }

    #[test]
    fn bare_spreadsheet_command_gets_usage() {
        assert_eq!(interpret("/planilha"), Directive::Usage(SPREADSHEET_USAGE));
    }

    #[test]
    fn pdf_command_steers_to_the_tool() {
        match interpret("/pdf resumo da semana") {
            Directive::Relay(prompt) => {
                assert!(prompt.contains("gerar_pdf"));
                assert!(prompt.contains("resumo da semana"));
            }
            other => panic!("expected relay, got {other:?}"),
        }
    }

    #[test]
    fn spreadsheet_command_steers_to_the_tool() {
        match interpret("/planilha gastos de julho") {
            Directive::Relay(prompt) => {
                assert!(prompt.contains("gerar_planilha"));
                assert!(prompt.contains("gastos de julho"));
            }
            other => panic!("expected relay, got {other:?}"),
        }
    }

    #[test]
    fn command_must_match_the_whole_token() {
        // Not the /pdf command, just text that starts with it.
        assert_eq!(
            interpret("/pdfqualquercoisa"),
            Directive::Relay("/pdfqualquercoisa".into())
        );
        assert_eq!(
            interpret("/planilhas de ontem"),
            Directive::Relay("/planilhas de ontem".into())
        );
    }

    #[test]
    fn plain_text_relays_verbatim() {
        assert_eq!(
            interpret("Qual a capital da França?"),
            Directive::Relay("Qual a capital da França?".into())
        );
    }
}
