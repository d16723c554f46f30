//! The `chat` command — one local message, no Telegram.
//!
//! Useful for trying out the persona and the tools without a bot token.
//! Generated files stay on disk and their paths are printed.

use anyhow::Context;
use mordomo_config::AppConfig;
use mordomo_core::channel::ChatId;
use mordomo_core::conversation::Conversation;
use mordomo_memory::NoteStore;
use mordomo_providers::GeminiProvider;
use mordomo_relay::RelayLoop;
use std::sync::Arc;

pub async fn run(message: String) -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    config.validate().context("validating configuration")?;

    let google_api_key = config.google_api_key()?.to_string();

    let provider = GeminiProvider::new(google_api_key, &config.model)?;
    let notes = Arc::new(NoteStore::new(config.notes_path()));
    let registry = mordomo_tools::build_registry(
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

    let mut conversation = Conversation::new(ChatId(0));
    let outcome = relay.run(&mut conversation, &message).await?;

    println!("{}", outcome.reply);
    if let Some(path) = outcome.attachment {
        println!("Arquivo gerado: {}", path.display());
    }

    Ok(())
}
