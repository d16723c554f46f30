//! The `set-commands` command — registers the slash-command menu.
//!
//! One-shot call to `setMyCommands`; the menu shows up in the Telegram
//! client next to the message box.

use anyhow::Context;
use mordomo_channels::{BotCommand, TelegramChannel, TelegramConfig};
use mordomo_config::AppConfig;

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    let bot_token = config.telegram_token()?.to_string();

    let channel = TelegramChannel::new(TelegramConfig {
        bot_token,
        allowed_users: config.allowed_users.clone(),
    })?;

    let commands = [
        BotCommand {
            command: "start".into(),
            description: "Reinicia a conversa".into(),
        },
        BotCommand {
            command: "pdf".into(),
            description: "Gera um documento PDF".into(),
        },
        BotCommand {
            command: "planilha".into(),
            description: "Gera uma planilha Excel".into(),
        },
    ];

    channel.set_my_commands(&commands).await?;
    println!("Menu de comandos registrado ({} comandos).", commands.len());

    Ok(())
}
