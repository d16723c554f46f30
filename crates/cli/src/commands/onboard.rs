//! The `onboard` command — writes a starter config file.

use anyhow::Context;
use mordomo_config::AppConfig;

pub async fn run() -> anyhow::Result<()> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return Ok(());
    }

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("creating {}", config_dir.display()))?;
    std::fs::write(&config_path, AppConfig::default_toml())
        .with_context(|| format!("writing {}", config_path.display()))?;

    println!("Config written to {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set TELEGRAM_TOKEN and GOOGLE_API_KEY (env or config file)");
    println!("  2. Optionally set TAVILY_API_KEY to enable web search");
    println!("  3. mordomo set-commands   # register the slash-command menu");
    println!("  4. mordomo run");

    Ok(())
}
