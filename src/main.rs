use std::sync::Arc;

use checklist_bot::bot::{Bot, BotDeps};
use checklist_bot::channels::{Channel, CliChannel, TelegramChannel};
use checklist_bot::config::{BotConfig, ChannelSettings};
use checklist_bot::dialog::ConversationStore;
use checklist_bot::document::FileChecklist;
use checklist_bot::health;
use checklist_bot::notify::Notifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Missing operator chat or token stops us here, before any conversation.
    let config = BotConfig::from_env()?;

    eprintln!("📋 Checklist bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Channel: {}", config.channel.name());
    eprintln!("   Operator chat: {}", config.operator_chat_id);
    eprintln!("   Checklist: {}", config.checklist_path.display());

    let checklist = FileChecklist::new(config.checklist_path);
    if !checklist.path().exists() {
        tracing::warn!(
            path = %checklist.path().display(),
            "Checklist file not found; users will get the unavailable message"
        );
    }

    // ── Health listener ──────────────────────────────────────────────
    if let Some(port) = config.health_port {
        eprintln!("   Health: http://0.0.0.0:{}/health", port);
        tokio::spawn(async move {
            if let Err(e) = health::serve(port).await {
                tracing::error!(port, "Health listener failed: {}", e);
            }
        });
    }

    // ── Channel ──────────────────────────────────────────────────────
    let (channel, notifier): (Arc<dyn Channel>, Arc<dyn Notifier>) = match config.channel {
        ChannelSettings::Telegram { bot_token } => {
            let telegram = Arc::new(TelegramChannel::new(bot_token));
            if let Err(e) = telegram.health_check().await {
                tracing::warn!("Telegram health check failed: {}", e);
            }
            let channel: Arc<dyn Channel> = telegram.clone();
            let notifier: Arc<dyn Notifier> = telegram;
            (channel, notifier)
        }
        ChannelSettings::Cli => {
            eprintln!("   Type /start to begin, /cancel to abort.\n");
            let cli = Arc::new(CliChannel::new());
            let channel: Arc<dyn Channel> = cli.clone();
            let notifier: Arc<dyn Notifier> = cli;
            (channel, notifier)
        }
    };

    let deps = BotDeps {
        channel,
        documents: Arc::new(checklist),
        notifier,
        operator_chat_id: config.operator_chat_id,
    };

    let bot = Arc::new(Bot::new(deps, ConversationStore::new()));
    bot.run().await?;

    Ok(())
}
