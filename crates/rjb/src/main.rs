use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use rjb_core::{
    config::Config,
    dispatch::Dispatcher,
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger},
    },
    polling::{run_polling, PullSettings, UpdateFeed},
    search::JobSearch,
};
use rjb_jobicy::{JobicyClient, JobicyConfig};
use rjb_telegram::{webhook, TelegramFeed, TelegramMessenger};

#[derive(Parser)]
#[command(name = "rjb", version, about = "Remote jobs Telegram bot")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Long-poll Telegram for updates (default).
    Poll,
    /// Receive updates on the webhook HTTP server.
    Serve,
    /// Register the public webhook URL with Telegram.
    SetWebhook {
        #[arg(long)]
        url: String,
    },
    /// Remove the registered webhook.
    DeleteWebhook,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rjb_core::logging::init("rjb")?;
    let cli = Cli::parse();
    let cfg = Config::load()?;

    let bot = rjb_telegram::build_bot(&cfg.telegram_bot_token, cfg.poll_timeout)?;

    match cli.command.unwrap_or(Command::Poll) {
        Command::SetWebhook { url } => {
            rjb_telegram::set_webhook(&bot, &url).await?;
            return Ok(());
        }
        Command::DeleteWebhook => {
            rjb_telegram::delete_webhook(&bot).await?;
            return Ok(());
        }
        Command::Poll => {
            let dispatcher = build_dispatcher(&cfg, bot.clone())?;
            let shutdown = shutdown_on_ctrl_c();

            // getUpdates is refused while a webhook is registered.
            if let Err(e) = rjb_telegram::delete_webhook(&bot).await {
                warn!(error = %e, "could not clear webhook before polling");
            }

            let feed: Arc<dyn UpdateFeed> = Arc::new(TelegramFeed::new(bot));
            let cursor =
                run_polling(feed, dispatcher, PullSettings::from_config(&cfg), shutdown).await;
            info!(offset = cursor.next(), "bye");
        }
        Command::Serve => {
            let dispatcher = build_dispatcher(&cfg, bot)?;
            let shutdown = shutdown_on_ctrl_c();
            let app = webhook::router(dispatcher, &cfg.webhook_path);
            webhook::serve(cfg.webhook_addr, app, shutdown)
                .await
                .context("webhook server failed")?;
        }
    }

    Ok(())
}

fn build_dispatcher(cfg: &Config, bot: rjb_telegram::Bot) -> anyhow::Result<Arc<Dispatcher>> {
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot));
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        ThrottleConfig::default(),
    ));
    let search: Arc<dyn JobSearch> = Arc::new(JobicyClient::new(JobicyConfig::from_config(cfg))?);

    info!(
        mode = %cfg.dispatch_mode,
        message_limit = cfg.message_limit,
        "bot configured"
    );
    Ok(Arc::new(Dispatcher::new(messenger, search, cfg.message_limit)))
}

fn shutdown_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "ctrl-c handler unavailable");
            return;
        }
        info!("ctrl-c received, shutting down");
        trigger.cancel();
    });
    token
}
