use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::watch;

use steam_price_bot::config::{self, AppConfig, Secrets};
use steam_price_bot::monitoring::{health, logger};
use steam_price_bot::notify::format;
use steam_price_bot::store::client::SteamStoreClient;
use steam_price_bot::store::listing::lookup_game;
use steam_price_bot::store::pacing::RequestPacer;
use steam_price_bot::store::LookupService;
use steam_price_bot::watch::registry::WatchRegistry;
use steam_price_bot::watch::watcher::DiscountWatcher;

#[derive(Debug, Parser)]
#[command(name = "steam-price-bot", about = "Steam price lookups and discount alerts")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the chat bot and the discount watcher (default).
    Run,
    /// Look up a game once and print its price card.
    Lookup {
        /// Game title to search for.
        #[arg(required = true)]
        term: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, secrets) = AppConfig::load(&cli.config)?;

    logger::init_logging(&config.monitoring)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config, secrets).await,
        Command::Lookup { term } => lookup(&config, &term.join(" ")).await,
    }
}

/// Print a single game card to stdout. A failed lookup is printed and returned as an error.
async fn lookup(config: &AppConfig, term: &str) -> Result<()> {
    let client = SteamStoreClient::new(&config.store)?;
    let pacer = RequestPacer::new(Duration::from_millis(config.store.dlc_request_delay_ms));

    match lookup_game(&client, &pacer, term).await {
        Ok(game) => {
            println!("{}", format::game_card(&game));
            Ok(())
        }
        Err(e) => {
            println!("{}", format::lookup_error(&e));
            Err(anyhow::Error::new(e).context(format!("Lookup of {term:?} failed")))
        }
    }
}

async fn run(config: AppConfig, secrets: Secrets) -> Result<()> {
    tracing::info!(
        interval_s = config.watcher.sweep_interval_seconds,
        discount_source = ?config.watcher.discount_source,
        on_discount_end = ?config.watcher.on_discount_end,
        on_rewatch = ?config.watcher.on_rewatch,
        "Steam price bot starting"
    );

    let lookup: Arc<dyn LookupService> = Arc::new(SteamStoreClient::new(&config.store)?);
    let registry = Arc::new(WatchRegistry::new(config.watcher.on_rewatch));

    let health_state = health::HealthState::new();
    let health_handle = config
        .monitoring
        .health_enabled
        .then(|| health::spawn_health_server(config.monitoring.health_addr.clone(), health_state.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let watcher_handle = serve(&config, secrets, lookup, registry, health_state, shutdown_rx).await?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = watcher_handle.await {
        tracing::error!(error = %e, "Discount watcher task failed");
    }
    if let Some(handle) = health_handle {
        handle.abort();
    }

    tracing::info!("Steam price bot stopped");
    Ok(())
}

/// Start the watcher and the Telegram front end; returns once the bot stops.
#[cfg(feature = "telegram")]
async fn serve(
    config: &AppConfig,
    secrets: Secrets,
    lookup: Arc<dyn LookupService>,
    registry: Arc<WatchRegistry>,
    health_state: health::HealthState,
    shutdown: watch::Receiver<bool>,
) -> Result<tokio::task::JoinHandle<()>> {
    use secrecy::ExposeSecret;
    use steam_price_bot::bot::telegram::{run_dispatcher, TelegramNotifier};
    use steam_price_bot::bot::BotState;
    use teloxide::Bot;

    let token = secrets
        .telegram_token
        .ok_or_else(|| anyhow::anyhow!("TELEGRAM_TOKEN is not set"))?;
    let bot = Bot::new(token.expose_secret());

    let watcher = DiscountWatcher::new(
        &config.watcher,
        Arc::clone(&lookup),
        Arc::clone(&registry),
        Arc::new(TelegramNotifier::new(bot.clone())),
    )
    .with_health(health_state);
    let watcher_handle = Arc::new(watcher).spawn(shutdown);

    let pacer = RequestPacer::new(Duration::from_millis(config.store.dlc_request_delay_ms));
    let state = Arc::new(BotState::new(lookup, registry, pacer));
    run_dispatcher(bot, state).await;

    Ok(watcher_handle)
}

/// Without a chat transport the watcher logs its notifications until Ctrl-C.
#[cfg(not(feature = "telegram"))]
async fn serve(
    config: &AppConfig,
    _secrets: Secrets,
    lookup: Arc<dyn LookupService>,
    registry: Arc<WatchRegistry>,
    health_state: health::HealthState,
    shutdown: watch::Receiver<bool>,
) -> Result<tokio::task::JoinHandle<()>> {
    use steam_price_bot::notify::LogNotifier;

    tracing::warn!("Built without the telegram feature, notifications go to the log");

    let watcher = DiscountWatcher::new(&config.watcher, lookup, registry, Arc::new(LogNotifier))
        .with_health(health_state);
    let watcher_handle = Arc::new(watcher).spawn(shutdown);

    tokio::signal::ctrl_c().await?;
    Ok(watcher_handle)
}
