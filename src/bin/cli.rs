//! pricewatch CLI
//!
//! Long-running watcher, one-off scans and configuration checks.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use pricewatch::{
    bot::{Dispatcher, run_bot},
    config,
    error::Result,
    models::Settings,
    notify::{Notifier, TelegramBot},
    parsers::ParserRegistry,
    pipeline::{CycleKind, Scheduler, Watcher},
    storage::{LocalStorage, TrackedStore},
    utils::http::{FetchClient, RequestPacer},
};
use tokio::sync::mpsc;

/// pricewatch - shop price and stock availability watcher
#[derive(Parser, Debug)]
#[command(
    name = "pricewatch",
    version,
    about = "Watches prices and stock availability and reports changes to Telegram"
)]
struct Cli {
    /// Environment file to load before reading settings (default: ./.env if present)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run both periodic checks and answer bot commands
    Run,

    /// Run cycles once now and exit
    Scan {
        /// Which cycle to run
        #[arg(long, value_enum, default_value_t = ScanKind::All)]
        kind: ScanKind,
    },

    /// Validate settings and tracked files
    Validate,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ScanKind {
    Prices,
    Availability,
    All,
}

impl ScanKind {
    fn cycles(self) -> Vec<CycleKind> {
        match self {
            Self::Prices => vec![CycleKind::Prices],
            Self::Availability => vec![CycleKind::Availability],
            Self::All => CycleKind::ALL.to_vec(),
        }
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Shared components of a running watcher.
struct App {
    settings: Settings,
    registry: Arc<ParserRegistry>,
    tracked: Arc<TrackedStore>,
    bot: Arc<TelegramBot>,
    watcher: Arc<Watcher>,
}

impl App {
    async fn build(settings: Settings) -> Result<Self> {
        let registry = Arc::new(ParserRegistry::builtin());
        let tracked = Arc::new(
            TrackedStore::open(
                &settings.tracked_prices_path,
                &settings.tracked_availability_path,
                Arc::clone(&registry),
            )
            .await?,
        );
        let sites = tracked.load_sites().await?;
        log::info!("Tracking {} availability sites", sites.len());

        let bot = Arc::new(TelegramBot::new(settings.bot_token.clone())?);
        let notifier = Notifier::from_settings(bot.clone(), &settings);

        let watcher = Arc::new(Watcher::new(
            Arc::new(FetchClient::new()?),
            Arc::clone(&registry),
            RequestPacer::new(settings.request_interval),
            Arc::new(LocalStorage::new(&settings.results_dir)),
            Arc::clone(&tracked),
            notifier,
        ));

        Ok(Self {
            settings,
            registry,
            tracked,
            bot,
            watcher,
        })
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("pricewatch starting...");

    let settings = config::load_settings(cli.env_file.as_deref())?;
    log::debug!("Settings: {settings:?}");

    match cli.command {
        Command::Run => {
            let app = App::build(settings).await?;
            let (requests, incoming) = mpsc::unbounded_channel();

            let dispatcher = Dispatcher::new(
                app.settings.chat_id.clone(),
                app.tracked.clone(),
                Arc::clone(&app.registry),
                requests,
                app.bot.clone(),
            );
            tokio::spawn(run_bot(Arc::clone(&app.bot), dispatcher));

            let scheduler = Arc::new(Scheduler::new(Arc::clone(&app.watcher)));
            scheduler
                .run(
                    app.settings.price_check_interval,
                    app.settings.availability_check_interval,
                    incoming,
                )
                .await;
        }

        Command::Scan { kind } => {
            let app = App::build(settings).await?;
            let scheduler = Scheduler::new(Arc::clone(&app.watcher));
            for cycle in kind.cycles() {
                scheduler.run_once(cycle).await?;
            }
            log::info!("Scan complete!");
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            let registry = Arc::new(ParserRegistry::builtin());
            let tracked = TrackedStore::open(
                &settings.tracked_prices_path,
                &settings.tracked_availability_path,
                registry,
            )
            .await?;
            let sites = tracked.load_sites().await?;

            log::info!("✓ Settings OK");
            log::info!("✓ {} tracked price items", tracked.items().await.len());
            log::info!("✓ {} tracked availability sites", sites.len());
            log::info!("All validations passed!");
        }
    }

    log::info!("Done!");

    Ok(())
}
