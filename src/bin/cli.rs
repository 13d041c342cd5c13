//! markov-bot CLI
//!
//! Local execution entry point. For AWS Lambda, use `markov-bot-lambda`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use markov_bot::{
    error::{AppError, Result},
    markov::WordTokenizer,
    models::BotConfig,
    pipeline::{self, Bot, BuildOutcome},
    storage::LocalStore,
};
use tokio_util::sync::CancellationToken;

/// markov-bot - Markov chain bot for Mastodon and Ohagi accounts
#[derive(Parser, Debug)]
#[command(name = "markov-bot", version, about = "Markov chain bot for fediverse accounts")]
struct Cli {
    /// Directory holding config.toml and model.json
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuild the model if stale, then generate and post
    Run,

    /// Rebuild the model unconditionally
    Build,

    /// Generate from the existing model and post
    Generate {
        /// Print the text instead of posting it
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Cancel in-flight requests on Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling...");
            token.cancel();
        }
    });
    cancel
}

/// `--dry-run` or `dry_run = true` in the config.
fn resolve_dry_run(flag: bool, config: &BotConfig) -> bool {
    flag || config.dry_run
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let config = BotConfig::load(&config_path).map_err(|e| {
        AppError::config(format!("load config {}: {e}", config_path.display()))
    })?;
    log::info!("Loaded configuration from {}", config_path.display());

    let store = LocalStore::new(cli.storage_dir.join("model.json"));
    let cancel = cancel_on_ctrl_c();

    match cli.command {
        Command::Run => {
            config.validate()?;
            let bot = Bot::from_config(&config)?;
            let report = pipeline::run(&bot, &WordTokenizer, &store, &cancel).await?;

            match &report.build {
                BuildOutcome::Skipped => log::info!("Model was {}, build skipped", report.freshness),
                BuildOutcome::Rebuilt(summary) => {
                    log::info!("Model rebuilt from {} posts", summary.post_count)
                }
                BuildOutcome::Kept { error } => log::warn!("Kept previous model: {error}"),
            }
            log::info!("Generated: {}", report.text);
        }

        Command::Build => {
            config.validate()?;
            let bot = Bot::from_config(&config)?;
            let mut fetcher = bot.fetch_client.posts_fetcher(cancel.clone());
            let summary = pipeline::build_chain(
                fetcher.as_mut(),
                &WordTokenizer,
                bot.chain.fetch_status_count,
                bot.chain.state_size,
                &store,
            )
            .await?;

            log::info!(
                "Model saved to {}: {} posts, {} states",
                store.path().display(),
                summary.post_count,
                summary.state_count
            );
        }

        Command::Generate { dry_run } => {
            config.validate()?;
            let bot = Bot::from_config(&config)?;
            let dry_run = resolve_dry_run(dry_run, &config);
            let text = pipeline::generate_and_post(
                bot.post_client.as_ref(),
                &store,
                bot.chain.min_words_count,
                dry_run,
                &cancel,
            )
            .await?;

            if dry_run {
                println!("{text}");
            } else {
                log::info!("Posted: {text}");
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }
    }

    log::info!("Done!");

    Ok(())
}
