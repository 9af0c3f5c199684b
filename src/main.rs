//! # Huddlebot CLI
//!
//! Group session scheduler bot: propose events, collect RSVPs, list what's
//! coming up, and get a DM before an event starts.
//!
//! Usage:
//!   huddlebot run                      # Connect and serve commands
//!   huddlebot onboard                  # First-time setup
//!   huddlebot config show              # Show configuration

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

use huddle_channels::DiscordChannel;
use huddle_commands::Dispatcher;
use huddle_core::traits::Channel;
use huddle_core::types::OutgoingMessage;
use huddle_core::HuddleConfig;
use huddle_scheduler::{spawn_reminder_loop, ReminderEngine};
use huddle_store::Store;

#[derive(Parser)]
#[command(
    name = "huddlebot",
    version,
    about = "Group session scheduler bot — events, RSVPs, and reminders"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the chat channel and serve commands
    Run,

    /// First-time setup wizard
    Onboard,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Reset to defaults
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "huddlebot=debug,huddle_store=debug,huddle_scheduler=debug,huddle_channels=debug"
    } else {
        "huddlebot=info,huddle_store=info,huddle_scheduler=info,huddle_channels=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = if let Some(path) = &cli.config {
        HuddleConfig::load_from(std::path::Path::new(path))?
    } else {
        HuddleConfig::load()?
    };

    match cli.command {
        Commands::Run => run(config).await?,

        Commands::Onboard => {
            println!("Huddlebot — First-time Setup\n");
            let config = HuddleConfig::default();
            config.save()?;
            println!("Config saved to: {}", HuddleConfig::default_path().display());

            std::fs::create_dir_all(config.store.resolved_dir())?;
            println!("Store directory created");

            println!("\nNext steps:");
            println!("  1. Add your bot token under [channel.discord] in the config");
            println!("  2. Start the bot: huddlebot run");
            println!("  3. In chat: {}list-commands", config.command_prefix);
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", toml::to_string_pretty(&config)?);
            }
            ConfigAction::Reset => {
                HuddleConfig::default().save()?;
                println!("Config reset to defaults");
            }
        },
    }

    Ok(())
}

async fn run(config: HuddleConfig) -> Result<()> {
    let Some(discord_config) = config.channel.discord.clone() else {
        anyhow::bail!(
            "No Discord channel configured. Add [channel.discord] to {}",
            HuddleConfig::default_path().display()
        );
    };
    if !discord_config.enabled {
        anyhow::bail!("Discord channel is disabled in the config");
    }

    let store = Arc::new(Store::open(&config.store.resolved_dir()));
    let dispatcher = Dispatcher::new(store.clone(), config.command_prefix.clone());

    let mut channel = DiscordChannel::new(discord_config);
    channel.connect().await?;
    let channel: Arc<dyn Channel> = Arc::new(channel);

    let engine = ReminderEngine::new(store);
    tokio::spawn(spawn_reminder_loop(
        engine,
        channel.clone(),
        config.scheduler.poll_secs,
    ));

    // Single-worker loop: one command is fully processed before the next
    // message is taken off the stream, preserving command ordering.
    let mut stream = channel.listen().await?;
    tracing::info!("Huddlebot is listening");
    while let Some(incoming) = stream.next().await {
        let Some(response) = dispatcher.dispatch(&incoming.content, &incoming.sender_id) else {
            continue;
        };
        if let Err(e) = channel
            .send(OutgoingMessage::reply_to(&incoming, response))
            .await
        {
            tracing::error!("Failed to send response: {e}");
        }
    }

    Ok(())
}
