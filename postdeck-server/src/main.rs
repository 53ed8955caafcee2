//! # Postdeck Server
//!
//! Runs the Telegram bot: long-polling dispatcher, background session
//! pruning and the keepalive HTTP endpoint.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use postdeck_core::{
    AssistantSettings, Collaborators, StateMachine,
    infra::{
        DisabledMetadata, HttpShortener, InMemoryFileRecords, InMemoryOwners, InMemoryPosts,
        InMemoryRequests, OpenGate, PassthroughPoster, TmdbClient, postgres::PostgresStore,
    },
    ports::{
        AccessGate, FileRecordRepository, MetadataProvider, OwnerRepository, PostRepository,
        RequestRepository,
    },
};
use postdeck_server::{
    infra::{Config, KeepaliveState, keepalive},
    telegram::{ChannelGate, TelegramMessenger, run_dispatcher},
};
use teloxide::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SESSION_PRUNE_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "postdeck-server")]
#[command(about = "Telegram assistant that publishes media posts to channels")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Keepalive port (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Keepalive host (overrides SERVER_HOST)
    #[arg(long)]
    host: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Apply database migrations and exit
    Migrate,
}

struct Repositories {
    files: Arc<dyn FileRecordRepository>,
    owners: Arc<dyn OwnerRepository>,
    requests: Arc<dyn RequestRepository>,
    posts: Arc<dyn PostRepository>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn,hyper=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(host) = cli.serve.host.clone() {
        config.server_host = host;
    }
    if let Some(port) = cli.serve.port {
        config.server_port = port;
    }

    if let Some(Command::Db(DbCommand::Migrate)) = cli.command {
        return run_db_migrate(&config).await;
    }

    run_server(config).await
}

async fn run_db_migrate(config: &Config) -> anyhow::Result<()> {
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set to run migrations")?;
    let store = PostgresStore::connect(database_url, config.database_max_connections)
        .await
        .context("failed to connect to PostgreSQL")?;
    store
        .run_migrations()
        .await
        .context("failed to apply migrations")?;
    info!("Migrations applied");
    Ok(())
}

async fn open_repositories(config: &Config) -> anyhow::Result<Repositories> {
    match config.database_url.as_deref() {
        Some(database_url) => {
            let store = PostgresStore::connect(database_url, config.database_max_connections)
                .await
                .context("failed to connect to PostgreSQL")?;
            store
                .run_migrations()
                .await
                .context("failed to apply migrations")?;
            info!("Using PostgreSQL storage");
            Ok(Repositories {
                files: Arc::new(store.files.clone()),
                owners: Arc::new(store.owners.clone()),
                requests: Arc::new(store.requests.clone()),
                posts: Arc::new(store.posts.clone()),
            })
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory storage, data is lost on restart");
            Ok(Repositories {
                files: Arc::new(InMemoryFileRecords::default()),
                owners: Arc::new(InMemoryOwners::default()),
                requests: Arc::new(InMemoryRequests::default()),
                posts: Arc::new(InMemoryPosts::default()),
            })
        }
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    info!(?config, "starting postdeck");

    let repositories = open_repositories(&config).await?;

    let bot = Bot::new(config.bot_token.clone());
    let me = bot
        .get_me()
        .await
        .context("failed to reach the Bot API; check BOT_TOKEN")?;
    let bot_username = me.username().to_string();
    info!(bot = %bot_username, "authenticated with the Bot API");

    let gate: Arc<dyn AccessGate> = match config.force_sub_channel.as_deref() {
        Some(channel) => Arc::new(ChannelGate::new(
            bot.clone(),
            channel,
            config.invite_link.clone(),
            config.membership_cache,
        )),
        None => Arc::new(OpenGate),
    };
    let metadata: Arc<dyn MetadataProvider> = match config.tmdb_api_key.as_deref() {
        Some(key) => Arc::new(TmdbClient::new(key)),
        None => {
            warn!("TMDB_API_KEY not set; metadata search is disabled");
            Arc::new(DisabledMetadata)
        }
    };

    let deps = Collaborators {
        messenger: Arc::new(TelegramMessenger::new(bot.clone())),
        files: repositories.files,
        owners: repositories.owners,
        requests: repositories.requests,
        posts: repositories.posts,
        gate,
        metadata,
        shortener: Arc::new(HttpShortener::new()),
        poster: Arc::new(PassthroughPoster),
    };
    let settings = AssistantSettings {
        owner_id: config.owner_id,
        archive_chat: config.archive_chat,
        bot_username,
        blog_url: config.blog_url.clone(),
        broadcast_delay: config.broadcast_delay,
        caption_footer: config.caption_footer.clone(),
    };
    let machine = Arc::new(StateMachine::new(settings, deps));

    let address = config.bind_address();
    tokio::spawn(async move {
        if let Err(e) = keepalive::serve(address, KeepaliveState::new()).await {
            error!("keepalive server stopped: {e:#}");
        }
    });

    let pruner = Arc::clone(&machine);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PRUNE_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            let pruned = pruner.sessions().prune_idle();
            if pruned > 0 {
                info!(pruned, "pruned idle sessions");
            }
        }
    });

    run_dispatcher(bot, machine).await;
    info!("postdeck stopped");
    Ok(())
}
