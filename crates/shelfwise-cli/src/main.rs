mod entity;
mod pipeline;

use clap::{Parser, Subcommand};
use shelfwise_core::EntityId;
use shelfwise_db::PgDocumentStore;
use tracing_subscriber::EnvFilter;

use crate::entity::EntityCommands;

#[derive(Debug, Parser)]
#[command(name = "shelfwise")]
#[command(about = "Marketplace scraping, sentiment, and competitive reports")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Register and manage tracked entities
    Entity {
        #[command(subcommand)]
        command: EntityCommands,
    },
    /// Scrape the top listing for an entity on each of its platforms
    Scrape { entity: EntityId },
    /// Scrape several competing listings per platform
    Competitors {
        entity: EntityId,
        /// Listings per platform (defaults to SHELFWISE_COMPETITOR_COUNT)
        #[arg(long)]
        count: Option<usize>,
    },
    /// Compute and store the sentiment snapshot for one scraped record
    Sentiment { scraped: EntityId },
    /// Ask a question about an entity and store the resulting report
    Ask { entity: EntityId, question: String },
    /// Show the stored report joined with the latest sentiment snapshot
    Report { entity: EntityId },
    /// List scraped records for an entity, newest first
    Scraped { entity: EntityId },
    /// Show recent scrape run logs
    Logs {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = shelfwise_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let Some(command) = cli.command else {
        println!("shelfwise ready; see --help");
        return Ok(());
    };

    let pool_config = shelfwise_db::PoolConfig::from_app_config(&config);
    let pool = shelfwise_db::connect_pool(&config.database_url, pool_config).await?;
    let store = PgDocumentStore::new(pool);

    match command {
        Commands::Entity { command } => entity::run(&store, command).await,
        Commands::Scrape { entity } => pipeline::run_scrape(&store, &config, entity, 1).await,
        Commands::Competitors { entity, count } => {
            let count = count.unwrap_or(config.competitor_count);
            pipeline::run_scrape(&store, &config, entity, count).await
        }
        Commands::Sentiment { scraped } => pipeline::run_sentiment(&store, scraped).await,
        Commands::Ask { entity, question } => {
            pipeline::run_ask(&store, &config, entity, &question).await
        }
        Commands::Report { entity } => pipeline::run_unified_report(&store, entity).await,
        Commands::Scraped { entity } => pipeline::run_list_scraped(&store, entity).await,
        Commands::Logs { limit } => pipeline::run_logs(&store, limit).await,
        Commands::Db { command } => run_db(store.pool(), &command).await,
    }
}

async fn run_db(pool: &sqlx::PgPool, command: &DbCommands) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            shelfwise_db::ping(pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = shelfwise_db::run_migrations(pool).await?;
            println!("applied {applied} migration(s)");
        }
    }
    Ok(())
}

/// Print any serializable value as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
