mod cli;
mod commands;

use crate::cli::CLI;
use anyhow::Context;
use clap::Parser;
use golink_storage::{LinkStore, StoreConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // logs go to stderr so stdout stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = CLI::parse();
    let mut stdout = std::io::stdout().lock();

    if !config.command.needs_database() {
        return commands::run_offline(&config.command, &mut stdout);
    }

    let database_url = config
        .database_url
        .context("a database url is required, pass --database-url or set GOLINK_DATABASE_URL")?;

    let store_config = StoreConfig::builder()
        .database_url(database_url)
        .max_connections(config.max_connections)
        .concurrency(config.concurrency.into())
        .build();

    info!(
        max_connections = config.max_connections,
        concurrency = %config.concurrency,
        "connecting to link database"
    );

    let store = LinkStore::connect(&store_config)
        .await
        .context("opening link database")?;

    let result = commands::run(&config.command, &store, &mut stdout).await;
    store.close().await;
    result
}
