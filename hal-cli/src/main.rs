mod commands;
mod config;
mod file_store;
mod render;
mod store_pb;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, span, Level};
use tracing_subscriber::EnvFilter;

use config::{AppConfig, Cli};
use file_store::FileStore;

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.default_log_filter()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_cli(&cli);
    init_tracing(&config);

    let _span = span!(Level::INFO, "hal", user = %config.session.username).entered();
    debug!("role {:?}, store {}", config.session.role, config.store_path.display());

    let store = FileStore::open(&config.store_path)
        .with_context(|| format!("opening store {}", config.store_path.display()))?;
    debug!("using {}", store.path().display());
    futures::executor::block_on(commands::run(&store, &config, cli.command))
}
