mod config;
mod core;
mod infra;
mod logging;

use std::sync::Arc;

use config::Config;
use crate::core::feed::FeedApi;
use infra::feed_client::ConnectFeedClient;
use infra::local_storage::FileStorage;
use infra::terminal::TerminalInput;

fn main() {
    // A missing .env is fine; deployments set real env vars.
    let _ = dotenvy::dotenv();
    logging::init_logging();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--cli") {
        run_cli(&config);
    } else {
        run_web(&config);
    }
}

/// Terminal front end. Settings and player state live in a local storage
/// file.
fn run_cli(config: &Config) {
    let storage = match FileStorage::open(&config.storage_path) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::error!(error = %e, "Local storage unavailable, changes will not persist");
            None
        }
    };
    if let Some(s) = &storage {
        tracing::info!(path = %s.path().display(), "Using local storage");
    }

    let feed = Box::new(ConnectFeedClient::new(&config.api_url));
    let mut app = core::app::App::new(storage.as_ref(), feed, TerminalInput);
    app.run();
}

/// Serves page data for the channel index and channel pages.
fn run_web(config: &Config) {
    // reqwest::blocking::Client owns a runtime of its own; build it before
    // entering ours.
    let feed: Arc<dyn FeedApi> = Arc::new(ConnectFeedClient::new(&config.api_url));

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(api_url = %config.api_url, "Feed service");
    if let Err(e) = rt.block_on(infra::web::start_server(Arc::clone(&feed), config.port)) {
        tracing::error!(error = %e, "Server stopped");
        std::process::exit(1);
    }
}
