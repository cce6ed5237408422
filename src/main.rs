use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use transit::{IRailClient, IRAIL_CONNECTIONS_URL};

mod command;
mod connections;
mod server;
mod transit;

const LISTEN_ADDR: &str = "0.0.0.0:9000";
const DEFAULT_LOG_FILTER: &str = "info";

// no cap, every connection gets its own task
const CONNECTION_LIMIT: Option<usize> = None;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // connect tracing to stdout, RUST_LOG overrides the default filter
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .init();

    let api = IRailClient::new(IRAIL_CONNECTIONS_URL)?;

    let listener = TcpListener::bind(LISTEN_ADDR).await?;
    tracing::info!("server listening on: {}", listener.local_addr()?);

    // runs until the process is killed
    server::run(listener, Arc::new(api), CONNECTION_LIMIT).await;

    Ok(())
}

fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[cfg(test)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::log_filter;

    #[test]
    fn check_log_filter() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));

        let debug = log_filter(Some("train_route=debug"));
        assert_eq!(debug.max_level_hint(), Some(LevelFilter::DEBUG));

        let quiet = log_filter(Some("warn"));
        assert_eq!(quiet.max_level_hint(), Some(LevelFilter::WARN));
    }
}
