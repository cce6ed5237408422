use std::{future::Future, sync::Arc, time::Duration};

use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpListener,
    sync::Semaphore,
};

use crate::{
    command::{CommandError, RouteCommand},
    connections::{self, DecodeError},
    transit::{FetchError, TransitApi},
};

/// A command is whatever arrives in a single read of at most this many bytes
pub const MAX_COMMAND_SIZE: usize = 512;
const UPSTREAM_FAILURE: &str = "Failed to reach SNCB API";
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

#[derive(thiserror::Error, Debug)]
pub enum RequestError {
    #[error("{0}")]
    Command(#[from] CommandError),

    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Decode(#[from] DecodeError),
}

impl RequestError {
    /// The error line sent back to the client, upstream details are never exposed
    pub fn reply(&self) -> String {
        match self {
            Self::Command(err) => format!("ERROR: {}", err),
            Self::Fetch(_) | Self::Decode(_) => format!("ERROR: {}", UPSTREAM_FAILURE),
        }
    }
}

/// Accepts connections forever, serving each one on its own task.
///
/// With a `limit`, at most that many connections are served at once,
/// the rest wait in the listen backlog until a slot frees up.
pub async fn run(listener: TcpListener, api: Arc<dyn TransitApi>, limit: Option<usize>) {
    let slots = limit.map(|limit| Arc::new(Semaphore::new(limit)));
    let listener = &listener;

    loop {
        let permit = match &slots {
            Some(slots) => slots.clone().acquire_owned().await.ok(),
            None => None,
        };

        let (conn, peer) = accept_with_backoff(move || listener.accept()).await;

        let api = api.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(conn, api.as_ref()).await {
                tracing::debug!("connection with {} failed: {}", peer, err);
            }

            drop(permit);
        });
    }
}

/// Retries `accept` until it yields a connection, pausing after every failure
async fn accept_with_backoff<F, Fut, T>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(err) => {
                tracing::warn!("failed to accept a connection: {}", err);
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}

/// Serves a single command, and closes the connection.
pub async fn handle_connection<S>(mut stream: S, api: &dyn TransitApi) -> tokio::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buffer = [0u8; MAX_COMMAND_SIZE];
    let rcount = stream.read(&mut buffer).await?;
    if rcount == 0 {
        // reached EOF
        return Ok(());
    }

    let command = String::from_utf8_lossy(&buffer[..rcount]);
    let command = command.trim();
    tracing::info!("received: {}", command);

    let reply = match process_command(command, api).await {
        Ok(body) => body,
        Err(err) => {
            tracing::warn!("failed to serve {:?}: {}", command, err);
            err.reply()
        }
    };
    tracing::debug!("responded: {:?}", reply);

    stream.write_all((reply + "\n").as_bytes()).await?;
    stream.shutdown().await
}

pub async fn process_command(command: &str, api: &dyn TransitApi) -> Result<String, RequestError> {
    let route: RouteCommand = command.parse()?;
    let payload = api.connections(&route.origin, &route.destination).await?;

    Ok(connections::format_connections(&payload)?)
}
