use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use futures::{SinkExt, TryStreamExt};
use hitachiprojector::config::{DEFAULT_PJLINK_PORT, DEFAULT_PORT};
use hitachiprojector::{ProjectorConfig, ProjectorConnection};
use projectord::*;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

#[derive(Debug, Parser)]
#[command(name = "projectord", about = "Hitachi projector control daemon")]
struct Args {
    #[arg(long, env = "PROJECTOR_HOST")]
    host: String,
    #[arg(long, env = "PROJECTOR_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
    #[arg(long, env = "PROJECTOR_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,
    #[arg(long, env = "PROJECTOR_PJLINK_PORT", default_value_t = DEFAULT_PJLINK_PORT)]
    pjlink_port: u16,
    /// Connect and per-command timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,
    /// How long to wait for an authentication challenge, in milliseconds
    #[arg(long, default_value_t = 500)]
    challenge_timeout_ms: u64,
    #[arg(long)]
    keep_alive: bool,
    /// Socket to bind when none is passed in by the service manager
    #[arg(long, default_value = DEFAULT_SOCKET)]
    socket: PathBuf,
}

async fn handle_client(handler: &Handler, stream: tokio::net::UnixStream) -> Result<(), Error> {
    let frames = Framed::new(stream, LengthDelimitedCodec::new());
    let mut payloads: tokio_serde::Framed<_, SocketPayload, Response, _> =
        tokio_serde::Framed::new(frames, tokio_serde::formats::Bincode::default());

    while let Some(payload) = payloads.try_next().await? {
        tracing::debug!(cmd = ?payload.cmd, "request");
        let response = handler.handle(&payload.cmd).await;
        payloads.send(response).await?;
    }

    Ok(())
}

fn listener(socket: &Path) -> Result<tokio::net::UnixListener, Error> {
    let mut listenfd = listenfd::ListenFd::from_env();
    if let Some(listener) = listenfd.take_unix_listener(0)? {
        listener.set_nonblocking(true)?;
        return Ok(tokio::net::UnixListener::from_std(listener)?);
    }

    match std::fs::remove_file(socket) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
        _ => {}
    }
    tracing::info!(socket = %socket.display(), "binding socket");
    Ok(tokio::net::UnixListener::bind(socket)?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ProjectorConfig::new(&args.host, &args.password)
        .with_port(args.port)
        .with_timeout(Duration::from_millis(args.timeout_ms))
        .with_challenge_timeout(Duration::from_millis(args.challenge_timeout_ms))
        .with_keep_alive(args.keep_alive);
    let pjlink = config.pjlink().with_port(args.pjlink_port);
    let handler = Handler::new(ProjectorConnection::new(config), pjlink);

    match handler.check().await {
        Ok(()) => tracing::info!(host = %args.host, port = args.port, "projector reachable"),
        Err(Error::InvalidAuth) => {
            tracing::error!(host = %args.host, "invalid password");
            return Err(Error::InvalidAuth);
        }
        Err(e) => tracing::warn!(host = %args.host, "can't validate projector: {}", e),
    }

    let listener = listener(&args.socket)?;
    let handler = Arc::new(handler);
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    if let Err(e) = handle_client(&handler, stream).await {
                        tracing::warn!("handle_client: {}", e)
                    }
                });
            }
            Err(e) => tracing::error!("listener error: {}", e),
        }
    }
}
