//! Session server command.

use anyhow::{Context, Result};
use quant_config::Protocol;
use quant_session::{
    json_lines, BatchInput, CancelToken, JsonLinesSink, MessageSink, SessionContext,
    SessionController, SessionStatus, StreamInput,
};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::{load_settings, registry_for};
use crate::cli::ServeArgs;

pub async fn run(args: ServeArgs, config_path: &Path) -> Result<()> {
    let config = load_settings(config_path)?;
    let registry = registry_for(&config)?;
    let controller = SessionController::new(Arc::new(registry), config.session);
    let protocol = args.protocol.unwrap_or(config.server.protocol);
    let shutdown = CancelToken::new();

    if args.stdio {
        let token = shutdown.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        });
        let ctx = SessionContext::new(shutdown);
        run_session(
            &controller,
            &ctx,
            protocol,
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        )
        .await;
        watcher.abort();
        return Ok(());
    }

    let listen = args.listen.unwrap_or(config.server.listen_addr);
    let listener = TcpListener::bind(&listen)
        .await
        .with_context(|| format!("Failed to bind {listen}"))?;
    info!(
        addr = %listener.local_addr()?,
        %protocol,
        strategies = ?controller.provider().entries().iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
        "session server listening"
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut sessions = JoinSet::new();

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!(active = sessions.len(), "shutdown requested, cancelling sessions");
                shutdown.cancel();
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let controller = controller.clone();
                    let ctx = SessionContext::new(shutdown.clone());
                    debug!(session_id = %ctx.id, %peer, "connection accepted");
                    sessions.spawn(async move {
                        serve_connection(&controller, &ctx, protocol, stream).await;
                    });
                }
                Err(err) => warn!(error = %err, "failed to accept connection"),
            },
            Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                if let Err(err) = joined {
                    warn!(error = %err, "session task failed");
                }
            }
        }
    }

    while let Some(joined) = sessions.join_next().await {
        if let Err(err) = joined {
            warn!(error = %err, "session task failed");
        }
    }
    info!("session server stopped");
    Ok(())
}

async fn serve_connection(
    controller: &SessionController,
    ctx: &SessionContext,
    protocol: Protocol,
    stream: TcpStream,
) {
    let (read, write) = stream.into_split();
    run_session(controller, ctx, protocol, BufReader::new(read), write).await;
}

/// Run one session over a line-delimited JSON reader and writer.
///
/// Failures are reported to the peer as a final status line.
async fn run_session<R, W>(
    controller: &SessionController,
    ctx: &SessionContext,
    protocol: Protocol,
    reader: R,
    writer: W,
) where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send,
{
    let mut sink = JsonLinesSink::new(writer);
    let result = match protocol {
        Protocol::Batched => {
            let inbound = json_lines::<_, BatchInput>(reader);
            controller.run_batched(ctx, inbound, &mut sink).await
        }
        Protocol::Streaming => {
            let inbound = json_lines::<_, StreamInput>(reader);
            controller.run_streaming(ctx, inbound, &mut sink).await
        }
    };

    if let Err(err) = result {
        if let Err(write_err) = sink.send(SessionStatus::from(&err)).await {
            debug!(session_id = %ctx.id, error = %write_err, "could not report session failure");
        }
    }
}
