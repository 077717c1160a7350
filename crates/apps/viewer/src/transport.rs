//! Event sources for the viewer: a reconnecting WebSocket client and a file
//! replay. Both turn wire frames into [`TransportEvent`]s on a channel; the
//! task owning the map is the only consumer.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use streaming::{decode_frame, FrameError, TransportEvent};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::config::SocketConfig;

/// Socket.IO event packet prefix for frames we send to an engine.io server.
const EVENT_PACKET: &str = "42";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to read replay file {path}: {source}")]
    Replay {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// What one inbound text frame means to the client.
#[derive(Debug, PartialEq)]
pub enum Inbound {
    Event(TransportEvent),
    /// engine.io open handshake; the server speaks Socket.IO framing.
    Open,
    /// engine.io heartbeat, answered with a pong.
    Ping,
    /// Namespace control packets and other frames with no map effect.
    Control,
}

pub fn classify(text: &str) -> Result<Inbound, FrameError> {
    let text = text.trim();
    match text {
        "2" => return Ok(Inbound::Ping),
        "3" | "40" | "41" => return Ok(Inbound::Control),
        _ => {}
    }
    if text.starts_with("0{") {
        return Ok(Inbound::Open);
    }
    if text.starts_with("40{") {
        return Ok(Inbound::Control);
    }
    decode_frame(text).map(Inbound::Event)
}

/// Runs the socket until `outbound` closes or nobody listens for events.
/// A dropped or refused connection is retried after the configured delay.
pub async fn run_socket(
    config: SocketConfig,
    events: mpsc::Sender<TransportEvent>,
    mut outbound: mpsc::Receiver<String>,
) {
    loop {
        match tokio_tungstenite::connect_async(config.url.as_str()).await {
            Ok((socket, _)) => {
                info!(url = %config.url, "socket connected");
                if events.send(TransportEvent::Connect).await.is_err() {
                    return;
                }
                let keep_going = session(socket, &events, &mut outbound).await;
                info!(url = %config.url, "socket disconnected");
                if events.send(TransportEvent::Disconnect).await.is_err() || !keep_going {
                    return;
                }
            }
            Err(err) => warn!(url = %config.url, error = %err, "socket connect failed"),
        }
        tokio::time::sleep(config.reconnect_delay).await;
    }
}

/// Pumps one connection. Returns false once the client is shutting down.
async fn session<S>(
    socket: tokio_tungstenite::WebSocketStream<S>,
    events: &mpsc::Sender<TransportEvent>,
    outbound: &mut mpsc::Receiver<String>,
) -> bool
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut socket_io = false;

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    return false;
                };
                let frame = if socket_io { format!("{EVENT_PACKET}{frame}") } else { frame };
                if let Err(err) = ws_tx.send(Message::Text(frame)).await {
                    warn!(error = %err, "socket send failed");
                    return true;
                }
            }
            msg = ws_rx.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => return true,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        warn!(error = %err, "socket receive failed");
                        return true;
                    }
                };
                match classify(&text) {
                    Ok(Inbound::Event(event)) => {
                        if events.send(event).await.is_err() {
                            return false;
                        }
                    }
                    Ok(Inbound::Open) => {
                        socket_io = true;
                        if let Err(err) = ws_tx.send(Message::Text("40".to_string())).await {
                            warn!(error = %err, "namespace connect failed");
                            return true;
                        }
                    }
                    Ok(Inbound::Ping) => {
                        if let Err(err) = ws_tx.send(Message::Text("3".to_string())).await {
                            warn!(error = %err, "pong failed");
                            return true;
                        }
                    }
                    Ok(Inbound::Control) => debug!(frame = %text, "control frame"),
                    Err(err) => warn!(error = %err, "skipping undecodable frame"),
                }
            }
        }
    }
}

/// One line of a replay file. Blank lines and `#` comments carry nothing;
/// `connect` and `disconnect` stand for the socket lifecycle.
pub fn parse_replay_line(line: &str) -> Option<Result<TransportEvent, FrameError>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    match line {
        "connect" => Some(Ok(TransportEvent::Connect)),
        "disconnect" => Some(Ok(TransportEvent::Disconnect)),
        _ => Some(decode_frame(line)),
    }
}

/// Sends every event recorded in `path`, in order. Returns how many were sent.
pub async fn replay_file(
    path: &Path,
    delay: Duration,
    events: mpsc::Sender<TransportEvent>,
) -> Result<usize, TransportError> {
    let io_err = |source| TransportError::Replay {
        path: path.to_path_buf(),
        source,
    };
    let file = tokio::fs::File::open(path).await.map_err(io_err)?;
    let mut lines = BufReader::new(file).lines();
    let mut sent = 0;
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await.map_err(io_err)? {
        line_no += 1;
        match parse_replay_line(&line) {
            None => continue,
            Some(Ok(event)) => {
                if events.send(event).await.is_err() {
                    break;
                }
                sent += 1;
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            Some(Err(err)) => warn!(line = line_no, error = %err, "skipping bad replay line"),
        }
    }
    debug!(sent, path = %path.display(), "replay finished");
    Ok(sent)
}
