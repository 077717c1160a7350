use std::time::Duration;

use clap::Parser;
use layers::{LayerId, MarkerSurface, OverlaySurface};
use streaming::Submission;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use viewer::{
    load_style, replay_file, run_socket, Args, Command, FieldMap, LogOverlay, LogSurface,
    SocketConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let style = load_style(args.style.as_deref())?;
    let mut map = FieldMap::start(
        style,
        LayerId(args.layer),
        LogSurface::new(),
        LogOverlay::new(),
    );
    let (event_tx, mut event_rx) = mpsc::channel(256);

    match args.command {
        Command::Connect { url, reconnect_ms } => {
            let config = SocketConfig::resolve(url, reconnect_ms);
            let (out_tx, out_rx) = mpsc::channel(32);
            let socket = tokio::spawn(run_socket(config, event_tx, out_rx));

            let mut stdin = BufReader::new(tokio::io::stdin()).lines();
            let mut stdin_open = true;
            let shutdown = tokio::signal::ctrl_c();
            tokio::pin!(shutdown);

            loop {
                tokio::select! {
                    event = event_rx.recv() => match event {
                        Some(event) => {
                            map.handle(&event);
                        }
                        None => break,
                    },
                    line = stdin.next_line(), if stdin_open => match line {
                        Ok(Some(line)) => run_command(&map, &line, &out_tx).await,
                        Ok(None) => stdin_open = false,
                        Err(err) => {
                            warn!(error = %err, "stdin closed");
                            stdin_open = false;
                        }
                    },
                    _ = &mut shutdown => {
                        info!("interrupted");
                        break;
                    }
                }
            }
            drop(out_tx);
            socket.abort();
        }
        Command::Replay { path, delay_ms } => {
            let delay = Duration::from_millis(delay_ms);
            let replay = tokio::spawn(async move { replay_file(&path, delay, event_tx).await });
            while let Some(event) = event_rx.recv().await {
                map.handle(&event);
            }
            let sent = replay.await??;
            info!(sent, "replay complete");
        }
    }

    let metrics = map.metrics();
    for (name, value) in &metrics.counters {
        info!(counter = name, value, "metric");
    }
    map.stop();
    Ok(())
}

/// Stdin commands while connected: `draft <row>` prints a prefilled edit,
/// a JSON submission object is sent to the server.
async fn run_command<M, O>(map: &FieldMap<M, O>, line: &str, out: &mpsc::Sender<String>)
where
    M: MarkerSurface + 'static,
    O: OverlaySurface + 'static,
{
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    if let Some(id) = line.strip_prefix("draft ") {
        match map.draft_submission(id.trim()) {
            Some(draft) => match serde_json::to_string(&draft) {
                Ok(json) => println!("{json}"),
                Err(err) => warn!(error = %err, "failed to encode draft"),
            },
            None => warn!(row = id.trim(), "no such row"),
        }
        return;
    }

    let submission: Submission = match serde_json::from_str(line) {
        Ok(submission) => submission,
        Err(err) => {
            warn!(error = %err, "expected `draft <row>` or a submission object");
            return;
        }
    };
    match map.submit(&submission) {
        Ok(frame) => {
            if out.send(frame).await.is_err() {
                warn!("socket task has stopped; submission dropped");
            }
        }
        Err(err) => warn!(error = %err, "failed to encode submission"),
    }
}
