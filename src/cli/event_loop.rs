//! Serving loop for `start`
//!
//! Single-threaded: one `select!` over the next stdin line, the next
//! autosave deadline and a termination signal (Ctrl-C, or SIGTERM on
//! unix). Every request is handled to completion before the next input is
//! read.

use std::future::Future;
use std::time::Instant;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::observability::Event;

use super::console::Console;
use super::errors::CliResult;
use super::io::write_line;

/// Serve requests until EOF, `quit` or a termination signal, then write
/// once and return.
///
/// The final write also runs when stdin or stdout fails.
pub async fn serve(mut console: Console, startup_notice: serde_json::Value) -> CliResult<()> {
    write_line(&startup_notice)?;
    info!(
        event = %Event::Serving,
        awaiting_recovery = console.awaiting_recovery(),
        "reading requests from stdin"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let terminated = shutdown_signal();
    tokio::pin!(terminated);

    let result = 'serve: loop {
        let deadline = console.next_deadline();
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let step = console.handle_line(&line, Instant::now());
                    for value in &step.output {
                        if let Err(e) = write_line(value) {
                            break 'serve Err(e);
                        }
                    }
                    if step.quit {
                        break Ok(());
                    }
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(e.into()),
            },
            _ = sleep_until(deadline) => {
                for value in console.on_deadline(Instant::now()) {
                    if let Err(e) = write_line(&value) {
                        break 'serve Err(e);
                    }
                }
            }
            signal = &mut terminated => {
                info!(signal, "termination signal received");
                break Ok(());
            }
        }
    };

    for value in console.shutdown() {
        write_line(&value)?;
    }
    result
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending::<()>().await,
    }
}

/// Resolves on Ctrl-C or SIGTERM and names the signal.
///
/// The SIGTERM listener is installed before this returns, so a signal that
/// arrives before the first poll is not lost. A handler that cannot be
/// installed never resolves; the loop then ends on EOF or `quit` only.
fn shutdown_signal() -> impl Future<Output = &'static str> {
    #[cfg(unix)]
    let mut terminate = {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                None
            }
        }
    };

    async move {
        let ctrl_c = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => "SIGINT",
                Err(e) => {
                    warn!(error = %e, "ctrl-c handler unavailable");
                    std::future::pending().await
                }
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match terminate.as_mut() {
                Some(stream) => {
                    stream.recv().await;
                    "SIGTERM"
                }
                None => std::future::pending().await,
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<&'static str>();

        tokio::select! {
            name = ctrl_c => name,
            name = terminate => name,
        }
    }
}
