//! Interactive terminal session.
//!
//! Reads lines with rustyline on a blocking thread, submits them through
//! [`ChatSync`] and re-renders the page whenever the displayed snapshot or the
//! send status changes.

use std::{io::Write, time::Duration};

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::{mpsc, watch};

use crate::{
    cache::CacheEntry,
    dispatcher::DispatchState,
    domain::{PendingConfirmations, Viewer},
    formatter::{DEFAULT_WIDTH, MessageFormatter},
    sync::ChatSync,
    view::{MessageInput, StreamView, compose},
};

/// How long to wait for queued writes when the user quits
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Run the interactive chat session until the user exits (Ctrl+C / Ctrl+D).
///
/// Consumes `sync`; polling stops when the session ends.
pub async fn run_client_session(sync: ChatSync) {
    println!("\nType messages and press Enter to send. Press Ctrl+C to exit.\n");

    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    let (pending_tx, pending_rx) = watch::channel(0usize);

    // Spawn a blocking thread for rustyline (synchronous readline)
    let _readline_handle = std::thread::spawn(move || read_lines(&input_tx));

    let mut render_task = tokio::spawn(render_loop(
        sync.subscribe(),
        sync.subscribe_dispatch(),
        pending_rx,
        sync.viewer().cloned(),
    ));

    let mut pending = PendingConfirmations::new();
    let mut snapshots = sync.subscribe();
    let mut dispatch = sync.subscribe_dispatch();
    let mut last_generation = snapshots.borrow_and_update().generation;
    let mut input = MessageInput::new();

    loop {
        tokio::select! {
            line = input_rx.recv() => {
                let Some(line) = line else {
                    break;
                };
                input.set(line);
                match sync.submit(&mut input) {
                    Ok(message) => pending.track(&message),
                    Err(e) => tracing::warn!("Message not sent: {}", e),
                }
                pending_tx.send_replace(pending.len());
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let entry = snapshots.borrow_and_update().clone();
                // Local writes bump the generation; only server snapshots confirm messages
                let from_server = entry.generation == last_generation;
                last_generation = entry.generation;
                match &entry.value {
                    None => pending.clear(),
                    Some(snapshot) if from_server => {
                        let confirmed = pending.reconcile(snapshot);
                        if confirmed > 0 {
                            tracing::debug!("{} message(s) confirmed by server", confirmed);
                        }
                    }
                    Some(_) => {}
                }
                pending_tx.send_replace(pending.len());
            }
            changed = dispatch.changed() => {
                if changed.is_err() {
                    break;
                }
                // Failed writes are never persisted, so stop waiting for them
                let dropped = pending.forget(&sync.take_failed_writes());
                if dropped > 0 {
                    tracing::debug!("{} message(s) failed to send", dropped);
                    pending_tx.send_replace(pending.len());
                }
            }
            _ = &mut render_task => {
                break;
            }
        }
    }

    if tokio::time::timeout(SHUTDOWN_GRACE, sync.wait_for_writes())
        .await
        .is_err()
    {
        tracing::warn!("Exiting with unsent messages");
    }
    render_task.abort();
    tracing::info!("Session ended");
}

fn read_lines(input_tx: &mpsc::UnboundedSender<String>) {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to initialize readline: {}", e);
            return;
        }
    };

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let line = line.trim();
                if !line.is_empty() {
                    rl.add_history_entry(line).ok();
                    if input_tx.send(line.to_string()).is_err() {
                        // Channel closed, exit thread
                        break;
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C
                tracing::info!("Interrupted");
                break;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D
                tracing::info!("EOF");
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {}", err);
                break;
            }
        }
    }
}

/// Print the page whenever what is displayed actually changes.
async fn render_loop(
    mut snapshots: watch::Receiver<CacheEntry>,
    mut dispatch: watch::Receiver<DispatchState>,
    mut pending: watch::Receiver<usize>,
    viewer: Option<Viewer>,
) {
    let mut last_view: Option<StreamView> = None;
    let mut last_status: Option<(DispatchState, usize)> = None;

    loop {
        let (view, fetched_at) = {
            let entry = snapshots.borrow_and_update();
            (
                compose(entry.value.as_ref(), viewer.as_ref()),
                entry.fetched_at,
            )
        };
        let status = (
            dispatch.borrow_and_update().clone(),
            *pending.borrow_and_update(),
        );

        // Polls that return the same snapshot only move the sync time; skip those
        let view_changed = last_view.as_ref() != Some(&view);
        if view_changed {
            print!("{}", MessageFormatter::format_view(&view, DEFAULT_WIDTH));
            last_view = Some(view);
        }
        if view_changed || last_status.as_ref() != Some(&status) {
            print!(
                "{}> ",
                MessageFormatter::format_status(&status.0, status.1, fetched_at)
            );
            std::io::stdout().flush().ok();
            last_status = Some(status);
        }

        let closed = tokio::select! {
            changed = snapshots.changed() => changed.is_err(),
            changed = dispatch.changed() => changed.is_err(),
            changed = pending.changed() => changed.is_err(),
        };
        if closed {
            break;
        }
    }
}
