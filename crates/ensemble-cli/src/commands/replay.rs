use anyhow::{Context, Result};
use ensemble_application::{SyncSnapshot, Synchronizer};
use ensemble_core::config::SyncConfig;
use ensemble_core::session::ExecutionEvent;
use ensemble_execution::{EventPump, SyncCommand};
use std::path::Path;

use super::print_snapshot;

pub async fn run(log: &Path, config: SyncConfig, approve: bool) -> Result<()> {
    let content = tokio::fs::read_to_string(log)
        .await
        .with_context(|| format!("Failed to read event log {}", log.display()))?;
    let snapshot = replay(&content, config, approve).await?;
    print_snapshot(&snapshot)
}

/// Parses one event per line. Blank lines and `#` comments are skipped;
/// lines that do not parse are logged and skipped.
pub fn parse_events(content: &str) -> Vec<ExecutionEvent> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .filter_map(|(index, line)| match serde_json::from_str(line) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!("[Replay] Skipping line {}: {}", index + 1, e);
                None
            }
        })
        .collect()
}

/// Feeds the events through an event pump and returns the final view.
///
/// With `approve`, a plan waiting in the approval gate is approved as soon
/// as it arrives, before the next event is applied.
pub async fn replay(content: &str, config: SyncConfig, approve: bool) -> Result<SyncSnapshot> {
    let events = parse_events(content);
    let (pump, handle) = EventPump::new(Synchronizer::new(config), 64);
    let mut updates = handle.subscribe();
    let worker = tokio::spawn(pump.run());

    for event in events {
        handle.send_event(event).await?;
        // Every command publishes once, so this waits for it to be applied.
        updates.changed().await?;
        if approve && updates.borrow_and_update().is_waiting_for_approval {
            handle.send(SyncCommand::ApprovePlan(None)).await?;
            updates.changed().await?;
        }
    }

    let snapshot = handle.snapshot();
    drop(handle);
    worker.await.context("event pump panicked")?;
    Ok(snapshot)
}
