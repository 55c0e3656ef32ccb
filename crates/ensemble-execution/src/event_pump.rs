//! Single-writer event pump.
//!
//! The pump owns the [`Synchronizer`] and applies commands one at a time in
//! arrival order. After every command it publishes a fresh [`SyncSnapshot`]
//! on a watch channel, so readers never touch the writer's state.

use ensemble_application::{SyncSnapshot, Synchronizer};
use ensemble_core::EnsembleError;
use ensemble_core::error::Result;
use ensemble_core::session::{ExecutionEvent, RunMode, SessionSnapshot};
use ensemble_core::task::TaskSpec;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

/// Work item for the pump: a wire event or a UI action.
#[derive(Debug)]
pub enum SyncCommand {
    Event(ExecutionEvent),
    Hydrate(SessionSnapshot),
    SelectTask(Option<String>),
    SetMode(RunMode),
    ApprovePlan(Option<Vec<TaskSpec>>),
    RejectPlan,
    /// Guarded reset; the outcome is sent back so a refusal can be shown.
    Reset {
        force: bool,
        reply: oneshot::Sender<Result<()>>,
    },
}

pub struct EventPump {
    synchronizer: Synchronizer,
    commands: mpsc::Receiver<SyncCommand>,
    snapshots: watch::Sender<SyncSnapshot>,
    cancel: CancellationToken,
}

/// Cloneable producer/reader side of an [`EventPump`].
#[derive(Clone)]
pub struct PumpHandle {
    commands: mpsc::Sender<SyncCommand>,
    snapshots: watch::Receiver<SyncSnapshot>,
    cancel: CancellationToken,
}

impl EventPump {
    /// Creates a pump around `synchronizer` with a bounded command queue.
    pub fn new(synchronizer: Synchronizer, capacity: usize) -> (Self, PumpHandle) {
        let (command_tx, command_rx) = mpsc::channel(capacity.max(1));
        let (snapshot_tx, snapshot_rx) = watch::channel(synchronizer.snapshot());
        let cancel = CancellationToken::new();

        let pump = Self {
            synchronizer,
            commands: command_rx,
            snapshots: snapshot_tx,
            cancel: cancel.clone(),
        };
        let handle = PumpHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            cancel,
        };
        (pump, handle)
    }

    /// Drains commands until cancelled or every handle is dropped, then
    /// hands back the synchronizer.
    pub async fn run(mut self) -> Synchronizer {
        tracing::debug!("[EventPump] Started");
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::info!("[EventPump] Cancelled, stopping");
                    break;
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.process(command),
                    None => {
                        tracing::debug!("[EventPump] All handles dropped, stopping");
                        break;
                    }
                }
            }
        }
        self.synchronizer
    }

    fn process(&mut self, command: SyncCommand) {
        let reply = self.handle(command);
        self.snapshots.send_replace(self.synchronizer.snapshot());
        // Replies go out after publishing so callers observe the new state.
        if let Some((reply, outcome)) = reply {
            if reply.send(outcome).is_err() {
                tracing::debug!("[EventPump] Caller went away before the reply");
            }
        }
    }

    fn handle(&mut self, command: SyncCommand) -> Option<(oneshot::Sender<Result<()>>, Result<()>)> {
        match command {
            SyncCommand::Event(event) => self.synchronizer.apply(event),
            SyncCommand::Hydrate(snapshot) => self.synchronizer.hydrate(snapshot),
            SyncCommand::SelectTask(task_id) => self.synchronizer.select_task(task_id),
            SyncCommand::SetMode(mode) => self.synchronizer.set_mode(mode),
            SyncCommand::ApprovePlan(edited) => {
                self.synchronizer.approve_plan(edited);
            }
            SyncCommand::RejectPlan => {
                self.synchronizer.reject_plan();
            }
            SyncCommand::Reset { force, reply } => {
                return Some((reply, self.synchronizer.reset_tasks(force)));
            }
        }
        None
    }
}

impl PumpHandle {
    pub async fn send(&self, command: SyncCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| EnsembleError::internal("event pump is not running"))
    }

    pub async fn send_event(&self, event: ExecutionEvent) -> Result<()> {
        self.send(SyncCommand::Event(event)).await
    }

    /// Requests a reset and waits for the pump's answer.
    pub async fn reset_tasks(&self, force: bool) -> Result<()> {
        let (reply, outcome) = oneshot::channel();
        self.send(SyncCommand::Reset { force, reply }).await?;
        outcome
            .await
            .map_err(|_| EnsembleError::internal("event pump stopped before replying"))?
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SyncSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.snapshots.clone()
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
