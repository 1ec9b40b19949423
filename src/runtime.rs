// SPDX-License-Identifier: MPL-2.0

//! Event loop driving a [`CascadeController`].
//!
//! Selection changes and fetch completions are applied one at a time on a
//! single task. Fetches run concurrently; a fetch superseded by a newer change
//! is aborted, and if it still gets through, its generation marks it stale.

use std::collections::BTreeMap;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::CascadeError;
use crate::widgets::cascade::{
    ApplyOutcome, CascadeController, CascadeMessage, ControlState, Level, OptionId, Task,
};

enum Command {
    Select {
        level: Level,
        id: OptionId,
        reply: oneshot::Sender<Result<(), CascadeError>>,
    },
    Snapshot(oneshot::Sender<Vec<ControlState>>),
    /// Reply once no fetch is outstanding.
    Settled(oneshot::Sender<Vec<ControlState>>),
}

/// Cloneable handle for sending selection changes to a running loop.
///
/// The loop exits once every handle has been dropped.
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl RuntimeHandle {
    /// Report a selection change at `level`; returns once the change (not its
    /// fetch) has been applied.
    pub async fn select(&self, level: Level, id: impl Into<OptionId>) -> Result<(), CascadeError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Select {
            level,
            id: id.into(),
            reply,
        })?;
        rx.await.map_err(|_| CascadeError::RuntimeClosed)?
    }

    /// Current state of every control, root first.
    pub async fn snapshot(&self) -> Result<Vec<ControlState>, CascadeError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply))?;
        rx.await.map_err(|_| CascadeError::RuntimeClosed)
    }

    /// Wait until no fetch is outstanding, then return the states.
    pub async fn settled(&self) -> Result<Vec<ControlState>, CascadeError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Settled(reply))?;
        rx.await.map_err(|_| CascadeError::RuntimeClosed)
    }

    fn send(&self, command: Command) -> Result<(), CascadeError> {
        self.commands
            .send(command)
            .map_err(|_| CascadeError::RuntimeClosed)
    }
}

pub struct CascadeRuntime {
    controller: CascadeController,
    commands: mpsc::UnboundedReceiver<Command>,
    completions_tx: mpsc::UnboundedSender<CascadeMessage>,
    completions: mpsc::UnboundedReceiver<CascadeMessage>,
    /// Outstanding fetch per level, with the generation it was issued under.
    in_flight: BTreeMap<Level, (u64, JoinHandle<()>)>,
    waiting: Vec<oneshot::Sender<Vec<ControlState>>>,
}

impl CascadeRuntime {
    /// Start the loop on the current tokio runtime.
    ///
    /// The join handle yields the controller back once the loop exits.
    pub fn spawn(controller: CascadeController) -> (RuntimeHandle, JoinHandle<CascadeController>) {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let runtime = Self {
            controller,
            commands,
            completions_tx,
            completions,
            in_flight: BTreeMap::new(),
            waiting: Vec::new(),
        };
        let join = tokio::spawn(runtime.run());
        (
            RuntimeHandle {
                commands: commands_tx,
            },
            join,
        )
    }

    async fn run(mut self) -> CascadeController {
        info!(depth = self.controller.depth(), "cascade runtime started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(message) = self.completions.recv() => self.handle_completion(message),
            }
            self.wake_settled();
        }

        for (_, (_, handle)) in std::mem::take(&mut self.in_flight) {
            handle.abort();
        }
        info!("cascade runtime stopped");
        self.controller
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Select { level, id, reply } => {
                let result = self.controller.select(level, id).map(|task| {
                    self.abort_below(level);
                    if let Some(task) = task {
                        self.start(task);
                    }
                });
                if let Err(e) = &result {
                    warn!(level, error = %e, "selection rejected");
                }
                let _ = reply.send(result);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.controller.snapshot());
            }
            Command::Settled(reply) => self.waiting.push(reply),
        }
    }

    fn handle_completion(&mut self, message: CascadeMessage) {
        if let CascadeMessage::ChildrenLoaded(completion) = message {
            let level = completion.level;
            if self
                .in_flight
                .get(&level)
                .is_some_and(|(generation, _)| *generation == completion.generation)
            {
                self.in_flight.remove(&level);
            }
            if self.controller.apply(completion) == ApplyOutcome::Stale {
                debug!(level, "late response ignored");
            }
        }
    }

    /// Cancel fetches for every level below `level`; their results are stale now.
    fn abort_below(&mut self, level: Level) {
        let stale = self.in_flight.split_off(&(level + 1));
        for (lvl, (generation, handle)) in stale {
            debug!(level = lvl, generation, "aborting superseded fetch");
            handle.abort();
        }
    }

    fn start(&mut self, task: Task) {
        let level = task.level;
        let generation = task.generation;
        let completions = self.completions_tx.clone();
        let handle = tokio::spawn(async move {
            let message = task.await;
            let _ = completions.send(message);
        });
        self.in_flight.insert(level, (generation, handle));
    }

    fn wake_settled(&mut self) {
        if !self.in_flight.is_empty() || self.waiting.is_empty() {
            return;
        }
        let snapshot = self.controller.snapshot();
        for reply in self.waiting.drain(..) {
            let _ = reply.send(snapshot.clone());
        }
    }
}
