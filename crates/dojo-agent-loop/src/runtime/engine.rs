use super::config::AgentConfig;
use super::outcome::{RunError, Trigger};
use super::step::{replay_suspended, run_agent_step, StepOutcome};
use super::thread_locks::ThreadLocks;
use dojo_contract::{
    Checkpoint, CheckpointStatus, CheckpointStore, CheckpointStoreError, Message,
    PendingInterrupt, UpdateEvent,
};
use futures::{FutureExt, Stream};
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Ordered update events of one turn, ending with exactly one terminal event.
pub type RunStream = Pin<Box<dyn Stream<Item = UpdateEvent> + Send>>;

enum Plan {
    Fresh,
    Replay {
        pending: PendingInterrupt,
        resume: Value,
    },
}

/// Drives turns for every thread against one checkpoint store.
///
/// Turns on the same thread are serialized; turns on different threads run
/// independently. Each turn runs in its own task, so dropping the returned
/// stream stops delivery but never the turn itself.
#[derive(Clone)]
pub struct ExecutionEngine {
    config: Arc<AgentConfig>,
    store: Arc<dyn CheckpointStore>,
    locks: ThreadLocks,
}

impl ExecutionEngine {
    pub fn new(config: AgentConfig, store: Arc<dyn CheckpointStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            locks: ThreadLocks::new(),
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn CheckpointStore> {
        &self.store
    }

    /// Start a turn with a new human message.
    pub fn start(&self, thread_id: impl Into<String>, input: impl Into<String>) -> RunStream {
        self.run(thread_id, Trigger::NewInput(Message::human(input)))
    }

    /// Resume a suspended turn with the value its pending interrupt asked for.
    pub fn resume(&self, thread_id: impl Into<String>, value: Value) -> RunStream {
        self.run(thread_id, Trigger::Resume(value))
    }

    /// Remove a thread once no turn on it is in flight.
    pub async fn delete(&self, thread_id: &str) -> Result<(), CheckpointStoreError> {
        let _guard = self.locks.acquire(thread_id).await;
        self.store.delete(thread_id).await?;
        tracing::info!(thread_id, "thread deleted");
        Ok(())
    }

    pub fn run(&self, thread_id: impl Into<String>, trigger: Trigger) -> RunStream {
        let thread_id = thread_id.into();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let engine = self.clone();
        tokio::spawn(async move {
            for event in engine.run_turn(&thread_id, trigger).await {
                if tx.send(event).is_err() {
                    tracing::debug!(thread_id = %thread_id, "stream receiver dropped");
                    break;
                }
            }
        });
        Box::pin(async_stream::stream! {
            while let Some(event) = rx.recv().await {
                yield event;
            }
        })
    }

    /// Run one turn to completion and return its events.
    ///
    /// Every event is returned only after the checkpoint it reflects is stored.
    pub async fn run_turn(&self, thread_id: &str, trigger: Trigger) -> Vec<UpdateEvent> {
        match self.execute(thread_id, trigger).await {
            Ok(events) => events,
            Err(err) => {
                match &err {
                    RunError::StoreWriteFailure(_) | RunError::StoreReadFailure(_) => {
                        tracing::error!(thread_id, error = %err, "turn failed on storage")
                    }
                    e if e.is_rejection() => {
                        tracing::info!(thread_id, error = %err, "turn rejected")
                    }
                    _ => tracing::warn!(thread_id, error = %err, "turn failed"),
                }
                vec![UpdateEvent::error(err.to_string())]
            }
        }
    }

    async fn execute(&self, thread_id: &str, trigger: Trigger) -> Result<Vec<UpdateEvent>, RunError> {
        let _guard = self.locks.acquire(thread_id).await;
        let stored = self
            .store
            .get(thread_id)
            .await
            .map_err(RunError::StoreReadFailure)?;

        let (base, mut history, plan) = match trigger {
            Trigger::NewInput(message) => {
                let base = stored.unwrap_or_else(|| Checkpoint::empty(thread_id));
                if !base.status.accepts_new_input() {
                    return Err(RunError::ThreadInterrupted(thread_id.to_string()));
                }
                let mut history = base.messages.clone();
                history.push(message);
                (base, history, Plan::Fresh)
            }
            Trigger::Resume(resume) => {
                let base = stored.ok_or_else(|| RunError::ThreadNotFound(thread_id.to_string()))?;
                let pending = match (&base.status, &base.pending_interrupt) {
                    (CheckpointStatus::Interrupted, Some(pending)) => pending.clone(),
                    _ => {
                        return Err(RunError::InvalidResumeState {
                            thread_id: thread_id.to_string(),
                            status: base.status,
                        })
                    }
                };
                let history = base.messages.clone();
                (base, history, Plan::Replay { pending, resume })
            }
        };

        tracing::info!(
            thread_id,
            sequence = base.sequence,
            resume = matches!(plan, Plan::Replay { .. }),
            "turn started"
        );

        let step = AssertUnwindSafe(async {
            match &plan {
                Plan::Fresh => run_agent_step(&self.config, thread_id, &history).await,
                Plan::Replay { pending, resume } => {
                    replay_suspended(&self.config, thread_id, pending, resume.clone()).await
                }
            }
        })
        .catch_unwind();
        let outcome = match tokio::time::timeout(self.config.step_timeout, step).await {
            Ok(Ok(Ok(outcome))) => outcome,
            Ok(Ok(Err(e))) => {
                return Err(self
                    .persist_failure(&base, history, RunError::StepExecutionFailure(e.to_string()))
                    .await)
            }
            Ok(Err(panic)) => {
                let err = RunError::StepExecutionFailure(format!(
                    "step panicked: {}",
                    panic_message(&*panic)
                ));
                return Err(self.persist_failure(&base, history, err).await);
            }
            Err(_) => {
                let err = RunError::StepExecutionFailure(format!(
                    "step timed out after {:?}",
                    self.config.step_timeout
                ));
                return Err(self.persist_failure(&base, history, err).await);
            }
        };

        match outcome {
            StepOutcome::Suspended { messages, pending } => {
                history.extend(messages);
                let event = UpdateEvent::interrupt(&pending);
                let next = base.successor(CheckpointStatus::Interrupted, history, Some(pending));
                self.persist(&next).await?;
                tracing::info!(thread_id, sequence = next.sequence, "turn suspended");
                Ok(vec![event])
            }
            StepOutcome::Completed { messages } => {
                history.extend(messages.iter().cloned());
                let next = base.successor(CheckpointStatus::Completed, history, None);
                self.persist(&next).await?;
                tracing::info!(
                    thread_id,
                    sequence = next.sequence,
                    produced = messages.len(),
                    "turn completed"
                );
                let mut events: Vec<UpdateEvent> =
                    messages.into_iter().map(UpdateEvent::node_update).collect();
                events.push(UpdateEvent::Done);
                Ok(events)
            }
        }
    }

    async fn persist(&self, checkpoint: &Checkpoint) -> Result<(), RunError> {
        self.store
            .put(checkpoint)
            .await
            .map_err(RunError::StoreWriteFailure)
    }

    /// Store a `failed` successor keeping `history`, then hand back the error to report.
    async fn persist_failure(
        &self,
        base: &Checkpoint,
        history: Vec<Message>,
        err: RunError,
    ) -> RunError {
        let failed = base.successor(CheckpointStatus::Failed, history, None);
        match self.persist(&failed).await {
            Ok(()) => err,
            Err(write_err) => {
                tracing::error!(
                    thread_id = %base.thread_id,
                    error = %err,
                    "could not record failed step"
                );
                write_err
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
