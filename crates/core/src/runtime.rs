//! Async actor that owns the [`Governor`] and drives it from a channel.
//!
//! All governance state is touched only by the actor task. Fetches and
//! executions run as spawned tasks and report back through the same inbox,
//! tagged with the request sequence or consent cycle they belong to.

use custodian_executor::{ActionExecutor, ActionOutcome, ExecutorError};
use custodian_policy::{SettingsSnapshot, Suggestion};
use custodian_providers::{ProviderError, SuggestionProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::audit::AuditEvent;
use crate::error::GovernanceError;
use crate::governor::{Effect, Governor};
use crate::types::{InputEvent, Notice, OperationalStatus, Transcript};

const INBOX_CAPACITY: usize = 64;
const NOTICE_CAPACITY: usize = 64;

enum Command {
    Input(InputEvent),
    SuggestionReady {
        seq: u64,
        result: Result<Suggestion, ProviderError>,
    },
    ExecutionDone {
        cycle: u64,
        result: Result<ActionOutcome, ExecutorError>,
    },
    UpdatePolicy(SettingsSnapshot),
    SetOnline(bool),
    Remember(String, oneshot::Sender<Result<(), GovernanceError>>),
    Purge(oneshot::Sender<Result<(), GovernanceError>>),
    AuditSnapshot(oneshot::Sender<Vec<AuditEvent>>),
    Shutdown,
}

/// Cloneable front door to a running [`GovernanceRuntime`].
#[derive(Clone)]
pub struct RuntimeHandle {
    tx: mpsc::Sender<Command>,
    status: watch::Receiver<OperationalStatus>,
    notices: broadcast::Sender<Notice>,
}

impl RuntimeHandle {
    async fn send(&self, command: Command) -> Result<(), GovernanceError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| GovernanceError::RuntimeClosed)
    }

    pub async fn submit_text(&self, text: impl Into<String>) -> Result<(), GovernanceError> {
        self.send(Command::Input(InputEvent::Typed(text.into()))).await
    }

    /// Forwards a transcription result. Interim text is dropped here.
    pub async fn submit_transcript(&self, transcript: Transcript) -> Result<(), GovernanceError> {
        match transcript.into_event() {
            Some(event) => self.send(Command::Input(event)).await,
            None => Ok(()),
        }
    }

    pub async fn idle_check(&self) -> Result<(), GovernanceError> {
        self.send(Command::Input(InputEvent::IdleCheck)).await
    }

    pub async fn update_policy(&self, settings: SettingsSnapshot) -> Result<(), GovernanceError> {
        self.send(Command::UpdatePolicy(settings)).await
    }

    pub async fn set_online(&self, online: bool) -> Result<(), GovernanceError> {
        self.send(Command::SetOnline(online)).await
    }

    /// Stores a line in durable memory. Accepted in every state.
    pub async fn remember(&self, text: impl Into<String>) -> Result<(), GovernanceError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Remember(text.into(), reply)).await?;
        rx.await.map_err(|_| GovernanceError::RuntimeClosed)?
    }

    pub async fn purge_memory(&self) -> Result<(), GovernanceError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Purge(reply)).await?;
        rx.await.map_err(|_| GovernanceError::RuntimeClosed)?
    }

    pub async fn audit_snapshot(&self) -> Result<Vec<AuditEvent>, GovernanceError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::AuditSnapshot(reply)).await?;
        rx.await.map_err(|_| GovernanceError::RuntimeClosed)
    }

    pub fn status(&self) -> OperationalStatus {
        *self.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<OperationalStatus> {
        self.status.clone()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub async fn shutdown(&self) -> Result<(), GovernanceError> {
        self.send(Command::Shutdown).await
    }
}

pub struct GovernanceRuntime {
    governor: Governor,
    provider: Arc<dyn SuggestionProvider>,
    executor: Arc<dyn ActionExecutor>,
    inbox: mpsc::Sender<Command>,
    notices: broadcast::Sender<Notice>,
    tasks: Vec<JoinHandle<()>>,
}

impl GovernanceRuntime {
    /// Starts the actor. With `idle_interval` set, an idle-check input is
    /// submitted on that period; the governor ignores it unless idle in
    /// active mode.
    pub fn spawn(
        governor: Governor,
        provider: Arc<dyn SuggestionProvider>,
        executor: Arc<dyn ActionExecutor>,
        idle_interval: Option<Duration>,
    ) -> (RuntimeHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        let handle = RuntimeHandle {
            tx: tx.clone(),
            status: governor.subscribe(),
            notices: notices.clone(),
        };

        tracing::info!(
            "Governance runtime starting with provider {}",
            provider.name()
        );

        let runtime = Self {
            governor,
            provider,
            executor,
            inbox: tx,
            notices,
            tasks: Vec::new(),
        };
        let join = tokio::spawn(runtime.run(rx, idle_interval));

        (handle, join)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>, idle_interval: Option<Duration>) {
        let mut idle = idle_interval.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            let deadline = self.governor.next_deadline().map(Instant::from_std);

            tokio::select! {
                command = rx.recv() => match command {
                    None | Some(Command::Shutdown) => break,
                    Some(command) => self.handle(command),
                },
                _ = sleep_until(deadline) => {
                    let effects = self.governor.poll(now());
                    self.apply(effects);
                }
                _ = tick(&mut idle) => {
                    let effects = self.governor.handle_input(InputEvent::IdleCheck, now());
                    self.apply(effects);
                }
            }
        }

        for task in self.tasks.drain(..) {
            task.abort();
        }
        tracing::info!("Governance runtime stopped");
    }

    fn handle(&mut self, command: Command) {
        let effects = match command {
            Command::Input(event) => self.governor.handle_input(event, now()),
            Command::SuggestionReady { seq, result } => {
                self.governor.on_suggestion(seq, result, now())
            }
            Command::ExecutionDone { cycle, result } => {
                self.governor.on_execution_result(cycle, result, now())
            }
            Command::UpdatePolicy(settings) => self.governor.update_policy(settings, now()),
            Command::SetOnline(online) => {
                self.governor.set_online(online);
                Vec::new()
            }
            Command::Remember(text, reply) => {
                let result = self.governor.remember(&text);
                if result.is_ok() {
                    self.notify(Notice::Remembered);
                }
                let _ = reply.send(result);
                Vec::new()
            }
            Command::Purge(reply) => {
                let result = self.governor.purge_memory();
                if result.is_ok() {
                    self.notify(Notice::MemoryPurged);
                }
                let _ = reply.send(result);
                Vec::new()
            }
            Command::AuditSnapshot(reply) => {
                let _ = reply.send(self.governor.audit_snapshot());
                Vec::new()
            }
            Command::Shutdown => Vec::new(),
        };
        self.apply(effects);
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        self.tasks.retain(|task| !task.is_finished());

        for effect in effects {
            match effect {
                Effect::Fetch(request) => {
                    let provider = Arc::clone(&self.provider);
                    let inbox = self.inbox.clone();
                    self.tasks.push(tokio::spawn(async move {
                        let seq = request.seq;
                        let result = provider.suggest(&request).await;
                        let _ = inbox.send(Command::SuggestionReady { seq, result }).await;
                    }));
                }
                Effect::Execute { cycle, request } => {
                    let executor = Arc::clone(&self.executor);
                    let inbox = self.inbox.clone();
                    self.tasks.push(tokio::spawn(async move {
                        let result = executor.execute(&request).await;
                        let _ = inbox.send(Command::ExecutionDone { cycle, result }).await;
                    }));
                }
                Effect::AbortInFlight => {
                    for task in self.tasks.drain(..) {
                        task.abort();
                    }
                }
                Effect::Notify(notice) => self.notify(notice),
            }
        }
    }

    fn notify(&self, notice: Notice) {
        // No subscribers is fine.
        let _ = self.notices.send(notice);
    }
}

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn tick(interval: &mut Option<tokio::time::Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
