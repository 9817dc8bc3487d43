use std::future::Future;
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use tracker_core::{Effect, Generation, Origin, RecordFields, RecordId, RecordPatch, UserId};
use tracker_logging::{tracker_debug, tracker_error, tracker_info, tracker_warn};

use crate::notifier::{ChangeNotifier, ChangeSignal};
use crate::{ChangeFeed, EngineEvent, FailureKind, RecordStore, StoreError};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Upper bound for any single store call.
    pub call_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Subscribe { user: UserId },
    Unsubscribe,
    Fetch {
        user: UserId,
        generation: Generation,
    },
    Create {
        user: UserId,
        fields: RecordFields,
        origin: Origin,
    },
    Update {
        id: RecordId,
        patch: RecordPatch,
        origin: Origin,
    },
    Delete {
        id: RecordId,
        origin: Origin,
    },
}

impl From<Effect> for EngineCommand {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::Subscribe { user } => EngineCommand::Subscribe { user },
            Effect::Unsubscribe => EngineCommand::Unsubscribe,
            Effect::FetchRecords { user, generation } => EngineCommand::Fetch { user, generation },
            Effect::CreateRecord {
                user,
                fields,
                origin,
            } => EngineCommand::Create {
                user,
                fields,
                origin,
            },
            Effect::UpdateRecord { id, patch, origin } => {
                EngineCommand::Update { id, patch, origin }
            }
            Effect::DeleteRecord { id, origin } => EngineCommand::Delete { id, origin },
        }
    }
}

/// Runs store calls on a dedicated worker thread.
///
/// Commands execute one at a time in submission order, so a fetch queued
/// after a mutation observes that mutation. Results and change notifications
/// come back through [`EngineHandle::try_recv`] / [`EngineHandle::recv_timeout`].
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
    signal: ChangeSignal,
}

impl EngineHandle {
    pub fn new(
        store: Arc<dyn RecordStore>,
        feed: Option<Arc<dyn ChangeFeed>>,
        settings: EngineSettings,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>();
        let (event_tx, event_rx) = mpsc::channel();

        let signal_tx = event_tx.clone();
        let signal = ChangeSignal::new(move || {
            let _ = signal_tx.send(EngineEvent::RemoteChanged);
        });
        let worker_signal = signal.clone();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    tracker_error!("Failed to start engine runtime: {}", err);
                    return;
                }
            };
            let mut notifier = ChangeNotifier::new(feed, worker_signal);
            while let Ok(command) = cmd_rx.recv() {
                let event = runtime.block_on(handle_command(
                    store.as_ref(),
                    &mut notifier,
                    &settings,
                    command,
                ));
                if let Some(event) = event {
                    let _ = event_tx.send(event);
                }
            }
            notifier.unsubscribe();
            tracker_debug!("Engine worker stopped");
        });

        Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
            signal,
        }
    }

    pub fn submit(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }

    pub fn run_effects(&self, effects: Vec<Effect>) {
        for effect in effects {
            self.submit(effect.into());
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        let event = self.lock_events().try_recv().ok()?;
        Some(self.acknowledge(event))
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        let event = self.lock_events().recv_timeout(timeout).ok()?;
        Some(self.acknowledge(event))
    }

    fn lock_events(&self) -> std::sync::MutexGuard<'_, mpsc::Receiver<EngineEvent>> {
        self.event_rx.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Taking a change signal re-arms the notifier.
    fn acknowledge(&self, event: EngineEvent) -> EngineEvent {
        if event == EngineEvent::RemoteChanged {
            self.signal.acknowledge();
        }
        event
    }
}

async fn handle_command(
    store: &dyn RecordStore,
    notifier: &mut ChangeNotifier,
    settings: &EngineSettings,
    command: EngineCommand,
) -> Option<EngineEvent> {
    match command {
        EngineCommand::Subscribe { user } => match notifier.subscribe(&user) {
            Ok(()) => None,
            Err(err) => {
                tracker_warn!("Change subscription for user {} failed: {}", user, err);
                Some(EngineEvent::SubscriptionFailed(err))
            }
        },
        EngineCommand::Unsubscribe => {
            notifier.unsubscribe();
            None
        }
        EngineCommand::Fetch { user, generation } => {
            let result = with_timeout(settings, store.list_records(&user)).await;
            match &result {
                Ok(records) => tracker_info!(
                    "Fetched {} jobs generation={}",
                    records.len(),
                    generation.value()
                ),
                Err(err) => tracker_warn!(
                    "Fetch generation={} failed: {}",
                    generation.value(),
                    err
                ),
            }
            Some(EngineEvent::RecordsFetched { generation, result })
        }
        EngineCommand::Create {
            user,
            fields,
            origin,
        } => {
            let result = with_timeout(settings, store.create_record(&user, &fields)).await;
            match &result {
                Ok(id) => tracker_info!("Created job id={}", id),
                Err(err) => tracker_warn!("Create failed: {}", err),
            }
            Some(EngineEvent::RecordCreated { origin, result })
        }
        EngineCommand::Update { id, patch, origin } => {
            let result = with_timeout(settings, store.update_record(&id, &patch)).await;
            log_outcome("Update", &id, &result);
            Some(EngineEvent::RecordUpdated { id, origin, result })
        }
        EngineCommand::Delete { id, origin } => {
            let result = with_timeout(settings, store.delete_record(&id)).await;
            log_outcome("Delete", &id, &result);
            Some(EngineEvent::RecordDeleted { id, origin, result })
        }
    }
}

async fn with_timeout<T>(
    settings: &EngineSettings,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    match tokio::time::timeout(settings.call_timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::new(
            FailureKind::Timeout,
            format!("store call exceeded {:?}", settings.call_timeout),
        )),
    }
}

fn log_outcome(action: &str, id: &RecordId, result: &Result<(), StoreError>) {
    match result {
        Ok(()) => tracker_info!("{} job id={} ok", action, id),
        Err(err) => tracker_warn!("{} job id={} failed: {}", action, id, err),
    }
}
