use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracker_core::{Effect, Msg};
use tracker_engine::{
    ChangeFeed, EngineEvent, EngineHandle, EngineSettings, MemoryStore, RecordStore, RestStore,
    StoreError,
};
use tracker_logging::tracker_debug;

use crate::config::Backend;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Forwards effects to the engine and engine events back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
    memory: Option<MemoryStore>,
}

impl EffectRunner {
    /// `forward` returns false once the receiving side is gone, which stops
    /// the event loop.
    pub fn new(
        backend: &Backend,
        forward: impl Fn(Msg) -> bool + Send + 'static,
    ) -> Result<Self, StoreError> {
        let settings = EngineSettings::default();
        let (engine, memory) = match backend {
            Backend::Memory => {
                let store = MemoryStore::new();
                let records: Arc<dyn RecordStore> = Arc::new(store.clone());
                let feed: Arc<dyn ChangeFeed> = Arc::new(store.clone());
                (EngineHandle::new(records, Some(feed), settings), Some(store))
            }
            Backend::Rest(store_settings) => {
                let store = RestStore::new(store_settings.clone())?;
                (EngineHandle::new(Arc::new(store), None, settings), None)
            }
        };
        let runner = Self { engine, memory };
        runner.spawn_event_loop(forward);
        Ok(runner)
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            tracker_debug!("Effect {:?}", effect);
            self.engine.submit(effect.into());
        }
    }

    /// The in-process store, when running on the memory backend.
    pub fn memory_store(&self) -> Option<&MemoryStore> {
        self.memory.as_ref()
    }

    fn spawn_event_loop(&self, forward: impl Fn(Msg) -> bool + Send + 'static) {
        let engine = self.engine.clone();
        thread::spawn(move || loop {
            if let Some(event) = engine.recv_timeout(POLL_INTERVAL) {
                if !forward(event_to_msg(event)) {
                    break;
                }
            }
        });
    }
}

pub fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::RecordsFetched { generation, result } => Msg::RecordsFetched {
            generation,
            result: result.map_err(message),
        },
        EngineEvent::RecordCreated { origin, result } => Msg::CreateCompleted {
            origin,
            result: result.map_err(message),
        },
        EngineEvent::RecordUpdated { id, origin, result } => Msg::UpdateCompleted {
            id,
            origin,
            result: result.map_err(message),
        },
        EngineEvent::RecordDeleted { id, origin, result } => Msg::DeleteCompleted {
            id,
            origin,
            result: result.map_err(message),
        },
        EngineEvent::RemoteChanged => Msg::RemoteChanged,
        EngineEvent::SubscriptionFailed(err) => Msg::SubscriptionFailed(message(err)),
    }
}

// The store's own wording is what the user sees.
fn message(err: StoreError) -> String {
    err.message
}
