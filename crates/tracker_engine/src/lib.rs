//! Tracker engine: store capabilities, change notifications and effect execution.
mod engine;
mod memory;
mod notifier;
mod rest;
mod store;
mod types;

pub use engine::{EngineCommand, EngineHandle, EngineSettings};
pub use memory::MemoryStore;
pub use notifier::{ChangeNotifier, ChangeSignal};
pub use rest::{RestStore, StoreSettings};
pub use store::{ChangeCallback, ChangeFeed, RecordStore, Subscription};
pub use types::{EngineEvent, FailureKind, StoreError};
