//! Scout engine: effect execution, timers, interception and storage.
mod engine;
mod intercept;
mod ports;
mod scheduler;
mod store;

pub use engine::{Engine, EngineConfig, EngineError, EnginePorts, EngineSlot};
pub use intercept::{Interception, NetworkInterceptor};
pub use ports::{ElementRef, PageHost, UiProbe};
pub use scheduler::{jittered, Scheduler, TimerToken};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
