//! Player module
//!
//! Drives an external HLS engine through attach, manifest, play, error
//! recovery and teardown.

mod controller;
mod engine;
mod scheduler;

pub use controller::{ErrorClass, PlayerController, PlayerSettings, PlayerState};
pub use engine::{
    EngineConfig, EngineErrorType, MediaSink, PlayerEvent, PlayerNotice, QualityLevel,
    QualitySelection, SessionId, SinkErrorCode, StreamingBackend, StreamingEngine,
};
pub use scheduler::{RetryScheduler, RetryTicket, SessionEvent, ThreadScheduler};
