//! Observability bootstrap
//!
//! Installs the process-wide `tracing` subscriber. Library code only emits
//! events through `tracing` macros; binaries and tests decide how those
//! events are rendered by calling [`init_tracing`] once at startup.

pub mod logging;

pub use logging::{init_tracing, LogFormat};
