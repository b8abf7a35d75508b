//! Request pipeline - the only entry point callers use

pub mod service;

pub use service::RequestPipeline;
