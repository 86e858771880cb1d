//! Observability: structured logging and the optional remote status mirror.

pub mod logging;
pub mod mirror;

pub use logging::{init_default_logging, init_logging, LogFormat};
pub use mirror::LogMirror;
