//! Logging utilities.
//!
//! Centralizes logger initialization. The library itself only talks to the
//! `log` facade; `init_logging` wires up `env_logger` for binaries.

mod init;

pub use init::{init_logging, LoggingConfig};
