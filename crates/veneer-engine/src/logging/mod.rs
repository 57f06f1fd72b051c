//! Logging utilities.
//!
//! Logger initialization for binaries, and the nested trace sink the
//! compositor reports its steps through.

mod init;
mod trace;

pub use init::{LoggingConfig, init_logging};
pub use trace::{LogSink, LogTree, NoopSink, TraceGroup};
