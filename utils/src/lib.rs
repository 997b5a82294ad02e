//! Shared utilities for the Verity protocol.

pub mod logging;

pub use logging::{init_logging, try_init_logging, LogFormat};
