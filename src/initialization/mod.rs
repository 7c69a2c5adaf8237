//! Process-level initialization for the `dss` binary.
//!
//! The library never installs global state itself; embedding applications
//! bring their own logger.

mod logger;

pub use logger::init_logger_with;
