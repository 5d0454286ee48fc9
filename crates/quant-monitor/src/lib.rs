//! Logging and tracing setup.

mod logging;

pub use logging::{level_filter, setup_logging};
