//! Embedded interpreter console for the Nexia learning platform.
//!
//! This crate runs learner code in a loaded interpreter (or on the backend),
//! streams what the program prints into an ordered output log, and suspends the
//! program whenever it asks for a line of input until the user submits one.
//! It also carries the terminal front end used by the `nexia` binary.

pub mod application;
pub mod configuration;
pub mod domain;
pub mod infrastructure;
pub use application::ui::{destruct_terminal_for_panic, start_loop};
pub use configuration::{Config, ConfigKey};
pub use domain::models::{
    Event, ExecutionError, ExecutionOutcome, OutputKind, OutputLog, RunBridge, RunId, Runtime,
    RuntimeLoader, RuntimeName,
};
pub use domain::services::Console;
pub use infrastructure::clients::NexiaApi;
pub use infrastructure::runtimes::RuntimeManager;
