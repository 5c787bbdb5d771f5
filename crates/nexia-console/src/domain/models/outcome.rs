use serde::Serialize;
use thiserror::Error;

/// Why a run did not succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The program raised an error.
    #[error("{0}")]
    Guest(String),
    /// The backend could not be reached.
    #[error("Could not reach the server: {0}")]
    Network(String),
    /// The backend answered with a server-side failure.
    #[error("The server reported an error: {0}")]
    Server(String),
    /// A pending input request was dropped before a line was submitted.
    #[error("Input request was abandoned")]
    InputAbandoned,
    #[error("{0}")]
    Load(String),
}

impl ExecutionError {
    pub fn is_network(&self) -> bool {
        matches!(self, ExecutionError::Network(_) | ExecutionError::Server(_))
    }
}

/// A `run` call refused before anything was started.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunRejected {
    #[error("The runtime is not ready")]
    NotReady,
    #[error("A run is already in progress")]
    Busy,
    #[error("No code to execute")]
    EmptySource,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRejected {
    #[error("The program is not waiting for input")]
    NoPendingInput,
}

/// Terminal result of one run, handed to the console's owner.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionOutcome {
    pub fn succeeded(output: String) -> ExecutionOutcome {
        return ExecutionOutcome {
            success: true,
            output: Some(output),
            error: None,
        };
    }

    pub fn failed(error: &ExecutionError) -> ExecutionOutcome {
        return ExecutionOutcome {
            success: false,
            output: None,
            error: Some(error.to_string()),
        };
    }
}
