use std::rc::Rc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use strum::IntoEnumIterator;
use strum::{Display, EnumIter, EnumString, VariantNames};
use tokio::sync::mpsc;

use super::Event;
use super::ExecutionError;
use super::PendingInputRequest;
use super::RunId;

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumString,
    VariantNames,
    Serialize,
    Deserialize,
    EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum RuntimeName {
    #[default]
    Lua,
    Remote,
}

impl RuntimeName {
    pub fn parse(s: &str) -> Option<RuntimeName> {
        RuntimeName::iter().find(|e| e.to_string() == s)
    }
}

/// Write side of one run, handed to the runtime for the duration of `execute`.
///
/// Stream writes are enqueued synchronously and never block the guest. Every
/// event carries the run id so the console can drop output from a run it has
/// already abandoned.
#[derive(Clone, Debug)]
pub struct RunBridge {
    run: RunId,
    event_tx: mpsc::UnboundedSender<Event>,
}

impl RunBridge {
    pub fn new(run: RunId, event_tx: mpsc::UnboundedSender<Event>) -> RunBridge {
        return RunBridge { run, event_tx };
    }

    pub fn run(&self) -> RunId {
        return self.run;
    }

    pub fn stdout(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        let event = Event::Stdout {
            run: self.run,
            text: text.to_string(),
        };
        if self.event_tx.send(event).is_err() {
            tracing::debug!(run = %self.run, "stdout write after console shutdown");
        }
    }

    pub fn stderr(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        let event = Event::Stderr {
            run: self.run,
            text: text.to_string(),
        };
        if self.event_tx.send(event).is_err() {
            tracing::debug!(run = %self.run, "stderr write after console shutdown");
        }
    }

    /// Suspends the calling guest until the user submits a line.
    ///
    /// The request is handed to the console and this future parks on the
    /// continuation's receiver. It resolves with the submitted text, or with
    /// `InputAbandoned` if the console drops the request (clear, new run,
    /// shutdown).
    pub async fn read_line(&self, prompt: Option<String>) -> Result<String, ExecutionError> {
        let (request, resumed) = PendingInputRequest::new(self.run, prompt);
        if self.event_tx.send(Event::InputRequested(request)).is_err() {
            return Err(ExecutionError::InputAbandoned);
        }

        return resumed.await.map_err(|_| ExecutionError::InputAbandoned);
    }
}

/// A ready-to-run interpreter owned by one console.
#[async_trait(?Send)]
pub trait Runtime {
    fn name(&self) -> RuntimeName;

    /// Human readable identity shown in the ready line, e.g. `Lua 5.4`.
    fn description(&self) -> String;

    /// Whether guest code can ask the user for input mid-run.
    fn supports_input(&self) -> bool;

    async fn execute(&self, source: &str, bridge: RunBridge) -> Result<(), ExecutionError>;
}

pub type RuntimeBox = Rc<dyn Runtime>;

/// Acquires a runtime once per console.
#[async_trait(?Send)]
pub trait RuntimeLoader {
    fn name(&self) -> RuntimeName;
    async fn load(&self) -> Result<RuntimeBox, ExecutionError>;
}

pub type RuntimeLoaderBox = Box<dyn RuntimeLoader>;
