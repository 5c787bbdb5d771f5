use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::models::Event;
use crate::domain::models::ExecutionError;
use crate::domain::models::ExecutionOutcome;
use crate::domain::models::InputRejected;
use crate::domain::models::OutputKind;
use crate::domain::models::OutputLog;
use crate::domain::models::PendingInputRequest;
use crate::domain::models::RunBridge;
use crate::domain::models::RunId;
use crate::domain::models::RunPhase;
use crate::domain::models::RunRejected;
use crate::domain::models::RuntimeBox;
use crate::domain::models::RuntimeLoaderBox;
use crate::domain::models::RuntimeStatus;

#[cfg(test)]
#[path = "console_test.rs"]
mod tests;

/// The embedded interpreter console.
///
/// Owns the output log, the runtime handle and the run state machine
/// (`Idle -> Running -> Idle`, with zero or more pending input requests while
/// running). Runtimes and workers talk back through [`Event`]s on an unbounded
/// channel; [`Console::handle_event`] is the only place those events touch
/// state, which keeps log appends in arrival order.
///
/// Workers are spawned with `spawn_local`, so the console must be driven from
/// inside a `tokio::task::LocalSet`.
pub struct Console {
    log: OutputLog,
    status: RuntimeStatus,
    runtime: Option<RuntimeBox>,
    phase: RunPhase,
    pending_input: Option<PendingInputRequest>,
    submitted_inputs: Vec<String>,
    worker: Option<JoinHandle<()>>,
    event_tx: mpsc::UnboundedSender<Event>,
    event_rx: mpsc::UnboundedReceiver<Event>,
    observer: Option<mpsc::UnboundedSender<ExecutionOutcome>>,
}

impl Default for Console {
    fn default() -> Console {
        Console::new()
    }
}

impl Console {
    pub fn new() -> Console {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Console {
            log: OutputLog::new(),
            status: RuntimeStatus::Unmounted,
            runtime: None,
            phase: RunPhase::Idle,
            pending_input: None,
            submitted_inputs: vec![],
            worker: None,
            event_tx,
            event_rx,
            observer: None,
        }
    }

    /// Every finished run's outcome is also sent here.
    pub fn with_outcome_observer(mut self, observer: mpsc::UnboundedSender<ExecutionOutcome>) -> Console {
        self.observer = Some(observer);
        self
    }

    /// Starts loading the runtime. Runs are rejected until the load lands.
    pub fn mount(&mut self, loader: RuntimeLoaderBox) {
        if self.status != RuntimeStatus::Unmounted {
            tracing::warn!(status = ?self.status, "console already mounted");
            return;
        }

        let runtime_name = loader.name();
        self.status = RuntimeStatus::Loading;
        self.log.append(
            OutputKind::Status,
            &format!("🔄 Loading the {runtime_name} runtime...\n"),
        );
        tracing::debug!(runtime = %runtime_name, "loading runtime");

        let event_tx = self.event_tx.clone();
        tokio::task::spawn_local(async move {
            let result = loader.load().await;
            let _ = event_tx.send(Event::RuntimeLoaded(result));
        });
    }

    pub fn log(&self) -> &OutputLog {
        &self.log
    }

    pub fn output_text(&self) -> String {
        self.log.text()
    }

    pub fn runtime_status(&self) -> &RuntimeStatus {
        &self.status
    }

    pub fn runtime_description(&self) -> Option<String> {
        self.runtime.as_ref().map(|runtime| runtime.description())
    }

    pub fn is_ready(&self) -> bool {
        self.status == RuntimeStatus::Ready && self.runtime.is_some()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, RunPhase::Running { .. })
    }

    pub fn is_awaiting_input(&self) -> bool {
        self.pending_input.is_some()
    }

    pub fn pending_prompt(&self) -> Option<&str> {
        self.pending_input
            .as_ref()
            .and_then(|request| request.prompt.as_deref())
    }

    /// Lines the user typed during the current (or last) run.
    pub fn submitted_inputs(&self) -> &[String] {
        &self.submitted_inputs
    }

    /// Starts one run of `source`.
    ///
    /// Rejections append a single warning line and leave the run state alone.
    pub fn run(&mut self, source: &str) -> Result<RunId, RunRejected> {
        let runtime = match self.runtime.clone() {
            Some(runtime) if self.status == RuntimeStatus::Ready => runtime,
            _ => return Err(self.reject(RunRejected::NotReady)),
        };

        if self.is_running() {
            return Err(self.reject(RunRejected::Busy));
        }

        if source.trim().is_empty() {
            return Err(self.reject(RunRejected::EmptySource));
        }

        let run = RunId::new();
        self.submitted_inputs.clear();
        self.phase = RunPhase::Running {
            run,
            transcript_start: self.log.len(),
        };
        self.log.append(OutputKind::Status, "▶️  Running code...\n");
        tracing::debug!(run = %run, runtime = %runtime.name(), "run started");

        let bridge = RunBridge::new(run, self.event_tx.clone());
        let event_tx = self.event_tx.clone();
        let source = source.to_string();
        self.worker = Some(tokio::task::spawn_local(async move {
            let result = runtime.execute(&source, bridge).await;
            let _ = event_tx.send(Event::RunFinished { run, result });
        }));

        Ok(run)
    }

    fn reject(&mut self, reason: RunRejected) -> RunRejected {
        tracing::debug!(reason = %reason, "run rejected");
        self.log
            .append(OutputKind::Warning, &format!("{reason}\n"));
        reason
    }

    /// Answers the pending input request with `line`, which may be empty.
    pub fn submit_input_line(&mut self, line: &str) -> Result<(), InputRejected> {
        let Some(request) = self.pending_input.take() else {
            return Err(InputRejected::NoPendingInput);
        };

        let run = request.run;
        if !request.resume(line.to_string()) {
            tracing::debug!(run = %run, "input submitted to a run that already ended");
        }
        self.log.append(OutputKind::Echo, &format!("{line}\n"));
        self.submitted_inputs.push(line.to_string());

        Ok(())
    }

    /// Resets the log and abandons any in-flight run.
    ///
    /// A pending input request is dropped unresolved. The run's worker is
    /// aborted and anything it already queued is discarded by run id.
    pub fn clear(&mut self) {
        self.log.clear();
        self.submitted_inputs.clear();

        if let Some(request) = self.pending_input.take() {
            tracing::debug!(run = %request.run, "abandoning pending input request");
        }

        if let Some(run) = self.phase.current_run() {
            tracing::debug!(run = %run, "abandoning run");
            self.phase = RunPhase::Idle;
        }

        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }

    /// Waits for the next event from the loader or a run.
    pub async fn recv(&mut self) -> Option<Event> {
        self.event_rx.recv().await
    }

    /// Waits for and applies one event.
    pub async fn pump(&mut self) -> Option<ExecutionOutcome> {
        let event = self.recv().await?;
        self.handle_event(event)
    }

    /// Applies one event. Returns the outcome when it finishes the current run.
    pub fn handle_event(&mut self, event: Event) -> Option<ExecutionOutcome> {
        match event {
            Event::RuntimeLoaded(result) => {
                self.handle_runtime_loaded(result);
                None
            }
            Event::Stdout { run, text } => {
                if self.is_current(run) {
                    self.log.append(OutputKind::Stdout, &text);
                } else {
                    tracing::warn!(run = %run, "discarding stdout from abandoned run");
                }
                None
            }
            Event::Stderr { run, text } => {
                if self.is_current(run) {
                    self.log.append(OutputKind::Stderr, &text);
                } else {
                    tracing::warn!(run = %run, "discarding stderr from abandoned run");
                }
                None
            }
            Event::InputRequested(request) => {
                self.handle_input_requested(request);
                None
            }
            Event::RunFinished { run, result } => {
                if !self.is_current(run) {
                    tracing::debug!(run = %run, "ignoring completion of abandoned run");
                    return None;
                }
                Some(self.finish_run(result))
            }
        }
    }

    fn is_current(&self, run: RunId) -> bool {
        self.phase.current_run() == Some(run)
    }

    fn handle_runtime_loaded(&mut self, result: Result<RuntimeBox, ExecutionError>) {
        if self.status != RuntimeStatus::Loading {
            tracing::warn!(status = ?self.status, "unexpected runtime load result");
            return;
        }

        match result {
            Ok(runtime) => {
                let description = runtime.description();
                tracing::debug!(runtime = %description, "runtime ready");
                self.log.append(
                    OutputKind::Status,
                    &format!("✅ {description} is ready to run code!\n\n"),
                );
                self.runtime = Some(runtime);
                self.status = RuntimeStatus::Ready;
            }
            Err(err) => {
                tracing::error!(error = %err, "runtime failed to load");
                self.log.append(
                    OutputKind::Error,
                    &format!("Failed to load the runtime: {err}\n"),
                );
                self.status = RuntimeStatus::Failed(err.to_string());
            }
        }
    }

    fn handle_input_requested(&mut self, request: PendingInputRequest) {
        if !self.is_current(request.run) {
            tracing::warn!(run = %request.run, "dropping input request from abandoned run");
            return;
        }

        if let Some(existing) = &self.pending_input {
            tracing::warn!(run = %existing.run, "input already pending, dropping second request");
            return;
        }

        if let Some(prompt) = &request.prompt {
            self.log.append(OutputKind::Prompt, prompt);
        }
        tracing::debug!(run = %request.run, "awaiting input");
        self.pending_input = Some(request);
    }

    fn finish_run(&mut self, result: Result<(), ExecutionError>) -> ExecutionOutcome {
        let transcript_start = match self.phase {
            RunPhase::Running {
                transcript_start, ..
            } => transcript_start,
            RunPhase::Idle => self.log.len(),
        };
        self.phase = RunPhase::Idle;
        self.pending_input = None;
        self.worker = None;

        let outcome = match result {
            Ok(()) => {
                let output = self.log.program_output_since(transcript_start);
                self.log.append(
                    OutputKind::Status,
                    "\n✅ Execution finished successfully!\n",
                );
                tracing::debug!("run succeeded");
                ExecutionOutcome::succeeded(output)
            }
            Err(err) => {
                self.log
                    .append(OutputKind::Error, &format!("Error: {err}\n"));
                tracing::debug!(error = %err, network = err.is_network(), "run failed");
                ExecutionOutcome::failed(&err)
            }
        };

        if let Some(observer) = &self.observer {
            if observer.send(outcome.clone()).is_err() {
                tracing::debug!("outcome observer went away");
            }
        }

        outcome
    }
}
