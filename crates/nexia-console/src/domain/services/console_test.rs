use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::LocalSet;

use super::*;
use crate::domain::models::OutputFragment;
use crate::domain::models::Runtime;
use crate::domain::models::RuntimeLoader;
use crate::domain::models::RuntimeName;

#[derive(Clone)]
enum Step {
    Out(&'static str),
    Err(&'static str),
    Input(Option<&'static str>),
    PrintLastInput,
    Fail(&'static str),
}

struct ScriptedRuntime {
    steps: Vec<Step>,
    executions: Cell<usize>,
    inputs: RefCell<Vec<String>>,
}

impl ScriptedRuntime {
    fn new(steps: Vec<Step>) -> Rc<ScriptedRuntime> {
        Rc::new(ScriptedRuntime {
            steps,
            executions: Cell::new(0),
            inputs: RefCell::new(vec![]),
        })
    }
}

#[async_trait(?Send)]
impl Runtime for ScriptedRuntime {
    fn name(&self) -> RuntimeName {
        RuntimeName::Lua
    }

    fn description(&self) -> String {
        "Scripted".to_string()
    }

    fn supports_input(&self) -> bool {
        true
    }

    async fn execute(&self, _source: &str, bridge: RunBridge) -> Result<(), ExecutionError> {
        self.executions.set(self.executions.get() + 1);
        for step in self.steps.clone() {
            match step {
                Step::Out(text) => bridge.stdout(text),
                Step::Err(text) => bridge.stderr(text),
                Step::Input(prompt) => {
                    let line = bridge.read_line(prompt.map(|p| p.to_string())).await?;
                    self.inputs.borrow_mut().push(line);
                }
                Step::PrintLastInput => {
                    let last = self.inputs.borrow().last().cloned().unwrap_or_default();
                    bridge.stdout(&format!("{last}\n"));
                }
                Step::Fail(message) => return Err(ExecutionError::Guest(message.to_string())),
            }
        }
        Ok(())
    }
}

struct FakeLoader {
    result: RefCell<Option<Result<RuntimeBox, ExecutionError>>>,
}

impl FakeLoader {
    fn ok(runtime: Rc<ScriptedRuntime>) -> RuntimeLoaderBox {
        let runtime: RuntimeBox = runtime;
        Box::new(FakeLoader {
            result: RefCell::new(Some(Ok(runtime))),
        })
    }

    fn failing(message: &str) -> RuntimeLoaderBox {
        Box::new(FakeLoader {
            result: RefCell::new(Some(Err(ExecutionError::Load(message.to_string())))),
        })
    }
}

#[async_trait(?Send)]
impl RuntimeLoader for FakeLoader {
    fn name(&self) -> RuntimeName {
        RuntimeName::Lua
    }

    async fn load(&self) -> Result<RuntimeBox, ExecutionError> {
        self.result
            .borrow_mut()
            .take()
            .unwrap_or_else(|| Err(ExecutionError::Load("loaded twice".to_string())))
    }
}

async fn mounted(runtime: Rc<ScriptedRuntime>) -> Console {
    let mut console = Console::new();
    console.mount(FakeLoader::ok(runtime));
    while !console.is_ready() {
        console.pump().await;
    }
    console
}

async fn pump_until(console: &mut Console, predicate: impl Fn(&Console) -> bool) {
    while !predicate(console) {
        console.pump().await;
    }
}

async fn finish(console: &mut Console) -> ExecutionOutcome {
    loop {
        if let Some(outcome) = console.pump().await {
            return outcome;
        }
    }
}

fn fragments_of(console: &Console, kind: OutputKind) -> Vec<String> {
    console
        .log()
        .fragments()
        .iter()
        .filter(|fragment| fragment.kind == kind)
        .map(|fragment| fragment.text.clone())
        .collect()
}

#[tokio::test]
async fn it_reports_loading_then_ready() {
    LocalSet::new()
        .run_until(async {
            let mut console = Console::new();
            assert_eq!(console.runtime_status(), &RuntimeStatus::Unmounted);

            console.mount(FakeLoader::ok(ScriptedRuntime::new(vec![])));
            assert_eq!(console.runtime_status(), &RuntimeStatus::Loading);
            assert!(!console.is_ready());

            pump_until(&mut console, |c| c.is_ready()).await;
            let statuses = fragments_of(&console, OutputKind::Status);
            assert_eq!(statuses.len(), 2);
            assert!(statuses[0].contains("Loading the lua runtime"));
            assert!(statuses[1].contains("Scripted is ready"));
            assert_eq!(console.runtime_description().as_deref(), Some("Scripted"));

            console.mount(FakeLoader::failing("second loader"));
            assert_eq!(console.runtime_status(), &RuntimeStatus::Ready);
            assert_eq!(fragments_of(&console, OutputKind::Status).len(), 2);
        })
        .await;
}

#[tokio::test]
async fn it_rejects_runs_while_loading() {
    LocalSet::new()
        .run_until(async {
            let runtime = ScriptedRuntime::new(vec![Step::Out("hi\n")]);
            let mut console = Console::new();
            console.mount(FakeLoader::ok(runtime.clone()));

            assert_eq!(console.run("print('hi')"), Err(RunRejected::NotReady));
            assert_eq!(fragments_of(&console, OutputKind::Warning).len(), 1);
            assert!(!console.is_running());
            assert_eq!(runtime.executions.get(), 0);
        })
        .await;
}

#[tokio::test]
async fn it_stays_disabled_after_a_load_failure() {
    LocalSet::new()
        .run_until(async {
            let mut console = Console::new();
            console.mount(FakeLoader::failing("no interpreter"));
            pump_until(&mut console, |c| c.runtime_status() != &RuntimeStatus::Loading).await;

            assert_eq!(
                console.runtime_status(),
                &RuntimeStatus::Failed("no interpreter".to_string())
            );
            let errors = fragments_of(&console, OutputKind::Error);
            assert_eq!(errors, vec!["Failed to load the runtime: no interpreter\n"]);

            assert_eq!(console.run("print(1)"), Err(RunRejected::NotReady));
            assert!(!console.is_running());
        })
        .await;
}

#[tokio::test]
async fn it_rejects_whitespace_source_without_invoking_the_runtime() {
    LocalSet::new()
        .run_until(async {
            let runtime = ScriptedRuntime::new(vec![Step::Out("never\n")]);
            let mut console = mounted(runtime.clone()).await;
            let before = console.log().len();

            assert_eq!(console.run("  \n\t "), Err(RunRejected::EmptySource));

            assert_eq!(console.log().len(), before + 1);
            assert_eq!(
                console.log().fragments().last(),
                Some(&OutputFragment::new(OutputKind::Warning, "No code to execute\n"))
            );
            assert!(!console.is_running());
            tokio::task::yield_now().await;
            assert_eq!(runtime.executions.get(), 0);
        })
        .await;
}

#[tokio::test]
async fn it_rejects_a_second_run_while_running() {
    LocalSet::new()
        .run_until(async {
            let runtime = ScriptedRuntime::new(vec![Step::Input(None)]);
            let mut console = mounted(runtime.clone()).await;

            console.run("x = input()").unwrap();
            pump_until(&mut console, |c| c.is_awaiting_input()).await;

            assert_eq!(console.run("x = input()"), Err(RunRejected::Busy));
            assert_eq!(runtime.executions.get(), 1);
            assert!(console.is_running());

            console.submit_input_line("done").unwrap();
            let outcome = finish(&mut console).await;
            assert!(outcome.success);
            assert!(!console.is_running());
        })
        .await;
}

#[tokio::test]
async fn it_appends_stream_writes_in_arrival_order() {
    LocalSet::new()
        .run_until(async {
            let runtime = ScriptedRuntime::new(vec![
                Step::Out("one\n"),
                Step::Err("two\n"),
                Step::Out("three"),
                Step::Err("four\n"),
                Step::Out("\n"),
            ]);
            let mut console = mounted(runtime).await;
            let start = console.log().len();

            console.run("go()").unwrap();
            let outcome = finish(&mut console).await;

            let streamed = console.log().fragments()[start..]
                .iter()
                .filter(|f| matches!(f.kind, OutputKind::Stdout | OutputKind::Stderr))
                .cloned()
                .collect::<Vec<_>>();
            assert_eq!(
                streamed,
                vec![
                    OutputFragment::new(OutputKind::Stdout, "one\n"),
                    OutputFragment::new(OutputKind::Stderr, "two\n"),
                    OutputFragment::new(OutputKind::Stdout, "three"),
                    OutputFragment::new(OutputKind::Stderr, "four\n"),
                    OutputFragment::new(OutputKind::Stdout, "\n"),
                ]
            );
            assert_eq!(
                outcome.output.as_deref(),
                Some("one\n❌ two\nthree❌ four\n\n")
            );
        })
        .await;
}

#[tokio::test]
async fn it_resumes_the_guest_with_the_submitted_line() {
    LocalSet::new()
        .run_until(async {
            let runtime = ScriptedRuntime::new(vec![Step::Input(None), Step::PrintLastInput]);
            let mut console = mounted(runtime.clone()).await;

            console.run("x = input() print(x)").unwrap();
            pump_until(&mut console, |c| c.is_awaiting_input()).await;
            assert_eq!(console.pending_prompt(), None);

            console.submit_input_line("hello").unwrap();
            assert!(!console.is_awaiting_input());
            let outcome = finish(&mut console).await;

            assert!(outcome.success);
            assert_eq!(outcome.output.as_deref(), Some("hello\nhello\n"));
            assert_eq!(fragments_of(&console, OutputKind::Echo), vec!["hello\n"]);
            assert_eq!(fragments_of(&console, OutputKind::Stdout), vec!["hello\n"]);
            assert_eq!(console.submitted_inputs(), ["hello".to_string()]);
            assert_eq!(console.output_text().matches("hello").count(), 2);
        })
        .await;
}

#[tokio::test]
async fn it_forwards_an_empty_line() {
    LocalSet::new()
        .run_until(async {
            let runtime = ScriptedRuntime::new(vec![Step::Input(None), Step::PrintLastInput]);
            let mut console = mounted(runtime.clone()).await;

            console.run("x = input()").unwrap();
            pump_until(&mut console, |c| c.is_awaiting_input()).await;
            console.submit_input_line("").unwrap();
            let outcome = finish(&mut console).await;

            assert!(outcome.success);
            assert_eq!(runtime.inputs.borrow().as_slice(), ["".to_string()]);
            assert_eq!(console.submitted_inputs(), ["".to_string()]);
        })
        .await;
}

#[tokio::test]
async fn it_shows_the_prompt_without_a_line_break() {
    LocalSet::new()
        .run_until(async {
            let runtime = ScriptedRuntime::new(vec![
                Step::Out("hi\n"),
                Step::Input(Some("Name? ")),
                Step::PrintLastInput,
            ]);
            let mut console = mounted(runtime).await;
            let start = console.log().len();

            console.run("name = input('Name? ')").unwrap();
            pump_until(&mut console, |c| c.is_awaiting_input()).await;
            assert_eq!(console.pending_prompt(), Some("Name? "));
            console.submit_input_line("Ada").unwrap();
            finish(&mut console).await;

            assert_eq!(
                console.log().since(start + 1),
                "hi\nName? Ada\nAda\n\n✅ Execution finished successfully!\n"
            );
        })
        .await;
}

#[tokio::test]
async fn it_creates_the_next_input_request_only_after_the_first_resolves() {
    LocalSet::new()
        .run_until(async {
            let runtime = ScriptedRuntime::new(vec![
                Step::Input(Some("a? ")),
                Step::Input(Some("b? ")),
                Step::PrintLastInput,
            ]);
            let mut console = mounted(runtime.clone()).await;

            console.run("a = input() b = input()").unwrap();
            pump_until(&mut console, |c| c.is_awaiting_input()).await;
            tokio::task::yield_now().await;
            assert!(console.event_rx.try_recv().is_err());
            assert_eq!(console.pending_prompt(), Some("a? "));

            console.submit_input_line("1").unwrap();
            pump_until(&mut console, |c| c.is_awaiting_input()).await;
            assert_eq!(console.pending_prompt(), Some("b? "));

            console.submit_input_line("2").unwrap();
            let outcome = finish(&mut console).await;
            assert!(outcome.success);
            assert_eq!(
                runtime.inputs.borrow().as_slice(),
                ["1".to_string(), "2".to_string()]
            );
            assert_eq!(console.submitted_inputs(), ["1".to_string(), "2".to_string()]);
        })
        .await;
}

#[tokio::test]
async fn it_captures_guest_failures_as_outcomes() {
    LocalSet::new()
        .run_until(async {
            let (observer_tx, mut observer_rx) = mpsc::unbounded_channel();
            let runtime = ScriptedRuntime::new(vec![
                Step::Out("before\n"),
                Step::Fail("attempt to divide by zero"),
            ]);
            let mut console = Console::new().with_outcome_observer(observer_tx);
            console.mount(FakeLoader::ok(runtime));
            pump_until(&mut console, |c| c.is_ready()).await;

            console.run("print(1 // 0)").unwrap();
            let outcome = finish(&mut console).await;

            assert!(!outcome.success);
            assert_eq!(outcome.output, None);
            assert_eq!(outcome.error.as_deref(), Some("attempt to divide by zero"));
            assert_eq!(
                fragments_of(&console, OutputKind::Error),
                vec!["Error: attempt to divide by zero\n"]
            );
            assert!(console.output_text().contains("❌ Error: attempt to divide by zero"));
            assert!(!console.is_running());
            assert_eq!(observer_rx.try_recv().unwrap(), outcome);

            console.run("print(2)").unwrap();
            assert!(console.is_running());
        })
        .await;
}

#[tokio::test]
async fn it_clears_an_empty_console() {
    LocalSet::new()
        .run_until(async {
            let mut console = Console::new();
            console.clear();
            console.clear();

            assert!(console.log().is_empty());
            assert_eq!(console.output_text(), "");
            assert!(!console.is_running());
        })
        .await;
}

#[tokio::test]
async fn it_abandons_a_pending_request_on_clear() {
    LocalSet::new()
        .run_until(async {
            let (observer_tx, mut observer_rx) = mpsc::unbounded_channel();
            let runtime = ScriptedRuntime::new(vec![Step::Input(None), Step::PrintLastInput]);
            let mut console = Console::new().with_outcome_observer(observer_tx);
            console.mount(FakeLoader::ok(runtime.clone()));
            pump_until(&mut console, |c| c.is_ready()).await;

            console.run("x = input()").unwrap();
            pump_until(&mut console, |c| c.is_awaiting_input()).await;

            console.clear();
            assert!(console.log().is_empty());
            assert!(!console.is_running());
            assert!(!console.is_awaiting_input());
            assert_eq!(
                console.submit_input_line("late"),
                Err(InputRejected::NoPendingInput)
            );

            console.run("x = input()").unwrap();
            pump_until(&mut console, |c| c.is_awaiting_input()).await;
            console.submit_input_line("fresh").unwrap();
            let outcome = finish(&mut console).await;

            assert!(outcome.success);
            assert_eq!(outcome.output.as_deref(), Some("fresh\nfresh\n"));
            assert_eq!(runtime.inputs.borrow().as_slice(), ["fresh".to_string()]);
            assert_eq!(runtime.executions.get(), 2);
            assert_eq!(observer_rx.try_recv().unwrap(), outcome);
            assert!(observer_rx.try_recv().is_err());
        })
        .await;
}

#[tokio::test]
async fn it_discards_events_from_an_abandoned_run() {
    LocalSet::new()
        .run_until(async {
            let runtime = ScriptedRuntime::new(vec![Step::Out("ok\n")]);
            let mut console = mounted(runtime).await;
            console.run("print('ok')").unwrap();
            console.clear();

            let stale = RunId::new();
            assert_eq!(
                console.handle_event(Event::Stdout {
                    run: stale,
                    text: "ghost".to_string(),
                }),
                None
            );
            let (request, mut resumed) = PendingInputRequest::new(stale, Some("? ".to_string()));
            console.handle_event(Event::InputRequested(request));
            assert_eq!(
                console.handle_event(Event::RunFinished {
                    run: stale,
                    result: Ok(()),
                }),
                None
            );

            assert!(console.log().is_empty());
            assert!(!console.is_awaiting_input());
            assert!(resumed.try_recv().is_err());
        })
        .await;
}

#[tokio::test]
async fn it_rejects_input_when_nothing_is_pending() {
    LocalSet::new()
        .run_until(async {
            let mut console = mounted(ScriptedRuntime::new(vec![])).await;
            let before = console.log().len();

            assert_eq!(
                console.submit_input_line("stray"),
                Err(InputRejected::NoPendingInput)
            );
            assert_eq!(console.log().len(), before);
        })
        .await;
}
