use tui_textarea::Input;

use super::ExecutionError;
use super::PendingInputRequest;
use super::RunId;
use super::RuntimeBox;

/// Everything that can change console state, in the order it happened.
pub enum Event {
    RuntimeLoaded(Result<RuntimeBox, ExecutionError>),
    Stdout { run: RunId, text: String },
    Stderr { run: RunId, text: String },
    InputRequested(PendingInputRequest),
    RunFinished {
        run: RunId,
        result: Result<(), ExecutionError>,
    },
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::RuntimeLoaded(Ok(runtime)) => {
                write!(f, "RuntimeLoaded(Ok({}))", runtime.description())
            }
            Event::RuntimeLoaded(Err(err)) => write!(f, "RuntimeLoaded(Err({err:?}))"),
            Event::Stdout { run, text } => write!(f, "Stdout({run}, {text:?})"),
            Event::Stderr { run, text } => write!(f, "Stderr({run}, {text:?})"),
            Event::InputRequested(request) => write!(f, "InputRequested({request:?})"),
            Event::RunFinished { run, result } => write!(f, "RunFinished({run}, {result:?})"),
        }
    }
}

/// What the interactive loop reacts to: console events plus terminal input.
#[derive(Debug)]
pub enum UiEvent {
    Console(Event),
    KeyboardCharInput(Input),
    KeyboardCTRLC,
    KeyboardCTRLL,
    KeyboardCTRLR,
    KeyboardEnter,
    KeyboardEsc,
    KeyboardPaste(String),
    UITick,
    UIScrollDown,
    UIScrollUp,
    UIScrollPageDown,
    UIScrollPageUp,
}
