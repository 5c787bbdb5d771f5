use std::fmt;

use tokio::sync::oneshot;

use super::RunId;

/// One-shot handle that resumes a guest blocked in its line-input primitive.
///
/// `resume` consumes the continuation, so a request can be answered at most
/// once. Dropping it without resuming abandons the guest call.
pub struct InputContinuation {
    tx: oneshot::Sender<String>,
}

impl InputContinuation {
    pub fn new() -> (InputContinuation, oneshot::Receiver<String>) {
        let (tx, rx) = oneshot::channel();
        return (InputContinuation { tx }, rx);
    }

    /// Returns false when the guest side is already gone.
    pub fn resume(self, line: String) -> bool {
        return self.tx.send(line).is_ok();
    }

    pub fn is_abandoned(&self) -> bool {
        return self.tx.is_closed();
    }
}

impl fmt::Debug for InputContinuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputContinuation")
            .field("abandoned", &self.is_abandoned())
            .finish()
    }
}

/// Exists while a run is parked waiting for a line from the user.
#[derive(Debug)]
pub struct PendingInputRequest {
    pub run: RunId,
    pub prompt: Option<String>,
    continuation: InputContinuation,
}

impl PendingInputRequest {
    pub fn new(
        run: RunId,
        prompt: Option<String>,
    ) -> (PendingInputRequest, oneshot::Receiver<String>) {
        let (continuation, rx) = InputContinuation::new();
        let request = PendingInputRequest {
            run,
            prompt,
            continuation,
        };

        return (request, rx);
    }

    pub fn resume(self, line: String) -> bool {
        return self.continuation.resume(line);
    }
}
