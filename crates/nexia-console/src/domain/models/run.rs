use std::fmt;

use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> RunId {
        return RunId(Uuid::new_v4());
    }
}

impl Default for RunId {
    fn default() -> RunId {
        return RunId::new();
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.0.simple().to_string();
        write!(f, "run_{}", &id[..8])
    }
}

/// Readiness of the console's runtime. `Failed` is terminal for the console.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuntimeStatus {
    Unmounted,
    Loading,
    Ready,
    Failed(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running {
        run: RunId,
        /// Log length when the run started, for the per-run transcript.
        transcript_start: usize,
    },
}

impl RunPhase {
    pub fn current_run(&self) -> Option<RunId> {
        match self {
            RunPhase::Running { run, .. } => Some(*run),
            RunPhase::Idle => None,
        }
    }
}
