use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use nexia_api_types::SubmissionResponse;
use nexia_console::ExecutionOutcome;
use nexia_console::NexiaApi;
use tokio::fs;

/// Records successful runs of a file as submissions for one exercise.
pub struct SubmissionRecorder {
    api: NexiaApi,
    exercise_id: String,
    source_path: PathBuf,
}

impl SubmissionRecorder {
    pub fn new(api: NexiaApi, exercise_id: &str, source_path: PathBuf) -> SubmissionRecorder {
        return SubmissionRecorder {
            api,
            exercise_id: exercise_id.to_string(),
            source_path,
        };
    }

    /// Submits the current contents of the source file when `outcome` succeeded.
    pub async fn record(&self, outcome: &ExecutionOutcome) -> Result<Option<SubmissionResponse>> {
        if !outcome.success {
            tracing::debug!(exercise = %self.exercise_id, "failed run not submitted");
            return Ok(None);
        }

        let code = fs::read_to_string(&self.source_path)
            .await
            .with_context(|| format!("could not read {}", self.source_path.display()))?;
        let res = self.api.submit_exercise(&self.exercise_id, &code).await?;
        tracing::info!(exercise = %self.exercise_id, success = res.success, "submission recorded");

        return Ok(Some(res));
    }
}
