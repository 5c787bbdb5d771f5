use std::rc::Rc;

use async_trait::async_trait;
use nexia_api_types::ApiError;

use crate::domain::models::ExecutionError;
use crate::domain::models::RunBridge;
use crate::domain::models::Runtime;
use crate::domain::models::RuntimeBox;
use crate::domain::models::RuntimeLoader;
use crate::domain::models::RuntimeName;
use crate::infrastructure::clients::NexiaApi;

#[cfg(test)]
#[path = "remote_test.rs"]
mod tests;

/// Loads a runtime that ships code to the backend instead of running it here.
///
/// Without an explicit client the backend settings come from [`crate::Config`].
#[derive(Default)]
pub struct RemoteLoader {
    api: Option<NexiaApi>,
}

impl RemoteLoader {
    pub fn with_api(api: NexiaApi) -> RemoteLoader {
        RemoteLoader { api: Some(api) }
    }
}

#[async_trait(?Send)]
impl RuntimeLoader for RemoteLoader {
    fn name(&self) -> RuntimeName {
        RuntimeName::Remote
    }

    async fn load(&self) -> Result<RuntimeBox, ExecutionError> {
        let api = match &self.api {
            Some(api) => api.clone(),
            None => NexiaApi::from_config().map_err(|err| ExecutionError::Load(err.to_string()))?,
        };

        tracing::debug!(url = api.base_url(), "remote runtime configured");
        Ok(Rc::new(RemoteRuntime { api }))
    }
}

pub struct RemoteRuntime {
    api: NexiaApi,
}

#[async_trait(?Send)]
impl Runtime for RemoteRuntime {
    fn name(&self) -> RuntimeName {
        RuntimeName::Remote
    }

    fn description(&self) -> String {
        format!("Remote execution at {}", self.api.base_url())
    }

    fn supports_input(&self) -> bool {
        false
    }

    async fn execute(&self, source: &str, bridge: RunBridge) -> Result<(), ExecutionError> {
        tracing::debug!(run = %bridge.run(), "sending code to the backend");
        let res = self.api.execute(source).await.map_err(remote_error)?;

        if let Some(output) = res.output_text() {
            bridge.stdout(output);
        }

        if !res.success {
            let message = res.error_text().unwrap_or("Execution failed");
            return Err(ExecutionError::Guest(message.to_string()));
        }

        Ok(())
    }
}

fn remote_error(err: ApiError) -> ExecutionError {
    match err {
        ApiError::Unreachable { .. } => ExecutionError::Network(err.to_string()),
        ApiError::Status { .. } | ApiError::Decode { .. } => ExecutionError::Server(err.to_string()),
        ApiError::Config { .. } => ExecutionError::Load(err.to_string()),
    }
}
