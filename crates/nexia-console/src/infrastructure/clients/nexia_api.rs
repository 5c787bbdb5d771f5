use std::time::Duration;

use nexia_api_types::ApiError;
use nexia_api_types::ApiResult;
use nexia_api_types::ExecuteRequest;
use nexia_api_types::ExecuteResponse;
use nexia_api_types::SubmissionRequest;
use nexia_api_types::SubmissionResponse;
use reqwest::RequestBuilder;
use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

#[cfg(test)]
#[path = "nexia_api_test.rs"]
mod tests;

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// HTTP client for the Nexia backend.
#[derive(Clone, Debug)]
pub struct NexiaApi {
    base_url: String,
    access_token: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
}

impl NexiaApi {
    pub fn new(base_url: &str) -> NexiaApi {
        return NexiaApi {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: None,
            client: reqwest::Client::new(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        };
    }

    pub fn with_access_token(mut self, token: &str) -> NexiaApi {
        if token.is_empty() {
            self.access_token = None;
        } else {
            self.access_token = Some(token.to_string());
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> NexiaApi {
        self.timeout = timeout;
        self
    }

    /// Builds a client from the loaded [`Config`].
    pub fn from_config() -> ApiResult<NexiaApi> {
        return NexiaApi::from_settings(
            &Config::get(ConfigKey::ApiUrl),
            &Config::get(ConfigKey::AccessToken),
            &Config::get(ConfigKey::RequestTimeout),
        );
    }

    pub fn from_settings(base_url: &str, access_token: &str, timeout_ms: &str) -> ApiResult<NexiaApi> {
        if base_url.is_empty() {
            return Err(ApiError::config("api-url is not defined"));
        }

        let timeout = timeout_ms.parse::<u64>().map_err(|_| {
            ApiError::config(format!(
                "request-timeout must be a number of milliseconds, got '{timeout_ms}'"
            ))
        })?;

        return Ok(NexiaApi::new(base_url)
            .with_access_token(access_token)
            .with_timeout(Duration::from_millis(timeout)));
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health_check(&self) -> ApiResult<()> {
        let url = self.url("/health");
        let res = self.send(&url, self.client.get(&url)).await?;
        check_status(res).await?;

        return Ok(());
    }

    /// Runs `code` on the server.
    pub async fn execute(&self, code: &str) -> ApiResult<ExecuteResponse> {
        let url = self.url("/execute");
        let req = self.client.post(&url).json(&ExecuteRequest::new(code));
        let res = self.send(&url, req).await?;

        return decode(check_status(res).await?).await;
    }

    /// Records a submission of `code` for an exercise.
    pub async fn submit_exercise(
        &self,
        exercise_id: &str,
        code: &str,
    ) -> ApiResult<SubmissionResponse> {
        let url = self.url(&format!("/exercises/{exercise_id}/submit"));
        let req = self.client.post(&url).json(&SubmissionRequest {
            code: code.to_string(),
        });
        let res = self.send(&url, req).await?;

        return decode(check_status(res).await?).await;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, url: &str, req: RequestBuilder) -> ApiResult<Response> {
        let mut req = req.timeout(self.timeout);
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }

        return req.send().await.map_err(|err| {
            tracing::error!(error = ?err, url = url, "backend is not reachable");
            ApiError::unreachable(url, err.to_string())
        });
    }
}

async fn check_status(res: Response) -> ApiResult<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    tracing::error!(status = status.as_u16(), body = %body, "backend request failed");

    return Err(ApiError::Status {
        status: status.as_u16(),
        body,
    });
}

async fn decode<T: DeserializeOwned>(res: Response) -> ApiResult<T> {
    let body = res
        .text()
        .await
        .map_err(|err| ApiError::decode(err.to_string()))?;

    return serde_json::from_str::<T>(&body).map_err(|err| ApiError::decode(err.to_string()));
}
