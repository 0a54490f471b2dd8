use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::api::{ChatRequest, ChatResponse, DeleteModelRequest, ModelDescriptor, TagsResponse};
use crate::core::message::Message;
use crate::utils::url::construct_api_url;

/// Failures talking to an Ollama server.
#[derive(Debug)]
pub enum ApiError {
    /// The request never produced a response (connection refused, timeout,
    /// undecodable body).
    Transport {
        endpoint: String,
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport { endpoint, source } => {
                write!(f, "Request to {endpoint} failed: {source}")
            }
            ApiError::Status {
                endpoint,
                status,
                body,
            } => {
                let body = body.trim();
                if body.is_empty() {
                    write!(f, "Request to {endpoint} failed with status {status}")
                } else {
                    write!(
                        f,
                        "Request to {endpoint} failed with status {status}: {body}"
                    )
                }
            }
        }
    }
}

impl StdError for ApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ApiError::Transport { source, .. } => Some(source),
            ApiError::Status { .. } => None,
        }
    }
}

/// The request/response collaborator the session store and conversation
/// flow depend on. `base_url` is the joined `"{url}:{port}"` of a server.
#[async_trait]
pub trait ModelRegistry: Send + Sync {
    async fn list_models(&self, base_url: &str) -> Result<Vec<ModelDescriptor>, ApiError>;

    /// Non-streaming completion; returns the assistant reply text.
    async fn chat_completion(
        &self,
        base_url: &str,
        model: &str,
        messages: &[Message],
    ) -> Result<String, ApiError>;

    async fn delete_model(&self, base_url: &str, model: &str) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::new(builder.build()?))
    }

    async fn check_status(
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

fn transport(endpoint: &str) -> impl FnOnce(reqwest::Error) -> ApiError + '_ {
    move |source| ApiError::Transport {
        endpoint: endpoint.to_string(),
        source,
    }
}

#[async_trait]
impl ModelRegistry for OllamaClient {
    async fn list_models(&self, base_url: &str) -> Result<Vec<ModelDescriptor>, ApiError> {
        let endpoint = construct_api_url(base_url, "api/tags");
        debug!(%endpoint, "listing models");

        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(transport(&endpoint))?;
        let response = Self::check_status(&endpoint, response).await?;
        let tags = response
            .json::<TagsResponse>()
            .await
            .map_err(transport(&endpoint))?;
        Ok(tags.models)
    }

    async fn chat_completion(
        &self,
        base_url: &str,
        model: &str,
        messages: &[Message],
    ) -> Result<String, ApiError> {
        let endpoint = construct_api_url(base_url, "api/chat");
        debug!(%endpoint, model, messages = messages.len(), "requesting completion");

        let request = ChatRequest {
            model,
            messages,
            stream: false,
        };
        let response = self
            .client
            .post(&endpoint)
            .json(&request)
            .send()
            .await
            .map_err(transport(&endpoint))?;
        let response = Self::check_status(&endpoint, response).await?;
        let body = response
            .json::<ChatResponse>()
            .await
            .map_err(transport(&endpoint))?;
        Ok(body.message.content)
    }

    async fn delete_model(&self, base_url: &str, model: &str) -> Result<(), ApiError> {
        let endpoint = construct_api_url(base_url, "api/delete");
        debug!(%endpoint, model, "deleting model");

        let response = self
            .client
            .delete(&endpoint)
            .json(&DeleteModelRequest { model })
            .send()
            .await
            .map_err(transport(&endpoint))?;
        Self::check_status(&endpoint, response).await?;
        Ok(())
    }
}
