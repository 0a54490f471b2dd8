#[cfg(test)]
use crate::api::{ApiError, ModelDescriptor, ModelDetails, ModelRegistry};
#[cfg(test)]
use crate::core::message::Message;
#[cfg(test)]
use crate::core::storage::StateStorage;
#[cfg(test)]
use crate::core::store::{SessionState, SessionStore};
#[cfg(test)]
use async_trait::async_trait;
#[cfg(test)]
use std::collections::{HashMap, VecDeque};
#[cfg(test)]
use std::sync::{Arc, Mutex};

/// Recorded `chat_completion` call: base url, model, messages.
#[cfg(test)]
pub type CompletionCall = (String, String, Vec<Message>);

/// Scripted [`ModelRegistry`] for store and conversation tests.
#[cfg(test)]
#[derive(Default)]
pub struct FakeRegistry {
    models: Mutex<HashMap<String, Result<Vec<ModelDescriptor>, u16>>>,
    replies: Mutex<VecDeque<Result<String, u16>>>,
    completions: Mutex<Vec<CompletionCall>>,
    listed: Mutex<Vec<String>>,
    deleted: Mutex<Vec<(String, String)>>,
    list_barrier: Option<Arc<tokio::sync::Barrier>>,
    list_gate: Option<ListGate>,
}

/// Holds `list_models` mid-request until the test releases it.
#[cfg(test)]
#[derive(Default)]
struct ListGate {
    entered: tokio::sync::Notify,
    release: tokio::sync::Notify,
}

#[cfg(test)]
impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `list_models` call waits until `parties` calls are in flight.
    pub fn with_list_barrier(parties: usize) -> Self {
        Self {
            list_barrier: Some(Arc::new(tokio::sync::Barrier::new(parties))),
            ..Self::default()
        }
    }

    /// Every `list_models` call parks after recording its url until
    /// [`release_list`](Self::release_list) is called.
    pub fn with_list_gate() -> Self {
        Self {
            list_gate: Some(ListGate::default()),
            ..Self::default()
        }
    }

    /// Resolves once a gated `list_models` call is in flight.
    pub async fn wait_for_list(&self) {
        if let Some(gate) = &self.list_gate {
            gate.entered.notified().await;
        }
    }

    pub fn release_list(&self) {
        if let Some(gate) = &self.list_gate {
            gate.release.notify_one();
        }
    }

    pub fn set_models(&self, base_url: &str, models: Vec<ModelDescriptor>) {
        self.models
            .lock()
            .unwrap()
            .insert(base_url.to_string(), Ok(models));
    }

    pub fn fail_models(&self, base_url: &str, status: u16) {
        self.models
            .lock()
            .unwrap()
            .insert(base_url.to_string(), Err(status));
    }

    pub fn push_reply(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(Ok(reply.to_string()));
    }

    pub fn push_failure(&self, status: u16) {
        self.replies.lock().unwrap().push_back(Err(status));
    }

    pub fn completions(&self) -> Vec<CompletionCall> {
        self.completions.lock().unwrap().clone()
    }

    pub fn listed(&self) -> Vec<String> {
        self.listed.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.lock().unwrap().clone()
    }

    fn status_error(endpoint: &str, status: u16) -> ApiError {
        ApiError::Status {
            endpoint: endpoint.to_string(),
            status,
            body: "scripted failure".to_string(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl ModelRegistry for FakeRegistry {
    async fn list_models(&self, base_url: &str) -> Result<Vec<ModelDescriptor>, ApiError> {
        self.listed.lock().unwrap().push(base_url.to_string());
        if let Some(barrier) = &self.list_barrier {
            barrier.wait().await;
        }
        if let Some(gate) = &self.list_gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        let scripted = self.models.lock().unwrap().get(base_url).cloned();
        match scripted {
            Some(Ok(models)) => Ok(models),
            Some(Err(status)) => Err(Self::status_error(base_url, status)),
            None => Err(Self::status_error(base_url, 404)),
        }
    }

    async fn chat_completion(
        &self,
        base_url: &str,
        model: &str,
        messages: &[Message],
    ) -> Result<String, ApiError> {
        self.completions.lock().unwrap().push((
            base_url.to_string(),
            model.to_string(),
            messages.to_vec(),
        ));
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(status)) => Err(Self::status_error(base_url, status)),
            None => Err(Self::status_error(base_url, 503)),
        }
    }

    async fn delete_model(&self, base_url: &str, model: &str) -> Result<(), ApiError> {
        self.deleted
            .lock()
            .unwrap()
            .push((base_url.to_string(), model.to_string()));
        Ok(())
    }
}

#[cfg(test)]
pub fn create_test_store(registry: Arc<FakeRegistry>) -> SessionStore {
    SessionStore::new(SessionState::default(), StateStorage::Memory, registry)
}

#[cfg(test)]
pub fn create_test_model(name: &str) -> ModelDescriptor {
    ModelDescriptor {
        name: name.to_string(),
        modified_at: "2024-05-01T10:00:00Z".to_string(),
        size: 4_661_224_676,
        digest: format!("sha256:{name}"),
        details: ModelDetails {
            format: "gguf".to_string(),
            family: "llama".to_string(),
            families: Some(vec!["llama".to_string()]),
            parameter_size: "8.0B".to_string(),
            quantization_level: "Q4_0".to_string(),
        },
    }
}
