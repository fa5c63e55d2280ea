//! Scripted in-memory model service for tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{GenerativeService, Generation, ModelInfo, PromptFeedback};
use crate::error::RemoteError;
use crate::invoker::SafetySettings;
use crate::types::{ProcessingState, RemoteAsset, RequestPayload};

/// What the next generate call returns.
#[derive(Debug, Clone)]
pub(crate) enum GenerateOutcome {
    Text(String),
    Quota,
    Api(String),
    Blocked(PromptFeedback),
}

pub(crate) struct FakeService {
    states: Mutex<HashMap<String, VecDeque<ProcessingState>>>,
    failing_uploads: Mutex<HashSet<String>>,
    outcome: Mutex<GenerateOutcome>,

    pub uploads: Mutex<Vec<String>>,
    pub staged: Mutex<Vec<(PathBuf, bool)>>,
    pub polls: Mutex<Vec<String>>,
    pub generated: Mutex<Vec<(RequestPayload, SafetySettings)>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            failing_uploads: Mutex::new(HashSet::new()),
            outcome: Mutex::new(GenerateOutcome::Text("## Strategy Report".to_string())),
            uploads: Mutex::new(Vec::new()),
            staged: Mutex::new(Vec::new()),
            polls: Mutex::new(Vec::new()),
            generated: Mutex::new(Vec::new()),
        }
    }

    /// States reported for `name`: the first on upload, the rest on each
    /// poll. The last state repeats.
    pub fn with_states(self, name: &str, states: &[ProcessingState]) -> Self {
        self.states
            .lock()
            .unwrap()
            .insert(name.to_string(), states.iter().copied().collect());
        self
    }

    pub fn with_failing_upload(self, name: &str) -> Self {
        self.failing_uploads.lock().unwrap().insert(name.to_string());
        self
    }

    pub fn with_outcome(self, outcome: GenerateOutcome) -> Self {
        *self.outcome.lock().unwrap() = outcome;
        self
    }

    pub fn generate_calls(&self) -> usize {
        self.generated.lock().unwrap().len()
    }

    pub fn last_payload(&self) -> Option<RequestPayload> {
        self.generated.lock().unwrap().last().map(|(p, _)| p.clone())
    }

    fn next_state(&self, name: &str) -> ProcessingState {
        let mut states = self.states.lock().unwrap();
        match states.get_mut(name) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(ProcessingState::Ready),
            Some(queue) => queue.front().copied().unwrap_or(ProcessingState::Ready),
            None => ProcessingState::Ready,
        }
    }

    fn asset(name: &str, state: ProcessingState) -> RemoteAsset {
        RemoteAsset {
            reference_id: format!("files/{}", name),
            uri: format!("https://files.test/{}", name),
            mime_type: "application/octet-stream".to_string(),
            processing_state: state,
        }
    }
}

#[async_trait]
impl GenerativeService for FakeService {
    async fn upload_file(
        &self,
        path: &Path,
        _mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteAsset, RemoteError> {
        self.staged
            .lock()
            .unwrap()
            .push((path.to_path_buf(), path.exists()));
        self.uploads.lock().unwrap().push(display_name.to_string());

        if self.failing_uploads.lock().unwrap().contains(display_name) {
            return Err(RemoteError::Api {
                status: 500,
                message: "upload rejected".to_string(),
            });
        }

        Ok(Self::asset(display_name, self.next_state(display_name)))
    }

    async fn get_file(&self, reference_id: &str) -> Result<RemoteAsset, RemoteError> {
        let name = reference_id.trim_start_matches("files/");
        self.polls.lock().unwrap().push(name.to_string());
        Ok(Self::asset(name, self.next_state(name)))
    }

    async fn generate(
        &self,
        payload: &RequestPayload,
        safety: &SafetySettings,
    ) -> Result<Generation, RemoteError> {
        self.generated
            .lock()
            .unwrap()
            .push((payload.clone(), safety.clone()));

        match self.outcome.lock().unwrap().clone() {
            GenerateOutcome::Text(text) => Ok(Generation {
                text: Some(text),
                finish_reason: Some("STOP".to_string()),
                feedback: None,
            }),
            GenerateOutcome::Quota => Err(RemoteError::QuotaExceeded {
                message: "Resource has been exhausted".to_string(),
            }),
            GenerateOutcome::Api(message) => Err(RemoteError::Api { status: 500, message }),
            GenerateOutcome::Blocked(feedback) => Ok(Generation {
                text: None,
                finish_reason: None,
                feedback: Some(feedback),
            }),
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, RemoteError> {
        Ok(vec![
            ModelInfo {
                name: "models/gemini-2.5-flash".to_string(),
                display_name: Some("Gemini 2.5 Flash".to_string()),
                supported_generation_methods: vec!["generateContent".to_string()],
            },
            ModelInfo {
                name: "models/text-embedding-004".to_string(),
                display_name: None,
                supported_generation_methods: vec!["embedContent".to_string()],
            },
        ])
    }
}
