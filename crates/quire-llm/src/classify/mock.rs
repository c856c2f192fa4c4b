//! Mock classification provider for testing
//!
//! Lets orchestrator and pipeline tests run without API keys or network calls.
//! Every call is counted and its request recorded, so tests can assert on
//! exactly how many provider calls a code path made.

use async_trait::async_trait;
use quire_config::ProviderId;
use quire_core::{
    ClassificationProvider, ClassificationRequest, ClassificationResult, ClassifyError,
    ClassifyResult,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

type ResponseFn = dyn Fn(&ClassificationRequest) -> ClassifyResult<ClassificationResult> + Send + Sync;

enum Behavior {
    /// Pop responses in order; the last one repeats once the script runs out
    Script(Mutex<VecDeque<ClassifyResult<ClassificationResult>>>),
    Function(Box<ResponseFn>),
}

/// Scriptable [`ClassificationProvider`]
///
/// Clones share call history.
#[derive(Clone)]
pub struct MockClassifier {
    behavior: Arc<Behavior>,
    provider: ProviderId,
    model: String,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<ClassificationRequest>>>,
}

impl MockClassifier {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior: Arc::new(behavior),
            provider: ProviderId::OpenAI,
            model: "mock-classifier".to_string(),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always return `result`
    pub fn returning(result: ClassificationResult) -> Self {
        Self::scripted(vec![Ok(result)])
    }

    /// Always fail with `error`
    pub fn failing(error: ClassifyError) -> Self {
        Self::scripted(vec![Err(error)])
    }

    /// Return responses in order, repeating the last one when exhausted
    pub fn scripted(responses: Vec<ClassifyResult<ClassificationResult>>) -> Self {
        Self::with_behavior(Behavior::Script(Mutex::new(responses.into())))
    }

    /// Compute each response from the request
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&ClassificationRequest) -> ClassifyResult<ClassificationResult> + Send + Sync + 'static,
    {
        Self::with_behavior(Behavior::Function(Box::new(f)))
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report a different model id
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Report a different provider id
    pub fn with_provider(mut self, provider: ProviderId) -> Self {
        self.provider = provider;
        self
    }

    /// Number of `classify` calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, in call order
    pub fn requests(&self) -> Vec<ClassificationRequest> {
        lock(&self.requests).clone()
    }

    fn next_response(&self, request: &ClassificationRequest) -> ClassifyResult<ClassificationResult> {
        match self.behavior.as_ref() {
            Behavior::Function(f) => f(request),
            Behavior::Script(script) => {
                let mut script = lock(script);
                if script.len() > 1 {
                    script
                        .pop_front()
                        .unwrap_or_else(|| Err(ClassifyError::parse("mock script is empty")))
                } else {
                    script
                        .front()
                        .cloned()
                        .unwrap_or_else(|| Err(ClassifyError::parse("mock script is empty")))
                }
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ClassificationProvider for MockClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> ClassifyResult<ClassificationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.next_response(request)
    }

    fn provider_id(&self) -> ProviderId {
        self.provider
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
