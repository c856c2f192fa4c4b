//! Provider client seam

use crate::classification::{ClassificationRequest, ClassificationResult};
use crate::error::ClassifyResult;
use async_trait::async_trait;
use quire_config::ProviderId;

/// A backend that can classify one note per call
///
/// Implementations perform exactly one network call per `classify` (no
/// internal retries), enforce their own timeout, and map every failure into
/// the [`ClassifyError`](crate::ClassifyError) taxonomy so the orchestrator
/// can decide whether to retry.
#[async_trait]
pub trait ClassificationProvider: Send + Sync {
    /// Classify the request into the strict result shape
    async fn classify(&self, request: &ClassificationRequest) -> ClassifyResult<ClassificationResult>;

    /// Which backend this is
    fn provider_id(&self) -> ProviderId;

    /// Model used for requests
    fn model_id(&self) -> &str;
}
