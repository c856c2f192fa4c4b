//! Per-note decisions and run accounting

use crate::classification::ClassificationResult;
use crate::error::ClassifyError;
use serde::{Deserialize, Serialize};

/// Where a classification result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationSource {
    /// Reloaded from the cache store
    Cache,
    /// Returned by a provider call in this run
    Fresh,
    /// No result was obtained
    None,
}

/// How the category decision was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationOutcome {
    /// A result passed the confidence gate with a valid slug
    Classified,
    /// A result was obtained but policy made it undecided
    UndecidedPolicy,
    /// No usable result could be obtained
    UndecidedError,
    /// Run cancelled before a decision; the note was not touched
    Cancelled,
}

/// Private diagnostics recorded on every decided note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationDiagnostics {
    /// Raw model confidence
    pub confidence: Option<f64>,
    /// Raw model reasoning
    pub reasoning: Option<String>,
    /// Provider id
    pub provider: String,
    /// Model id
    pub model: String,
    /// Raw suggestions as returned
    pub suggestions: Vec<String>,
    /// Cache, fresh call, or nothing
    pub source: ClassificationSource,
    /// Decision path
    pub outcome: ClassificationOutcome,
    /// Error message when the outcome is an error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Orchestrator output for one note
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationDecision {
    /// Category applied to the note (may be `other` via policy)
    pub category: Option<String>,
    /// Decision path
    pub outcome: ClassificationOutcome,
    /// Where the raw result came from
    pub source: ClassificationSource,
    /// Raw result, if any
    pub result: Option<ClassificationResult>,
    /// Suggestions after dedup and truncation
    pub suggestions: Vec<String>,
    /// Normalized free-form tags
    pub llm_tags: Vec<String>,
    /// Last error when no result could be obtained
    pub error: Option<ClassifyError>,
    /// Provider calls made for this note
    pub attempts: u32,
    /// Provider id
    pub provider: String,
    /// Model id
    pub model: String,
}

impl ClassificationDecision {
    /// A decision for a note that was never classified due to cancellation
    pub fn cancelled(provider: impl Into<String>, model: impl Into<String>, attempts: u32) -> Self {
        Self {
            category: None,
            outcome: ClassificationOutcome::Cancelled,
            source: ClassificationSource::None,
            result: None,
            suggestions: Vec::new(),
            llm_tags: Vec::new(),
            error: None,
            attempts,
            provider: provider.into(),
            model: model.into(),
        }
    }

    /// Whether the note was left untouched
    pub fn is_cancelled(&self) -> bool {
        self.outcome == ClassificationOutcome::Cancelled
    }

    /// Diagnostics object for `metadata._classification`
    pub fn diagnostics(&self) -> ClassificationDiagnostics {
        ClassificationDiagnostics {
            confidence: self.result.as_ref().map(|r| r.confidence),
            reasoning: self.result.as_ref().map(|r| r.reasons.clone()),
            provider: self.provider.clone(),
            model: self.model.clone(),
            suggestions: self
                .result
                .as_ref()
                .map(|r| r.suggestions.clone())
                .unwrap_or_default(),
            source: self.source,
            outcome: self.outcome,
            error: self.error.as_ref().map(ToString::to_string),
        }
    }
}

/// Per-note outcome reported at the end of a run
#[derive(Debug, Clone, PartialEq)]
pub enum NoteOutcome {
    /// Confident category assigned
    Classified {
        /// Assigned slug
        category: String,
        /// Result origin
        source: ClassificationSource,
    },
    /// Undecided because of confidence or the model's own answer
    UndecidedPolicy {
        /// `other` under the `other` policy, else `None`
        category: Option<String>,
        /// Result origin
        source: ClassificationSource,
    },
    /// Undecided because no result could be obtained
    UndecidedError {
        /// `other` under the `other` policy, else `None`
        category: Option<String>,
        /// Final error message
        error: String,
    },
    /// Not classified because the run was cancelled
    Cancelled,
    /// Classification is disabled for this run
    Skipped,
    /// Processing stopped partway; the note never reached the sink
    Failed {
        /// What went wrong
        error: String,
    },
}

impl NoteOutcome {
    /// Summarize an orchestrator decision
    pub fn from_decision(decision: &ClassificationDecision) -> Self {
        match decision.outcome {
            ClassificationOutcome::Classified => match &decision.category {
                Some(category) => Self::Classified {
                    category: category.clone(),
                    source: decision.source,
                },
                None => Self::UndecidedPolicy {
                    category: None,
                    source: decision.source,
                },
            },
            ClassificationOutcome::UndecidedPolicy => Self::UndecidedPolicy {
                category: decision.category.clone(),
                source: decision.source,
            },
            ClassificationOutcome::UndecidedError => Self::UndecidedError {
                category: decision.category.clone(),
                error: decision
                    .error
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            },
            ClassificationOutcome::Cancelled => Self::Cancelled,
        }
    }

    /// Category applied to the note, if any
    pub fn category(&self) -> Option<&str> {
        match self {
            Self::Classified { category, .. } => Some(category),
            Self::UndecidedPolicy { category, .. } | Self::UndecidedError { category, .. } => {
                category.as_deref()
            }
            Self::Cancelled | Self::Skipped | Self::Failed { .. } => None,
        }
    }

    /// Result origin, if a result was obtained
    pub fn source(&self) -> Option<ClassificationSource> {
        match self {
            Self::Classified { source, .. } | Self::UndecidedPolicy { source, .. } => Some(*source),
            _ => None,
        }
    }

    /// Check if a confident category was assigned
    pub fn is_classified(&self) -> bool {
        matches!(self, Self::Classified { .. })
    }

    /// Check if the note ended undecided for any reason
    pub fn is_undecided(&self) -> bool {
        matches!(
            self,
            Self::UndecidedPolicy { .. } | Self::UndecidedError { .. }
        )
    }
}

/// Counts reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Notes read from the source
    pub total: usize,
    /// Notes with a confident category
    pub classified: usize,
    /// Notes undecided by policy
    pub undecided_policy: usize,
    /// Notes undecided because classification failed
    pub undecided_error: usize,
    /// Notes not classified due to cancellation
    pub cancelled: usize,
    /// Notes passed through with classification disabled
    pub skipped: usize,
    /// Results served from the cache
    pub served_from_cache: usize,
    /// Results obtained from a provider call
    pub fresh_requests: usize,
    /// Notes whose provider calls all failed
    pub failed_requests: usize,
    /// Notes lost partway through processing
    pub failed: usize,
    /// Notes the sink refused
    pub sink_errors: usize,
    /// Source records that could not be read
    pub source_errors: usize,
}

impl RunSummary {
    /// Create an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one note's outcome
    pub fn record(&mut self, outcome: &NoteOutcome) {
        self.total += 1;
        match outcome {
            NoteOutcome::Classified { .. } => self.classified += 1,
            NoteOutcome::UndecidedPolicy { .. } => self.undecided_policy += 1,
            NoteOutcome::UndecidedError { .. } => {
                self.undecided_error += 1;
                self.failed_requests += 1;
            }
            NoteOutcome::Cancelled => self.cancelled += 1,
            NoteOutcome::Skipped => self.skipped += 1,
            NoteOutcome::Failed { .. } => self.failed += 1,
        }
        match outcome.source() {
            Some(ClassificationSource::Cache) => self.served_from_cache += 1,
            Some(ClassificationSource::Fresh) => self.fresh_requests += 1,
            _ => {}
        }
    }

    /// Count a sink failure
    pub fn record_sink_error(&mut self) {
        self.sink_errors += 1;
    }

    /// Count an unreadable source record
    pub fn record_source_error(&mut self) {
        self.source_errors += 1;
    }
}
