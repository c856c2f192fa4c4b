//! Note Processing Pipeline Driver
//!
//! ## Per-note sequence
//!
//! 1. **Classify**: cache lookup, provider call with retry, policy
//! 2. **Propagate tags**: category slug, suggestions, model tags
//! 3. **Heuristic stages**: e.g. the tag folder heuristic
//! 4. **Resolve folder**: the category overrides heuristic folders
//! 5. **Finalize**: render the tag set into `metadata.tags`
//!
//! Classification runs first so the heuristic stages can see its tags.
//!
//! ## Scheduling
//!
//! ```text
//! source ──> feeder ──> job queue ──> N workers ──> results ──> resequencer ──> sink
//! ```
//!
//! `llm_concurrency` workers share one job queue. Each worker takes a note
//! through the whole sequence before taking the next one, so no note is seen
//! by the sink half processed. Results are reordered to source order before
//! handoff, so the sink sees the same order for any concurrency and any
//! completion order.
//!
//! ## Failure handling
//!
//! Nothing a single note does aborts the run. Classification failures become
//! undecided outcomes, sink failures and unreadable source records are
//! counted. Cancellation stops new provider calls; the remaining notes are
//! still handed to the sink and reported as cancelled. A note whose worker
//! dies mid-way is reported as failed in its input position.

use crate::resequence::Resequencer;
use anyhow::{Context, Result};
use quire_config::{ClassifierConfig, CredentialSource};
use quire_core::{
    ClassificationProvider, Note, NoteOutcome, NoteSink, NoteSource, NoteStage, RunSummary,
};
use quire_enrichment::{
    create_category_classifier, CategoryClassifier, FolderResolver, TagFolderHeuristic,
    TagPropagator,
};
use quire_llm::create_classification_provider;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Everything a run reports
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Per-note outcomes in source order
    pub outcomes: Vec<(String, NoteOutcome)>,
    /// Aggregate counts
    pub summary: RunSummary,
}

impl RunReport {
    /// Outcome for a note id
    pub fn outcome(&self, note_id: &str) -> Option<&NoteOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id == note_id)
            .map(|(_, outcome)| outcome)
    }
}

/// Per-note work shared by all workers
#[derive(Clone)]
struct NoteProcessor {
    classifier: Option<Arc<CategoryClassifier>>,
    tags: TagPropagator,
    stages: Vec<Arc<dyn NoteStage>>,
    folder: FolderResolver,
}

impl NoteProcessor {
    async fn process(&self, mut note: Note, cancel: &CancellationToken) -> (Note, NoteOutcome) {
        let outcome = match &self.classifier {
            Some(classifier) => {
                let decision = classifier.classify_note(&mut note, cancel).await;
                if decision.is_cancelled() {
                    note.finalize_metadata();
                    return (note, NoteOutcome::Cancelled);
                }
                self.tags.apply(&mut note, &decision);
                NoteOutcome::from_decision(&decision)
            }
            None => NoteOutcome::Skipped,
        };

        for stage in &self.stages {
            stage.apply(&mut note);
        }
        self.folder.apply(&mut note);
        note.finalize_metadata();

        (note, outcome)
    }
}

/// Drives notes from a source through classification into a sink
///
/// # Architecture
///
/// ```text
/// NotePipeline
///   ├─> CategoryClassifier (optional; absent when classification is disabled)
///   ├─> TagPropagator
///   ├─> NoteStage heuristics
///   └─> FolderResolver
/// ```
///
/// Clones share the classifier and its cache.
#[derive(Clone)]
pub struct NotePipeline {
    processor: Arc<NoteProcessor>,
    concurrency: usize,
}

impl NotePipeline {
    /// Create a pipeline around an existing classifier
    ///
    /// Pass `None` to run only the appliers and stages.
    pub fn new(classifier: Option<CategoryClassifier>, config: &ClassifierConfig) -> Self {
        let heuristic: Arc<dyn NoteStage> = Arc::new(TagFolderHeuristic::from_config(config));
        Self {
            processor: Arc::new(NoteProcessor {
                classifier: classifier.map(Arc::new),
                tags: TagPropagator::from_config(config),
                stages: vec![heuristic],
                folder: FolderResolver::from_config(config),
            }),
            concurrency: config.effective_concurrency(),
        }
    }

    /// Build a pipeline from configuration, resolving the provider credential
    ///
    /// Fails before any network call when the provider id is unknown or a
    /// required API key cannot be resolved. With classification disabled no
    /// provider is built and no key is needed.
    pub async fn from_config(
        config: &ClassifierConfig,
        credentials: &dyn CredentialSource,
    ) -> Result<Self> {
        for warning in config.validate() {
            warn!(warning = %warning, "Configuration warning");
        }

        if !config.enable_llm_categorization {
            info!("LLM categorization disabled; notes pass through unclassified");
            return Ok(Self::new(None, config));
        }

        let provider = create_classification_provider(config, credentials)
            .context("Failed to create classification provider")?;
        Self::with_provider(config, provider).await
    }

    /// Build a pipeline with an explicit provider
    pub async fn with_provider(
        config: &ClassifierConfig,
        provider: Arc<dyn ClassificationProvider>,
    ) -> Result<Self> {
        let classifier = create_category_classifier(config, provider)
            .await
            .context("Failed to create category classifier")?;
        Ok(Self::new(Some(classifier), config))
    }

    /// Append a heuristic stage; stages run in the order added
    ///
    /// Stages run after tag propagation and before the folder resolver.
    /// Other clones of this pipeline keep their own stage list.
    pub fn with_stage(mut self, stage: Arc<dyn NoteStage>) -> Self {
        Arc::make_mut(&mut self.processor).stages.push(stage);
        self
    }

    /// Override the worker count (minimum 1)
    pub fn with_concurrency(mut self, workers: usize) -> Self {
        self.concurrency = workers.max(1);
        self
    }

    /// Whether notes are classified
    pub fn is_classifying(&self) -> bool {
        self.processor.classifier.is_some()
    }

    /// Process every note from `source` and hand it to `sink` in source order
    pub async fn run(
        &self,
        source: &mut dyn NoteSource,
        sink: &dyn NoteSink,
        cancel: &CancellationToken,
    ) -> Result<RunReport> {
        info!(
            workers = self.concurrency,
            classifying = self.is_classifying(),
            expected = ?source.size_hint(),
            sink = sink.name(),
            "Starting classification run"
        );

        let (job_tx, job_rx) = mpsc::channel::<(usize, Note)>(self.concurrency * 2);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<(usize, Note, NoteOutcome)>();

        let workers: Vec<_> = (0..self.concurrency)
            .map(|worker| {
                let jobs = Arc::clone(&job_rx);
                let results = result_tx.clone();
                let processor = Arc::clone(&self.processor);
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    loop {
                        let job = jobs.lock().await.recv().await;
                        let Some((position, note)) = job else {
                            break;
                        };
                        debug!(worker, note_id = %note.id, "Processing note");
                        let (note, outcome) = processor.process(note, &cancel).await;
                        if results.send((position, note, outcome)).is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();
        drop(job_rx);
        drop(result_tx);

        let feeder = async move {
            let mut fed_ids = Vec::new();
            let mut source_errors = 0usize;
            let mut workers_gone = false;
            loop {
                match source.next_note().await {
                    Ok(Some(note)) => {
                        let note_id = note.id.clone();
                        if !workers_gone && job_tx.send((fed_ids.len(), note)).await.is_err() {
                            error!("All workers stopped; remaining notes will be reported as failed");
                            workers_gone = true;
                        }
                        fed_ids.push(note_id);
                    }
                    Ok(None) => break,
                    Err(e) if e.is_recoverable() => {
                        source_errors += 1;
                        warn!(error = %e, "Skipping unreadable note");
                    }
                    Err(e) => {
                        source_errors += 1;
                        error!(error = %e, "Note source failed; stopping intake");
                        break;
                    }
                }
            }
            (fed_ids, source_errors)
        };

        let consumer = async {
            let mut report = RunReport::default();
            let mut order = Resequencer::new();
            while let Some((position, note, outcome)) = result_rx.recv().await {
                for (note, outcome) in order.push(position, (note, outcome)) {
                    deliver(sink, note, outcome, &mut report).await;
                }
            }
            (report, order)
        };

        let ((fed_ids, source_errors), (mut report, mut order)) = tokio::join!(feeder, consumer);
        report.summary.source_errors = source_errors;

        let mut worker_failure = None;
        for (worker, joined) in futures::future::join_all(workers).await.into_iter().enumerate() {
            if let Err(e) = joined {
                error!(worker, error = %e, "Classification worker failed");
                worker_failure = Some(e.to_string());
            }
        }

        for slot in order.finish(fed_ids.len()) {
            match slot {
                Ok((note, outcome)) => deliver(sink, note, outcome, &mut report).await,
                Err(position) => {
                    let note_id = fed_ids.get(position).cloned().unwrap_or_default();
                    let error = worker_failure
                        .clone()
                        .unwrap_or_else(|| "worker stopped before finishing".to_string());
                    error!(note_id = %note_id, error = %error, "Note lost during processing");
                    let outcome = NoteOutcome::Failed { error };
                    report.summary.record(&outcome);
                    report.outcomes.push((note_id, outcome));
                }
            }
        }

        if let Some(classifier) = &self.processor.classifier {
            if let Err(e) = classifier.cache().flush().await {
                warn!(error = %e, "Cache flush failed");
            }
        }
        if let Err(e) = sink.flush().await {
            report.summary.record_sink_error();
            warn!(sink = sink.name(), kind = e.category(), error = %e, "Sink flush failed");
        }

        let s = &report.summary;
        info!(
            total = s.total,
            classified = s.classified,
            undecided_policy = s.undecided_policy,
            undecided_error = s.undecided_error,
            cancelled = s.cancelled,
            skipped = s.skipped,
            lost = s.failed,
            from_cache = s.served_from_cache,
            fresh = s.fresh_requests,
            failed = s.failed_requests,
            sink_errors = s.sink_errors,
            source_errors = s.source_errors,
            "Classification run finished"
        );

        Ok(report)
    }
}

async fn deliver(sink: &dyn NoteSink, note: Note, outcome: NoteOutcome, report: &mut RunReport) {
    report.summary.record(&outcome);
    let note_id = note.id.clone();
    if let Err(e) = sink.write(note).await {
        report.summary.record_sink_error();
        warn!(note_id = %note_id, sink = sink.name(), kind = e.category(), error = %e, "Sink rejected note");
    }
    report.outcomes.push((note_id, outcome));
}
