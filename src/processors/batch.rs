//! Batch orchestration over a bounded pool of file tasks

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{error, info, warn};

use crate::core::cancel::CancelToken;
use crate::core::client::{RetryingTranslator, TranslationService};
use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslationError};
use crate::core::models::{BatchReport, FileFailure, TranslationOutcome, TranslationTarget};
use crate::core::progress::ProgressSink;
use crate::processors::discovery::TargetDiscovery;
use crate::processors::xml::XmlFileTranslator;

/// Runs the file translator over every discovered target
#[derive(Debug, Clone)]
pub struct BatchTranslator {
    discovery: TargetDiscovery,
    files: XmlFileTranslator,
    max_workers: usize,
    sink: ProgressSink,
}

type Joined = std::result::Result<(Id, TranslationOutcome), JoinError>;

impl BatchTranslator {
    /// Assemble a batch from its parts; `max_workers` is clamped to at least 1
    pub fn new(
        discovery: TargetDiscovery,
        files: XmlFileTranslator,
        max_workers: usize,
        sink: ProgressSink,
    ) -> Self {
        Self {
            discovery,
            files,
            max_workers: max_workers.max(1),
            sink,
        }
    }

    /// Build the whole pipeline from configuration
    pub fn from_config(
        config: &TranslatorConfig,
        service: Arc<dyn TranslationService>,
        sink: ProgressSink,
    ) -> Self {
        let translator = RetryingTranslator::from_config(service, config);
        Self::new(
            TargetDiscovery::from_config(config),
            XmlFileTranslator::new(translator),
            config.max_workers,
            sink,
        )
    }

    /// Translate every target under `root`
    ///
    /// Only a discovery failure is returned as an error; per-file failures
    /// are collected in the report.
    pub async fn translate_directory(
        &self,
        root: &Path,
        src: &str,
        dest: &str,
        cancel: &CancelToken,
    ) -> Result<BatchReport> {
        let targets = self.discover_blocking(root, cancel).await?;
        let total = targets.len();
        let mut report = BatchReport::new(total);

        info!(
            "Translating {} files from {} to {} with {} workers",
            total, src, dest, self.max_workers
        );
        self.sink.info(format!("Found {} files to translate", total));

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = JoinSet::new();
        let mut paths: HashMap<Id, PathBuf> = HashMap::new();

        for (index, target) in targets.into_iter().enumerate() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| TranslationError::InternalError(e.to_string()))?;

            while let Some(joined) = tasks.try_join_next_with_id() {
                self.record_joined(&mut report, &mut paths, joined);
            }

            if cancel.is_cancelled() {
                report.record(&TranslationOutcome::Skipped { target });
                continue;
            }

            let path = target.path().to_path_buf();
            let files = self.files.clone();
            let sink = self.sink.clone();
            let src = src.to_string();
            let dest = dest.to_string();

            let handle = tasks.spawn(async move {
                let _permit = permit;
                files
                    .translate_file(&target, &src, &dest, index, total, &sink)
                    .await
            });
            paths.insert(handle.id(), path);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            self.record_joined(&mut report, &mut paths, joined);
        }

        if report.skipped > 0 {
            warn!("Cancelled, {} files skipped", report.skipped);
            self.sink
                .warn(format!("Cancelled: {} of {} files skipped", report.skipped, total));
        }

        info!(
            "Batch finished: {} succeeded, {} failed, {} skipped",
            report.succeeded, report.failed, report.skipped
        );
        self.sink.success("All translations complete.");

        Ok(report)
    }

    /// Walk the tree off the async workers; the walk is synchronous IO
    async fn discover_blocking(
        &self,
        root: &Path,
        cancel: &CancelToken,
    ) -> Result<Vec<TranslationTarget>> {
        let discovery = self.discovery.clone();
        let root = root.to_path_buf();
        let cancel = cancel.clone();

        tokio::task::spawn_blocking(move || discovery.discover(&root, &cancel))
            .await
            .map_err(|e| TranslationError::InternalError(format!("Discovery task failed: {}", e)))?
    }

    fn record_joined(
        &self,
        report: &mut BatchReport,
        paths: &mut HashMap<Id, PathBuf>,
        joined: Joined,
    ) {
        match joined {
            Ok((id, outcome)) => {
                paths.remove(&id);
                report.record(&outcome);
            }
            Err(e) => {
                let path = paths.remove(&e.id()).unwrap_or_default();
                error!("File task aborted: {} - {}", path.display(), e);
                self.sink
                    .error(format!("File task aborted: {} - {}", path.display(), e));
                report.failed += 1;
                report.failures.push(FileFailure {
                    path,
                    message: e.to_string(),
                });
            }
        }
    }

    /// Run a batch and close the progress stream whatever happens
    pub async fn run(
        &self,
        root: &Path,
        src: &str,
        dest: &str,
        cancel: &CancelToken,
    ) -> Result<BatchReport> {
        self.sink.info("Starting translation...");

        let result = self.translate_directory(root, src, dest, cancel).await;
        if let Err(e) = &result {
            error!("Translation aborted: {}", e);
            self.sink.error(format!("Translation aborted: {}", e));
        }

        self.sink.finish();
        result
    }
}
