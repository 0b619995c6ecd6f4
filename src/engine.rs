//! Batch comparison of control/test document pairs.
//!
//! Every pair becomes one `tokio::spawn` task. A semaphore bounds how many
//! run at once, and the parse plus tree walk runs on the blocking pool.
//! Results come back in pair order.

use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::comparator::{ComparisonSettings, TreeComparator};
use crate::document::XmlDocument;
use crate::error::{CompareError, DocumentResult, Result};
use crate::file_discovery::{FileDiscovery, FilePair};
use crate::report::DiffReport;

/// Which side of a pair is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A control document without a test document
    MissingTest,
    /// A test document without a control document
    MissingControl,
}

/// Outcome of comparing one pair
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComparisonStatus {
    /// No differences
    Identical,
    /// At least one difference
    Different { report: DiffReport },
    /// Only one side exists
    Skipped { reason: SkipReason },
    /// One of the documents could not be read or parsed
    Error { message: String },
}

impl ComparisonStatus {
    pub fn is_identical(&self) -> bool {
        matches!(self, ComparisonStatus::Identical)
    }

    pub fn is_different(&self) -> bool {
        matches!(self, ComparisonStatus::Different { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ComparisonStatus::Skipped { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ComparisonStatus::Error { .. })
    }
}

/// Result of comparing a single pair
#[derive(Debug, Clone, Serialize)]
pub struct FileComparisonResult {
    /// Pair name (relative path)
    pub name: String,
    pub control: Option<PathBuf>,
    pub test: Option<PathBuf>,
    pub status: ComparisonStatus,
    /// Time spent parsing and comparing
    pub duration: Duration,
}

impl FileComparisonResult {
    fn skipped(pair: FilePair, reason: SkipReason) -> Self {
        Self {
            name: pair.name,
            control: pair.control,
            test: pair.test,
            status: ComparisonStatus::Skipped { reason },
            duration: Duration::ZERO,
        }
    }
}

/// Aggregated results of a batch
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResults {
    pub total_pairs: usize,
    pub identical: usize,
    pub different: usize,
    pub skipped: usize,
    pub errors: usize,
    /// Wall-clock duration of the batch
    pub total_duration: Duration,
    /// Per-pair results sorted by name
    pub file_results: Vec<FileComparisonResult>,
}

impl ComparisonResults {
    /// Aggregate individual pair results into a summary
    pub fn aggregate(file_results: Vec<FileComparisonResult>, total_duration: Duration) -> Self {
        let mut identical = 0;
        let mut different = 0;
        let mut skipped = 0;
        let mut errors = 0;

        for result in &file_results {
            match result.status {
                ComparisonStatus::Identical => identical += 1,
                ComparisonStatus::Different { .. } => different += 1,
                ComparisonStatus::Skipped { .. } => skipped += 1,
                ComparisonStatus::Error { .. } => errors += 1,
            }
        }

        Self {
            total_pairs: file_results.len(),
            identical,
            different,
            skipped,
            errors,
            total_duration,
            file_results,
        }
    }

    /// Any pair with differences or errors
    pub fn has_failures(&self) -> bool {
        self.different > 0 || self.errors > 0
    }

    /// Share of compared pairs (skips excluded) that were identical, in percent
    pub fn success_rate(&self) -> f64 {
        let compared = self.total_pairs - self.skipped;
        if compared == 0 {
            0.0
        } else {
            (self.identical as f64 / compared as f64) * 100.0
        }
    }
}

/// Runs the comparisons for a whole directory pair
pub struct ComparisonEngine {
    settings: Arc<ComparisonSettings>,
    max_concurrent: usize,
}

impl ComparisonEngine {
    pub fn new(settings: ComparisonSettings, max_concurrent: usize) -> Self {
        Self {
            settings: Arc::new(settings),
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn settings(&self) -> &ComparisonSettings {
        &self.settings
    }

    /// Discover both directories, pair their documents and compare them.
    pub async fn compare_directories(
        &self,
        discovery: &FileDiscovery,
        control_dir: &Path,
        test_dir: &Path,
    ) -> Result<ComparisonResults> {
        for dir in [control_dir, test_dir] {
            if !dir.is_dir() {
                return Err(CompareError::FileSystemTraversal {
                    path: dir.to_path_buf(),
                    reason: "directory does not exist".to_string(),
                });
            }
        }

        let pairs = discovery.discover_pairs(control_dir, test_dir).await?;
        info!(
            control = %control_dir.display(),
            test = %test_dir.display(),
            pairs = pairs.len(),
            "starting comparison"
        );

        let start = Instant::now();
        let file_results = self.compare_pairs(pairs).await?;
        Ok(ComparisonResults::aggregate(file_results, start.elapsed()))
    }

    /// Compare already-paired documents concurrently.
    pub async fn compare_pairs(&self, pairs: Vec<FilePair>) -> Result<Vec<FileComparisonResult>> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }

        // Create a semaphore to limit concurrent comparisons
        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.max_concurrent));

        let tasks: Vec<_> = pairs
            .into_iter()
            .map(|pair| {
                let settings = Arc::clone(&self.settings);
                let semaphore = Arc::clone(&semaphore);

                tokio::spawn(async move {
                    let (control, test) = match (pair.control.clone(), pair.test.clone()) {
                        (Some(control), Some(test)) => (control, test),
                        (Some(_), None) => {
                            warn!(pair = %pair.name, "no test document");
                            return Ok(FileComparisonResult::skipped(pair, SkipReason::MissingTest));
                        }
                        _ => {
                            warn!(pair = %pair.name, "no control document");
                            return Ok(FileComparisonResult::skipped(
                                pair,
                                SkipReason::MissingControl,
                            ));
                        }
                    };

                    // Acquire semaphore permit to limit concurrency
                    let _permit = semaphore.acquire().await.map_err(|_| {
                        CompareError::Concurrency {
                            details: "Failed to acquire comparison semaphore".to_string(),
                        }
                    })?;

                    let start = Instant::now();
                    let outcome = tokio::task::spawn_blocking(move || {
                        Self::compare_files(&control, &test, &settings)
                    })
                    .await
                    .map_err(|e| CompareError::Concurrency {
                        details: format!("Comparison task failed: {}", e),
                    })?;

                    let status = match outcome {
                        Ok(report) if report.has_differences() => {
                            info!(pair = %pair.name, differences = report.len(), "differences found");
                            ComparisonStatus::Different { report }
                        }
                        Ok(_) => {
                            info!(pair = %pair.name, "identical");
                            ComparisonStatus::Identical
                        }
                        Err(e) => {
                            warn!(pair = %pair.name, error = %e, "comparison failed");
                            ComparisonStatus::Error {
                                message: e.to_string(),
                            }
                        }
                    };

                    Ok::<FileComparisonResult, CompareError>(FileComparisonResult {
                        name: pair.name,
                        control: pair.control,
                        test: pair.test,
                        status,
                        duration: start.elapsed(),
                    })
                })
            })
            .collect();

        // Collect all results
        let task_results = try_join_all(tasks)
            .await
            .map_err(|e| CompareError::Concurrency {
                details: format!("Task join error: {}", e),
            })?;

        task_results.into_iter().collect()
    }

    /// Parse and compare one pair on the current thread.
    pub fn compare_files(
        control: &Path,
        test: &Path,
        settings: &ComparisonSettings,
    ) -> DocumentResult<DiffReport> {
        let control_doc = XmlDocument::from_file(control)?;
        let test_doc = XmlDocument::from_file(test)?;
        debug!(control = %control.display(), test = %test.display(), "comparing documents");
        Ok(TreeComparator::from_settings(settings).compare(&control_doc, &test_doc))
    }
}
