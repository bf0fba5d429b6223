//! End-to-end `build` pipeline: tree → plan → transform → title page → combined file.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDate;
use tracing::{info, instrument};

use topicpress_shared::{Result, RunConfig, SourceLayout, TopicNode, TopicPressError};

use crate::emitter::{self, CombinedDocument};
use crate::title_page::build_title_page;
use crate::tree::load_topic_tree;
use crate::walker::{self, WalkPlan};

/// Inputs for one `build` run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Product identifier.
    pub product: String,
    /// Paths inside the documentation checkout.
    pub layout: SourceLayout,
    /// Document ids to leave out.
    pub excluded: BTreeSet<String>,
    /// Logo reference for the title page.
    pub logo: PathBuf,
    /// Date printed on the title page.
    pub generated_on: NaiveDate,
}

/// Result of a `build` run.
#[derive(Debug)]
pub struct BuildResult {
    /// Where the combined markdown was written.
    pub combined_path: PathBuf,
    /// Topics directory the documents were read from.
    pub topics_dir: PathBuf,
    /// Product display name from the tree root.
    pub display_name: String,
    /// Product version.
    pub version: String,
    /// Number of documents transformed and included.
    pub documents_processed: usize,
    /// References skipped by the exclusion list.
    pub excluded_skipped: usize,
    /// Repeated references skipped.
    pub duplicates_skipped: usize,
    /// Size of the combined file.
    pub combined_bytes: usize,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a document has been transformed and written back.
    fn document_processed(&self, id: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_processed(&self, _id: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &BuildResult) {}
}

/// Read the product version file; surrounding whitespace is trimmed.
pub async fn read_version(path: &Path) -> Result<String> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TopicPressError::MissingVersionFile {
                path: path.to_path_buf(),
            }
        } else {
            TopicPressError::io(path, e)
        }
    })?;

    let version = raw.trim();
    if version.is_empty() {
        return Err(TopicPressError::validation(format!(
            "version file {} is empty",
            path.display()
        )));
    }

    Ok(version.to_string())
}

/// Load the tree and version, and freeze them into a [`RunConfig`].
///
/// Nothing is written before this succeeds.
pub async fn load_run(options: &BuildOptions) -> Result<(RunConfig, TopicNode)> {
    let tree = load_topic_tree(&options.layout.tree_file).await?;
    let version = read_version(&options.layout.version_file).await?;

    let run = RunConfig {
        product: options.product.clone(),
        excluded: options.excluded.clone(),
        topics_dir: options.layout.topics_dir.clone(),
        combined_path: options.layout.combined_file.clone(),
        version,
        display_name: tree.display_name.clone().unwrap_or_default(),
        logo: options.logo.clone(),
    };

    Ok((run, tree))
}

/// Run the full `build` pipeline.
///
/// 1. Load the topic tree and version
/// 2. Plan documents in traversal order
/// 3. Verify every planned document exists
/// 4. Transform and write back each document
/// 5. Emit title page + documents as the combined file
#[instrument(skip_all, fields(product = %options.product, root = %options.layout.root.display()))]
pub async fn build_combined(
    options: &BuildOptions,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let start = Instant::now();

    // --- Phase 1: Inputs ---
    progress.phase("Loading topic tree");
    let (run, tree) = load_run(options).await?;

    info!(
        display_name = %run.display_name,
        version = %run.version,
        excluded = run.excluded.len(),
        "starting build"
    );

    // --- Phase 2: Plan ---
    progress.phase("Planning documents");
    let WalkPlan {
        documents,
        excluded,
        duplicates,
    } = walker::collect_documents(&tree, &run.excluded);
    walker::verify_documents(&run.topics_dir, &documents).await?;

    // --- Phase 3: Transform ---
    progress.phase("Transforming documents");
    let fragments = walker::process_documents(&run.topics_dir, &documents, progress).await?;

    // --- Phase 4: Combine ---
    progress.phase("Writing combined document");
    let title_page = build_title_page(
        &run.display_name,
        &run.version,
        &run.logo,
        options.generated_on,
    );
    let mut combined = CombinedDocument::new(title_page);
    combined.extend(fragments);

    let combined_bytes = emitter::emit(&run.combined_path, &combined).await?;

    let result = BuildResult {
        combined_path: run.combined_path.clone(),
        topics_dir: run.topics_dir.clone(),
        display_name: run.display_name.clone(),
        version: run.version.clone(),
        documents_processed: combined.fragments().len(),
        excluded_skipped: excluded,
        duplicates_skipped: duplicates,
        combined_bytes,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        documents = result.documents_processed,
        excluded = result.excluded_skipped,
        duplicates = result.duplicates_skipped,
        elapsed_ms = result.elapsed.as_millis(),
        "processed a total of {} files",
        result.documents_processed
    );

    Ok(result)
}
