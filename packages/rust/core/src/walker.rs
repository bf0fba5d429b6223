//! Tree walker: decides which topics become documents and processes them.
//!
//! Planning is a pure pre-order fold over the tree. Processing then reads,
//! transforms and writes back every planned document on its own task, and
//! returns the transformed fragments in plan order regardless of completion
//! order.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use topicpress_markdown::transform_document;
use topicpress_shared::{Result, TopicNode, TopicPressError};

use crate::emitter::DocumentFragment;
use crate::pipeline::ProgressReporter;

/// Documents selected from a topic tree, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkPlan {
    /// Document ids to process, pre-order, each at most once.
    pub documents: Vec<String>,
    /// Document references skipped because they are in the exclusion set.
    pub excluded: usize,
    /// Later references to an id that was already planned.
    pub duplicates: usize,
}

/// Walk the tree depth-first, pre-order, children left to right.
///
/// A node contributes a document when its id ends with a document extension
/// and is not excluded. Children are visited either way.
pub fn collect_documents(root: &TopicNode, excluded: &BTreeSet<String>) -> WalkPlan {
    let mut plan = WalkPlan::default();
    let mut seen: HashSet<&str> = HashSet::new();
    visit(root, excluded, &mut seen, &mut plan);
    plan
}

fn visit<'a>(
    node: &'a TopicNode,
    excluded: &BTreeSet<String>,
    seen: &mut HashSet<&'a str>,
    plan: &mut WalkPlan,
) {
    if let Some(id) = node.id.as_deref().filter(|_| node.has_document_id()) {
        if excluded.contains(id) {
            debug!(id, "excluded document skipped");
            plan.excluded += 1;
        } else if !seen.insert(id) {
            warn!(id, "document referenced more than once; keeping first occurrence");
            plan.duplicates += 1;
        } else {
            plan.documents.push(id.to_string());
        }
    }

    for child in &node.children {
        visit(child, excluded, seen, plan);
    }
}

/// Check that every planned document exists before anything is written.
pub async fn verify_documents(topics_dir: &Path, ids: &[String]) -> Result<()> {
    for id in ids {
        let path = topics_dir.join(id);
        let is_file = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.is_file(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(TopicPressError::io(&path, e)),
        };

        if !is_file {
            return Err(TopicPressError::DocumentNotFound {
                id: id.clone(),
                path,
            });
        }
    }
    Ok(())
}

/// Read, transform and overwrite every document in `ids`.
///
/// Returns the transformed fragments in the order of `ids`. All writes have
/// completed when this returns `Ok`; the first failure aborts the remaining
/// tasks and is returned.
#[instrument(skip_all, fields(topics_dir = %topics_dir.display(), documents = ids.len()))]
pub async fn process_documents(
    topics_dir: &Path,
    ids: &[String],
    progress: &dyn ProgressReporter,
) -> Result<Vec<DocumentFragment>> {
    let total = ids.len();
    let mut tasks = JoinSet::new();

    for (index, id) in ids.iter().enumerate() {
        let id = id.clone();
        let path = topics_dir.join(&id);
        tasks.spawn(async move { process_document(index, id, &path).await });
    }

    let mut slots: Vec<Option<DocumentFragment>> = vec![None; total];
    let mut completed = 0;

    while let Some(joined) = tasks.join_next().await {
        let (index, fragment) = joined.map_err(|e| TopicPressError::Task(e.to_string()))??;
        completed += 1;
        progress.document_processed(&fragment.id, completed, total);
        slots[index] = Some(fragment);
    }

    let fragments: Vec<DocumentFragment> = slots.into_iter().flatten().collect();

    info!(processed = fragments.len(), "processed documents");

    Ok(fragments)
}

/// Transform one document and write it back in place.
async fn process_document(
    index: usize,
    id: String,
    path: &Path,
) -> Result<(usize, DocumentFragment)> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TopicPressError::DocumentNotFound {
                id: id.clone(),
                path: path.to_path_buf(),
            }
        } else {
            TopicPressError::io(path, e)
        }
    })?;

    let raw = String::from_utf8_lossy(&bytes);
    if let Cow::Owned(_) = raw {
        warn!(%id, path = %path.display(), "document is not valid UTF-8; invalid bytes replaced with U+FFFD");
    }
    let content = transform_document(&raw);

    tokio::fs::write(path, &content)
        .await
        .map_err(|e| TopicPressError::write(path, e))?;

    debug!(%id, bytes = content.len(), "document rewritten");

    Ok((index, DocumentFragment { id, content }))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use topicpress_markdown::PAGE_BREAK_SUFFIX;

    use super::*;
    use crate::pipeline::SilentProgress;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tp-walker-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn excluded(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn sample_tree() -> TopicNode {
        TopicNode {
            id: Some("root".into()),
            display_name: Some("Demo".into()),
            children: vec![
                TopicNode::document("a.md").with_children(vec![
                    TopicNode::document("a1.md"),
                    TopicNode::document("a2.md"),
                ]),
                TopicNode::default().with_children(vec![TopicNode::document("b1.md")]),
                TopicNode::document("c.md"),
            ],
        }
    }

    #[test]
    fn plan_is_pre_order() {
        let plan = collect_documents(&sample_tree(), &BTreeSet::new());
        assert_eq!(plan.documents, vec!["a.md", "a1.md", "a2.md", "b1.md", "c.md"]);
        assert_eq!(plan.excluded, 0);
    }

    #[test]
    fn excluded_parent_still_visits_children() {
        let plan = collect_documents(&sample_tree(), &excluded(&["a.md"]));
        assert_eq!(plan.documents, vec!["a1.md", "a2.md", "b1.md", "c.md"]);
        assert_eq!(plan.excluded, 1);
    }

    #[test]
    fn excluded_id_never_planned_even_when_repeated() {
        let tree = TopicNode::default().with_children(vec![
            TopicNode::document("skip.md"),
            TopicNode::document("keep.md")
                .with_children(vec![TopicNode::document("skip.md")]),
        ]);
        let plan = collect_documents(&tree, &excluded(&["skip.md"]));
        assert_eq!(plan.documents, vec!["keep.md"]);
        assert_eq!(plan.excluded, 2);
    }

    #[test]
    fn repeated_reference_is_planned_once() {
        let tree = TopicNode::default().with_children(vec![
            TopicNode::document("shared.md"),
            TopicNode::document("other.md"),
            TopicNode::document("shared.md"),
        ]);
        let plan = collect_documents(&tree, &BTreeSet::new());
        assert_eq!(plan.documents, vec!["shared.md", "other.md"]);
        assert_eq!(plan.duplicates, 1);
    }

    #[test]
    fn non_document_ids_and_empty_nodes_are_skipped() {
        let tree = TopicNode::default().with_children(vec![
            TopicNode::default(),
            TopicNode::document("image.png"),
            TopicNode::document("notes.md.txt"),
        ]);
        let plan = collect_documents(&tree, &BTreeSet::new());
        assert!(plan.documents.is_empty());
    }

    #[test]
    fn exclusion_is_exact_match() {
        let tree = TopicNode::default().with_children(vec![TopicNode::document("Intro.md")]);
        let plan = collect_documents(&tree, &excluded(&["intro.md"]));
        assert_eq!(plan.documents, vec!["Intro.md"]);
    }

    #[tokio::test]
    async fn verify_reports_first_missing_document() {
        let dir = temp_dir();
        std::fs::write(dir.join("a.md"), "A").unwrap();

        let ids = vec!["a.md".to_string(), "missing.md".to_string()];
        let err = verify_documents(&dir, &ids).await.unwrap_err();
        match err {
            TopicPressError::DocumentNotFound { id, path } => {
                assert_eq!(id, "missing.md");
                assert_eq!(path, dir.join("missing.md"));
            }
            other => panic!("unexpected error: {other}"),
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn verify_treats_directory_as_missing_document() {
        let dir = temp_dir();
        std::fs::create_dir_all(dir.join("folder.md")).unwrap();

        let ids = vec!["folder.md".to_string()];
        let err = verify_documents(&dir, &ids).await.unwrap_err();
        assert!(matches!(err, TopicPressError::DocumentNotFound { .. }));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn verify_reports_unreadable_directory_as_io_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = temp_dir();
        let locked = dir.join("locked");
        std::fs::create_dir_all(&locked).unwrap();
        std::fs::write(locked.join("a.md"), "A").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits are ignored for root, so only assert when they apply.
        let blocked = std::fs::metadata(locked.join("a.md")).is_err();
        let ids = vec!["a.md".to_string()];
        let result = verify_documents(&locked, &ids).await;

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        if blocked {
            assert!(matches!(result, Err(TopicPressError::Io { .. })));
        } else {
            assert!(result.is_ok());
        }
    }

    #[tokio::test]
    async fn process_replaces_invalid_utf8_and_writes_back() {
        let dir = temp_dir();
        std::fs::write(dir.join("latin.md"), b"caf\xe9 [menu](m.md)").unwrap();

        let ids = vec!["latin.md".to_string()];
        let fragments = process_documents(&dir, &ids, &SilentProgress).await.unwrap();

        let expected = format!("caf\u{FFFD} menu{PAGE_BREAK_SUFFIX}");
        assert_eq!(fragments[0].content, expected);
        assert_eq!(std::fs::read_to_string(dir.join("latin.md")).unwrap(), expected);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn process_writes_back_and_keeps_order() {
        let dir = temp_dir();
        let ids: Vec<String> = (0..20).map(|i| format!("doc-{i:02}.md")).collect();
        for (i, id) in ids.iter().enumerate() {
            std::fs::write(dir.join(id), format!("Doc {i} see [link](x.md)")).unwrap();
        }

        let fragments = process_documents(&dir, &ids, &SilentProgress).await.unwrap();

        assert_eq!(fragments.len(), ids.len());
        for (i, fragment) in fragments.iter().enumerate() {
            assert_eq!(fragment.id, ids[i]);
            let expected = format!("Doc {i} see link{PAGE_BREAK_SUFFIX}");
            assert_eq!(fragment.content, expected);
            let on_disk = std::fs::read_to_string(dir.join(&ids[i])).unwrap();
            assert_eq!(on_disk, expected);
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn process_fails_on_missing_document() {
        let dir = temp_dir();
        let ids = vec!["gone.md".to_string()];
        let err = process_documents(&dir, &ids, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, TopicPressError::DocumentNotFound { .. }));
        std::fs::remove_dir_all(&dir).ok();
    }
}
