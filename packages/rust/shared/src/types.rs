//! Core domain types for a topicpress run.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::LayoutConfig;

/// File extensions that mark a topic id as a markdown document.
pub const DOCUMENT_EXTENSIONS: &[&str] = &[".md"];

// ---------------------------------------------------------------------------
// TopicNode
// ---------------------------------------------------------------------------

/// One entry in the documentation table of contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopicNode {
    /// Document file name relative to the topics directory, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human-readable title (only meaningful at the root).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Child topics in document order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TopicNode>,
}

impl TopicNode {
    /// A node backed by a document id, without children.
    pub fn document(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Builder-style helper to attach children.
    pub fn with_children(mut self, children: Vec<TopicNode>) -> Self {
        self.children = children;
        self
    }

    /// Whether the node's id names a markdown document.
    pub fn has_document_id(&self) -> bool {
        self.id.as_deref().is_some_and(|id| {
            DOCUMENT_EXTENSIONS
                .iter()
                .any(|ext| id.len() > ext.len() && id.ends_with(ext))
        })
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TopicNode::node_count).sum::<usize>()
    }
}

// ---------------------------------------------------------------------------
// SourceLayout
// ---------------------------------------------------------------------------

/// Resolved paths inside one documentation checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLayout {
    /// Checkout root (`<work_dir>/<product>-documentation`).
    pub root: PathBuf,
    /// Table-of-contents file.
    pub tree_file: PathBuf,
    /// Product version file.
    pub version_file: PathBuf,
    /// Directory holding the markdown topics.
    pub topics_dir: PathBuf,
    /// Combined markdown output.
    pub combined_file: PathBuf,
}

impl SourceLayout {
    /// Resolve the conventional paths under `root`.
    pub fn resolve(root: impl AsRef<Path>, layout: &LayoutConfig) -> Self {
        let root = root.as_ref().to_path_buf();
        let topics_dir = root.join(&layout.topics_dir);
        Self {
            tree_file: root.join(&layout.tree_file),
            version_file: root.join(&layout.version_file),
            combined_file: topics_dir.join(&layout.combined_file),
            topics_dir,
            root,
        }
    }
}

// ---------------------------------------------------------------------------
// RunConfig
// ---------------------------------------------------------------------------

/// Parameters governing one pipeline execution. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Product identifier (e.g. `teamcity`).
    pub product: String,
    /// Document ids that never contribute to the output.
    pub excluded: BTreeSet<String>,
    /// Directory the document ids are resolved against.
    pub topics_dir: PathBuf,
    /// Where the combined markdown is written.
    pub combined_path: PathBuf,
    /// Product version from the version file, trimmed.
    pub version: String,
    /// Product display name from the tree root.
    pub display_name: String,
    /// Logo reference placed on the title page.
    pub logo: PathBuf,
}
