//! Combined document assembly and emission.
//!
//! The combined document is the title page followed by every transformed
//! topic in traversal order. It is the only file handed to the renderer.

use std::path::Path;

use tracing::{info, instrument};

use topicpress_shared::{Result, TopicPressError};

/// One transformed topic, ready for concatenation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFragment {
    /// Document id the content came from.
    pub id: String,
    /// Transformed markdown, page break included.
    pub content: String,
}

/// Title page plus fragments, append-only.
#[derive(Debug, Clone)]
pub struct CombinedDocument {
    title_page: String,
    fragments: Vec<DocumentFragment>,
}

impl CombinedDocument {
    /// Start a combined document with its title page.
    pub fn new(title_page: impl Into<String>) -> Self {
        Self {
            title_page: title_page.into(),
            fragments: Vec::new(),
        }
    }

    /// Append a fragment after everything already added.
    pub fn push(&mut self, fragment: DocumentFragment) {
        self.fragments.push(fragment);
    }

    /// Fragments in output order.
    pub fn fragments(&self) -> &[DocumentFragment] {
        &self.fragments
    }

    /// Concatenate the title page and all fragments.
    pub fn render(&self) -> String {
        let len = self.title_page.len()
            + self.fragments.iter().map(|f| f.content.len()).sum::<usize>();
        let mut out = String::with_capacity(len);
        out.push_str(&self.title_page);
        for fragment in &self.fragments {
            out.push_str(&fragment.content);
        }
        out
    }
}

impl Extend<DocumentFragment> for CombinedDocument {
    fn extend<I: IntoIterator<Item = DocumentFragment>>(&mut self, iter: I) {
        self.fragments.extend(iter);
    }
}

/// Write the combined document to `path`, replacing any existing file.
///
/// The content goes to a temp file next to `path` first and is then renamed
/// over it. Returns the number of bytes written.
#[instrument(skip_all, fields(path = %path.display(), fragments = document.fragments.len()))]
pub async fn emit(path: &Path, document: &CombinedDocument) -> Result<usize> {
    let content = document.render();

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| TopicPressError::validation(format!("{} is not a file path", path.display())))?;
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    tokio::fs::write(&temp, &content)
        .await
        .map_err(|e| TopicPressError::write(&temp, e))?;
    tokio::fs::rename(&temp, path)
        .await
        .map_err(|e| TopicPressError::write(path, e))?;

    info!(bytes = content.len(), "combined document written");

    Ok(content.len())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tp-emitter-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn fragment(id: &str, content: &str) -> DocumentFragment {
        DocumentFragment {
            id: id.into(),
            content: content.into(),
        }
    }

    #[test]
    fn render_keeps_insertion_order() {
        let mut doc = CombinedDocument::new("TITLE|");
        doc.push(fragment("a.md", "A|"));
        doc.extend([fragment("b.md", "B|"), fragment("c.md", "C|")]);
        assert_eq!(doc.render(), "TITLE|A|B|C|");
        assert_eq!(doc.fragments().len(), 3);
    }

    #[tokio::test]
    async fn emit_overwrites_existing_file() {
        let dir = temp_dir();
        let path = dir.join("_combined.md");
        std::fs::write(&path, "stale content that is longer than the new one").unwrap();

        let mut doc = CombinedDocument::new("T\n");
        doc.push(fragment("a.md", "A\n"));
        let written = emit(&path, &doc).await.unwrap();

        assert_eq!(written, 4);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "T\nA\n");
        assert!(!dir.join("._combined.md.tmp").exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn emit_into_missing_directory_is_write_error() {
        let dir = temp_dir();
        let path = dir.join("no-such-dir").join("_combined.md");
        let err = emit(&path, &CombinedDocument::new("T")).await.unwrap_err();
        assert!(matches!(err, TopicPressError::Write { .. }));
        std::fs::remove_dir_all(&dir).ok();
    }
}
