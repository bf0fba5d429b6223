//! Markdown normalization for print output.
//!
//! Source topics are written in a markdown dialect with inline directives
//! (`[//]: # (title: ...)`, `<seealso>`, `<video/>`) that a PDF renderer does not
//! understand. [`transform_document`] rewrites one topic into plain GitHub-flavored
//! markdown and terminates it with a page break.

mod transform;

use tracing::debug;

/// Block-level HTML marker that forces a page break in the rendered output.
pub const PAGE_BREAK: &str = r#"<div style="page-break-after: always"></div>"#;

/// Suffix appended to every processed document.
pub const PAGE_BREAK_SUFFIX: &str = "\n<div style=\"page-break-after: always\"></div>\n\n\n";

/// Rewrite one document's raw text for inclusion in the combined output.
///
/// The passes run in a fixed order:
/// 1. Strip `<seealso>` blocks
/// 2. Promote the title directive to an H1
/// 3. Flatten links to their labels (images are kept)
/// 4. Remove `<video/>` embeds
/// 5. Remove leftover `[//]` directives
/// 6. Defuse literals that break the renderer
/// 7. Append [`PAGE_BREAK_SUFFIX`]
///
/// The function is pure; applying it twice appends two page breaks.
pub fn transform_document(raw: &str) -> String {
    let transformed = transform::run_pipeline(raw);
    debug!(
        raw_len = raw.len(),
        transformed_len = transformed.len(),
        "document transformed"
    );
    transformed
}
