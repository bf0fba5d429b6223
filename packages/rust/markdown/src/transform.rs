//! Per-document rewrite pipeline.
//!
//! Each pass is a function `&str -> String` applied in a fixed sequence; every
//! pass consumes the output of the one before it.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::PAGE_BREAK_SUFFIX;

/// Literal that breaks the PDF renderer when left as bold markup.
const DOMAIN_USERNAME: &str = r"__DOMAIN\username__";

/// Inline-code replacement for [`DOMAIN_USERNAME`].
const DOMAIN_USERNAME_CODE: &str = r"`DOMAIN\username`";

/// Run the full rewrite pipeline on one document's raw text.
pub(crate) fn run_pipeline(md: &str) -> String {
    let mut result = strip_see_also(md);

    result = promote_title_directive(&result);
    result = flatten_links(&result);
    result = strip_videos(&result);
    result = strip_comment_directives(&result);
    result = escape_domain_username(&result);
    result = append_page_break(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Strip "see also" blocks
// ---------------------------------------------------------------------------

/// Remove every `<seealso>...</seealso>` region, tags included.
fn strip_see_also(md: &str) -> String {
    static SEE_ALSO_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)<seealso>.*?</seealso>").expect("valid regex")
    });

    SEE_ALSO_RE.replace_all(md, "").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 2: Promote the title directive
// ---------------------------------------------------------------------------

/// Turn `[//]: # (title: TEXT)` into `# TEXT`.
fn promote_title_directive(md: &str) -> String {
    static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)\[//\]: # \(title: (.*?)\)").expect("valid regex")
    });

    TITLE_RE.replace_all(md, "# ${1}").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 3: Flatten hyperlinks
// ---------------------------------------------------------------------------

/// Replace `[LABEL](TARGET)` with `LABEL`, leaving `![ALT](SRC)` untouched.
///
/// A label may hold one level of balanced brackets, so `[a [b] c](t)` and
/// `[![badge](img)](href)` flatten as a whole. Neither part crosses a line.
fn flatten_links(md: &str) -> String {
    static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\[((?:[^\[\]\n]|\[[^\[\]\n]*\])*)\]\([^)\n]*\)").expect("valid regex")
    });

    LINK_RE
        .replace_all(md, |caps: &Captures| {
            let Some(full_match) = caps.get(0) else {
                return String::new();
            };

            // `regex` has no look-behind; check the byte before the match instead
            let start = full_match.start();
            if start > 0 && md.as_bytes()[start - 1] == b'!' {
                return full_match.as_str().to_string();
            }

            caps[1].to_string()
        })
        .into_owned()
}

// ---------------------------------------------------------------------------
// Pass 4: Remove embedded videos
// ---------------------------------------------------------------------------

/// Remove self-closing `<video ... />` tags. Attribute values may span lines
/// and quoted values may contain `>`. Tags with unbalanced quotes or a bare
/// `>` are matched up to the first `/>` that precedes the next `<`.
fn strip_videos(md: &str) -> String {
    static VIDEO_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"<video\b(?:(?:"[^"]*"|'[^']*'|[^"'>])*|[^<]*?)/>"#).expect("valid regex")
    });

    VIDEO_RE.replace_all(md, "").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 5: Remove residual comment directives
// ---------------------------------------------------------------------------

/// Remove remaining `[//]...)` directives (notes, anchors) up to the last
/// closing parenthesis on the line.
fn strip_comment_directives(md: &str) -> String {
    static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\[//\].*\)").expect("valid regex")
    });

    DIRECTIVE_RE.replace_all(md, "").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 6: Defuse renderer-breaking literals
// ---------------------------------------------------------------------------

fn escape_domain_username(md: &str) -> String {
    md.replace(DOMAIN_USERNAME, DOMAIN_USERNAME_CODE)
}

// ---------------------------------------------------------------------------
// Pass 7: Page break
// ---------------------------------------------------------------------------

/// Append the page-break block so the next document starts on a new page.
fn append_page_break(md: &str) -> String {
    format!("{md}{PAGE_BREAK_SUFFIX}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
