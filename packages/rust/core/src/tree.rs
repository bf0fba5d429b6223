//! Topic tree loader.
//!
//! Parses the XML table of contents (`tc.tree`) into a [`TopicNode`] tree:
//!
//! ```xml
//! <product-profile id="tc" name="TeamCity">
//!     <toc-element id="intro.md"/>
//!     <toc-element toc-title="Setup">
//!         <toc-element id="install.md"/>
//!     </toc-element>
//! </product-profile>
//! ```
//!
//! The root's `name` becomes the display name; every nested `toc-element`
//! becomes a child topic in document order.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::escape::unescape;
use tracing::{debug, instrument};

use topicpress_shared::{Result, TopicNode, TopicPressError};

/// Element name of a nested topic entry.
const TOC_ELEMENT: &[u8] = b"toc-element";

/// An element currently open in the document.
enum Frame {
    Topic(TopicNode),
    /// Anything that is not a topic; nested topics attach to the nearest topic above it.
    Other,
}

/// Read and parse the tree file at `path`.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn load_topic_tree(path: &Path) -> Result<TopicNode> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TopicPressError::MissingTreeFile {
                path: path.to_path_buf(),
            }
        } else {
            TopicPressError::io(path, e)
        }
    })?;

    parse_topic_tree(&bytes).map_err(|e| match e {
        TopicPressError::MalformedTree { message } => {
            TopicPressError::malformed_tree(format!("{}: {message}", path.display()))
        }
        other => other,
    })
}

/// Parse a table-of-contents document into its root [`TopicNode`].
pub fn parse_topic_tree(bytes: &[u8]) -> Result<TopicNode> {
    let content = std::str::from_utf8(strip_bom(bytes))
        .map_err(|e| TopicPressError::malformed_tree(format!("not valid UTF-8: {e}")))?;

    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<TopicNode> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(TopicPressError::malformed_tree(format!(
                    "at byte {}: {e}",
                    reader.error_position()
                )));
            }
        };

        match event {
            Event::Start(e) => {
                let frame = open_element(&e, &stack, root.is_some())?;
                stack.push(frame);
            }
            Event::Empty(e) => {
                let frame = open_element(&e, &stack, root.is_some())?;
                close_element(frame, &mut stack, &mut root);
            }
            Event::End(e) => {
                let frame = stack.pop().ok_or_else(|| {
                    TopicPressError::malformed_tree(format!(
                        "unexpected closing tag </{}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    ))
                })?;
                close_element(frame, &mut stack, &mut root);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(TopicPressError::malformed_tree(format!(
            "unexpected end of document with {} unclosed element(s)",
            stack.len()
        )));
    }

    let root = root.ok_or_else(|| TopicPressError::malformed_tree("document has no root element"))?;

    debug!(
        display_name = root.display_name.as_deref().unwrap_or_default(),
        nodes = root.node_count(),
        "topic tree parsed"
    );

    Ok(root)
}

/// Build the frame for a newly opened element.
fn open_element(e: &BytesStart<'_>, stack: &[Frame], has_root: bool) -> Result<Frame> {
    if stack.is_empty() {
        if has_root {
            return Err(TopicPressError::malformed_tree(format!(
                "second root element <{}>",
                element_name(e)
            )));
        }

        let display_name = attribute(e, b"name")?.ok_or_else(|| {
            TopicPressError::malformed_tree(format!(
                "root element <{}> has no name attribute",
                element_name(e)
            ))
        })?;

        return Ok(Frame::Topic(TopicNode {
            id: attribute(e, b"id")?,
            display_name: Some(display_name),
            children: Vec::new(),
        }));
    }

    if e.name().as_ref() != TOC_ELEMENT {
        return Ok(Frame::Other);
    }

    Ok(Frame::Topic(TopicNode {
        id: attribute(e, b"id")?,
        ..TopicNode::default()
    }))
}

/// Attach a finished frame to its parent, or make it the root.
fn close_element(frame: Frame, stack: &mut [Frame], root: &mut Option<TopicNode>) {
    let Frame::Topic(node) = frame else {
        return;
    };

    let parent = stack.iter_mut().rev().find_map(|f| match f {
        Frame::Topic(parent) => Some(parent),
        Frame::Other => None,
    });

    match parent {
        Some(parent) => parent.children.push(node),
        None => *root = Some(node),
    }
}

/// Read an attribute by name; empty values count as absent.
fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| {
            TopicPressError::malformed_tree(format!(
                "invalid attribute on <{}>: {err}",
                element_name(e)
            ))
        })?;

        if attr.key.as_ref() != key {
            continue;
        }

        let raw = std::str::from_utf8(&attr.value).map_err(|err| {
            TopicPressError::malformed_tree(format!("attribute is not valid UTF-8: {err}"))
        })?;
        let value = unescape(raw).map_err(|err| {
            TopicPressError::malformed_tree(format!(
                "bad escape in attribute on <{}>: {err}",
                element_name(e)
            ))
        })?;

        return Ok(Some(value.into_owned()).filter(|v| !v.is_empty()));
    }

    Ok(None)
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(nodes: &[TopicNode]) -> Vec<Option<&str>> {
        nodes.iter().map(|n| n.id.as_deref()).collect()
    }

    #[test]
    fn parses_root_and_children_in_order() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE product-profile SYSTEM "product-profile.dtd">
<product-profile id="tc" name="TeamCity" start-page="teamcity-documentation.md">
    <toc-element id="teamcity-documentation.md"/>
    <toc-element id="getting-started.md">
        <toc-element id="install.md"/>
        <toc-element id="configure.md"/>
    </toc-element>
    <toc-element toc-title="Reference">
        <toc-element id="api.md"/>
    </toc-element>
</product-profile>"#;

        let root = parse_topic_tree(xml.as_bytes()).expect("parse");
        assert_eq!(root.display_name.as_deref(), Some("TeamCity"));
        assert_eq!(root.id.as_deref(), Some("tc"));
        assert_eq!(
            ids(&root.children),
            vec![Some("teamcity-documentation.md"), Some("getting-started.md"), None]
        );
        assert_eq!(
            ids(&root.children[1].children),
            vec![Some("install.md"), Some("configure.md")]
        );
        assert_eq!(ids(&root.children[2].children), vec![Some("api.md")]);
    }

    #[test]
    fn single_child_is_still_a_list() {
        let xml = r#"<product-profile name="Hub"><toc-element id="only.md"/></product-profile>"#;
        let root = parse_topic_tree(xml.as_bytes()).expect("parse");
        assert_eq!(root.children.len(), 1);
        assert!(root.id.is_none());
    }

    #[test]
    fn non_topic_elements_are_transparent() {
        let xml = r#"<product-profile name="Demo">
    <toc-element id="a.md"/>
    <group>
        <toc-element id="b.md"/>
    </group>
    <snippet id="not-a-topic.md"/>
</product-profile>"#;
        let root = parse_topic_tree(xml.as_bytes()).expect("parse");
        assert_eq!(ids(&root.children), vec![Some("a.md"), Some("b.md")]);
    }

    #[test]
    fn attributes_are_unescaped_and_empty_ids_dropped() {
        let xml = r#"<product-profile name="R&amp;D Docs"><toc-element id=""/></product-profile>"#;
        let root = parse_topic_tree(xml.as_bytes()).expect("parse");
        assert_eq!(root.display_name.as_deref(), Some("R&D Docs"));
        assert!(root.children[0].id.is_none());
    }

    #[test]
    fn bom_is_ignored() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice(br#"<product-profile name="Demo"/>"#);
        let root = parse_topic_tree(&bytes).expect("parse");
        assert!(root.children.is_empty());
    }

    #[test]
    fn rejects_mismatched_tags() {
        let xml = r#"<product-profile name="Demo"><toc-element id="a.md"></product-profile>"#;
        let err = parse_topic_tree(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, TopicPressError::MalformedTree { .. }));
    }

    #[test]
    fn rejects_unclosed_root() {
        let xml = r#"<product-profile name="Demo"><toc-element id="a.md"/>"#;
        let err = parse_topic_tree(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, TopicPressError::MalformedTree { .. }));
    }

    #[test]
    fn rejects_empty_document() {
        let err = parse_topic_tree(b"   ").unwrap_err();
        assert!(err.to_string().contains("no root element"));
    }

    #[test]
    fn rejects_missing_name() {
        let err = parse_topic_tree(br#"<product-profile id="tc"/>"#).unwrap_err();
        assert!(err.to_string().contains("no name attribute"));
    }

    #[test]
    fn rejects_second_root() {
        let err = parse_topic_tree(br#"<a name="x"/><b name="y"/>"#).unwrap_err();
        assert!(err.to_string().contains("second root"));
    }

    #[tokio::test]
    async fn missing_file_is_reported_with_path() {
        let path = std::env::temp_dir()
            .join(format!("tp-tree-test-{}", uuid::Uuid::now_v7()))
            .join("tc.tree");
        let err = load_topic_tree(&path).await.unwrap_err();
        assert!(matches!(err, TopicPressError::MissingTreeFile { .. }));
        assert!(err.to_string().contains("tc.tree"));
    }
}
