//! The rendered-document boundary: parsing markup into a mutable tree,
//! locating the checking root, and serializing the annotated result.

pub mod reconcile;
pub mod walker;

use anyhow::{Context, Result};
use html5ever::driver::ParseOpts;
use html5ever::serialize::SerializeOpts;
use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, serialize};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Parse rendered markup into a mutable tree.
pub fn parse(html: &str) -> RcDom {
    parse_document(RcDom::default(), ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
}

/// Serialize the whole tree back to markup.
pub fn serialize_tree(dom: &RcDom) -> Result<String> {
    let mut buf = Vec::new();
    let handle = SerializableHandle::from(dom.document.clone());
    serialize(&mut buf, &handle, SerializeOpts::default())
        .context("Failed to serialize document")?;
    String::from_utf8(buf).context("Serialized markup was not UTF-8")
}

/// Find the element named by `selector`: a bare tag name, or `#id` matched
/// against `id` attributes. Returns the first match in document order.
pub fn select_root(dom: &RcDom, selector: &str) -> Option<Handle> {
    if let Some(id) = selector.strip_prefix('#') {
        find_element(&dom.document, &|node| has_attribute(node, "id", id))
    } else {
        find_element(&dom.document, &|node| element_name(node) == Some(selector))
    }
}

fn element_name(node: &Handle) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

fn find_element(node: &Handle, matches: &dyn Fn(&Handle) -> bool) -> Option<Handle> {
    if element_name(node).is_some() && matches(node) {
        return Some(node.clone());
    }
    for child in node.children.borrow().iter() {
        if let Some(found) = find_element(child, matches) {
            return Some(found);
        }
    }
    None
}

fn has_attribute(node: &Handle, attribute: &str, value: &str) -> bool {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .any(|a| a.name.local.as_ref() == attribute && a.value.as_ref() == value),
        _ => false,
    }
}

/// Output path for an annotated document: the input's stem with a
/// `-spellchecked` suffix and an `.html` extension, placed in `out_dir` or
/// next to the input.
pub fn annotated_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("output");
    let dir = out_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{stem}-spellchecked.html"))
}

/// True for paths already produced by an earlier run.
pub fn is_annotated_output(path: &Path) -> bool {
    path.file_stem()
        .and_then(OsStr::to_str)
        .is_some_and(|stem| stem.ends_with("-spellchecked"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_select_by_tag() {
        let dom = parse("<html><body><p>hi</p></body></html>");
        let body = select_root(&dom, "body").unwrap();
        match &body.data {
            NodeData::Element { name, .. } => assert_eq!(name.local.as_ref(), "body"),
            _ => panic!("expected an element"),
        }
    }

    #[test]
    fn test_select_by_id() {
        let dom = parse(r#"<body><div id="main"><p>hi</p></div></body>"#);
        let root = select_root(&dom, "#main").unwrap();
        assert!(has_attribute(&root, "id", "main"));
    }

    #[test]
    fn test_missing_selector_matches_nothing() {
        let dom = parse("<body><p>hi</p></body>");
        assert!(select_root(&dom, "article").is_none());
        assert!(select_root(&dom, "#missing").is_none());
    }

    #[test]
    fn test_round_trip_preserves_text() {
        let dom = parse("<html><head></head><body><p>Hello there</p></body></html>");
        let markup = serialize_tree(&dom).unwrap();
        assert!(markup.contains("<p>Hello there</p>"));
    }

    #[test]
    fn test_annotated_path_naming() {
        assert_eq!(
            annotated_path(Path::new("docs/page.html"), None),
            PathBuf::from("docs/page-spellchecked.html")
        );
        assert_eq!(
            annotated_path(Path::new("docs/guide.md"), Some(Path::new("out"))),
            PathBuf::from("out/guide-spellchecked.html")
        );
    }

    #[test]
    fn test_annotated_outputs_are_recognized() {
        assert!(is_annotated_output(Path::new("page-spellchecked.html")));
        assert!(!is_annotated_output(Path::new("page.html")));
    }
}
