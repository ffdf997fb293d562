//! Rewrites checked text nodes in place: correct spans stay plain text,
//! misspelled words become inline annotation elements.

use crate::Verdict;
use html5ever::{ns, Attribute, LocalName, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Marker class carried by every annotation element, alongside a
/// language-qualified variant (`misspelled-en_US`).
pub const ANNOTATION_CLASS: &str = "misspelled";

const ANNOTATION_STYLE: &str =
    ".misspelled { text-decoration: underline wavy #c00000; background-color: #ffecec; }";

/// Outcome for one span of a text node, in document order.
#[derive(Debug, Clone)]
pub struct WordCheck {
    pub text: String,
    pub verdict: Verdict,
}

/// Rewrite `node` if any of its spans failed: plain text for the passing
/// spans, one annotation element per misspelled word. Returns the number of
/// misspellings annotated; zero means the node was left untouched.
pub fn annotate_node(
    parent: &Handle,
    node: &Handle,
    checks: &[WordCheck],
    language: &str,
) -> usize {
    let misses = checks
        .iter()
        .filter(|check| !check.verdict.is_ok())
        .count();
    if misses == 0 {
        return 0;
    }

    let mut fragments = Vec::new();
    let mut plain = String::new();
    for check in checks {
        match &check.verdict {
            Verdict::Misspelled { suggestions, .. } => {
                if !plain.is_empty() {
                    fragments.push(create_text(&plain));
                    plain.clear();
                }
                fragments.push(annotation(&check.text, suggestions, language));
            }
            _ => plain.push_str(&check.text),
        }
    }
    if !plain.is_empty() {
        fragments.push(create_text(&plain));
    }

    replace_child(parent, node, fragments);
    misses
}

/// Append the highlight rule for annotation elements to the document head.
pub fn inject_style(dom: &RcDom) {
    if let Some(head) = crate::document::select_root(dom, "head") {
        let style = create_element("style", &[]);
        style.children.borrow_mut().push(create_text(ANNOTATION_STYLE));
        head.children.borrow_mut().push(style);
    }
}

fn annotation(word: &str, suggestions: &[String], language: &str) -> Handle {
    let class = format!("{ANNOTATION_CLASS} {ANNOTATION_CLASS}-{language}");
    let title = tooltip(suggestions);
    let span = create_element("span", &[("class", &class), ("title", &title)]);
    span.children.borrow_mut().push(create_text(word));
    span
}

/// Tooltip text: the alternatives joined by ", ", always ending in "?".
fn tooltip(suggestions: &[String]) -> String {
    format!("{}?", suggestions.join(", "))
}

fn replace_child(parent: &Handle, node: &Handle, fragments: Vec<Handle>) {
    let mut children = parent.children.borrow_mut();
    if let Some(index) = children.iter().position(|c| Rc::ptr_eq(c, node)) {
        children.splice(index..=index, fragments);
    }
}

pub fn create_element(tag: &str, attrs: &[(&str, &str)]) -> Handle {
    let attributes = attrs
        .iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(*name)),
            value: value.to_string().into(),
        })
        .collect();
    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Element {
            name: QualName::new(None, ns!(html), LocalName::from(tag)),
            attrs: RefCell::new(attributes),
            template_contents: Default::default(),
            mathml_annotation_xml_integration_point: false,
        },
    })
}

pub fn create_text(text: &str) -> Handle {
    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Text {
            contents: RefCell::new(text.to_string().into()),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{parse, select_root, serialize_tree, walker};
    use crate::Options;

    fn miss(text: &str, suggestions: &[&str]) -> WordCheck {
        WordCheck {
            text: text.to_string(),
            verdict: Verdict::Misspelled {
                position: 0,
                suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    fn ok(text: &str) -> WordCheck {
        WordCheck {
            text: text.to_string(),
            verdict: Verdict::Correct,
        }
    }

    #[test]
    fn test_single_misspelling_becomes_annotation() {
        let dom = parse("<html><head></head><body><p>helo world</p></body></html>");
        let root = select_root(&dom, "body").unwrap();
        let targets = walker::collect_targets(&root, &Options::default());
        let target = &targets[0];

        let checks = vec![miss("helo", &["foo", "bar"]), ok(" "), ok("world")];
        let annotated = annotate_node(&target.parent, &target.node, &checks, "en_US");
        assert_eq!(annotated, 1);

        let markup = serialize_tree(&dom).unwrap();
        assert!(markup.contains(
            r#"<p><span class="misspelled misspelled-en_US" title="foo, bar?">helo</span> world</p>"#
        ));
    }

    #[test]
    fn test_clean_node_is_untouched() {
        let dom = parse("<body><p>all fine here</p></body>");
        let root = select_root(&dom, "body").unwrap();
        let targets = walker::collect_targets(&root, &Options::default());
        let target = &targets[0];
        let before = serialize_tree(&dom).unwrap();

        let checks = vec![ok("all"), ok(" "), ok("fine"), ok(" "), ok("here")];
        assert_eq!(annotate_node(&target.parent, &target.node, &checks, "en_US"), 0);
        assert_eq!(serialize_tree(&dom).unwrap(), before);
    }

    #[test]
    fn test_empty_suggestions_still_get_question_mark() {
        assert_eq!(tooltip(&[]), "?");
        assert_eq!(tooltip(&["foo".to_string(), "bar".to_string()]), "foo, bar?");
    }

    #[test]
    fn test_adjacent_misspellings_each_get_their_own_annotation() {
        let dom = parse("<body><p>helo wrold</p></body>");
        let root = select_root(&dom, "body").unwrap();
        let targets = walker::collect_targets(&root, &Options::default());
        let target = &targets[0];

        let checks = vec![miss("helo", &["hello"]), ok(" "), miss("wrold", &[])];
        assert_eq!(annotate_node(&target.parent, &target.node, &checks, "en_US"), 2);

        let markup = serialize_tree(&dom).unwrap();
        assert!(markup.contains(r#"title="hello?">helo</span>"#));
        assert!(markup.contains(r#"title="?">wrold</span>"#));
    }

    #[test]
    fn test_style_is_injected_into_head() {
        let dom = parse("<html><head><title>t</title></head><body></body></html>");
        inject_style(&dom);
        let markup = serialize_tree(&dom).unwrap();
        assert!(markup.contains("<style>.misspelled {"));
        assert!(markup.contains("</style></head>"));
    }
}
