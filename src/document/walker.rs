//! Depth-first traversal that turns a document tree into an ordered list of
//! text nodes to check, each tagged with the language its ancestors imply.

use crate::Options;
use markup5ever_rcdom::{Handle, NodeData};

/// A text node scheduled for checking, in document order.
pub struct CheckTarget {
    /// The element holding the text node; needed to splice in annotations.
    pub parent: Handle,
    pub node: Handle,
    pub text: String,
    pub language: String,
}

/// Collect the text nodes under `root`, skipping ignored elements and
/// threading the inherited language through the recursion. A per-element-name
/// override beats the inherited language for that element's whole subtree.
pub fn collect_targets(root: &Handle, options: &Options) -> Vec<CheckTarget> {
    let mut targets = Vec::new();
    visit(root, &options.language, options, &mut targets);
    targets
}

fn visit(node: &Handle, language: &str, options: &Options, out: &mut Vec<CheckTarget>) {
    match &node.data {
        NodeData::Element { name, .. } => {
            let tag = name.local.as_ref();
            if options.ignored_elements.contains(tag) {
                return;
            }
            let language = options
                .element_languages
                .get(tag)
                .map(String::as_str)
                .unwrap_or(language);
            for child in node.children.borrow().iter() {
                if let NodeData::Text { contents } = &child.data {
                    out.push(CheckTarget {
                        parent: node.clone(),
                        node: child.clone(),
                        text: contents.borrow().to_string(),
                        language: language.to_string(),
                    });
                } else {
                    visit(child, language, options, out);
                }
            }
        }
        NodeData::Document => {
            for child in node.children.borrow().iter() {
                visit(child, language, options, out);
            }
        }
        other => {
            if options.verbosity >= 2 {
                eprintln!("skipping {} node", node_kind(other));
            }
        }
    }
}

fn node_kind(data: &NodeData) -> &'static str {
    match data {
        NodeData::Document => "document",
        NodeData::Doctype { .. } => "doctype",
        NodeData::Text { .. } => "text",
        NodeData::Comment { .. } => "comment",
        NodeData::Element { .. } => "element",
        NodeData::ProcessingInstruction { .. } => "processing-instruction",
    }
}
