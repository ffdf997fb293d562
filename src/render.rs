//! Minimal markdown rendering: turns a `.md` source into a complete styled
//! HTML page so the checker always operates on rendered markup.

use pulldown_cmark::{html, Options as MarkdownOptions, Parser};
use std::ffi::OsStr;
use std::path::Path;

const PAGE_STYLE: &str = "\
body { max-width: 42em; margin: 2em auto; padding: 0 1em; \
font-family: system-ui, sans-serif; line-height: 1.6; }\n\
pre, code { background-color: #f4f4f4; }\n\
pre { padding: 0.75em; overflow-x: auto; }";

pub fn is_markdown(path: &Path) -> bool {
    matches!(
        path.extension().and_then(OsStr::to_str),
        Some("md" | "mdx" | "markdown")
    )
}

/// Render markdown into a full HTML page with a charset declaration, the
/// given title and a small base stylesheet.
pub fn render_page(markdown: &str, title: &str) -> String {
    let mut options = MarkdownOptions::empty();
    options.insert(MarkdownOptions::ENABLE_TABLES);
    options.insert(MarkdownOptions::ENABLE_FOOTNOTES);
    options.insert(MarkdownOptions::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);

    let mut body = String::new();
    html::push_html(&mut body, parser);

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
<title>{}</title>\n<style>\n{PAGE_STYLE}\n</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
        escape_text(title)
    )
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
