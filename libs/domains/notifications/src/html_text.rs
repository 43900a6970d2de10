//! Plain-text alternative derived from an HTML body.

use scraper::{ElementRef, Html, Node};

const INVISIBLE: [&str; 5] = ["head", "title", "style", "script", "template"];
const HEADINGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];
const BLOCKS: [&str; 14] = [
    "p", "div", "tr", "table", "thead", "tbody", "ul", "ol", "section", "article", "header", "footer",
    "blockquote", "hr",
];

/// Headings become `### HEADING ###`, links `text [href]`, block elements line breaks.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    render_children(fragment.root_element(), &mut out);
    tidy(&out)
}

fn render_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_collapsed(out, text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    render_element(child, out);
                }
            }
            _ => {}
        }
    }
}

fn render_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    match name {
        _ if INVISIBLE.contains(&name) => {}
        _ if HEADINGS.contains(&name) => {
            out.push_str(&format!("\n### {} ###\n", inline_text(element).to_uppercase()));
        }
        "a" => match element.value().attr("href") {
            Some(href) => {
                let label = inline_text(element);
                if label.is_empty() || label == href {
                    out.push_str(href);
                } else {
                    out.push_str(&format!("{} [{}]", label, href));
                }
            }
            None => render_children(element, out),
        },
        "br" => out.push('\n'),
        "li" => {
            out.push_str("\n * ");
            render_children(element, out);
            out.push('\n');
        }
        _ if BLOCKS.contains(&name) => {
            out.push('\n');
            render_children(element, out);
            out.push('\n');
        }
        _ => render_children(element, out),
    }
}

fn inline_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    render_children(element, &mut text);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Source whitespace is insignificant; only rendered breaks survive.
fn push_collapsed(out: &mut String, text: &str) {
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
}

/// Trims every line and keeps at most one blank line in a row.
fn tidy(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() && lines.last().is_none_or(|last| last.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|last| last.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
