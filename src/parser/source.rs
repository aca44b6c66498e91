use scraper::{ElementRef, Html, Node, Selector};
use tracing::warn;

use crate::error::{Error, Result};
use crate::rules::ExtractionRules;

/// One element of a page snapshot, as the pipeline sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentNode {
    pub attributes: Vec<(String, String)>,
    pub text: String,
    /// Child elements only; text children don't count.
    pub child_count: usize,
}

impl ContentNode {
    pub fn text(text: &str) -> Self {
        ContentNode {
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_children(mut self, count: usize) -> Self {
        self.child_count = count;
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_leaf(&self) -> bool {
        self.child_count == 0
    }
}

/// Read-only view of a fully loaded page.
pub trait ContentSource {
    /// Every node matching at least one selector, once each, in document order.
    fn query(&self, selectors: &[String]) -> Vec<ContentNode>;
}

// ── HTML snapshot ──

pub struct HtmlSnapshot {
    document: Html,
}

impl HtmlSnapshot {
    pub fn parse(html: &str) -> Self {
        HtmlSnapshot {
            document: Html::parse_document(html),
        }
    }
}

impl ContentSource for HtmlSnapshot {
    fn query(&self, selectors: &[String]) -> Vec<ContentNode> {
        if selectors.is_empty() {
            return Vec::new();
        }
        let joined = selectors.join(", ");
        let selector = match Selector::parse(&joined) {
            Ok(s) => s,
            Err(e) => {
                warn!(selectors = %joined, error = %e, "Unparsable selector list, skipping");
                return Vec::new();
            }
        };

        self.document
            .select(&selector)
            .map(|el| ContentNode {
                attributes: el
                    .value()
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                text: rendered_text(&el),
                child_count: el.children().filter(|c| c.value().is_element()).count(),
            })
            .collect()
    }
}

/// Elements that sit on their own lines when rendered.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// Elements whose contents never render.
const HIDDEN_TAGS: &[&str] = &["script", "style", "template"];

/// Approximates what a browser shows for the element: whitespace inside text
/// collapses, `<br>` and block elements break the line, hidden elements are
/// skipped, blank lines disappear.
fn rendered_text(el: &ElementRef) -> String {
    let mut raw = String::new();
    render_children(*el, &mut raw);

    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_children(el: ElementRef, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => push_collapsed(out, text),
            Node::Element(e) => {
                let name = e.name();
                if HIDDEN_TAGS.contains(&name) {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                if BLOCK_TAGS.contains(&name) {
                    out.push('\n');
                    render_children(child_el, out);
                    out.push('\n');
                } else {
                    render_children(child_el, out);
                }
            }
            _ => {}
        }
    }
}

fn push_collapsed(out: &mut String, text: &str) {
    let mut pending_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            pending_space = true;
        } else {
            if pending_space && !out.is_empty() && !out.ends_with('\n') {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        }
    }
    if pending_space && !out.is_empty() && !out.ends_with('\n') {
        out.push(' ');
    }
}

/// Rejects rule sets whose selectors the HTML engine can't parse.
pub fn validate_selectors(rules: &ExtractionRules) -> Result<()> {
    let all = rules
        .marker_selectors
        .iter()
        .chain(std::iter::once(&rules.label_selector))
        .chain(rules.leaf_selectors.iter());
    for selector in all {
        if let Err(e) = Selector::parse(selector) {
            return Err(Error::InvalidSelector {
                selector: selector.clone(),
                reason: e.to_string(),
            });
        }
    }
    Ok(())
}

// ── In-memory tree ──

/// Fake content source: each node answers to the selectors it was registered with.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    nodes: Vec<(Vec<String>, ContentNode)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, selectors: &[&str], node: ContentNode) -> Self {
        self.nodes
            .push((selectors.iter().map(|s| s.to_string()).collect(), node));
        self
    }
}

impl ContentSource for MemorySource {
    fn query(&self, selectors: &[String]) -> Vec<ContentNode> {
        self.nodes
            .iter()
            .filter(|(tags, _)| tags.iter().any(|t| selectors.contains(t)))
            .map(|(_, node)| node.clone())
            .collect()
    }
}
