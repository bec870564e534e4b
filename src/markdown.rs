//! Markdown files as outline sources.
//!
//! Headings nest by level, list items nest under the heading (or item) that
//! contains them, and every other block becomes body text of the nearest
//! heading or item. Node ids are derived from the parent id, the title and
//! how often that title already occurred under the parent, so reparsing an
//! unchanged document yields the same ids.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::Path;

use anyhow::{Context, Result};
use comrak::nodes::{AstNode, NodeValue};
use comrak::{Arena, Options, parse_document};

use crate::source::{MemoryTree, SourceError};
use crate::tree::NodeId;

/// Id of the document root of every parsed outline.
pub const ROOT_ID: NodeId = NodeId(0);

/// Read and parse the markdown file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn load_outline(path: &Path) -> Result<MemoryTree> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let title = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
    Ok(parse_outline(&source, &title))
}

/// Parse markdown `source` into a tree whose root is titled `title`.
///
/// # Example
///
/// ```
/// use outliner::markdown::{parse_outline, ROOT_ID};
/// use outliner::source::TreeSource;
///
/// let tree = parse_outline("# One\n\n## Two\n\n- item\n", "notes.md");
/// assert_eq!(tree.text(ROOT_ID), Some("notes.md"));
/// let one = tree.children(ROOT_ID)[0];
/// let two = tree.children(one)[0];
/// assert_eq!(tree.children(two).len(), 1);
/// ```
pub fn parse_outline(source: &str, title: &str) -> MemoryTree {
    let _scope = crate::perf::scope("markdown.parse_outline");
    let arena = Arena::new();
    let options = create_options();
    let root = parse_document(&arena, source, &options);

    let mut builder = OutlineBuilder::new(title);
    for child in root.children() {
        builder.block(child);
    }
    builder.finish()
}

fn create_options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options
}

struct OutlineBuilder {
    tree: MemoryTree,
    /// Open headings, outermost first.
    headings: Vec<(u8, NodeId)>,
    occurrences: HashMap<(NodeId, String), u32>,
    /// Title plus accumulated body, flushed into the tree at the end.
    texts: HashMap<NodeId, String>,
}

impl OutlineBuilder {
    fn new(title: &str) -> Self {
        Self {
            tree: MemoryTree::with_root(ROOT_ID, title),
            headings: Vec::new(),
            occurrences: HashMap::new(),
            texts: HashMap::from([(ROOT_ID, title.to_string())]),
        }
    }

    fn current_section(&self) -> NodeId {
        self.headings.last().map_or(ROOT_ID, |(_, id)| *id)
    }

    fn block<'a>(&mut self, node: &'a AstNode<'a>) {
        let value = node.data.borrow().value.clone();
        match value {
            NodeValue::Heading(heading) => {
                while self
                    .headings
                    .last()
                    .is_some_and(|(level, _)| *level >= heading.level)
                {
                    self.headings.pop();
                }
                let parent = self.current_section();
                let id = self.add_node(parent, inline_text(node));
                self.headings.push((heading.level, id));
            }
            NodeValue::List(_) => {
                let parent = self.current_section();
                self.list(node, parent);
            }
            NodeValue::ThematicBreak => {}
            _ => {
                let section = self.current_section();
                self.append_body(section, &block_text(node));
            }
        }
    }

    fn list<'a>(&mut self, list: &'a AstNode<'a>, parent: NodeId) {
        for item in list.children() {
            let marker = match &item.data.borrow().value {
                NodeValue::Item(_) => "",
                NodeValue::TaskItem(Some(_)) => "[x] ",
                NodeValue::TaskItem(None) => "[ ] ",
                _ => continue,
            };
            let mut id = None;
            for child in item.children() {
                let is_list = matches!(child.data.borrow().value, NodeValue::List(_));
                let owner = match id {
                    Some(owner) => owner,
                    None => {
                        let title = if is_list {
                            String::new()
                        } else {
                            format!("{marker}{}", inline_text(child))
                        };
                        let owner = self.add_node(parent, title);
                        id = Some(owner);
                        if !is_list {
                            continue;
                        }
                        owner
                    }
                };
                if is_list {
                    self.list(child, owner);
                } else {
                    self.append_body(owner, &block_text(child));
                }
            }
            if id.is_none() {
                self.add_node(parent, marker.trim_end().to_string());
            }
        }
    }

    fn add_node(&mut self, parent: NodeId, title: String) -> NodeId {
        let occurrence = self
            .occurrences
            .entry((parent, title.clone()))
            .and_modify(|count| *count += 1)
            .or_insert(0);
        let mut id = stable_id(parent, &title, *occurrence);
        loop {
            match self.tree.insert_with_id(parent, id, title.as_str(), usize::MAX) {
                Err(SourceError::DuplicateNode(_)) => id = NodeId(id.0.wrapping_add(1)),
                Err(err) => {
                    tracing::warn!(%err, "skipping markdown node");
                    break;
                }
                Ok(_) => break,
            }
        }
        self.texts.insert(id, title);
        id
    }

    fn append_body(&mut self, id: NodeId, body: &str) {
        let body = body.trim_end();
        if body.is_empty() {
            return;
        }
        let text = self.texts.entry(id).or_default();
        text.push_str("\n\n");
        text.push_str(body);
    }

    fn finish(mut self) -> MemoryTree {
        for (id, text) in self.texts {
            if self.tree.set_text(id, text).is_err() {
                tracing::warn!(node = %id, "lost body text while building outline");
            }
        }
        tracing::debug!(nodes = self.tree.len(), "markdown outline built");
        self.tree
    }
}

fn stable_id(parent: NodeId, title: &str, occurrence: u32) -> NodeId {
    let mut hasher = DefaultHasher::new();
    parent.hash(&mut hasher);
    title.hash(&mut hasher);
    occurrence.hash(&mut hasher);
    match hasher.finish() {
        0 => NodeId(1),
        hash => NodeId(hash),
    }
}

/// Flattened inline text of a heading or paragraph.
fn inline_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    inline_text_recursive(node, &mut text);
    text.trim().to_string()
}

fn inline_text_recursive<'a>(node: &'a AstNode<'a>, text: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(t) => text.push_str(t),
        NodeValue::Code(code) => {
            text.push('`');
            text.push_str(&code.literal);
            text.push('`');
        }
        NodeValue::SoftBreak | NodeValue::LineBreak => text.push(' '),
        NodeValue::List(_) => {}
        _ => {
            for child in node.children() {
                inline_text_recursive(child, text);
            }
        }
    }
}

/// Plain text of a non-heading block.
fn block_text<'a>(node: &'a AstNode<'a>) -> String {
    match &node.data.borrow().value {
        NodeValue::CodeBlock(code) => code.literal.clone(),
        NodeValue::HtmlBlock(html) => html.literal.clone(),
        NodeValue::Table(_) => node
            .children()
            .map(|row| {
                row.children()
                    .map(inline_text)
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect::<Vec<_>>()
            .join("\n"),
        NodeValue::BlockQuote => node
            .children()
            .map(|child| format!("> {}", block_text(child)))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => inline_text(node),
    }
}
