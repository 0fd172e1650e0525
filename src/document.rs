//! An owned document tree that outlives the parse arena.
//!
//! comrak's AST borrows from its parse [`Arena`]; streaming needs a tree
//! that can be held across parses, appended to, and rendered on demand. [`Node`] deep-copies the arena AST into plain owned values and
//! [`Document`] is the forest of top-level blocks, with the fold/merge
//! operations living in one place.

use std::io;

use comrak::nodes::{AstNode, NodeValue};
use comrak::{format_commonmark, format_html, parse_document, Arena, Options};

use crate::merge;

/// Errors from appending to or rendering a [`Document`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The node fits nowhere in the tree: it is inline, and no open
    /// container accepts it.
    #[error("cannot append {kind} node to the document")]
    InvalidAppend {
        /// Kind of the rejected node.
        kind: &'static str,
    },
    /// A formatter failed, or produced bytes that were not UTF-8.
    #[error("render failed: {0}")]
    Render(#[from] io::Error),
}

/// One node of the tree: a [`NodeValue`] plus its children, owned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// What the node is.
    pub value: NodeValue,
    /// Its children, in order.
    pub children: Vec<Node>,
}

/// An owned Markdown document: the top-level blocks, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Top-level blocks.
    pub nodes: Vec<Node>,
}

impl Node {
    /// A node with no children.
    pub fn new(value: NodeValue) -> Node {
        Node {
            value,
            children: vec![],
        }
    }

    /// Deep-copy an arena node and its descendants.
    pub fn from_ast<'a>(node: &'a AstNode<'a>) -> Node {
        Node {
            value: node.data.borrow().value.clone(),
            children: node.children().map(Node::from_ast).collect(),
        }
    }

    /// Allocate this node and its descendants into `arena`.
    pub fn to_ast<'a>(&self, arena: &'a Arena<AstNode<'a>>) -> &'a AstNode<'a> {
        let ast: &AstNode = arena.alloc(self.value.clone().into());
        for child in &self.children {
            ast.append(child.to_ast(arena));
        }
        ast
    }
}

impl Document {
    /// Parse `text` into an owned tree.
    ///
    /// ```
    /// use comrak::Options;
    /// use markstream::Document;
    ///
    /// let doc = Document::parse("hello *world*", &Options::default());
    /// assert_eq!(doc.nodes.len(), 1);
    /// ```
    pub fn parse(text: &str, options: &Options) -> Document {
        let arena = Arena::new();
        let root = parse_document(&arena, text, options);
        Document {
            nodes: root.children().map(Node::from_ast).collect(),
        }
    }

    /// Fold `nodes` into the tree, each one landing in the deepest
    /// trailing container that accepts it: contained nodes are pushed,
    /// same-flavor sibling lists are spliced, loose items and rows are
    /// wrapped into the container they imply, and anything else a
    /// document can hold starts a new top-level node.
    pub fn append_nodes(&mut self, nodes: Vec<Node>) -> Result<(), Error> {
        merge::append_nodes(&mut self.nodes, nodes)
    }

    /// Append every top-level node of `other` via [`Document::append_nodes`].
    pub fn merge(&mut self, other: Document) -> Result<(), Error> {
        merge::append_nodes(&mut self.nodes, other.nodes)
    }

    /// Render the tree back to CommonMark.
    pub fn to_commonmark(&self, options: &Options) -> Result<String, Error> {
        let arena = Arena::new();
        let mut out = vec![];
        format_commonmark(self.to_ast(&arena), options, &mut out)?;
        rendered_string(out)
    }

    /// Render the tree to HTML.
    pub fn to_html(&self, options: &Options) -> Result<String, Error> {
        let arena = Arena::new();
        let mut out = vec![];
        format_html(self.to_ast(&arena), options, &mut out)?;
        rendered_string(out)
    }

    /// Allocate the whole document into `arena` under a fresh root.
    pub fn to_ast<'a>(&self, arena: &'a Arena<AstNode<'a>>) -> &'a AstNode<'a> {
        let root: &AstNode = arena.alloc(NodeValue::Document.into());
        for node in &self.nodes {
            root.append(node.to_ast(arena));
        }
        root
    }
}

fn rendered_string(bytes: Vec<u8>) -> Result<String, Error> {
    String::from_utf8(bytes)
        .map_err(|e| Error::Render(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Node kind name for diagnostics.
pub(crate) fn kind_name(value: &NodeValue) -> &'static str {
    match *value {
        NodeValue::Document => "document",
        NodeValue::FrontMatter(_) => "frontmatter",
        NodeValue::BlockQuote => "block_quote",
        NodeValue::List(..) => "list",
        NodeValue::Item(..) => "item",
        NodeValue::DescriptionList => "description_list",
        NodeValue::DescriptionItem(_) => "description_item",
        NodeValue::DescriptionTerm => "description_term",
        NodeValue::DescriptionDetails => "description_details",
        NodeValue::CodeBlock(..) => "code_block",
        NodeValue::HtmlBlock(..) => "html_block",
        NodeValue::Paragraph => "paragraph",
        NodeValue::Heading(..) => "heading",
        NodeValue::ThematicBreak => "thematic_break",
        NodeValue::FootnoteDefinition(_) => "footnote_definition",
        NodeValue::FootnoteReference(..) => "footnote_reference",
        NodeValue::Table(..) => "table",
        NodeValue::TableRow(..) => "table_row",
        NodeValue::TableCell => "table_cell",
        NodeValue::Text(..) => "text",
        NodeValue::TaskItem { .. } => "taskitem",
        NodeValue::SoftBreak => "softbreak",
        NodeValue::LineBreak => "linebreak",
        NodeValue::Code(..) => "code",
        NodeValue::HtmlInline(..) => "html_inline",
        NodeValue::Emph => "emph",
        NodeValue::Strong => "strong",
        NodeValue::Strikethrough => "strikethrough",
        NodeValue::Superscript => "superscript",
        NodeValue::Link(..) => "link",
        NodeValue::Image(..) => "image",
        NodeValue::Math(..) => "math",
        NodeValue::MultilineBlockQuote(_) => "multiline_block_quote",
        NodeValue::WikiLink(..) => "wikilink",
        NodeValue::Underline => "underline",
        NodeValue::Subscript => "subscript",
        NodeValue::SpoileredText => "spoiler",
        NodeValue::Alert(_) => "alert",
        _ => "unknown",
    }
}
