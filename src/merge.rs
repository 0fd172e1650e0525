// Folding freshly parsed nodes into an existing tree: the merge side of
// streaming. Each incoming node sinks into the deepest trailing container
// that takes it, so a chunk boundary inside a list or table does not break
// the structure apart.

use comrak::nodes::{ListType, NodeList, NodeTable, NodeValue, TableAlignment};
use tracing::debug;

use crate::document::{kind_name, Error, Node};

/// Fold `incoming` into `nodes`, oldest node first.
pub(crate) fn append_nodes(nodes: &mut Vec<Node>, incoming: Vec<Node>) -> Result<(), Error> {
    for node in incoming {
        append_node(nodes, node)?;
    }
    Ok(())
}

fn append_node(nodes: &mut Vec<Node>, node: Node) -> Result<(), Error> {
    let mut node = node;
    for candidate in nodes.iter_mut().rev() {
        node = match maybe_append(candidate, node) {
            Ok(()) => return Ok(()),
            Err(node) => node,
        };
    }

    // Nothing existing takes it. Loose structural nodes get the container
    // they imply; whatever the document itself can hold starts a new
    // top-level node.
    let node = match wrap_loose(node) {
        Ok(wrapped) => wrapped,
        Err(node) => node,
    };
    if can_contain(&Node::new(NodeValue::Document), &node) {
        nodes.push(node);
        Ok(())
    } else {
        Err(Error::InvalidAppend {
            kind: kind_name(&node.value),
        })
    }
}

/// Try to sink `node` into `parent`, handing it back on failure.
fn maybe_append(parent: &mut Node, node: Node) -> Result<(), Node> {
    if can_contain(parent, &node) {
        parent.children.push(node);
        return Ok(());
    }

    if sibling_lists_match(parent, &node) {
        debug!(
            kind = kind_name(&node.value),
            items = node.children.len(),
            "splicing same-flavor sibling list"
        );
        let mut node = node;
        parent.children.append(&mut node.children);
        return Ok(());
    }

    if fuse_trailing_text(parent, &node) {
        return Ok(());
    }

    match parent.children.last_mut() {
        Some(last) => maybe_append(last, node),
        None => Err(node),
    }
}

/// Whether `parent` can directly contain `child`, mirroring the parser's
/// own containment rules, with one refinement: an item only goes into a
/// list of its own flavor.
pub(crate) fn can_contain(parent: &Node, child: &Node) -> bool {
    match child.value {
        NodeValue::Document => {
            return false;
        }
        NodeValue::FrontMatter(_) => {
            return matches!(parent.value, NodeValue::Document);
        }
        NodeValue::Item(ref child_list) => {
            return match parent.value {
                NodeValue::List(ref list) => same_list_flavor(list, child_list),
                _ => false,
            };
        }
        NodeValue::TaskItem(_) => {
            return matches!(parent.value, NodeValue::List(_));
        }
        NodeValue::DescriptionItem(_) => {
            return matches!(parent.value, NodeValue::DescriptionList);
        }
        NodeValue::DescriptionTerm | NodeValue::DescriptionDetails => {
            return matches!(parent.value, NodeValue::DescriptionItem(_));
        }
        NodeValue::TableRow(_) => {
            return matches!(parent.value, NodeValue::Table(_));
        }
        NodeValue::TableCell => {
            return matches!(parent.value, NodeValue::TableRow(_));
        }
        _ => {}
    }

    match parent.value {
        NodeValue::Document
        | NodeValue::BlockQuote
        | NodeValue::FootnoteDefinition(_)
        | NodeValue::DescriptionTerm
        | NodeValue::DescriptionDetails
        | NodeValue::Item(..)
        | NodeValue::TaskItem(..)
        | NodeValue::MultilineBlockQuote(_)
        | NodeValue::Alert(_) => child.value.block(),

        NodeValue::List(..) | NodeValue::DescriptionList | NodeValue::Table(..) => false,

        NodeValue::Paragraph
        | NodeValue::Heading(..)
        | NodeValue::TableCell
        | NodeValue::Emph
        | NodeValue::Strong
        | NodeValue::Link(..)
        | NodeValue::Image(..)
        | NodeValue::WikiLink(..)
        | NodeValue::Strikethrough
        | NodeValue::Superscript
        | NodeValue::SpoileredText
        | NodeValue::Underline
        | NodeValue::Subscript => !child.value.block(),

        _ => false,
    }
}

/// Same list type and same marker: the formatter would render the two as
/// one uninterrupted list.
fn same_list_flavor(a: &NodeList, b: &NodeList) -> bool {
    a.list_type == b.list_type
        && match a.list_type {
            ListType::Bullet => a.bullet_char == b.bullet_char,
            ListType::Ordered => a.delimiter == b.delimiter,
        }
}

/// Two lists of the same flavor are one list cut in half by a chunk
/// boundary; their items belong together.
fn sibling_lists_match(parent: &Node, node: &Node) -> bool {
    match (&parent.value, &node.value) {
        (NodeValue::List(a), NodeValue::List(b)) => same_list_flavor(a, b),
        (NodeValue::DescriptionList, NodeValue::DescriptionList) => true,
        _ => false,
    }
}

/// Text streamed right after an item continues the item's trailing text
/// node rather than opening anything new.
fn fuse_trailing_text(parent: &mut Node, node: &Node) -> bool {
    if !matches!(parent.value, NodeValue::Item(..) | NodeValue::TaskItem(..)) {
        return false;
    }
    let incoming = match node.value {
        NodeValue::Text(ref text) => text,
        _ => return false,
    };
    if let Some(last) = parent.children.last_mut() {
        if let NodeValue::Text(ref mut text) = last.value {
            debug!(len = incoming.len(), "fusing text into trailing text node");
            text.push_str(incoming);
            return true;
        }
    }
    false
}

/// A loose item, task item, description item or table row arriving at the
/// top level gets wrapped into the container it implies.
fn wrap_loose(node: Node) -> Result<Node, Node> {
    let container = match node.value {
        NodeValue::Item(ref list) => NodeValue::List(*list),
        NodeValue::TaskItem(..) => NodeValue::List(NodeList {
            list_type: ListType::Bullet,
            bullet_char: b'-',
            tight: true,
            is_task_list: true,
            ..NodeList::default()
        }),
        NodeValue::DescriptionItem(_) => NodeValue::DescriptionList,
        NodeValue::TableRow(_) => {
            let columns = node.children.len();
            NodeValue::Table(NodeTable {
                alignments: vec![TableAlignment::None; columns],
                num_columns: columns,
                num_rows: 1,
                num_nonempty_cells: 0,
            })
        }
        _ => return Err(node),
    };
    debug!(kind = kind_name(&node.value), "wrapping loose node");
    Ok(Node {
        value: container,
        children: vec![node],
    })
}
