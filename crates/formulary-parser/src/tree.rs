//! Expression trees.
//!
//! A [`Tree`] is built from postfix tokens. Its nodes live in an arena and
//! refer to each other by [`NodeId`]; the [`NodeDictionary`] maps every
//! postfix token, identified by its index in the postfix sequence, to the
//! node created for it. Nothing in the tree holds a reference back into the
//! token sequence, so a tree can outlive the tokens it was built from.
//!
//! Function calls keep their exact argument structure: the call node's right
//! child is either a single argument or a right-leaning chain of argument
//! separator nodes, see [`Tree::arguments`].

use std::fmt;

use indexmap::IndexMap;
use log::debug;

use formulary_core::{
    span::Span,
    token::{Token, TokenKind},
};

use crate::error::{Diagnostic, ErrorCode, Result};

/// Handle of a node inside its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A binary tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    token: Token,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

impl Node {
    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn kind(&self) -> TokenKind {
        self.token.kind()
    }
}

/// Lookup from postfix token index to node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeDictionary {
    entries: IndexMap<usize, NodeId>,
}

impl NodeDictionary {
    /// The node created for the postfix token at `postfix_index`.
    pub fn get(&self, postfix_index: usize) -> Option<NodeId> {
        self.entries.get(&postfix_index).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in postfix order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, NodeId)> + '_ {
        self.entries.iter().map(|(&index, &id)| (index, id))
    }

    fn insert(&mut self, postfix_index: usize, id: NodeId) {
        self.entries.insert(postfix_index, id);
    }
}

/// A built expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    nodes: Vec<Node>,
    parents: Vec<Option<NodeId>>,
    root: NodeId,
    dictionary: NodeDictionary,
}

/// Build a tree from tokens in postfix order.
///
/// Literals, identifiers and missing-operand placeholders become leaves.
/// Every other token pops its right and then its left operand off the
/// working stack; when fewer than two operands are available it becomes a
/// leaf instead.
///
/// # Errors
///
/// Returns [`ErrorCode::E103`] for an empty sequence and [`ErrorCode::E102`]
/// when more than one operand is left once every token is consumed; the
/// diagnostic labels each residual operand.
pub fn build_tree(postfix: &[Token]) -> Result<Tree> {
    let mut nodes: Vec<Node> = Vec::with_capacity(postfix.len());
    let mut dictionary = NodeDictionary::default();
    let mut stack: Vec<usize> = Vec::new();

    for (index, token) in postfix.iter().enumerate() {
        let id = NodeId(nodes.len());
        let node = if stack.len() < 2 || token.kind().is_operand() {
            Node {
                token: token.clone(),
                left: None,
                right: None,
            }
        } else {
            let right = stack.pop().and_then(|index| dictionary.get(index));
            let left = stack.pop().and_then(|index| dictionary.get(index));
            Node {
                token: token.clone(),
                left,
                right,
            }
        };
        nodes.push(node);
        dictionary.insert(index, id);
        stack.push(index);
    }

    let root = match stack.as_slice() {
        [] => {
            return Err(Diagnostic::error("empty expression")
                .with_code(ErrorCode::E103)
                .with_help("write an operand, an operator or a function call"));
        }
        [single] => dictionary.get(*single),
        residual => {
            let mut diagnostic = Diagnostic::error(format!(
                "expression has {} operands that no operator connects",
                residual.len()
            ))
            .with_code(ErrorCode::E102)
            .with_help("add an operator or an argument separator between them");
            for &index in residual {
                let Some(id) = dictionary.get(index) else {
                    continue;
                };
                diagnostic = diagnostic.with_optional_label(
                    subtree_span(&nodes, id),
                    format!("operand `{}`", render_node(&nodes, id)),
                );
            }
            return Err(diagnostic);
        }
    };
    let Some(root) = root else {
        return Err(Diagnostic::error("empty expression").with_code(ErrorCode::E103));
    };

    let mut parents = vec![None; nodes.len()];
    for (index, node) in nodes.iter().enumerate() {
        for child in [node.left, node.right].into_iter().flatten() {
            parents[child.0] = Some(NodeId(index));
        }
    }

    let tree = Tree {
        nodes,
        parents,
        root,
        dictionary,
    };
    debug!(
        nodes_len = tree.len(),
        height = tree.height();
        "Expression tree built"
    );
    Ok(tree)
}

impl Tree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn token(&self, id: NodeId) -> &Token {
        &self.nodes[id.0].token
    }

    /// All nodes in creation (postfix) order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    /// Nodes whose token has the given kind, in postfix order.
    pub fn nodes_of_kind(&self, kind: TokenKind) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes().filter(move |(_, node)| node.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn dictionary(&self) -> &NodeDictionary {
        &self.dictionary
    }

    /// The node whose left or right child is `id`; `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(id.0).copied().flatten()
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        self.height_of(self.root)
    }

    pub fn height_of(&self, id: NodeId) -> usize {
        fold_subtree::<usize>(&self.nodes, id, |_, left, right| {
            1 + left.copied().unwrap_or(0).max(right.copied().unwrap_or(0))
        })
    }

    /// Number of leaves reachable from the root, placeholders included.
    pub fn leaf_count(&self) -> usize {
        fold_subtree::<usize>(&self.nodes, self.root, |node, left, right| {
            if node.is_leaf() {
                1
            } else {
                left.copied().unwrap_or(0) + right.copied().unwrap_or(0)
            }
        })
    }

    /// The argument nodes of a function call, in source order.
    ///
    /// Walks the separator chain under the call's right child. A call whose
    /// right child is a placeholder has no arguments; a placeholder inside
    /// the chain is an empty argument and is returned as such.
    pub fn arguments(&self, call: NodeId) -> Vec<NodeId> {
        let Some(first) = self.node(call).right else {
            return Vec::new();
        };
        if self.node(first).kind() == TokenKind::Missing {
            return Vec::new();
        }

        let mut arguments = Vec::new();
        let mut current = first;
        loop {
            let node = self.node(current);
            match (node.kind(), node.left, node.right) {
                (TokenKind::ArgumentSeparator, Some(left), Some(right)) => {
                    arguments.push(left);
                    current = right;
                }
                _ => {
                    arguments.push(current);
                    return arguments;
                }
            }
        }
    }

    /// Returns `true` if `id` is a missing-operand placeholder.
    pub fn is_missing(&self, id: NodeId) -> bool {
        self.node(id).kind() == TokenKind::Missing
    }

    /// Source span covered by the subtree rooted at `id`.
    pub fn span_of(&self, id: NodeId) -> Option<Span> {
        subtree_span(&self.nodes, id)
    }

    /// Render the subtree rooted at `id` as infix text.
    ///
    /// Binary and unary operations are fully parenthesized, calls use round
    /// parentheses and placeholders render as nothing.
    pub fn to_infix_at(&self, id: NodeId) -> String {
        render_node(&self.nodes, id)
    }

    /// Render the whole tree as infix text, see [`Tree::to_infix_at`].
    pub fn to_infix(&self) -> String {
        self.to_infix_at(self.root)
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_infix())
    }
}

/// Fold the subtree rooted at `id` from the leaves up.
///
/// Children are created before their parent, so a pass over the arena in
/// index order sees both children of a node before the node itself. Nodes
/// outside the subtree are folded too and their results dropped.
fn fold_subtree<T>(
    nodes: &[Node],
    id: NodeId,
    mut combine: impl FnMut(&Node, Option<&T>, Option<&T>) -> T,
) -> T {
    let mut folded: Vec<T> = Vec::with_capacity(id.0 + 1);
    for node in &nodes[..=id.0] {
        let left = node.left.map(|child| &folded[child.0]);
        let right = node.right.map(|child| &folded[child.0]);
        let value = combine(node, left, right);
        folded.push(value);
    }
    folded.swap_remove(id.0)
}

/// Pending output of [`render_node`].
enum Piece<'a> {
    Node(NodeId),
    Text(&'a str),
}

fn render_node(nodes: &[Node], id: NodeId) -> String {
    let mut out = String::new();
    let mut pending = vec![Piece::Node(id)];

    while let Some(piece) = pending.pop() {
        let id = match piece {
            Piece::Text(text) => {
                out.push_str(text);
                continue;
            }
            Piece::Node(id) => id,
        };
        let node = &nodes[id.0];
        let text = Some(Piece::Text(node.token.text()));
        let child = |side: Option<NodeId>| side.map(Piece::Node);
        let open = Some(Piece::Text("("));
        let close = Some(Piece::Text(")"));

        // Pieces in output order
        let pieces = match node.kind() {
            TokenKind::Missing => vec![],
            TokenKind::Literal
            | TokenKind::Identifier
            | TokenKind::OpenParen
            | TokenKind::CloseParen => vec![text],
            TokenKind::Operator => vec![open, child(node.left), text, child(node.right), close],
            TokenKind::UnaryOperator => {
                let prefix = node
                    .left
                    .is_none_or(|side| nodes[side.0].kind() == TokenKind::Missing);
                if prefix {
                    vec![open, text, child(node.right), close]
                } else {
                    vec![open, child(node.left), text, close]
                }
            }
            TokenKind::ArgumentSeparator => vec![child(node.left), text, child(node.right)],
            TokenKind::Function => vec![text, open, child(node.right), close],
        };
        pending.extend(pieces.into_iter().rev().flatten());
    }
    out
}

fn subtree_span(nodes: &[Node], id: NodeId) -> Option<Span> {
    fold_subtree::<Option<Span>>(nodes, id, |node, left, right| {
        [left.copied().flatten(), right.copied().flatten(), node.token.span()]
            .into_iter()
            .flatten()
            .reduce(|a, b| a.union(b))
    })
}
