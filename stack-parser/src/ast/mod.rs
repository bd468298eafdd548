//! The arena-based abstract syntax tree produced by the [`Parser`](crate::parser::Parser).
//!
//! Nodes are stored in a flat [`Vec`] and refer to their children by [`NodeId`]. Whether a node
//! is invalid is tracked in a side table owned by the [`Ast`], so filters can mark nodes without
//! rebuilding the tree.

pub mod fmt;
pub mod iter;

use crate::parser::op::{BinOpKind, PostfixOpKind, PrefixOpKind};
use iter::Descendants;
use stack_error::Error;
use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a node inside an [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Returns the position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// How an implied multiplication was written by the author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Implicit {
    /// The operands were written directly next to each other, as in `2x` or `(a)(b)`.
    Juxtaposed,

    /// The operands were separated by whitespace, as in `x y`.
    Space,
}

/// The kind-specific contents of a node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeKind {
    /// The root of the tree, holding one or more statements.
    Root { statements: Vec<NodeId> },

    /// A single statement, delimited by `;` or `$` from its neighbours.
    Statement { expr: NodeId },

    /// A numeric literal, kept exactly as written (`12`, `1.50`, `3e-2`).
    Number { raw: String },

    /// A string literal. The value is the unescaped content, without the quotes.
    Str { value: String },

    /// A variable or function name.
    Identifier { name: String },

    /// A function call. The callee is usually an identifier, but may be any expression, as in
    /// `(f)(x)` or `f(x)(y)`.
    Call { callee: NodeId, args: Vec<NodeId> },

    /// A prefix operation, such as `-x`.
    Prefix { op: PrefixOpKind, operand: NodeId },

    /// A postfix operation, such as `n!`.
    Postfix { op: PostfixOpKind, operand: NodeId },

    /// A binary operation. `implicit` is set when the multiplication was implied rather than
    /// written.
    Binary {
        op: BinOpKind,
        lhs: NodeId,
        rhs: NodeId,
        implicit: Option<Implicit>,
    },

    /// A parenthesized group, `(a)` or `(a, b)`.
    Group { items: Vec<NodeId> },

    /// A list, `[a, b]`.
    List { items: Vec<NodeId> },

    /// A set, `{a, b}`.
    Set { items: Vec<NodeId> },

    /// A placeholder for an expression the parser expected but could not find. Always invalid.
    Missing,
}

/// A single node of the tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Node {
    /// The contents of the node.
    pub kind: NodeKind,

    /// The region of the source code that this node was parsed from.
    pub span: Range<usize>,
}

impl Node {
    /// Returns the children of this node, in source order.
    pub fn children(&self) -> Vec<NodeId> {
        match &self.kind {
            NodeKind::Root { statements } => statements.clone(),
            NodeKind::Statement { expr } => vec![*expr],
            NodeKind::Call { callee, args } => {
                let mut children = Vec::with_capacity(args.len() + 1);
                children.push(*callee);
                children.extend(args.iter().copied());
                children
            },
            NodeKind::Prefix { operand, .. } | NodeKind::Postfix { operand, .. } => vec![*operand],
            NodeKind::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            NodeKind::Group { items } | NodeKind::List { items } | NodeKind::Set { items } => items.clone(),
            NodeKind::Number { .. }
                | NodeKind::Str { .. }
                | NodeKind::Identifier { .. }
                | NodeKind::Missing => Vec::new(),
        }
    }
}

/// A parsed expression, together with its source, syntax errors, and invalid marks.
#[derive(Debug)]
pub struct Ast {
    /// The source code the tree was parsed from.
    source: String,

    /// The node arena. Nodes replaced by filters stay in the arena but are no longer reachable
    /// from the root.
    nodes: Vec<Node>,

    /// The root node.
    root: NodeId,

    /// Side table of invalid marks, indexed like `nodes`.
    invalid: Vec<bool>,

    /// Syntax errors found while parsing.
    errors: Vec<Error>,
}

impl Ast {
    /// Assembles a tree from its parts. Used by the parser.
    pub(crate) fn from_parts(
        source: String,
        nodes: Vec<Node>,
        root: NodeId,
        invalid: Vec<bool>,
        errors: Vec<Error>,
    ) -> Self {
        Self { source, nodes, root, invalid, errors }
    }

    /// Returns the source code the tree was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the node with the given id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Returns the kind of the node with the given id.
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Returns the span of the node with the given id.
    pub fn span(&self, id: NodeId) -> Range<usize> {
        self.nodes[id.0].span.clone()
    }

    /// Returns the part of the source code the node was parsed from.
    pub fn source_of(&self, id: NodeId) -> &str {
        let span = self.span(id);
        self.source.get(span).unwrap_or_default()
    }

    /// Returns the statements held by the root.
    pub fn statements(&self) -> &[NodeId] {
        match self.kind(self.root) {
            NodeKind::Root { statements } => statements,
            _ => &[],
        }
    }

    /// Returns the expression of the first statement. This is the whole expression for
    /// single-statement inputs such as student answers.
    pub fn first_expr(&self) -> Option<NodeId> {
        self.statements().first().and_then(|&stmt| match self.kind(stmt) {
            NodeKind::Statement { expr } => Some(*expr),
            _ => None,
        })
    }

    /// Returns an iterator over the given node and all of its descendants, in pre-order (parents
    /// before children, children left to right).
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants::new(self, id)
    }

    /// Returns an iterator over every node reachable from the root, in pre-order.
    pub fn walk(&self) -> Descendants<'_> {
        self.descendants(self.root)
    }

    /// Returns the syntax errors found while parsing.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Removes and returns the syntax errors found while parsing.
    pub fn take_errors(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.errors)
    }

    /// Returns true if the node itself has been marked invalid.
    pub fn is_invalid(&self, id: NodeId) -> bool {
        self.invalid[id.0]
    }

    /// Marks the node as invalid. Marks are never removed.
    pub fn mark_invalid(&mut self, id: NodeId) {
        self.invalid[id.0] = true;
    }

    /// Returns true if neither the node nor any of its descendants is invalid.
    pub fn is_subtree_valid(&self, id: NodeId) -> bool {
        self.descendants(id).all(|node| !self.is_invalid(node))
    }

    /// Returns true if the tree parsed without errors and no reachable node is marked invalid.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.is_subtree_valid(self.root)
    }

    /// Returns the ids of every reachable node that is marked invalid, in pre-order.
    pub fn invalid_nodes(&self) -> Vec<NodeId> {
        self.walk().filter(|&id| self.is_invalid(id)).collect()
    }

    /// Adds a new node to the arena and returns its id. The node is not reachable until a parent
    /// refers to it.
    pub fn push(&mut self, kind: NodeKind, span: Range<usize>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { kind, span });
        self.invalid.push(false);
        id
    }

    /// Replaces the contents of a node, keeping its span and invalid mark.
    pub fn replace(&mut self, id: NodeId, kind: NodeKind) {
        self.nodes[id.0].kind = kind;
    }

    /// Copies the subtree of `other` rooted at `from` into this tree, in place of the node `at`.
    ///
    /// The copied nodes take the span of `at`, since they have no source of their own in this
    /// tree. Their invalid marks are copied along with them.
    pub fn graft(&mut self, at: NodeId, other: &Ast, from: NodeId) {
        let span = self.span(at);
        let kind = self.copy_kind(other, from, &span);
        self.replace(at, kind);
        if other.is_invalid(from) {
            self.mark_invalid(at);
        }
    }

    fn copy_node(&mut self, other: &Ast, from: NodeId, span: &Range<usize>) -> NodeId {
        let kind = self.copy_kind(other, from, span);
        let id = self.push(kind, span.clone());
        if other.is_invalid(from) {
            self.mark_invalid(id);
        }
        id
    }

    fn copy_all(&mut self, other: &Ast, from: &[NodeId], span: &Range<usize>) -> Vec<NodeId> {
        from.iter().map(|&id| self.copy_node(other, id, span)).collect()
    }

    fn copy_kind(&mut self, other: &Ast, from: NodeId, span: &Range<usize>) -> NodeKind {
        match other.kind(from).clone() {
            NodeKind::Root { statements } => NodeKind::Root {
                statements: self.copy_all(other, &statements, span),
            },
            NodeKind::Statement { expr } => NodeKind::Statement {
                expr: self.copy_node(other, expr, span),
            },
            NodeKind::Call { callee, args } => NodeKind::Call {
                callee: self.copy_node(other, callee, span),
                args: self.copy_all(other, &args, span),
            },
            NodeKind::Prefix { op, operand } => NodeKind::Prefix {
                op,
                operand: self.copy_node(other, operand, span),
            },
            NodeKind::Postfix { op, operand } => NodeKind::Postfix {
                op,
                operand: self.copy_node(other, operand, span),
            },
            NodeKind::Binary { op, lhs, rhs, implicit } => NodeKind::Binary {
                op,
                lhs: self.copy_node(other, lhs, span),
                rhs: self.copy_node(other, rhs, span),
                implicit,
            },
            NodeKind::Group { items } => NodeKind::Group { items: self.copy_all(other, &items, span) },
            NodeKind::List { items } => NodeKind::List { items: self.copy_all(other, &items, span) },
            NodeKind::Set { items } => NodeKind::Set { items: self.copy_all(other, &items, span) },
            leaf @ (NodeKind::Number { .. }
                | NodeKind::Str { .. }
                | NodeKind::Identifier { .. }
                | NodeKind::Missing) => leaf,
        }
    }

    /// Returns the name of the node if it is an identifier.
    pub fn identifier(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Identifier { name } => Some(name),
            _ => None,
        }
    }

    /// Returns the name of the function being called if the node is a call to a plain
    /// identifier.
    pub fn call_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Call { callee, .. } => self.identifier(*callee),
            _ => None,
        }
    }

    /// Returns true if the node is a numeric literal written with a decimal point or exponent.
    pub fn is_float(&self, id: NodeId) -> bool {
        match self.kind(id) {
            NodeKind::Number { raw } => raw.contains(['.', 'e', 'E']),
            _ => false,
        }
    }

    /// Returns the leftmost numeric literal at or below the given node, if any.
    pub fn leftmost_number(&self, id: NodeId) -> Option<NodeId> {
        self.descendants(id).find(|&node| matches!(self.kind(node), NodeKind::Number { .. }))
    }
}
