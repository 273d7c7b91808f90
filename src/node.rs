// Copyright 2023 Christian Jaeger <ch@christianjaeger.ch>. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.


//! The tree produced by [parse](crate::parse::parse).
//!
//! All nodes of one parse live in an arena ([Ast]) and link to their
//! first child and next sibling by index. A node is either a list or
//! a scalar; a list has no text, a scalar has no children. The root
//! is a synthetic list whose children are the top-level nodes.
//!
//! ```text
//! ((1 2) 3 4)
//!
//! root
//!  `- list --next--> "3" --next--> "4"
//!      `- "1" --next--> "2"
//! ```

use crate::context::Located;
use crate::decode::{self, Decode, DecodeError};
use crate::pos::SourceLoc;
use crate::value;
use std::fmt::{Display, Formatter, Write};
use thiserror::Error;

pub(crate) fn ordinal(n: &usize) -> String {
    let suffix =
        if (10..=20).contains(&(n % 100)) {
            "th"
        } else {
            match n % 10 {
                1 => "st",
                2 => "nd",
                3 => "rd",
                _ => "th",
            }
        };
    format!("{}{}", n, suffix)
}

fn the_list_has(n: &usize, what: &str, whats: &str) -> String {
    match n {
        0 => format!("the list has no {}", whats),
        1 => format!("the list has 1 {} only", what),
        _ => format!("the list has {} {} only", n, whats),
    }
}

fn the_list_has_children(n: &usize) -> String {
    the_list_has(n, "child", "children")
}

fn the_list_has_siblings(n: &usize) -> String {
    the_list_has(n, "sibling", "siblings")
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// `index` is 1-based
    #[error("cannot retrieve {} child node, {}",
            ordinal(.index), the_list_has_children(.count))]
    NoSuchChild { loc: SourceLoc, node: NodeId, index: usize, count: usize },
    #[error("cannot retrieve {} sibling node, {}",
            ordinal(.index), the_list_has_siblings(.count))]
    NoSuchSibling { loc: SourceLoc, node: NodeId, index: usize, count: usize },
    #[error("node is not a list, expected list of key/value pairs")]
    NotAList { loc: SourceLoc, node: NodeId },
    #[error("node is not a list, expected key/value pair")]
    NotAPair { loc: SourceLoc, node: NodeId },
}

impl NodeError {
    /// The node the failing query was made on.
    pub fn node(&self) -> NodeId {
        match self {
            NodeError::NoSuchChild { node, .. } => *node,
            NodeError::NoSuchSibling { node, .. } => *node,
            NodeError::NotAList { node, .. } => *node,
            NodeError::NotAPair { node, .. } => *node,
        }
    }
}

impl Located for NodeError {
    fn loc(&self) -> SourceLoc {
        match self {
            NodeError::NoSuchChild { loc, .. } => *loc,
            NodeError::NoSuchSibling { loc, .. } => *loc,
            NodeError::NotAList { loc, .. } => *loc,
            NodeError::NotAPair { loc, .. } => *loc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nodekind {
    List,
    Scalar,
}

#[derive(Debug, Clone)]
struct NodeData {
    loc: SourceLoc,
    kind: Nodekind,
    // range in Ast::text, empty for lists
    start: usize,
    end: usize,
    first_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

/// Owns all nodes of one parse. Immutable once the parser hands it
/// out.
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<NodeData>,
    text: Vec<u8>,
}

impl Ast {
    pub(crate) fn new(root_loc: SourceLoc) -> Ast {
        let mut ast = Ast { nodes: Vec::new(), text: Vec::new() };
        ast.push_list(root_loc);
        ast
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len())
                        .unwrap_or_else(|_| panic!("too many nodes")));
        self.nodes.push(data);
        id
    }

    pub(crate) fn push_list(&mut self, loc: SourceLoc) -> NodeId {
        let at = self.text.len();
        self.push(NodeData {
            loc,
            kind: Nodekind::List,
            start: at,
            end: at,
            first_child: None,
            next_sibling: None,
        })
    }

    pub(crate) fn push_scalar(&mut self, loc: SourceLoc, value: &[u8]) -> NodeId {
        let start = self.text.len();
        self.text.extend_from_slice(value);
        self.push(NodeData {
            loc,
            kind: Nodekind::Scalar,
            start,
            end: self.text.len(),
            first_child: None,
            next_sibling: None,
        })
    }

    /// Link `child` after `prev` (the current last child of
    /// `parent`, if any).
    pub(crate) fn append(&mut self, parent: NodeId, prev: Option<NodeId>, child: NodeId) {
        match prev {
            None => self.nodes[parent.index()].first_child = Some(child),
            Some(prev) => self.nodes[prev.index()].next_sibling = Some(child),
        }
    }

    pub fn root(&self) -> Node<'_> {
        Node { ast: self, id: NodeId(0) }
    }

    /// Panics if `id` is not from this tree.
    pub fn node(&self, id: NodeId) -> Node<'_> {
        assert!(id.index() < self.nodes.len(), "{:?} is not a node of this tree", id);
        Node { ast: self, id }
    }

    /// Number of nodes including the root.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }
}

/// A borrowed handle to one node of an [Ast].
#[derive(Clone, Copy)]
pub struct Node<'a> {
    ast: &'a Ast,
    id: NodeId,
}

impl<'a> Node<'a> {
    fn data(&self) -> &'a NodeData {
        &self.ast.nodes[self.id.index()]
    }

    fn at(&self, id: Option<NodeId>) -> Option<Node<'a>> {
        id.map(|id| Node { ast: self.ast, id })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn ast(&self) -> &'a Ast {
        self.ast
    }

    /// Location of the node's first character.
    pub fn loc(&self) -> SourceLoc {
        self.data().loc
    }

    pub fn kind(&self) -> Nodekind {
        self.data().kind
    }

    pub fn is_list(&self) -> bool {
        self.kind() == Nodekind::List
    }

    pub fn is_scalar(&self) -> bool {
        self.kind() == Nodekind::Scalar
    }

    /// The literal text of a scalar (escapes resolved for quoted
    /// strings); empty for lists. Not necessarily UTF-8, since `\xHH`
    /// escapes produce single bytes.
    pub fn value(&self) -> &'a [u8] {
        let d = self.data();
        &self.ast.text[d.start..d.end]
    }

    /// [value](Node::value) if it is valid UTF-8.
    pub fn value_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.value()).ok()
    }

    pub fn first_child(&self) -> Option<Node<'a>> {
        self.at(self.data().first_child)
    }

    pub fn next(&self) -> Option<Node<'a>> {
        self.at(self.data().next_sibling)
    }

    pub fn children(&self) -> Siblings<'a> {
        Siblings(self.first_child())
    }

    /// The siblings following this node.
    pub fn siblings(&self) -> Siblings<'a> {
        Siblings(self.next())
    }

    /// O(n).
    pub fn num_children(&self) -> usize {
        self.children().count()
    }

    /// O(n).
    pub fn num_siblings(&self) -> usize {
        self.siblings().count()
    }

    /// For a list, the `n`th child (0 is the first child); for a
    /// scalar, the `n`th sibling, with 0 being the node itself.
    pub fn nth(&self, n: usize) -> Result<Node<'a>, NodeError> {
        if self.is_list() {
            self.children().nth(n).ok_or_else(|| NodeError::NoSuchChild {
                loc: self.loc(),
                node: self.id,
                index: n + 1,
                count: self.num_children(),
            })
        } else if n == 0 {
            Ok(*self)
        } else {
            self.siblings().nth(n - 1).ok_or_else(|| NodeError::NoSuchSibling {
                loc: self.loc(),
                node: self.id,
                index: n,
                count: self.num_siblings(),
            })
        }
    }

    /// The children of a list, or a scalar followed by its siblings.
    pub fn iter_nodes(&self) -> Siblings<'a> {
        if self.is_list() {
            self.children()
        } else {
            Siblings(Some(*self))
        }
    }

    /// Walk the children of a list, each of which must be a list of
    /// at least two elements `(key value ...)`. Pairs before an
    /// offending child have already been passed to `f` when the error
    /// is returned.
    pub fn iter_key_values<E>(
        &self,
        mut f: impl FnMut(Node<'a>, Node<'a>) -> Result<(), E>
    ) -> Result<(), E>
        where E: From<NodeError>
    {
        if !self.is_list() {
            return Err(NodeError::NotAList { loc: self.loc(), node: self.id }.into())
        }
        for c in self.children() {
            if !c.is_list() {
                return Err(NodeError::NotAPair { loc: c.loc(), node: c.id }.into())
            }
            let k = c.nth(0)?;
            let v = c.nth(1)?;
            f(k, v)?;
        }
        Ok(())
    }

    /// Decode this node into `out`, see [Decode].
    pub fn decode<T: Decode + ?Sized>(&self, out: &mut T) -> Result<(), DecodeError> {
        out.decode_from(*self)
    }

    /// Decode the nodes of [iter_nodes](Node::iter_nodes) into
    /// `outs`, position by position, see [decode::decode_each].
    pub fn decode_each(&self, outs: &mut [&mut dyn Decode]) -> Result<(), DecodeError> {
        decode::decode_each(*self, outs)
    }
}

impl<'a> PartialEq for Node<'a> {
    fn eq(&self, other: &Node<'a>) -> bool {
        std::ptr::eq(self.ast, other.ast) && self.id == other.id
    }
}

impl<'a> std::fmt::Debug for Node<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.write_fmt(format_args!("Node({:?} {} {})", self.id, self.loc(), self))
    }
}

/// Shows the subtree as an S-expression, scalars quoted.
impl<'a> Display for Node<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        if self.is_list() {
            f.write_char('(')?;
            for (i, c) in self.children().enumerate() {
                if i > 0 {
                    f.write_char(' ')?;
                }
                c.fmt(f)?;
            }
            f.write_char(')')
        } else {
            value::fmt_scalar(f, self.value())
        }
    }
}

/// Iterator over a node and the siblings following it.
#[derive(Clone)]
pub struct Siblings<'a>(Option<Node<'a>>);

impl<'a> Iterator for Siblings<'a> {
    type Item = Node<'a>;
    fn next(&mut self) -> Option<Node<'a>> {
        let n = self.0?;
        self.0 = n.next();
        Some(n)
    }
}
