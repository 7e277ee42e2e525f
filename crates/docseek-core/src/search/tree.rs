//! Arena-backed search tree mirroring each field's expression chain.

use std::ops::{Index, IndexMut};

use tracing::{debug, warn};

use super::node::{CandidateLines, NodeId, NodeLabel, SearchNode};
use crate::error::TreeError;
use crate::models::FieldSpec;
use crate::value::ExtractedValue;

/// Tree of search nodes stored in an arena and addressed by [`NodeId`].
#[derive(Debug, Clone)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
}

/// Saved state of a subtree, used to undo a failed attempt.
#[derive(Debug, Clone)]
pub struct Snapshot {
    arena_len: usize,
    saved: Vec<(NodeId, SavedNode)>,
}

#[derive(Debug, Clone)]
struct SavedNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    success: bool,
    found: Option<ExtractedValue>,
    lines: CandidateLines,
    anchor: Option<f64>,
    cell: Option<(usize, usize)>,
}

impl Default for SearchTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchTree {
    /// Tree holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![SearchNode::root()],
        }
    }

    /// Build the tree for a set of fields.
    ///
    /// Every field gets a `Field` node and one `Line` child at the unknown
    /// line, followed by the chain of its expressions. A field without
    /// expressions keeps a bare `Field` node and never resolves.
    pub fn populate(fields: &[FieldSpec]) -> Result<Self, TreeError> {
        let mut tree = Self::new();
        for spec in fields {
            let field = tree.add_child(tree.root(), SearchNode::field(spec))?;
            let Some(line) = SearchNode::line(spec) else {
                warn!("Field {} has no expressions, skipping its chain", spec.name);
                continue;
            };
            tree.add_child(field, line)?;
            tree.build_chain(field, spec, 0)?;
        }
        debug!(
            "Populated search tree: {} fields, {} nodes",
            fields.len(),
            tree.len()
        );
        Ok(tree)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&SearchNode> {
        self.nodes.get(id.0)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    /// Append a node under `parent`.
    pub fn add_child(&mut self, parent: NodeId, mut node: SearchNode) -> Result<NodeId, TreeError> {
        let parent_node = self
            .get(parent)
            .ok_or_else(|| TreeError::InvalidArgument(format!("unknown node {parent}")))?;
        if parent_node.is_terminal() {
            return Err(TreeError::TerminalChild(parent.0));
        }

        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Unlink a node from its parent. The node stays in the arena.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        self.nodes[parent.0].children.retain(|c| *c != id);
        self.nodes[id.0].parent = None;
    }

    /// Attach the chain of expressions `start..` below `anchor`.
    ///
    /// On a `Field` node the chain is built under each `Line` child that has
    /// no children yet. A node that already has children is left alone.
    pub fn build_chain(
        &mut self,
        anchor: NodeId,
        spec: &FieldSpec,
        start: usize,
    ) -> Result<(), TreeError> {
        let node = self
            .get(anchor)
            .ok_or_else(|| TreeError::InvalidArgument(format!("unknown node {anchor}")))?;

        match node.label {
            NodeLabel::Field => {
                let pending: Vec<NodeId> = node
                    .children
                    .iter()
                    .copied()
                    .filter(|c| self.children(*c).is_empty())
                    .collect();
                for line in pending {
                    self.build_chain(line, spec, start)?;
                }
                Ok(())
            }
            NodeLabel::Terminal => Err(TreeError::TerminalChild(anchor.0)),
            NodeLabel::Root => Err(TreeError::InvalidArgument(
                "cannot build a chain under the root".to_string(),
            )),
            NodeLabel::Line | NodeLabel::Search(_) => {
                if !node.children.is_empty() {
                    return Ok(());
                }
                if start >= spec.expressions.len() {
                    return Err(TreeError::InvalidArgument(format!(
                        "field {} has no expression {}",
                        spec.name, start
                    )));
                }
                let mut current = anchor;
                for index in start..spec.expressions.len() {
                    let step = SearchNode::chain(spec, index).ok_or_else(|| {
                        TreeError::InvalidArgument(format!(
                            "field {} has no expression {}",
                            spec.name, index
                        ))
                    })?;
                    current = self.add_child(current, step)?;
                }
                Ok(())
            }
        }
    }

    /// Mark a node and every strict ancestor below the root as successful.
    pub fn mark_success(&mut self, id: NodeId) {
        let root = self.root();
        let mut current = Some(id);
        while let Some(node) = current {
            if node == root {
                break;
            }
            self.nodes[node.0].success = true;
            current = self.nodes[node.0].parent;
        }
    }

    /// A node and all of its descendants, in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if self.get(node).is_none() {
                continue;
            }
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Terminal descendants of a node.
    pub fn terminals(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|n| self.nodes[n.0].is_terminal())
            .collect()
    }

    /// Field nodes in configuration order.
    pub fn field_nodes(&self) -> &[NodeId] {
        self.children(self.root())
    }

    pub fn field_node(&self, name: &str) -> Option<NodeId> {
        self.field_nodes()
            .iter()
            .copied()
            .find(|id| self.nodes[id.0].field == name)
    }

    /// Number of nodes on every Line-to-Terminal path of a field.
    pub fn field_depths(&self, field: NodeId) -> Vec<usize> {
        let mut depths = Vec::new();
        let mut stack: Vec<(NodeId, usize)> =
            self.children(field).iter().map(|c| (*c, 1)).collect();
        while let Some((node, depth)) = stack.pop() {
            if self.nodes[node.0].is_terminal() {
                depths.push(depth);
            }
            stack.extend(self.children(node).iter().map(|c| (*c, depth + 1)));
        }
        depths
    }

    /// Children of `parent` with `label` whose candidates include `line`.
    pub fn count_at_line(&self, parent: NodeId, label: NodeLabel, line: u32) -> usize {
        self.children(parent)
            .iter()
            .filter(|c| {
                let node = &self.nodes[c.0];
                node.label == label && node.lines.contains(line)
            })
            .count()
    }

    /// Save the mutable state of a subtree.
    pub fn snapshot(&self, id: NodeId) -> Snapshot {
        let saved = self
            .descendants(id)
            .into_iter()
            .map(|n| {
                let node = &self.nodes[n.0];
                (
                    n,
                    SavedNode {
                        parent: node.parent,
                        children: node.children.clone(),
                        success: node.success,
                        found: node.found.clone(),
                        lines: node.lines.clone(),
                        anchor: node.anchor,
                        cell: node.cell,
                    },
                )
            })
            .collect();
        Snapshot {
            arena_len: self.nodes.len(),
            saved,
        }
    }

    /// Undo everything done to a subtree since `snapshot`.
    ///
    /// Nodes added after the snapshot are dropped from the arena.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.nodes.truncate(snapshot.arena_len);
        for (id, saved) in snapshot.saved {
            let node = &mut self.nodes[id.0];
            node.parent = saved.parent;
            node.children = saved.children;
            node.success = saved.success;
            node.found = saved.found;
            node.lines = saved.lines;
            node.anchor = saved.anchor;
            node.cell = saved.cell;
        }
    }

    /// Found values of a field's successful terminals, joined by `|`.
    ///
    /// Valid values win; placeholders are reported only when no terminal
    /// produced a valid value. Empty when nothing matched.
    pub fn field_value(&self, field: NodeId) -> String {
        let found: Vec<&ExtractedValue> = self
            .terminals(field)
            .into_iter()
            .filter_map(|t| {
                let node = &self.nodes[t.0];
                node.success.then_some(node.found.as_ref()).flatten()
            })
            .collect();

        let preferred: Vec<&ExtractedValue> = if found.iter().any(|v| v.is_valid()) {
            found.into_iter().filter(|v| v.is_valid()).collect()
        } else {
            found
        };

        let mut values: Vec<&str> = Vec::new();
        for value in preferred {
            if !values.contains(&value.as_str()) {
                values.push(value.as_str());
            }
        }
        values.join("|")
    }
}

impl Index<NodeId> for SearchTree {
    type Output = SearchNode;

    fn index(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for SearchTree {
    fn index_mut(&mut self, id: NodeId) -> &mut SearchNode {
        &mut self.nodes[id.0]
    }
}
