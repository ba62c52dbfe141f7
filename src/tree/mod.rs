//! Arena-backed term tree.
//!
//! Nodes live in a slab addressed by generational [`NodeId`]s. A node
//! exclusively owns its fields; a field owns at most one child node. The
//! child keeps a weak back-reference ([`FieldRef`]) to the field embedding
//! it. Both directions
//! are only ever written together, by [`FormulaTree::attach_child`] and
//! [`FormulaTree::detach_child`].

pub mod edit;
mod field;
mod node;
pub mod text;

use std::fmt;

use log::{trace, warn};

use crate::brackets::BracketKind;

pub use field::{BracketPolicy, FieldContent, TermField};
pub use node::{Operator, Side, TermKind, TermNode, ValidationStatus};

/// Handle of a node. The generation changes each time the arena slot is
/// freed, so a handle to a removed node never resolves to its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
  index: usize,
  generation: u32,
}

impl NodeId {
  pub(crate) fn new(index: usize, generation: u32) -> Self {
    NodeId { index, generation }
  }

  pub fn index(self) -> usize {
    self.index
  }

  pub fn generation(self) -> u32 {
    self.generation
  }
}

impl fmt::Display for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.generation {
      0 => write!(f, "Node({})", self.index),
      g => write!(f, "Node({}#{})", self.index, g),
    }
  }
}

/// Identifier of a field, stable for the lifetime of its owning node.
/// Deepest level a node may sit at; roots are at level 0.
pub const MAX_NESTING_DEPTH: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub(crate) u32);

/// Address of a field from outside its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldRef {
  pub node: NodeId,
  pub slot: SlotId,
}

impl FieldRef {
  pub fn new(node: NodeId, slot: SlotId) -> Self {
    FieldRef { node, slot }
  }
}

/// Syntax settings shared by every node of a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeConfig {
  /// Top-level argument separator of new function nodes.
  pub separator: char,
  pub function_brackets: BracketKind,
  pub array_brackets: BracketKind,
}

impl Default for TreeConfig {
  fn default() -> Self {
    TreeConfig {
      separator: ';',
      function_brackets: BracketKind::Round,
      array_brackets: BracketKind::Square,
    }
  }
}

#[derive(Debug, Clone, Default)]
struct Entry {
  generation: u32,
  node: Option<TermNode>,
}

impl Entry {
  fn id(&self, index: usize) -> NodeId {
    NodeId::new(index, self.generation)
  }
}

#[derive(Debug, Clone, Default)]
pub struct FormulaTree {
  nodes: Vec<Entry>,
  free: Vec<usize>,
  config: TreeConfig,
}

impl FormulaTree {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_config(config: TreeConfig) -> Self {
    FormulaTree {
      config,
      ..Self::default()
    }
  }

  pub fn config(&self) -> &TreeConfig {
    &self.config
  }

  pub fn node(&self, id: NodeId) -> Option<&TermNode> {
    self
      .nodes
      .get(id.index)
      .filter(|e| e.generation == id.generation)
      .and_then(|e| e.node.as_ref())
  }

  pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut TermNode> {
    self
      .nodes
      .get_mut(id.index)
      .filter(|e| e.generation == id.generation)
      .and_then(|e| e.node.as_mut())
  }

  pub fn field(&self, field: FieldRef) -> Option<&TermField> {
    self.node(field.node)?.field(field.slot)
  }

  pub(crate) fn field_mut(
    &mut self,
    field: FieldRef,
  ) -> Option<&mut TermField> {
    self.node_mut(field.node)?.field_mut(field.slot)
  }

  pub fn contains(&self, id: NodeId) -> bool {
    self.node(id).is_some()
  }

  /// Number of live nodes.
  pub fn len(&self) -> usize {
    self.nodes.iter().filter(|e| e.node.is_some()).count()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Nodes that are not embedded in any field.
  pub fn roots(&self) -> Vec<NodeId> {
    self
      .nodes
      .iter()
      .enumerate()
      .filter_map(|(i, e)| match &e.node {
        Some(node) if node.parent.is_none() => Some(e.id(i)),
        _ => None,
      })
      .collect()
  }

  /// Slots of `id` in order, as field references.
  pub fn fields_of(&self, id: NodeId) -> Vec<FieldRef> {
    self
      .node(id)
      .map(|n| n.terms.iter().map(|t| FieldRef::new(id, t.slot())).collect())
      .unwrap_or_default()
  }

  /// Field at position `index` of node `id`.
  pub fn field_at(&self, id: NodeId, index: usize) -> Option<FieldRef> {
    let node = self.node(id)?;
    node.terms.get(index).map(|t| FieldRef::new(id, t.slot()))
  }

  pub fn children(&self, id: NodeId) -> Vec<NodeId> {
    self
      .node(id)
      .map(|n| n.terms.iter().filter_map(|t| t.child()).collect())
      .unwrap_or_default()
  }

  /// `id` and everything below it, parents before children.
  pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![id];
    while let Some(next) = stack.pop() {
      if !self.contains(next) {
        continue;
      }
      out.push(next);
      let mut kids = self.children(next);
      kids.reverse();
      stack.extend(kids);
    }
    out
  }

  /// Whether `ancestor` is `id` itself or lies on its path to the root.
  pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
    let mut cursor = Some(id);
    while let Some(current) = cursor {
      if current == ancestor {
        return true;
      }
      cursor = self.node(current).and_then(|n| n.parent).map(|f| f.node);
    }
    false
  }

  /// Number of ancestors of `id`.
  pub fn depth(&self, id: NodeId) -> usize {
    let mut depth = 0;
    let mut cursor = self.node(id).and_then(|n| n.parent);
    while let Some(field) = cursor {
      depth += 1;
      cursor = self.node(field.node).and_then(|n| n.parent);
    }
    depth
  }

  /// Levels below `id`: 0 for a node without child terms.
  pub fn height(&self, id: NodeId) -> usize {
    let mut height = 0;
    let mut stack = vec![(id, 0)];
    while let Some((next, level)) = stack.pop() {
      height = height.max(level);
      stack.extend(self.children(next).into_iter().map(|c| (c, level + 1)));
    }
    height
  }

  pub(crate) fn insert_node(&mut self, node: TermNode) -> NodeId {
    if let Some(index) = self.free.pop()
      && let Some(entry) = self.nodes.get_mut(index)
    {
      entry.node = Some(node);
      return entry.id(index);
    }
    self.nodes.push(Entry {
      generation: 0,
      node: Some(node),
    });
    NodeId::new(self.nodes.len() - 1, 0)
  }

  /// Create a detached node with no slots.
  pub fn new_node(&mut self, kind: TermKind) -> NodeId {
    self.insert_node(TermNode::new(kind))
  }

  /// Append an empty slot to `id`, using the node kind's bracket policy.
  pub fn push_field(&mut self, id: NodeId) -> Option<FieldRef> {
    let node = self.node_mut(id)?;
    let policy = node.default_policy();
    let slot = node.push_field(policy);
    self.mark_unvalidated(id);
    Some(FieldRef::new(id, slot))
  }

  /// Free `id` and its whole subtree, returning the freed ids.
  ///
  /// If the node was embedded, its field is left holding empty text.
  pub fn remove_subtree(&mut self, id: NodeId) -> Vec<NodeId> {
    if let Some(parent) = self.node(id).and_then(|n| n.parent) {
      self.detach_child(parent);
    }
    let removed = self.subtree(id);
    for node in &removed {
      if let Some(entry) = self.nodes.get_mut(node.index) {
        entry.node = None;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(node.index);
      }
    }
    trace!("freed {} nodes under {}", removed.len(), id);
    removed
  }

  /// Put `child` into `field`, dropping whatever the field held before.
  ///
  /// `child` is first taken out of its current field, if any. Refuses (and
  /// returns false) when `child` is the field's node or one of its
  /// ancestors, since the result would no longer be a tree, and when the
  /// subtree would reach below [`MAX_NESTING_DEPTH`].
  pub fn attach_child(&mut self, field: FieldRef, child: NodeId) -> bool {
    if !self.contains(child)
      || self.field(field).is_none()
      || self.is_ancestor(child, field.node)
    {
      return false;
    }
    if self.depth(field.node) + 1 + self.height(child) > MAX_NESTING_DEPTH {
      warn!("attaching {} under {} nests too deeply", child, field.node);
      return false;
    }
    if self.field(field).and_then(|f| f.child()) == Some(child) {
      return true;
    }
    if let Some(old_parent) = self.node(child).and_then(|n| n.parent) {
      self.detach_child(old_parent);
    }
    let previous = match self.field_mut(field) {
      Some(f) => f.replace_content(FieldContent::Term(child)),
      None => return false,
    };
    if let FieldContent::Term(old) = previous {
      self.release(old);
    }
    if let Some(node) = self.node_mut(child) {
      node.parent = Some(field);
    }
    self.mark_unvalidated(field.node);
    true
  }

  /// Take the child out of `field` and keep it alive as a detached root.
  /// The field is left holding empty text.
  pub fn detach_child(&mut self, field: FieldRef) -> Option<NodeId> {
    let child = self.field(field)?.child()?;
    if let Some(f) = self.field_mut(field) {
      f.replace_content(FieldContent::Text(String::new()));
    }
    if let Some(node) = self.node_mut(child) {
      node.parent = None;
    }
    self.mark_unvalidated(field.node);
    Some(child)
  }

  /// Store literal text in `field`, destroying any child it held.
  pub fn set_text(&mut self, field: FieldRef, text: &str) -> bool {
    let previous = match self.field_mut(field) {
      Some(f) => f.replace_content(FieldContent::Text(text.to_string())),
      None => return false,
    };
    if let FieldContent::Term(old) = previous {
      self.release(old);
    }
    self.mark_unvalidated(field.node);
    true
  }

  /// Free a subtree whose root has already been unlinked from its field.
  fn release(&mut self, id: NodeId) {
    if let Some(node) = self.node_mut(id) {
      node.parent = None;
    }
    self.remove_subtree(id);
  }

  /// Reset `id` and every ancestor to `Unvalidated`.
  pub(crate) fn mark_unvalidated(&mut self, id: NodeId) {
    let mut cursor = Some(id);
    while let Some(current) = cursor {
      match self.node_mut(current) {
        Some(node) => {
          node.status = ValidationStatus::Unvalidated;
          cursor = node.parent.map(|f| f.node);
        }
        None => break,
      }
    }
  }

  /// Check the parent/child invariant over the whole arena: every child
  /// points back at the field holding it and every back-reference is
  /// matched by that field.
  pub fn is_consistent(&self) -> bool {
    self.nodes.iter().enumerate().all(|(i, entry)| {
      let Some(node) = &entry.node else { return true };
      let id = entry.id(i);
      let children_ok = node.terms.iter().all(|t| match t.child() {
        Some(child) => self
          .node(child)
          .is_some_and(|c| c.parent == Some(FieldRef::new(id, t.slot()))),
        None => true,
      });
      let parent_ok = match node.parent {
        Some(field) => self.field(field).and_then(|f| f.child()) == Some(id),
        None => true,
      };
      children_ok && parent_ok
    })
  }
}
