use crate::error::TermError;
use crate::tree::{NodeId, SlotId};

/// When a child term placed in a slot is rendered inside brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketPolicy {
  Never,
  Always,
  IfNeeded,
}

/// What a slot holds: literal text or an owned child term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldContent {
  Text(String),
  Term(NodeId),
}

/// A named slot inside a term node.
///
/// The child, if any, is owned through the tree arena; the only way to put
/// a node into a field is [`crate::FormulaTree::attach_child`], which also
/// sets the node's back-reference.
#[derive(Debug, Clone, PartialEq)]
pub struct TermField {
  slot: SlotId,
  content: FieldContent,
  bracket_policy: BracketPolicy,
  last_error: Option<TermError>,
}

impl TermField {
  pub(crate) fn new(slot: SlotId, bracket_policy: BracketPolicy) -> Self {
    TermField {
      slot,
      content: FieldContent::Text(String::new()),
      bracket_policy,
      last_error: None,
    }
  }

  pub fn slot(&self) -> SlotId {
    self.slot
  }

  pub fn content(&self) -> &FieldContent {
    &self.content
  }

  pub fn bracket_policy(&self) -> BracketPolicy {
    self.bracket_policy
  }

  /// Error recorded by the last validation of this slot.
  pub fn last_error(&self) -> Option<&TermError> {
    self.last_error.as_ref()
  }

  pub fn is_term(&self) -> bool {
    matches!(self.content, FieldContent::Term(_))
  }

  /// True for a slot holding blank text. A slot with a child is never empty.
  pub fn is_empty(&self) -> bool {
    match &self.content {
      FieldContent::Text(t) => t.trim().is_empty(),
      FieldContent::Term(_) => false,
    }
  }

  pub fn text(&self) -> Option<&str> {
    match &self.content {
      FieldContent::Text(t) => Some(t),
      FieldContent::Term(_) => None,
    }
  }

  pub fn child(&self) -> Option<NodeId> {
    match self.content {
      FieldContent::Term(id) => Some(id),
      FieldContent::Text(_) => None,
    }
  }

  /// Swap in new content, handing back the old one so the caller can
  /// release a previous child.
  pub(crate) fn replace_content(
    &mut self,
    content: FieldContent,
  ) -> FieldContent {
    std::mem::replace(&mut self.content, content)
  }

  pub(crate) fn set_last_error(&mut self, error: Option<TermError>) {
    self.last_error = error;
  }
}
