//! Hooks through which the tree talks to the document that hosts it.

use crate::error::TermError;
use crate::tree::{FieldRef, FormulaTree, NodeId};

/// Callbacks into the surrounding editor. Every method has an empty
/// default, so a host only implements what it reacts to.
pub trait TreeListener {
  /// A term was removed and `replacement` took its place.
  fn on_term_delete(&mut self, _removed: &[NodeId], _replacement: NodeId) {}

  /// A term was removed and its field now holds `text`.
  fn on_term_delete_with_text(&mut self, _removed: &[NodeId], _text: &str) {}

  /// Delete was requested on a root term; removing it is up to the host.
  fn on_root_delete(&mut self, _root: NodeId) {}

  /// Called before an undoable structural edit, with the tree as it is.
  fn on_undo_checkpoint(&mut self, _tree: &FormulaTree) {}

  /// The content changed as if typed by the user.
  fn on_manual_input(&mut self) {}

  fn on_focus(&mut self, _field: FieldRef) {}

  /// An error marker is shown on `node`.
  fn on_error(&mut self, _node: NodeId, _error: &TermError, _message: &str) {}

  fn on_error_cleared(&mut self, _node: NodeId) {}
}

/// Listener that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl TreeListener for NoopListener {}
