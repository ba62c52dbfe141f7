//! Structural edits on argument lists.

use log::{debug, warn};

use crate::brackets::join_parts;
use crate::listener::TreeListener;
use crate::tree::text::ExpectedTerm;
use crate::tree::{BracketPolicy, FieldRef, FormulaTree, NodeId, SlotId};

impl FormulaTree {
  /// Insert an empty argument after `after` (or at the end).
  ///
  /// Only function nodes take extra arguments; returns `None` for other
  /// kinds and when the function already has its maximum count.
  pub fn add_argument(
    &mut self,
    id: NodeId,
    after: Option<SlotId>,
  ) -> Option<FieldRef> {
    let node = self.node_mut(id)?;
    let function = node.function()?;
    if !function.can_add_argument(node.terms.len()) {
      warn!(
        "{} does not take more than {} arguments",
        function.code,
        node.terms.len()
      );
      return None;
    }
    let index = match after.and_then(|slot| node.position_of(slot)) {
      Some(position) => position + 1,
      None => node.terms.len(),
    };
    let slot = node.insert_field(index, BracketPolicy::Never);
    self.mark_unvalidated(id);
    debug!("added argument {:?} to {} at {}", slot, id, index);
    Some(FieldRef::new(id, slot))
  }

  /// Remove the slot at position `index` together with its child.
  pub(crate) fn remove_field_at(&mut self, id: NodeId, index: usize) -> bool {
    let Some(field) = self.field_at(id, index) else {
      return false;
    };
    if let Some(child) = self.detach_child(field) {
      self.remove_subtree(child);
    }
    if let Some(node) = self.node_mut(id) {
      node.terms.remove(index);
    }
    self.mark_unvalidated(id);
    true
  }

  /// Remove one argument of a function node.
  ///
  /// The remaining arguments are joined with the node's separator and split
  /// again, so the bracket and arity rules are checked the same way as for
  /// typed text. Reported to `listener` as one undoable edit when
  /// `store_undo_state` is set. Returns the argument before the removed
  /// one, which is where focus goes.
  pub fn delete_argument(
    &mut self,
    id: NodeId,
    slot: SlotId,
    store_undo_state: bool,
    listener: &mut dyn TreeListener,
  ) -> Option<FieldRef> {
    let node = self.node(id)?;
    let function = node.function()?;
    let (separator, brackets) = (function.separator, function.brackets);
    let index = node.position_of(slot)?;
    let remaining: Vec<String> = node
      .terms
      .iter()
      .filter(|t| t.slot() != slot)
      .map(|t| self.field_text(t))
      .collect();

    if store_undo_state {
      listener.on_undo_checkpoint(self);
    }
    // Splitting strips one layer of the call's brackets.
    let joined = format!(
      "{}{}{}",
      brackets.open(),
      join_parts(&remaining, separator),
      brackets.close()
    );
    if let Err(e) =
      self.split_into_terms(id, &joined, ExpectedTerm::Formula, true)
    {
      warn!("could not rebuild arguments of {}: {}", id, e);
      return None;
    }
    debug!("removed argument {} of {}", index, id);
    listener.on_manual_input();

    let previous = index.checked_sub(1).and_then(|i| self.field_at(id, i));
    if let Some(field) = previous {
      listener.on_focus(field);
    }
    previous
  }
}
