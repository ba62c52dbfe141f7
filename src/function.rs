//! Function terms: calls of builtins, user-defined functions and array
//! accesses, written `name(a; b)` or `name[i; j]`.

use log::{debug, warn};

use crate::brackets::{BracketKind, is_wrapped};
use crate::builtins::Builtin;
use crate::listener::TreeListener;
use crate::tree::text::ExpectedTerm;
use crate::tree::{
  FieldContent, FieldRef, FormulaTree, NodeId, SlotId, TermKind, TermNode,
};
use crate::validate::ValidationPass;
use crate::{BuildError, Host};

/// What a function name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
  Builtin(Builtin),
  /// A function defined elsewhere in the document, found via the resolver.
  UserFunction,
  ArrayAccess,
}

impl CallKind {
  /// Square brackets index an array; anything else is a call, of a builtin
  /// when the name is known.
  pub fn for_call(name: &str, brackets: BracketKind) -> Self {
    if brackets == BracketKind::Square {
      return CallKind::ArrayAccess;
    }
    match Builtin::from_name(name) {
      Some(builtin) => CallKind::Builtin(builtin),
      None => CallKind::UserFunction,
    }
  }
}

/// Data of a function node.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionTerm {
  pub code: String,
  pub call: CallKind,
  pub min_args: usize,
  /// `None` for variadic functions.
  pub max_args: Option<usize>,
  pub brackets: BracketKind,
  pub separator: char,
}

impl FunctionTerm {
  pub fn new(
    code: &str,
    call: CallKind,
    brackets: BracketKind,
    separator: char,
  ) -> Self {
    let (min_args, max_args) = match call {
      CallKind::Builtin(builtin) => builtin.arity(),
      CallKind::UserFunction | CallKind::ArrayAccess => (1, None),
    };
    FunctionTerm {
      code: code.to_string(),
      call,
      min_args,
      max_args,
      brackets,
      separator,
    }
  }

  pub fn is_variadic(&self) -> bool {
    self.max_args.is_none()
  }

  pub fn can_add_argument(&self, count: usize) -> bool {
    self.max_args.is_none_or(|max| count < max)
  }

  /// Whether one of `count` arguments can be dropped without deleting the
  /// whole term.
  pub fn can_remove_argument(&self, count: usize) -> bool {
    self.is_variadic() && count > self.min_args.max(1)
  }

  pub fn accepts(&self, count: usize) -> bool {
    count >= self.min_args && self.max_args.is_none_or(|max| count <= max)
  }
}

/// What `on_delete` did to the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
  /// The node was replaced in its field by a surviving child term.
  ReplacedByTerm { field: FieldRef, term: NodeId },
  /// The node was replaced in its field by literal text.
  ReplacedByText { field: FieldRef, text: String },
  /// The node is a root; only the document was notified.
  RootDelete,
  /// One argument was removed; `focus` is the argument before it.
  ArgumentRemoved { focus: Option<FieldRef> },
  Ignored,
}

impl FormulaTree {
  /// Build a detached function node from its name and argument text.
  ///
  /// The argument text is split at the separator, then padded with empty
  /// arguments up to `required_arg_count` when that is non-zero. Fails
  /// without leaving any node behind when the argument list is empty, the
  /// count cannot be met, or the brackets are malformed. `paste_mode`
  /// allows an empty argument text to produce one empty argument.
  pub fn build_function(
    &mut self,
    code: &str,
    argument_text: &str,
    required_arg_count: usize,
    paste_mode: bool,
    host: &mut Host<'_>,
  ) -> Result<NodeId, BuildError> {
    let brackets = if is_wrapped(argument_text, self.config().array_brackets) {
      self.config().array_brackets
    } else {
      self.config().function_brackets
    };
    let separator = self.config().separator;
    let term = FunctionTerm::new(
      code,
      CallKind::for_call(code, brackets),
      brackets,
      separator,
    );
    let id = self.insert_node(TermNode::new(TermKind::Function(term)));

    if let Err(e) =
      self.fill_function(id, argument_text, required_arg_count, paste_mode)
    {
      warn!("cannot build {}: {}", code, e);
      self.remove_subtree(id);
      return Err(e);
    }
    // Errors stay on the node; the term is built either way.
    self.validate(id, ValidationPass::SingleFormula, host).ok();
    debug!("built {} as {}", self.to_text(id), id);
    Ok(id)
  }

  fn fill_function(
    &mut self,
    id: NodeId,
    argument_text: &str,
    required_arg_count: usize,
    paste_mode: bool,
  ) -> Result<(), BuildError> {
    self.split_into_terms(
      id,
      argument_text,
      ExpectedTerm::Formula,
      paste_mode,
    )?;
    let count = |tree: &FormulaTree| tree.node(id).map_or(0, |n| n.terms.len());
    if count(self) == 0 {
      return Err(BuildError::EmptyArgumentList);
    }
    if required_arg_count > 0 {
      while count(self) < required_arg_count {
        if self.add_argument(id, None).is_none() {
          break;
        }
      }
      if count(self) != required_arg_count {
        return Err(BuildError::InvalidArgumentCount {
          expected: required_arg_count,
          actual: count(self),
        });
      }
    }
    Ok(())
  }

  /// Whether deleting from node `id` removes the whole term rather than a
  /// single argument.
  pub fn is_remaining_term_on_delete(&self, id: NodeId) -> bool {
    let Some(node) = self.node(id) else {
      return true;
    };
    let count = node.terms.len();
    match node.function() {
      Some(f) => count <= 1 || !f.can_remove_argument(count),
      None => true,
    }
  }

  /// Delete triggered on node `id`, from its argument `source_slot` or from
  /// the term itself when `None`.
  ///
  /// If the term cannot shrink, it is removed and replaced in its parent
  /// field by what remains: a sibling child term if there is one, else
  /// non-empty sibling text, else the term's label. Within each kind the
  /// last sibling wins. A root is not removed; the document is told
  /// instead. If the term can shrink, only the source argument goes.
  pub fn on_delete(
    &mut self,
    id: NodeId,
    source_slot: Option<SlotId>,
    listener: &mut dyn TreeListener,
  ) -> DeleteOutcome {
    let Some(node) = self.node(id) else {
      return DeleteOutcome::Ignored;
    };
    let source = source_slot.filter(|slot| node.position_of(*slot).is_some());

    if source.is_none() || self.is_remaining_term_on_delete(id) {
      let mut remaining_term = None;
      let mut remaining_text = node.label();
      for field in node.terms.iter().filter(|t| Some(t.slot()) != source) {
        match field.content() {
          FieldContent::Term(child) => remaining_term = Some(*child),
          FieldContent::Text(text) if !text.trim().is_empty() => {
            remaining_text = text.trim().to_string();
          }
          FieldContent::Text(_) => {}
        }
      }

      let Some(parent) = node.parent else {
        debug!("delete on root {}", id);
        listener.on_root_delete(id);
        return DeleteOutcome::RootDelete;
      };

      listener.on_undo_checkpoint(self);
      if let Some(term) = remaining_term {
        self.detach_child_node(term);
        let removed = self.remove_subtree(id);
        self.attach_child(parent, term);
        debug!("{} replaced by its argument {}", id, term);
        listener.on_term_delete(&removed, term);
        DeleteOutcome::ReplacedByTerm {
          field: parent,
          term,
        }
      } else {
        let removed = self.remove_subtree(id);
        self.set_text(parent, &remaining_text);
        debug!("{} replaced by text {:?}", id, remaining_text);
        listener.on_term_delete_with_text(&removed, &remaining_text);
        DeleteOutcome::ReplacedByText {
          field: parent,
          text: remaining_text,
        }
      }
    } else {
      let Some(slot) = source else {
        return DeleteOutcome::Ignored;
      };
      let focus = self.delete_argument(id, slot, true, listener);
      DeleteOutcome::ArgumentRemoved { focus }
    }
  }

  /// Unlink `id` from whatever field holds it.
  fn detach_child_node(&mut self, id: NodeId) {
    if let Some(parent) = self.node(id).and_then(|n| n.parent) {
      self.detach_child(parent);
    }
  }
}
