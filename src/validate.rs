//! Validation of term trees: leaf well-formedness, arity and name
//! resolution, with the result stored per node and per field.

use log::{debug, trace};

use crate::brackets::is_bracket;
use crate::error::{ErrorKind, TermError};
use crate::function::CallKind;
use crate::grammar::parse_literal;
use crate::listener::TreeListener;
use crate::resolver::{Symbol, SymbolResolver};
use crate::tree::{
  BracketPolicy, FieldContent, FieldRef, FormulaTree, NodeId, ValidationStatus,
};
use crate::Host;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPass {
  /// Check this node's own fields; children that already carry a result
  /// contribute it without being visited again.
  SingleFormula,
  /// Re-check every node below.
  Full,
}

/// Check the literal text of a slot.
pub fn check_leaf(text: &str, policy: BracketPolicy) -> Result<(), TermError> {
  let trimmed = text.trim();
  if policy == BracketPolicy::Never
    && !trimmed.starts_with('"')
    && trimmed.chars().any(is_bracket)
  {
    return Err(TermError::with_detail(ErrorKind::Syntax, trimmed));
  }
  parse_literal(trimmed).map(|_| ())
}

/// Check what a function node's name refers to and whether its argument
/// count fits.
fn check_call(
  tree: &FormulaTree,
  id: NodeId,
  symbols: &dyn SymbolResolver,
) -> Result<(), TermError> {
  let Some(node) = tree.node(id) else {
    return Ok(());
  };
  let Some(f) = node.function() else {
    return Ok(());
  };
  let count = node.terms.len();
  let arity_error =
    || TermError::with_detail(ErrorKind::ArgumentCount, &f.code);
  if !f.accepts(count) {
    return Err(arity_error());
  }
  match f.call {
    CallKind::Builtin(_) => Ok(()),
    CallKind::UserFunction => match symbols.resolve(&f.code) {
      Symbol::Function { params, .. } if params.len() == count => Ok(()),
      Symbol::Function { .. } => Err(arity_error()),
      Symbol::Array { .. } | Symbol::Constant(_) => {
        Err(TermError::with_detail(ErrorKind::NotAFunction, &f.code))
      }
      Symbol::Unknown => {
        Err(TermError::with_detail(ErrorKind::UnknownFunction, &f.code))
      }
    },
    CallKind::ArrayAccess => match symbols.resolve(&f.code) {
      Symbol::Array { dims, .. } if dims.len() == count => Ok(()),
      Symbol::Array { .. } => Err(arity_error()),
      Symbol::Function { .. } | Symbol::Constant(_) => {
        Err(TermError::with_detail(ErrorKind::NotAnArray, &f.code))
      }
      Symbol::Unknown => {
        Err(TermError::with_detail(ErrorKind::UnknownArray, &f.code))
      }
    },
  }
}

impl FormulaTree {
  /// Validate node `id` and, depending on `pass`, the nodes below it.
  ///
  /// Every visited field records its own result. The node's result is the
  /// first failing field from the left, or else its own call check, which
  /// is the order evaluation meets them in. Each
  /// validated node is marked `Valid` or `Error` and its error marker is
  /// updated through the host's listener.
  pub fn validate(
    &mut self,
    id: NodeId,
    pass: ValidationPass,
    host: &mut Host<'_>,
  ) -> Result<(), TermError> {
    self.validate_node(id, pass, host.symbols, &mut *host.listener)
  }

  fn validate_node(
    &mut self,
    id: NodeId,
    pass: ValidationPass,
    symbols: &dyn SymbolResolver,
    listener: &mut dyn TreeListener,
  ) -> Result<(), TermError> {
    let fields = self.fields_of(id);
    if fields.is_empty() && !self.contains(id) {
      return Ok(());
    }

    let mut first_error = None;
    for field in fields {
      let result = self.validate_field(field, pass, symbols, listener);
      if let Some(f) = self.field_mut(field) {
        f.set_last_error(result.as_ref().err().cloned());
      }
      if first_error.is_none() {
        first_error = result.err();
      }
    }
    let result = match first_error {
      Some(err) => Err(err),
      None => check_call(self, id, symbols),
    };

    if let Some(node) = self.node_mut(id) {
      node.status = if result.is_ok() {
        ValidationStatus::Valid
      } else {
        ValidationStatus::Error
      };
    }
    trace!("validated {}: {:?}", id, result);
    self.set_error_code(id, result.as_ref().err(), listener);
    result
  }

  fn validate_field(
    &mut self,
    field: FieldRef,
    pass: ValidationPass,
    symbols: &dyn SymbolResolver,
    listener: &mut dyn TreeListener,
  ) -> Result<(), TermError> {
    let Some(f) = self.field(field) else {
      return Ok(());
    };
    match f.content().clone() {
      FieldContent::Text(text) => check_leaf(&text, f.bracket_policy()),
      FieldContent::Term(child) => {
        let stored = self
          .node(child)
          .map(|n| (n.status, n.error.clone()))
          .unwrap_or_default();
        match (pass, stored) {
          (ValidationPass::SingleFormula, (ValidationStatus::Valid, _)) => {
            Ok(())
          }
          (ValidationPass::SingleFormula, (ValidationStatus::Error, err)) => {
            Err(err.unwrap_or_else(|| TermError::new(ErrorKind::Syntax)))
          }
          _ => self.validate_node(child, pass, symbols, listener),
        }
      }
    }
  }

  /// Set or clear the error marker of `id` and tell the listener.
  ///
  /// A node holds at most one error; `None` clears it and always emits the
  /// matching clear notification.
  pub fn set_error_code(
    &mut self,
    id: NodeId,
    error: Option<&TermError>,
    listener: &mut dyn TreeListener,
  ) {
    let Some(node) = self.node_mut(id) else {
      return;
    };
    node.error = error.cloned();
    match error {
      Some(err) => {
        let message = err.message();
        debug!("{}: {}", id, message);
        listener.on_error(id, err, &message);
      }
      None => listener.on_error_cleared(id),
    }
  }
}
