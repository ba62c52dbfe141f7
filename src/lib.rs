//! Term tree engine for visual formula editors.
//!
//! A formula is a tree of nodes (operators, bracket groups and function
//! calls), each owning an ordered list of slots that hold either literal
//! text or one child node. Text typed into a slot is split into terms with
//! a bracket-aware parser; the resulting tree can be edited structurally,
//! validated, evaluated and differentiated.
//!
//! ```
//! use formterm::{FormulaTree, NoSymbols, RecursionGuard};
//!
//! let mut tree = FormulaTree::new();
//! let root = tree.parse_detached("2*(1+3)").unwrap().unwrap();
//! let value = tree.evaluate(root, &NoSymbols, &mut RecursionGuard::new());
//! assert_eq!(value.as_real(), Some(8.0));
//! ```

use thiserror::Error;

pub mod brackets;
pub mod builtins;
pub mod error;
pub mod eval;
pub mod function;
pub mod grammar;
pub mod listener;
pub mod resolver;
pub mod tree;
pub mod validate;
pub mod value;

pub use brackets::{BracketKind, MalformedBracketsError, split_top_level};
pub use error::{ErrorKind, TermError, classify_error};
pub use eval::{CallKey, Evaluator, RecursionGuard};
pub use function::{CallKind, DeleteOutcome, FunctionTerm};
pub use listener::{NoopListener, TreeListener};
pub use resolver::{NoSymbols, Symbol, SymbolResolver, SymbolTable};
pub use tree::text::ExpectedTerm;
pub use tree::{
  BracketPolicy, FieldContent, FieldRef, FormulaTree, MAX_NESTING_DEPTH,
  NodeId, Operator, SlotId, TermField, TermKind, TermNode, TreeConfig,
  ValidationStatus,
};
pub use validate::ValidationPass;
pub use value::{NumericValue, ValueKind};

/// Failure to construct a term. No node is left behind when this is
/// returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
  #[error("argument list is empty")]
  EmptyArgumentList,
  #[error("expected {expected} arguments, found {actual}")]
  InvalidArgumentCount { expected: usize, actual: usize },
  #[error("'{text}' cannot be split as '{kind}'")]
  Unsplittable { text: String, kind: String },
  #[error("terms are nested deeper than {limit} levels")]
  TooDeep { limit: usize },
  #[error("malformed brackets: {0}")]
  MalformedBrackets(#[from] MalformedBracketsError),
}

/// The collaborators a tree edit or validation talks to: the name resolver
/// and the listener of the hosting document.
pub struct Host<'a> {
  pub symbols: &'a dyn SymbolResolver,
  pub listener: &'a mut dyn TreeListener,
}

impl<'a> Host<'a> {
  pub fn new(
    symbols: &'a dyn SymbolResolver,
    listener: &'a mut dyn TreeListener,
  ) -> Self {
    Host { symbols, listener }
  }
}
