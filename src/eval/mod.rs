//! Numeric evaluation of term trees.
//!
//! Evaluation is bottom-up and fail-fast: the fields of a node are
//! evaluated left to right and the first invalid value is returned
//! unchanged, without touching the fields after it.

mod derivative;
pub mod guard;

use log::debug;
use num_complex::Complex64;

use crate::Host;
use crate::error::ErrorKind;
use crate::function::CallKind;
use crate::grammar::{Literal, parse_literal};
use crate::resolver::{Symbol, SymbolResolver};
use crate::tree::{
  FieldContent, FormulaTree, MAX_NESTING_DEPTH, NodeId, Operator, TermField,
  TermKind, TermNode,
};
use crate::value::NumericValue;

pub use guard::{CallKey, MAX_CALL_DEPTH, RecursionGuard};

/// Deepest chain of nested node evaluations, counted across user function
/// bodies.
pub const MAX_EVAL_DEPTH: usize = 2 * MAX_NESTING_DEPTH;

/// Parameter bindings of one user function call.
type Frame = Vec<(String, NumericValue)>;

/// State of one top-level evaluation or differentiation.
///
/// Arguments of every node are collected in a single scratch buffer: a node
/// owns the window starting where the buffer ended when it began and
/// truncates back to that point before returning.
pub struct Evaluator<'a> {
  tree: &'a FormulaTree,
  symbols: &'a dyn SymbolResolver,
  guard: &'a mut RecursionGuard,
  frames: Vec<Frame>,
  scratch: Vec<NumericValue>,
  depth: usize,
}

impl<'a> Evaluator<'a> {
  pub fn new(
    tree: &'a FormulaTree,
    symbols: &'a dyn SymbolResolver,
    guard: &'a mut RecursionGuard,
  ) -> Self {
    Evaluator {
      tree,
      symbols,
      guard,
      frames: Vec::new(),
      scratch: Vec::new(),
      depth: 0,
    }
  }

  pub fn evaluate(&mut self, id: NodeId) -> NumericValue {
    self.nested(|this| this.evaluate_node(id))
  }

  /// Run `step` one level deeper, or fail with `TooDeep` at the limit.
  fn nested(
    &mut self,
    step: impl FnOnce(&mut Self) -> NumericValue,
  ) -> NumericValue {
    if self.depth >= MAX_EVAL_DEPTH {
      debug!("evaluation nested deeper than {}", MAX_EVAL_DEPTH);
      return NumericValue::invalid(ErrorKind::TooDeep);
    }
    self.depth += 1;
    let value = step(self);
    self.depth -= 1;
    value
  }

  fn evaluate_node(&mut self, id: NodeId) -> NumericValue {
    let tree = self.tree;
    let Some(node) = tree.node(id) else {
      return NumericValue::invalid_with(ErrorKind::Syntax, id.to_string());
    };
    match &node.kind {
      TermKind::Brackets => match node.terms.first() {
        Some(field) => self.eval_field(field),
        None => NumericValue::invalid(ErrorKind::EmptyArgument),
      },
      TermKind::Operator(op) => {
        let base = match self.eval_args(node) {
          Ok(base) => base,
          Err(err) => return err,
        };
        let value = apply_operator(*op, &self.scratch[base..]);
        self.scratch.truncate(base);
        value
      }
      TermKind::Function(f) => {
        let key = CallKey::Node(id);
        if !self.guard.enter(key.clone()) {
          return NumericValue::invalid(ErrorKind::RecursiveCall);
        }
        let value = self.call(node, f.call, &f.code);
        self.guard.leave(&key);
        value
      }
    }
  }

  fn call(
    &mut self,
    node: &TermNode,
    call: CallKind,
    name: &str,
  ) -> NumericValue {
    let base = match self.eval_args(node) {
      Ok(base) => base,
      Err(err) => return err,
    };
    let value = match call {
      CallKind::Builtin(builtin) => builtin.apply(&self.scratch[base..]),
      CallKind::UserFunction => self.call_user(name, base),
      CallKind::ArrayAccess => self.read_array(name, &self.scratch[base..]),
    };
    self.scratch.truncate(base);
    value
  }

  /// Evaluate the fields of `node` into the scratch buffer and return the
  /// start of its window. On the first invalid value the window is dropped
  /// and that value is returned.
  fn eval_args(&mut self, node: &TermNode) -> Result<usize, NumericValue> {
    let base = self.scratch.len();
    for field in &node.terms {
      let value = self.eval_field(field);
      if !value.is_valid() {
        self.scratch.truncate(base);
        return Err(value);
      }
      self.scratch.push(value);
    }
    Ok(base)
  }

  fn eval_field(&mut self, field: &TermField) -> NumericValue {
    match field.content() {
      FieldContent::Text(text) => self.eval_text(text),
      FieldContent::Term(child) => self.evaluate(*child),
    }
  }

  fn eval_text(&self, text: &str) -> NumericValue {
    match parse_literal(text) {
      Err(err) => NumericValue::Invalid(err),
      Ok(Literal::Real(x)) => NumericValue::Real(x),
      Ok(Literal::Imaginary(y)) => {
        NumericValue::from_complex(Complex64::new(0.0, y))
      }
      Ok(Literal::Identifier(name)) => self.lookup(&name),
      Ok(Literal::Quoted(s)) => {
        NumericValue::invalid_with(ErrorKind::NotANumber, format!("{:?}", s))
      }
    }
  }

  /// Value of a name: a parameter of the innermost call, else a constant
  /// known to the resolver.
  fn lookup(&self, name: &str) -> NumericValue {
    let bound = self
      .frames
      .last()
      .and_then(|frame| frame.iter().find(|(param, _)| param == name));
    if let Some((_, value)) = bound {
      return value.clone();
    }
    match self.symbols.resolve(name) {
      Symbol::Constant(value) => value,
      Symbol::Function { .. } | Symbol::Array { .. } => {
        NumericValue::invalid_with(ErrorKind::NotANumber, name)
      }
      Symbol::Unknown => {
        NumericValue::invalid_with(ErrorKind::UnknownVariable, name)
      }
    }
  }

  /// Call a user-defined function with the arguments in the scratch window
  /// starting at `base`. The body runs in a fresh parameter frame while the
  /// definition is registered with the guard.
  fn call_user(&mut self, name: &str, base: usize) -> NumericValue {
    let (root, params) = match self.symbols.resolve(name) {
      Symbol::Function { root, params } => (root, params),
      Symbol::Array { .. } | Symbol::Constant(_) => {
        return NumericValue::invalid_with(ErrorKind::NotAFunction, name);
      }
      Symbol::Unknown => {
        return NumericValue::invalid_with(ErrorKind::UnknownFunction, name);
      }
    };
    let args = &self.scratch[base..];
    if params.len() != args.len() {
      return NumericValue::invalid_with(ErrorKind::ArgumentCount, name);
    }
    let frame: Frame = params.into_iter().zip(args.iter().cloned()).collect();

    let key = CallKey::Definition(name.to_string());
    if !self.guard.enter(key.clone()) {
      return NumericValue::invalid(ErrorKind::RecursiveCall);
    }
    self.frames.push(frame);
    let value = self.evaluate(root);
    self.frames.pop();
    self.guard.leave(&key);
    value
  }

  /// Read one element of a row-major array. Indices are zero-based.
  fn read_array(&self, name: &str, indices: &[NumericValue]) -> NumericValue {
    let (dims, values) = match self.symbols.resolve(name) {
      Symbol::Array { dims, values } => (dims, values),
      Symbol::Function { .. } | Symbol::Constant(_) => {
        return NumericValue::invalid_with(ErrorKind::NotAnArray, name);
      }
      Symbol::Unknown => {
        return NumericValue::invalid_with(ErrorKind::UnknownArray, name);
      }
    };
    if dims.len() != indices.len() {
      return NumericValue::invalid_with(ErrorKind::ArgumentCount, name);
    }
    let mut offset = 0;
    for (index, &dim) in indices.iter().zip(&dims) {
      let position = index
        .as_real()
        .filter(|i| i.fract() == 0.0 && *i >= 0.0 && *i < dim as f64);
      let Some(position) = position else {
        return NumericValue::invalid_with(
          ErrorKind::IndexOutOfRange,
          format!("{}[{}]", name, index),
        );
      };
      offset = offset * dim + position as usize;
    }
    match values.get(offset) {
      Some(v) => NumericValue::ArrayElement(*v),
      None => NumericValue::invalid_with(ErrorKind::IndexOutOfRange, name),
    }
  }
}

fn apply_operator(op: Operator, args: &[NumericValue]) -> NumericValue {
  match (op, args) {
    (Operator::Neg, [a]) => a.neg(),
    (Operator::Add, [a, b]) => a.add(b),
    (Operator::Sub, [a, b]) => a.sub(b),
    (Operator::Mul, [a, b]) => a.mul(b),
    (Operator::Div, [a, b]) => a.div(b),
    (Operator::Pow, [a, b]) => a.pow(b),
    _ => NumericValue::invalid_with(
      ErrorKind::ArgumentCount,
      op.symbol().to_string(),
    ),
  }
}

impl FormulaTree {
  /// Evaluate node `id`. The tree is not modified.
  pub fn evaluate(
    &self,
    id: NodeId,
    symbols: &dyn SymbolResolver,
    guard: &mut RecursionGuard,
  ) -> NumericValue {
    Evaluator::new(self, symbols, guard).evaluate(id)
  }

  /// Value of the derivative of node `id` with respect to `var`, at the
  /// current bindings. The tree is not modified.
  pub fn differentiate(
    &self,
    id: NodeId,
    var: &str,
    symbols: &dyn SymbolResolver,
    guard: &mut RecursionGuard,
  ) -> NumericValue {
    Evaluator::new(self, symbols, guard).differentiate(id, var)
  }

  /// Evaluate node `id` with a fresh guard and update its error marker:
  /// set on failure, cleared on success.
  pub fn calculate(&mut self, id: NodeId, host: &mut Host<'_>) -> NumericValue {
    let mut guard = RecursionGuard::new();
    let value = self.evaluate(id, host.symbols, &mut guard);
    self.set_error_code(id, value.error(), &mut *host.listener);
    value
  }
}
