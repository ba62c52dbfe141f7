//! Numeric derivatives, dispatched per node kind.

use num_complex::Complex64;

use crate::builtins::Builtin;
use crate::error::ErrorKind;
use crate::eval::{CallKey, Evaluator};
use crate::function::CallKind;
use crate::grammar::{Literal, parse_literal};
use crate::tree::{FieldContent, NodeId, Operator, TermField, TermKind};
use crate::value::NumericValue;

/// A field's value together with its derivative.
type Pair = (NumericValue, NumericValue);

fn is_zero(value: &NumericValue) -> bool {
  value.as_complex() == Some(Complex64::new(0.0, 0.0))
}

fn not_differentiable(label: impl Into<String>) -> NumericValue {
  NumericValue::invalid_with(ErrorKind::NotDifferentiable, label)
}

impl Evaluator<'_> {
  /// Derivative of node `id` with respect to `var`.
  pub fn differentiate(&mut self, id: NodeId, var: &str) -> NumericValue {
    self.nested(|this| this.diff_node(id, var))
  }

  fn diff_node(&mut self, id: NodeId, var: &str) -> NumericValue {
    let tree = self.tree;
    let Some(node) = tree.node(id) else {
      return NumericValue::invalid_with(ErrorKind::Syntax, id.to_string());
    };
    match &node.kind {
      TermKind::Brackets => match node.terms.first() {
        Some(field) => self.diff_field(field, var),
        None => NumericValue::invalid(ErrorKind::EmptyArgument),
      },
      TermKind::Operator(Operator::Neg) => match node.terms.first() {
        Some(field) => self.diff_field(field, var).neg(),
        None => NumericValue::invalid(ErrorKind::EmptyArgument),
      },
      TermKind::Operator(op) => {
        let [left, right] = node.terms.as_slice() else {
          return NumericValue::invalid_with(
            ErrorKind::ArgumentCount,
            op.symbol().to_string(),
          );
        };
        self.diff_binary(*op, left, right, var)
      }
      TermKind::Function(f) => match (f.call, node.terms.as_slice()) {
        (CallKind::Builtin(builtin), [arg]) if builtin.is_differentiable() => {
          let key = CallKey::Node(id);
          if !self.guard.enter(key.clone()) {
            return NumericValue::invalid(ErrorKind::RecursiveCall);
          }
          let value = self.chain_rule(builtin, arg, var);
          self.guard.leave(&key);
          value
        }
        _ => not_differentiable(f.code.clone()),
      },
    }
  }

  fn chain_rule(
    &mut self,
    builtin: Builtin,
    arg: &TermField,
    var: &str,
  ) -> NumericValue {
    let (u, du) = match self.pair(arg, var) {
      Ok(pair) => pair,
      Err(err) => return err,
    };
    let outer = u
      .as_complex()
      .and_then(|z| builtin.derivative(z))
      .map(NumericValue::from_complex);
    match outer {
      Some(d) => d.mul(&du),
      None => not_differentiable(builtin.name()),
    }
  }

  fn diff_binary(
    &mut self,
    op: Operator,
    left: &TermField,
    right: &TermField,
    var: &str,
  ) -> NumericValue {
    let (u, du) = match self.pair(left, var) {
      Ok(pair) => pair,
      Err(err) => return err,
    };
    let (v, dv) = match self.pair(right, var) {
      Ok(pair) => pair,
      Err(err) => return err,
    };
    match op {
      Operator::Add => du.add(&dv),
      Operator::Sub => du.sub(&dv),
      Operator::Mul => du.mul(&v).add(&u.mul(&dv)),
      Operator::Div => du.mul(&v).sub(&u.mul(&dv)).div(&v.mul(&v)),
      Operator::Pow if is_zero(&dv) => {
        if is_zero(&du) {
          return NumericValue::Real(0.0);
        }
        let one = NumericValue::Real(1.0);
        v.mul(&u.pow(&v.sub(&one))).mul(&du)
      }
      Operator::Pow => {
        let ln_u = Builtin::Ln.apply(std::slice::from_ref(&u));
        let inner = dv.mul(&ln_u).add(&v.mul(&du).div(&u));
        u.pow(&v).mul(&inner)
      }
      Operator::Neg => not_differentiable(op.symbol().to_string()),
    }
  }

  /// Value and derivative of a field, stopping at the first error.
  fn pair(
    &mut self,
    field: &TermField,
    var: &str,
  ) -> Result<Pair, NumericValue> {
    let value = self.eval_field(field);
    if !value.is_valid() {
      return Err(value);
    }
    let derivative = self.diff_field(field, var);
    if !derivative.is_valid() {
      return Err(derivative);
    }
    Ok((value, derivative))
  }

  fn diff_field(&mut self, field: &TermField, var: &str) -> NumericValue {
    match field.content() {
      FieldContent::Term(child) => self.differentiate(*child, var),
      FieldContent::Text(text) => match parse_literal(text) {
        Err(err) => NumericValue::Invalid(err),
        Ok(Literal::Identifier(name)) if name == var => NumericValue::Real(1.0),
        Ok(Literal::Identifier(name)) => {
          let value = self.lookup(&name);
          if value.is_valid() {
            NumericValue::Real(0.0)
          } else {
            value
          }
        }
        Ok(Literal::Real(_)) | Ok(Literal::Imaginary(_)) => {
          NumericValue::Real(0.0)
        }
        Ok(Literal::Quoted(s)) => {
          NumericValue::invalid_with(ErrorKind::NotANumber, format!("{:?}", s))
        }
      },
    }
  }
}
