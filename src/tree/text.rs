//! Turning slot text into terms, and terms back into text.

use log::debug;

use crate::BuildError;
use crate::brackets::{
  self, BracketKind, MalformedBracketsError, call_form, is_wrapped,
  split_list, strip_outer_brackets, top_level_positions,
};
use crate::function::{CallKind, FunctionTerm};
use crate::tree::{
  BracketPolicy, FieldContent, FieldRef, FormulaTree, MAX_NESTING_DEPTH,
  NodeId, Operator, Side, TermField, TermKind, TermNode,
};

/// How split parts are stored into slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedTerm {
  /// Recognize operators, brackets and calls and build child terms.
  Formula,
  /// Keep each part as literal text.
  Text,
}

/// The shape recognized at the top level of a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognized<'a> {
  Literal(&'a str),
  Brackets(&'a str),
  Binary(Operator, &'a str, &'a str),
  Negate(&'a str),
  Call {
    name: &'a str,
    kind: BracketKind,
    args: &'a str,
  },
}

/// True if the text before an operator ends with the mantissa of a number
/// in scientific notation, such as the `2e` of `2e-3`.
fn ends_with_exponent_marker(before: &str) -> bool {
  if !before.ends_with(['e', 'E']) {
    return false;
  }
  let token_start = before
    .char_indices()
    .rev()
    .take_while(|(_, c)| c.is_alphanumeric() || *c == '.')
    .last()
    .map(|(i, _)| i)
    .unwrap_or(before.len());
  let mantissa = &before[token_start..before.len() - 1];
  !mantissa.is_empty()
    && mantissa.starts_with(|c: char| c.is_ascii_digit() || c == '.')
    && mantissa.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Whether the operator character at byte `pos` joins two operands, as
/// opposed to being a sign or part of an exponent.
fn is_binary_at(text: &str, pos: usize) -> bool {
  let before = text[..pos].trim_end();
  let Some(prev) = before.chars().last() else {
    return false;
  };
  let operand_end = prev.is_alphanumeric()
    || prev == '_'
    || prev == '.'
    || prev == '"'
    || BracketKind::from_close(prev).is_some();
  if !operand_end {
    return false;
  }
  let op = text[pos..].chars().next();
  if matches!(op, Some('+') | Some('-')) && ends_with_exponent_marker(before)
  {
    return false;
  }
  true
}

/// Find the top-level shape of `text`.
///
/// Lowest precedence binds last: sums, then products, then a leading sign,
/// then powers (right-associative), then calls. Whatever is left is a
/// literal.
pub fn recognize(text: &str) -> Result<Recognized<'_>, MalformedBracketsError> {
  let text = text.trim();
  if text.is_empty() {
    return Ok(Recognized::Literal(text));
  }
  if is_wrapped(text, BracketKind::Round) {
    return Ok(Recognized::Brackets(&text[1..text.len() - 1]));
  }

  let ops = top_level_positions(text, |c| "+-*/^".contains(c))?;
  let binary: Vec<usize> =
    ops.into_iter().filter(|&p| is_binary_at(text, p)).collect();
  let split = |pos: usize| {
    let op = text[pos..].chars().next().and_then(Operator::from_symbol);
    op.map(|op| Recognized::Binary(op, &text[..pos], &text[pos + 1..]))
  };

  for group in ["+-", "*/"] {
    let rightmost = binary
      .iter()
      .rev()
      .find(|&&p| group.contains(&text[p..p + 1]));
    if let Some(&pos) = rightmost
      && let Some(found) = split(pos)
    {
      return Ok(found);
    }
  }
  if let Some(rest) = text.strip_prefix('-') {
    return Ok(Recognized::Negate(rest));
  }
  if text.starts_with('+') {
    return recognize(text.trim_start_matches(|c: char| {
      c == '+' || c.is_whitespace()
    }));
  }
  if let Some(&pos) = binary.iter().find(|&&p| &text[p..p + 1] == "^")
    && let Some(found) = split(pos)
  {
    return Ok(found);
  }

  if let Some((name, kind, args)) = call_form(text)
    && kind != BracketKind::Curly
  {
    return Ok(Recognized::Call { name, kind, args });
  }
  Ok(Recognized::Literal(text))
}

enum Parsed {
  Text(String),
  Node(NodeId),
}

impl FormulaTree {
  /// Parse `text` and store the result in `field`: a child term if the
  /// text has structure, literal text otherwise.
  ///
  /// Only unbalanced brackets or quotes and terms nested deeper than
  /// [`MAX_NESTING_DEPTH`] fail; any other problem is left for validation
  /// to report.
  pub fn parse_into_field(
    &mut self,
    field: FieldRef,
    text: &str,
  ) -> Result<(), BuildError> {
    brackets::check_balance(text)?;
    let depth = self.depth(field.node) + 1;
    match self.parse_term(text, depth)? {
      Parsed::Text(t) => {
        self.set_text(field, &t);
      }
      Parsed::Node(child) => {
        if !self.attach_child(field, child) {
          self.remove_subtree(child);
        }
      }
    }
    Ok(())
  }

  /// Parse text into a detached node, or `None` when it is a plain literal.
  pub fn parse_detached(
    &mut self,
    text: &str,
  ) -> Result<Option<NodeId>, BuildError> {
    brackets::check_balance(text)?;
    Ok(match self.parse_term(text, 0)? {
      Parsed::Text(_) => None,
      Parsed::Node(id) => Some(id),
    })
  }

  /// Parse `text` into a node that will sit at level `depth`.
  fn parse_term(
    &mut self,
    text: &str,
    depth: usize,
  ) -> Result<Parsed, BuildError> {
    let recognized = recognize(text)?;
    let is_literal = matches!(recognized, Recognized::Literal(_));
    if depth > MAX_NESTING_DEPTH && !is_literal {
      return Err(BuildError::TooDeep {
        limit: MAX_NESTING_DEPTH,
      });
    }
    let (kind, parts) = match recognized {
      Recognized::Literal(t) => return Ok(Parsed::Text(t.trim().to_string())),
      Recognized::Brackets(inner) => {
        (TermKind::Brackets, vec![inner.to_string()])
      }
      Recognized::Binary(op, left, right) => (
        TermKind::Operator(op),
        vec![left.to_string(), right.to_string()],
      ),
      Recognized::Negate(inner) => {
        (TermKind::Operator(Operator::Neg), vec![inner.to_string()])
      }
      Recognized::Call { name, kind, args } => {
        let separator = self.config().separator;
        let call = CallKind::for_call(name, kind);
        let term = FunctionTerm::new(name, call, kind, separator);
        (TermKind::Function(term), split_list(args, separator)?)
      }
    };

    let id = self.insert_node(TermNode::new(kind));
    for part in parts {
      let Some(field) = self.push_field(id) else { break };
      if let Err(e) = self.fill_field(field, &part, depth + 1) {
        self.remove_subtree(id);
        return Err(e);
      }
    }
    Ok(Parsed::Node(id))
  }

  fn fill_field(
    &mut self,
    field: FieldRef,
    text: &str,
    depth: usize,
  ) -> Result<(), BuildError> {
    match self.parse_term(text, depth)? {
      Parsed::Text(t) => {
        self.set_text(field, &t);
      }
      Parsed::Node(child) => {
        self.attach_child(field, child);
      }
    }
    Ok(())
  }

  /// Split `text` into the slots of node `id`.
  ///
  /// The node's enclosing bracket layer is stripped, the rest is split at
  /// the node's separator, and each part is stored into an existing or new
  /// slot (surplus slots are dropped). Returns `Ok(false)` when the text is
  /// empty and `allow_empty_result` is not set; fails when the brackets are
  /// malformed or there are more parts than the node accepts.
  pub fn split_into_terms(
    &mut self,
    id: NodeId,
    text: &str,
    expected: ExpectedTerm,
    allow_empty_result: bool,
  ) -> Result<bool, BuildError> {
    let text = text.trim();
    if text.is_empty() && !allow_empty_result {
      return Ok(false);
    }
    brackets::check_balance(text)?;
    let kind = match self.node(id) {
      Some(node) => node.kind.clone(),
      None => return Ok(false),
    };

    let parts = match &kind {
      TermKind::Function(f) => {
        split_list(strip_outer_brackets(text, f.brackets), f.separator)?
      }
      TermKind::Brackets => {
        vec![strip_outer_brackets(text, BracketKind::Round).to_string()]
      }
      TermKind::Operator(op) => match (op, recognize(text)?) {
        (Operator::Neg, Recognized::Negate(inner)) => vec![inner.to_string()],
        (op, Recognized::Binary(found, left, right)) if *op == found => {
          vec![left.to_string(), right.to_string()]
        }
        _ => {
          return Err(BuildError::Unsplittable {
            text: text.to_string(),
            kind: op.symbol().to_string(),
          });
        }
      },
    };

    let max = match &kind {
      TermKind::Function(f) => f.max_args,
      TermKind::Operator(op) => Some(op.arity()),
      TermKind::Brackets => Some(1),
    };
    if let Some(max) = max
      && parts.len() > max
    {
      return Err(BuildError::InvalidArgumentCount {
        expected: max,
        actual: parts.len(),
      });
    }

    for (index, part) in parts.iter().enumerate() {
      let field = match self.field_at(id, index) {
        Some(field) => field,
        None => match self.push_field(id) {
          Some(field) => field,
          None => break,
        },
      };
      match expected {
        ExpectedTerm::Formula => self.parse_into_field(field, part)?,
        ExpectedTerm::Text => {
          self.set_text(field, part);
        }
      }
    }
    while self.field_at(id, parts.len()).is_some() {
      self.remove_field_at(id, parts.len());
    }
    self.mark_unvalidated(id);
    debug!("split {:?} into {} terms of {}", text, parts.len(), id);
    Ok(true)
  }

  /// Render a node back to text in the same grammar the splitter reads.
  pub fn to_text(&self, id: NodeId) -> String {
    let Some(node) = self.node(id) else {
      return String::new();
    };
    match &node.kind {
      TermKind::Brackets => {
        let inner = node
          .terms
          .first()
          .map(|t| self.field_text(t))
          .unwrap_or_default();
        format!("({})", inner)
      }
      TermKind::Operator(op) if *op == Operator::Neg => {
        let operand = node
          .terms
          .first()
          .map(|t| self.operand_text(*op, t, Side::Right))
          .unwrap_or_default();
        format!("-{}", operand)
      }
      TermKind::Operator(op) => {
        let left = node
          .terms
          .first()
          .map(|t| self.operand_text(*op, t, Side::Left))
          .unwrap_or_default();
        let right = node
          .terms
          .get(1)
          .map(|t| self.operand_text(*op, t, Side::Right))
          .unwrap_or_default();
        format!("{}{}{}", left, op.symbol(), right)
      }
      TermKind::Function(f) => {
        let args: Vec<String> =
          node.terms.iter().map(|t| self.field_text(t)).collect();
        format!(
          "{}{}{}{}",
          f.code,
          f.brackets.open(),
          brackets::join_parts(&args, f.separator),
          f.brackets.close()
        )
      }
    }
  }

  /// Text of one slot, without any brackets its policy may add.
  pub fn field_text(&self, field: &TermField) -> String {
    match field.content() {
      FieldContent::Text(t) => t.trim().to_string(),
      FieldContent::Term(child) => self.to_text(*child),
    }
  }

  fn operand_text(
    &self,
    op: Operator,
    field: &TermField,
    side: Side,
  ) -> String {
    let text = self.field_text(field);
    let wrap = match (field.bracket_policy(), field.child()) {
      (_, None) => false,
      (BracketPolicy::Always, Some(_)) => true,
      (BracketPolicy::Never, Some(_)) => false,
      (BracketPolicy::IfNeeded, Some(child)) => {
        match self.node(child).map(|n| &n.kind) {
          Some(TermKind::Operator(inner)) => {
            inner.needs_brackets_under(op, side)
          }
          _ => false,
        }
      }
    };
    if wrap { format!("({})", text) } else { text }
  }

  /// Texts of all slots of `id`, in order.
  pub fn term_texts(&self, id: NodeId) -> Vec<String> {
    self
      .node(id)
      .map(|n| n.terms.iter().map(|t| self.field_text(t)).collect())
      .unwrap_or_default()
  }
}
