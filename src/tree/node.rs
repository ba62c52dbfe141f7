use crate::error::TermError;
use crate::function::FunctionTerm;
use crate::tree::field::{BracketPolicy, TermField};
use crate::tree::{FieldRef, SlotId};

/// Arithmetic operators recognized in slot text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
  Add,
  Sub,
  Mul,
  Div,
  Pow,
  /// Unary minus.
  Neg,
}

/// Which operand of a binary operator a slot is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
  Left,
  Right,
}

impl Operator {
  pub fn symbol(self) -> char {
    match self {
      Operator::Add => '+',
      Operator::Sub | Operator::Neg => '-',
      Operator::Mul => '*',
      Operator::Div => '/',
      Operator::Pow => '^',
    }
  }

  pub fn from_symbol(c: char) -> Option<Self> {
    match c {
      '+' => Some(Operator::Add),
      '-' => Some(Operator::Sub),
      '*' => Some(Operator::Mul),
      '/' => Some(Operator::Div),
      '^' => Some(Operator::Pow),
      _ => None,
    }
  }

  pub fn precedence(self) -> u8 {
    match self {
      Operator::Add | Operator::Sub => 1,
      Operator::Mul | Operator::Div => 2,
      Operator::Neg => 3,
      Operator::Pow => 4,
    }
  }

  pub fn arity(self) -> usize {
    if self == Operator::Neg { 1 } else { 2 }
  }

  /// Whether `self`, rendered as an operand of `parent` on `side`, must be
  /// bracketed to parse back into the same tree.
  pub fn needs_brackets_under(self, parent: Operator, side: Side) -> bool {
    let (own, outer) = (self.precedence(), parent.precedence());
    match parent {
      Operator::Neg => own < outer,
      Operator::Pow if side == Side::Right && self == Operator::Neg => false,
      Operator::Pow => own < outer || (own == outer && side == Side::Left),
      _ => own < outer || (own == outer && side == Side::Right),
    }
  }
}

/// The closed set of node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum TermKind {
  Operator(Operator),
  /// An explicit `( ... )` group with one slot.
  Brackets,
  Function(FunctionTerm),
}

/// Validation state of a node. Any structural edit resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationStatus {
  #[default]
  Unvalidated,
  Valid,
  Error,
}

/// A node of the term tree: its kind plus the ordered slots it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct TermNode {
  pub(crate) kind: TermKind,
  pub(crate) terms: Vec<TermField>,
  pub(crate) parent: Option<FieldRef>,
  pub(crate) status: ValidationStatus,
  pub(crate) error: Option<TermError>,
  next_slot: u32,
}

impl TermNode {
  pub(crate) fn new(kind: TermKind) -> Self {
    TermNode {
      kind,
      terms: Vec::new(),
      parent: None,
      status: ValidationStatus::Unvalidated,
      error: None,
      next_slot: 0,
    }
  }

  pub fn kind(&self) -> &TermKind {
    &self.kind
  }

  pub fn terms(&self) -> &[TermField] {
    &self.terms
  }

  /// The field embedding this node, `None` for a root.
  pub fn parent(&self) -> Option<FieldRef> {
    self.parent
  }

  pub fn status(&self) -> ValidationStatus {
    self.status
  }

  /// The active error marker of this node.
  pub fn error(&self) -> Option<&TermError> {
    self.error.as_ref()
  }

  pub fn function(&self) -> Option<&FunctionTerm> {
    match &self.kind {
      TermKind::Function(f) => Some(f),
      _ => None,
    }
  }

  pub fn position_of(&self, slot: SlotId) -> Option<usize> {
    self.terms.iter().position(|t| t.slot() == slot)
  }

  pub fn field(&self, slot: SlotId) -> Option<&TermField> {
    self.terms.iter().find(|t| t.slot() == slot)
  }

  pub(crate) fn field_mut(&mut self, slot: SlotId) -> Option<&mut TermField> {
    self.terms.iter_mut().find(|t| t.slot() == slot)
  }

  /// Text left behind when the node is deleted and nothing else remains.
  pub fn label(&self) -> String {
    match &self.kind {
      TermKind::Function(f) => f.code.clone(),
      TermKind::Operator(op) => op.symbol().to_string(),
      TermKind::Brackets => String::new(),
    }
  }

  /// Create an empty slot at `index` (clamped to the end).
  pub(crate) fn insert_field(
    &mut self,
    index: usize,
    policy: BracketPolicy,
  ) -> SlotId {
    let slot = SlotId(self.next_slot);
    self.next_slot += 1;
    let index = index.min(self.terms.len());
    self.terms.insert(index, TermField::new(slot, policy));
    slot
  }

  pub(crate) fn push_field(&mut self, policy: BracketPolicy) -> SlotId {
    self.insert_field(self.terms.len(), policy)
  }

  pub(crate) fn default_policy(&self) -> BracketPolicy {
    match self.kind {
      TermKind::Operator(_) => BracketPolicy::IfNeeded,
      TermKind::Brackets => BracketPolicy::Always,
      TermKind::Function(_) => BracketPolicy::Never,
    }
  }
}
