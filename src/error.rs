//! Error kinds reported by terms after construction, and the message
//! templates used to present them.

use std::fmt;

/// What went wrong while validating, evaluating or differentiating a term.
///
/// These are values carried through the tree, not panics: a failing term
/// yields an invalid [`crate::NumericValue`] tagged with one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  UnknownFunction,
  UnknownArray,
  NotAnArray,
  NotAFunction,
  RecursiveCall,
  NotDifferentiable,
  EmptyArgument,
  Syntax,
  UnknownVariable,
  NotANumber,
  ArgumentCount,
  IndexOutOfRange,
  TooDeep,
}

impl ErrorKind {
  /// Message template for this kind. `{}` is replaced by the detail.
  pub fn template(self) -> &'static str {
    match self {
      ErrorKind::UnknownFunction => "Unknown function: {}",
      ErrorKind::UnknownArray => "Unknown array: {}",
      ErrorKind::NotAnArray => "{} is not an array",
      ErrorKind::NotAFunction => "{} is not a function",
      ErrorKind::RecursiveCall => "Recursive call is not allowed",
      ErrorKind::NotDifferentiable => "{} is not differentiable",
      ErrorKind::EmptyArgument => "Argument is empty",
      ErrorKind::Syntax => "Cannot parse: {}",
      ErrorKind::UnknownVariable => "Unknown variable: {}",
      ErrorKind::NotANumber => "{} is not a number",
      ErrorKind::ArgumentCount => "Wrong number of arguments: {}",
      ErrorKind::IndexOutOfRange => "Index out of range: {}",
      ErrorKind::TooDeep => "Formula is nested too deeply",
    }
  }

  /// Whether the formatted message carries the offending name or text.
  pub fn takes_detail(self) -> bool {
    !matches!(
      self,
      ErrorKind::RecursiveCall | ErrorKind::EmptyArgument | ErrorKind::TooDeep
    )
  }
}

/// An error kind plus the free-text detail (usually the unresolved name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermError {
  pub kind: ErrorKind,
  pub detail: Option<String>,
}

impl TermError {
  pub fn new(kind: ErrorKind) -> Self {
    TermError { kind, detail: None }
  }

  pub fn with_detail(kind: ErrorKind, detail: impl Into<String>) -> Self {
    let detail = if kind.takes_detail() {
      Some(detail.into())
    } else {
      None
    };
    TermError { kind, detail }
  }

  pub fn recursive_call() -> Self {
    TermError::new(ErrorKind::RecursiveCall)
  }

  /// The user-facing message for this error.
  pub fn message(&self) -> String {
    classify_error(Some(self.kind), self.detail.as_deref()).unwrap_or_default()
  }
}

impl fmt::Display for TermError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.message())
  }
}

impl std::error::Error for TermError {}

/// Turn an error kind and its detail into the message shown to the user.
///
/// `None` stands for "no error" and produces no message. Kinds that carry
/// a detail substitute it into their template; `RecursiveCall` always
/// uses its fixed text.
pub fn classify_error(
  kind: Option<ErrorKind>,
  detail: Option<&str>,
) -> Option<String> {
  let kind = kind?;
  let template = kind.template();
  if !kind.takes_detail() {
    return Some(template.to_string());
  }
  Some(template.replacen("{}", detail.unwrap_or(""), 1))
}
