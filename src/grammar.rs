use pest::Parser;
use pest_derive::Parser;

use crate::error::{ErrorKind, TermError};

#[derive(Parser)]
#[grammar = "term.pest"]
pub struct LeafParser;

/// A well-formed literal held as slot text.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
  Real(f64),
  /// Imaginary number written with an `i` suffix, e.g. `2.5i`.
  Imaginary(f64),
  Identifier(String),
  /// Quoted text, already unescaped.
  Quoted(String),
}

fn syntax_error(text: &str) -> TermError {
  TermError::with_detail(ErrorKind::Syntax, text.trim())
}

/// Parse the literal text of a slot.
///
/// Empty text is reported as `EmptyArgument`, anything the leaf grammar
/// rejects as `Syntax` with the offending text as detail.
pub fn parse_literal(text: &str) -> Result<Literal, TermError> {
  if text.trim().is_empty() {
    return Err(TermError::new(ErrorKind::EmptyArgument));
  }
  let mut pairs =
    LeafParser::parse(Rule::Leaf, text).map_err(|_| syntax_error(text))?;
  let literal = pairs
    .next()
    .and_then(|leaf| leaf.into_inner().next())
    .ok_or_else(|| syntax_error(text))?;

  match literal.as_rule() {
    Rule::Real => literal
      .as_str()
      .parse::<f64>()
      .map(Literal::Real)
      .map_err(|_| syntax_error(text)),
    Rule::Imaginary => {
      let digits = literal.as_str().trim_end_matches('i');
      digits
        .parse::<f64>()
        .map(Literal::Imaginary)
        .map_err(|_| syntax_error(text))
    }
    Rule::Identifier => Ok(Literal::Identifier(literal.as_str().to_string())),
    Rule::Quoted => snailquote::unescape(literal.as_str())
      .map(Literal::Quoted)
      .map_err(|_| syntax_error(text)),
    _ => Err(syntax_error(text)),
  }
}
