//! Bracket-aware string utilities: stripping one enclosing bracket pair and
//! splitting argument lists at top-level separators.
//!
//! All scanners share the same rules: `(`, `[` and `{` open a level, their
//! counterparts close it, and a `"` starts a quoted region (with backslash
//! escapes) in which brackets and separators are plain text.

use thiserror::Error;

/// The bracket pairs understood by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BracketKind {
  Round,
  Square,
  Curly,
}

impl BracketKind {
  pub fn open(self) -> char {
    match self {
      BracketKind::Round => '(',
      BracketKind::Square => '[',
      BracketKind::Curly => '{',
    }
  }

  pub fn close(self) -> char {
    match self {
      BracketKind::Round => ')',
      BracketKind::Square => ']',
      BracketKind::Curly => '}',
    }
  }

  pub fn from_open(c: char) -> Option<Self> {
    match c {
      '(' => Some(BracketKind::Round),
      '[' => Some(BracketKind::Square),
      '{' => Some(BracketKind::Curly),
      _ => None,
    }
  }

  pub fn from_close(c: char) -> Option<Self> {
    match c {
      ')' => Some(BracketKind::Round),
      ']' => Some(BracketKind::Square),
      '}' => Some(BracketKind::Curly),
      _ => None,
    }
  }
}

pub fn is_bracket(c: char) -> bool {
  BracketKind::from_open(c).is_some() || BracketKind::from_close(c).is_some()
}

/// Unbalanced brackets or quotes in a piece of formula text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedBracketsError {
  #[error("unmatched '{bracket}' at position {position}")]
  UnmatchedCloser { bracket: char, position: usize },
  #[error("'{bracket}' at position {position} is never closed")]
  UnmatchedOpener { bracket: char, position: usize },
  #[error("expected '{expected}' but found '{found}' at position {position}")]
  MismatchedCloser {
    expected: char,
    found: char,
    position: usize,
  },
  #[error("quoted text starting at position {position} is never closed")]
  UnterminatedQuote { position: usize },
}

/// Walk `s` and report every character that sits outside brackets and
/// quotes to `on_top_level`, together with its byte position.
///
/// Fails on the first bracket that cannot be matched and on a quote that is
/// still open at the end.
fn scan_top_level(
  s: &str,
  mut on_top_level: impl FnMut(usize, char),
) -> Result<(), MalformedBracketsError> {
  let mut stack: Vec<(BracketKind, usize)> = Vec::new();
  let mut quote_start: Option<usize> = None;
  let mut escaped = false;

  for (i, c) in s.char_indices() {
    if quote_start.is_some() {
      if escaped {
        escaped = false;
      } else if c == '\\' {
        escaped = true;
      } else if c == '"' {
        quote_start = None;
      }
      continue;
    }

    if c == '"' {
      quote_start = Some(i);
      continue;
    }
    if let Some(kind) = BracketKind::from_open(c) {
      stack.push((kind, i));
      continue;
    }
    if let Some(kind) = BracketKind::from_close(c) {
      match stack.pop() {
        None => {
          return Err(MalformedBracketsError::UnmatchedCloser {
            bracket: c,
            position: i,
          });
        }
        Some((open, _)) if open != kind => {
          return Err(MalformedBracketsError::MismatchedCloser {
            expected: open.close(),
            found: c,
            position: i,
          });
        }
        Some(_) => {}
      }
      continue;
    }
    if stack.is_empty() {
      on_top_level(i, c);
    }
  }

  if let Some(position) = quote_start {
    return Err(MalformedBracketsError::UnterminatedQuote { position });
  }
  if let Some((kind, position)) = stack.pop() {
    return Err(MalformedBracketsError::UnmatchedOpener {
      bracket: kind.open(),
      position,
    });
  }
  Ok(())
}

/// Check that every bracket and quote in `s` is closed properly.
pub fn check_balance(s: &str) -> Result<(), MalformedBracketsError> {
  scan_top_level(s, |_, _| {})
}

/// Byte positions of the characters satisfying `pred` that are at nesting
/// depth zero and outside quotes.
pub fn top_level_positions(
  s: &str,
  pred: impl Fn(char) -> bool,
) -> Result<Vec<usize>, MalformedBracketsError> {
  let mut positions = Vec::new();
  scan_top_level(s, |i, c| {
    if pred(c) {
      positions.push(i);
    }
  })?;
  Ok(positions)
}

/// Position of the bracket closing the one opened at byte `open_pos`.
/// Quotes are honored; a mismatched pair yields `None`.
pub fn find_matching_close(s: &str, open_pos: usize) -> Option<usize> {
  let kind = BracketKind::from_open(s[open_pos..].chars().next()?)?;
  let mut stack = vec![kind];
  let mut in_quote = false;
  let mut escaped = false;

  for (offset, c) in s[open_pos..].char_indices().skip(1) {
    if in_quote {
      if escaped {
        escaped = false;
      } else if c == '\\' {
        escaped = true;
      } else if c == '"' {
        in_quote = false;
      }
      continue;
    }
    if c == '"' {
      in_quote = true;
    } else if let Some(open) = BracketKind::from_open(c) {
      stack.push(open);
    } else if let Some(close) = BracketKind::from_close(c) {
      if stack.pop() != Some(close) {
        return None;
      }
      if stack.is_empty() {
        return Some(open_pos + offset);
      }
    }
  }
  None
}

/// Whether the whole of `s` is enclosed by one bracket pair of `kind`,
/// where the first character's partner is the last character.
pub fn is_wrapped(s: &str, kind: BracketKind) -> bool {
  let s = s.trim();
  if !s.starts_with(kind.open()) || !s.ends_with(kind.close()) {
    return false;
  }
  find_matching_close(s, 0) == Some(s.len() - 1)
}

/// Remove one enclosing bracket pair of `kind` if it wraps the entire
/// string; otherwise return the (trimmed) input unchanged.
///
/// `(a)+(b)` is left alone: its first bracket is closed before the end.
pub fn strip_outer_brackets(s: &str, kind: BracketKind) -> &str {
  let trimmed = s.trim();
  if is_wrapped(trimmed, kind) {
    &trimmed[1..trimmed.len() - 1]
  } else {
    trimmed
  }
}

pub fn is_identifier(s: &str) -> bool {
  let mut chars = s.chars();
  match chars.next() {
    Some(c) if c.is_alphabetic() || c == '_' => {}
    _ => return false,
  }
  chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Split `s` as a call `name(...)`, `name[...]` or `name{...}` whose
/// bracket pair runs to the end of the string.
///
/// Returns the name, the bracket kind and the text between the brackets.
pub fn call_form(s: &str) -> Option<(&str, BracketKind, &str)> {
  let s = s.trim();
  let open_pos = s.find(|c: char| BracketKind::from_open(c).is_some())?;
  let name = s[..open_pos].trim_end();
  if !is_identifier(name) {
    return None;
  }
  let kind = BracketKind::from_open(s[open_pos..].chars().next()?)?;
  if find_matching_close(s, open_pos)? != s.len() - 1 {
    return None;
  }
  Some((name, kind, &s[open_pos + 1..s.len() - 1]))
}

/// Split an argument list at top-level occurrences of `separator`.
///
/// If the text is a whole call such as `f(a, b)`, its argument list is
/// split. Separators inside nested brackets or quotes never split. Parts
/// are trimmed, kept in order, and empty parts are preserved so a missing
/// argument stays visible to arity checks.
pub fn split_top_level(
  s: &str,
  separator: char,
) -> Result<Vec<String>, MalformedBracketsError> {
  check_balance(s)?;
  let body = match call_form(s) {
    Some((_, _, inner)) => inner,
    None => s.trim(),
  };
  split_list(body, separator)
}

/// Split `body` at top-level separators without looking for an enclosing
/// call. Empty text yields a single empty part.
pub fn split_list(
  body: &str,
  separator: char,
) -> Result<Vec<String>, MalformedBracketsError> {
  let cuts = top_level_positions(body, |c| c == separator)?;
  let mut parts = Vec::with_capacity(cuts.len() + 1);
  let mut start = 0;
  for cut in cuts {
    parts.push(body[start..cut].trim().to_string());
    start = cut + separator.len_utf8();
  }
  parts.push(body[start..].trim().to_string());
  Ok(parts)
}

/// Inverse of [`split_top_level`] for already-split parts.
pub fn join_parts<S: AsRef<str>>(parts: &[S], separator: char) -> String {
  let glue = format!("{} ", separator);
  parts
    .iter()
    .map(|p| p.as_ref().trim())
    .collect::<Vec<_>>()
    .join(&glue)
}
