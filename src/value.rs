use num_complex::Complex64;

use crate::error::{ErrorKind, TermError};

/// Tag of a [`NumericValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
  Real,
  Complex,
  ArrayElement,
  Invalid,
}

/// Result of evaluating or differentiating a term.
///
/// An error is only ever carried by `Invalid`, so a value with an error is
/// always invalid.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericValue {
  Real(f64),
  Complex(Complex64),
  /// A real read out of an array.
  ArrayElement(f64),
  Invalid(TermError),
}

impl Default for NumericValue {
  fn default() -> Self {
    NumericValue::Real(0.0)
  }
}

impl NumericValue {
  pub fn invalid(kind: ErrorKind) -> Self {
    NumericValue::Invalid(TermError::new(kind))
  }

  pub fn invalid_with(kind: ErrorKind, detail: impl Into<String>) -> Self {
    NumericValue::Invalid(TermError::with_detail(kind, detail))
  }

  /// Build a value from a complex number, demoting it to a real when the
  /// imaginary part vanishes.
  pub fn from_complex(c: Complex64) -> Self {
    if c.im == 0.0 {
      NumericValue::Real(c.re)
    } else {
      NumericValue::Complex(c)
    }
  }

  pub fn kind(&self) -> ValueKind {
    match self {
      NumericValue::Real(_) => ValueKind::Real,
      NumericValue::Complex(_) => ValueKind::Complex,
      NumericValue::ArrayElement(_) => ValueKind::ArrayElement,
      NumericValue::Invalid(_) => ValueKind::Invalid,
    }
  }

  pub fn is_valid(&self) -> bool {
    !matches!(self, NumericValue::Invalid(_))
  }

  pub fn error(&self) -> Option<&TermError> {
    match self {
      NumericValue::Invalid(err) => Some(err),
      _ => None,
    }
  }

  pub fn error_kind(&self) -> Option<ErrorKind> {
    self.error().map(|e| e.kind)
  }

  /// The real part for real-valued kinds; `None` for complex or invalid.
  pub fn as_real(&self) -> Option<f64> {
    match self {
      NumericValue::Real(x) | NumericValue::ArrayElement(x) => Some(*x),
      _ => None,
    }
  }

  pub fn as_complex(&self) -> Option<Complex64> {
    match self {
      NumericValue::Real(x) | NumericValue::ArrayElement(x) => {
        Some(Complex64::new(*x, 0.0))
      }
      NumericValue::Complex(c) => Some(*c),
      NumericValue::Invalid(_) => None,
    }
  }

  /// Turn the value into a `Result` so callers can use `?`.
  pub fn into_result(self) -> Result<NumericValue, TermError> {
    match self {
      NumericValue::Invalid(err) => Err(err),
      other => Ok(other),
    }
  }

  /// Apply a real rule when both operands are real, the complex rule
  /// otherwise. Invalid operands propagate the left-most error.
  fn combine(
    &self,
    rhs: &NumericValue,
    real: impl Fn(f64, f64) -> f64,
    complex: impl Fn(Complex64, Complex64) -> Complex64,
  ) -> NumericValue {
    if let NumericValue::Invalid(err) = self {
      return NumericValue::Invalid(err.clone());
    }
    if let NumericValue::Invalid(err) = rhs {
      return NumericValue::Invalid(err.clone());
    }
    match (self.as_real(), rhs.as_real()) {
      (Some(a), Some(b)) => NumericValue::Real(real(a, b)),
      _ => match (self.as_complex(), rhs.as_complex()) {
        (Some(a), Some(b)) => NumericValue::from_complex(complex(a, b)),
        _ => NumericValue::invalid(ErrorKind::NotANumber),
      },
    }
  }

  pub fn add(&self, rhs: &NumericValue) -> NumericValue {
    self.combine(rhs, |a, b| a + b, |a, b| a + b)
  }

  pub fn sub(&self, rhs: &NumericValue) -> NumericValue {
    self.combine(rhs, |a, b| a - b, |a, b| a - b)
  }

  pub fn mul(&self, rhs: &NumericValue) -> NumericValue {
    self.combine(rhs, |a, b| a * b, |a, b| a * b)
  }

  pub fn div(&self, rhs: &NumericValue) -> NumericValue {
    self.combine(rhs, |a, b| a / b, |a, b| a / b)
  }

  /// Power. A negative real base with a non-integer exponent goes through
  /// the complex branch instead of producing NaN.
  pub fn pow(&self, rhs: &NumericValue) -> NumericValue {
    if let (Some(a), Some(b)) = (self.as_real(), rhs.as_real())
      && a < 0.0
      && b.fract() != 0.0
    {
      return NumericValue::from_complex(
        Complex64::new(a, 0.0).powc(Complex64::new(b, 0.0)),
      );
    }
    self.combine(rhs, f64::powf, |a, b| a.powc(b))
  }

  pub fn neg(&self) -> NumericValue {
    match self {
      NumericValue::Real(x) => NumericValue::Real(-x),
      NumericValue::ArrayElement(x) => NumericValue::Real(-x),
      NumericValue::Complex(c) => NumericValue::Complex(-*c),
      NumericValue::Invalid(err) => NumericValue::Invalid(err.clone()),
    }
  }
}

impl std::fmt::Display for NumericValue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      NumericValue::Real(x) | NumericValue::ArrayElement(x) => {
        write!(f, "{}", x)
      }
      NumericValue::Complex(c) => {
        if c.im < 0.0 {
          write!(f, "{}-{}i", c.re, -c.im)
        } else {
          write!(f, "{}+{}i", c.re, c.im)
        }
      }
      NumericValue::Invalid(err) => write!(f, "{}", err),
    }
  }
}
