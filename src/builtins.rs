//! Table of builtin functions: name, arity, value rule and, for the
//! analytic unary ones, the derivative rule used by the chain rule.

use num_complex::Complex64;

use crate::error::ErrorKind;
use crate::value::NumericValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
  Sin,
  Cos,
  Tan,
  Asin,
  Acos,
  Atan,
  Sinh,
  Cosh,
  Tanh,
  Exp,
  Ln,
  Log10,
  Sqrt,
  Abs,
  Sign,
  Floor,
  Ceil,
  Round,
  Hypot,
  Min,
  Max,
}

const ALL: [Builtin; 21] = [
  Builtin::Sin,
  Builtin::Cos,
  Builtin::Tan,
  Builtin::Asin,
  Builtin::Acos,
  Builtin::Atan,
  Builtin::Sinh,
  Builtin::Cosh,
  Builtin::Tanh,
  Builtin::Exp,
  Builtin::Ln,
  Builtin::Log10,
  Builtin::Sqrt,
  Builtin::Abs,
  Builtin::Sign,
  Builtin::Floor,
  Builtin::Ceil,
  Builtin::Round,
  Builtin::Hypot,
  Builtin::Min,
  Builtin::Max,
];

type RealFn = fn(f64) -> f64;
type ComplexFn = fn(Complex64) -> Complex64;

impl Builtin {
  pub fn all() -> &'static [Builtin] {
    &ALL
  }

  pub fn name(self) -> &'static str {
    match self {
      Builtin::Sin => "sin",
      Builtin::Cos => "cos",
      Builtin::Tan => "tan",
      Builtin::Asin => "asin",
      Builtin::Acos => "acos",
      Builtin::Atan => "atan",
      Builtin::Sinh => "sinh",
      Builtin::Cosh => "cosh",
      Builtin::Tanh => "tanh",
      Builtin::Exp => "exp",
      Builtin::Ln => "ln",
      Builtin::Log10 => "log10",
      Builtin::Sqrt => "sqrt",
      Builtin::Abs => "abs",
      Builtin::Sign => "sign",
      Builtin::Floor => "floor",
      Builtin::Ceil => "ceil",
      Builtin::Round => "round",
      Builtin::Hypot => "hypot",
      Builtin::Min => "min",
      Builtin::Max => "max",
    }
  }

  pub fn from_name(name: &str) -> Option<Self> {
    ALL.iter().copied().find(|b| b.name() == name)
  }

  /// `(min, max)` argument count; `max == None` means variadic.
  pub fn arity(self) -> (usize, Option<usize>) {
    match self {
      Builtin::Hypot => (2, Some(2)),
      Builtin::Min | Builtin::Max => (1, None),
      _ => (1, Some(1)),
    }
  }

  /// Real and complex rules of the unary functions.
  fn unary_rules(self) -> Option<(RealFn, ComplexFn)> {
    let rules: (RealFn, ComplexFn) = match self {
      Builtin::Sin => (f64::sin, |z| z.sin()),
      Builtin::Cos => (f64::cos, |z| z.cos()),
      Builtin::Tan => (f64::tan, |z| z.tan()),
      Builtin::Asin => (f64::asin, |z| z.asin()),
      Builtin::Acos => (f64::acos, |z| z.acos()),
      Builtin::Atan => (f64::atan, |z| z.atan()),
      Builtin::Sinh => (f64::sinh, |z| z.sinh()),
      Builtin::Cosh => (f64::cosh, |z| z.cosh()),
      Builtin::Tanh => (f64::tanh, |z| z.tanh()),
      Builtin::Exp => (f64::exp, |z| z.exp()),
      Builtin::Ln => (f64::ln, |z| z.ln()),
      Builtin::Log10 => (f64::log10, |z| z.log10()),
      Builtin::Sqrt => (f64::sqrt, |z| z.sqrt()),
      Builtin::Abs => (f64::abs, |z| Complex64::new(z.norm(), 0.0)),
      Builtin::Sign => (sign, complex_sign),
      Builtin::Floor => (f64::floor, |z| componentwise(z, f64::floor)),
      Builtin::Ceil => (f64::ceil, |z| componentwise(z, f64::ceil)),
      Builtin::Round => (f64::round, |z| componentwise(z, f64::round)),
      Builtin::Hypot | Builtin::Min | Builtin::Max => return None,
    };
    Some(rules)
  }

  /// Derivative of the unary function, evaluated at `u`. `None` for
  /// functions without one.
  pub fn derivative(self, u: Complex64) -> Option<Complex64> {
    let one = Complex64::new(1.0, 0.0);
    let d = match self {
      Builtin::Sin => u.cos(),
      Builtin::Cos => -u.sin(),
      Builtin::Tan => one / (u.cos() * u.cos()),
      Builtin::Asin => one / (one - u * u).sqrt(),
      Builtin::Acos => -one / (one - u * u).sqrt(),
      Builtin::Atan => one / (one + u * u),
      Builtin::Sinh => u.cosh(),
      Builtin::Cosh => u.sinh(),
      Builtin::Tanh => one / (u.cosh() * u.cosh()),
      Builtin::Exp => u.exp(),
      Builtin::Ln => one / u,
      Builtin::Log10 => one / (u * std::f64::consts::LN_10),
      Builtin::Sqrt => one / (u.sqrt() * 2.0),
      Builtin::Abs if u.im == 0.0 && u.re != 0.0 => {
        Complex64::new(u.re.signum(), 0.0)
      }
      _ => return None,
    };
    Some(d)
  }

  pub fn is_differentiable(self) -> bool {
    self.unary_rules().is_some()
      && !matches!(
        self,
        Builtin::Sign | Builtin::Floor | Builtin::Ceil | Builtin::Round
      )
  }

  /// Apply the function to already evaluated, valid arguments.
  pub fn apply(self, args: &[NumericValue]) -> NumericValue {
    let (min, max) = self.arity();
    if args.len() < min || max.is_some_and(|m| args.len() > m) {
      return NumericValue::invalid_with(ErrorKind::ArgumentCount, self.name());
    }
    if let Some((real, complex)) = self.unary_rules() {
      return apply_unary(&args[0], real, complex);
    }
    let mut reals = Vec::with_capacity(args.len());
    for arg in args {
      match arg.as_real() {
        Some(x) => reals.push(x),
        None => {
          return NumericValue::invalid_with(ErrorKind::NotANumber, self.name());
        }
      }
    }
    let result = match self {
      Builtin::Hypot => reals[0].hypot(reals[1]),
      Builtin::Min => reals.iter().copied().fold(f64::INFINITY, f64::min),
      Builtin::Max => reals.iter().copied().fold(f64::NEG_INFINITY, f64::max),
      _ => {
        return NumericValue::invalid_with(
          ErrorKind::ArgumentCount,
          self.name(),
        );
      }
    };
    NumericValue::Real(result)
  }
}

fn sign(x: f64) -> f64 {
  if x == 0.0 { 0.0 } else { x.signum() }
}

fn complex_sign(z: Complex64) -> Complex64 {
  if z.norm() == 0.0 { z } else { z / z.norm() }
}

fn componentwise(z: Complex64, f: fn(f64) -> f64) -> Complex64 {
  Complex64::new(f(z.re), f(z.im))
}

/// Real inputs use the real rule unless it leaves the real domain (NaN from
/// a non-NaN input), in which case the complex rule takes over.
fn apply_unary(
  arg: &NumericValue,
  real: RealFn,
  complex: ComplexFn,
) -> NumericValue {
  if let Some(x) = arg.as_real() {
    let y = real(x);
    if !y.is_nan() || x.is_nan() {
      return NumericValue::Real(y);
    }
  }
  match arg.as_complex() {
    Some(z) => NumericValue::from_complex(complex(z)),
    None => arg.clone(),
  }
}
