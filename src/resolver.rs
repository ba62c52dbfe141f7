//! Name lookup for functions, arrays and constants defined outside a term.

use std::collections::HashMap;

use crate::tree::NodeId;
use crate::value::NumericValue;

/// What a name refers to in the surrounding document.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
  /// A user-defined function: the root of its body and its parameter names.
  Function { root: NodeId, params: Vec<String> },
  /// A row-major array with the given dimensions.
  Array { dims: Vec<usize>, values: Vec<f64> },
  Constant(NumericValue),
  Unknown,
}

impl Symbol {
  /// Number of arguments the symbol is called or indexed with.
  pub fn arity(&self) -> Option<usize> {
    match self {
      Symbol::Function { params, .. } => Some(params.len()),
      Symbol::Array { dims, .. } => Some(dims.len()),
      Symbol::Constant(_) | Symbol::Unknown => None,
    }
  }
}

pub trait SymbolResolver {
  fn resolve(&self, name: &str) -> Symbol;
}

/// Resolver that knows no names.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSymbols;

impl SymbolResolver for NoSymbols {
  fn resolve(&self, _name: &str) -> Symbol {
    Symbol::Unknown
  }
}

/// In-memory resolver backed by a map from name to symbol.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
  symbols: HashMap<String, Symbol>,
}

impl SymbolTable {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn define_function(
    &mut self,
    name: &str,
    root: NodeId,
    params: &[&str],
  ) -> &mut Self {
    let params = params.iter().map(|p| p.to_string()).collect();
    self
      .symbols
      .insert(name.to_string(), Symbol::Function { root, params });
    self
  }

  /// Define an array. Returns `false` and defines nothing when the values
  /// do not fill the dimensions exactly.
  pub fn define_array(
    &mut self,
    name: &str,
    dims: &[usize],
    values: &[f64],
  ) -> bool {
    if dims.is_empty() || dims.iter().product::<usize>() != values.len() {
      return false;
    }
    self.symbols.insert(
      name.to_string(),
      Symbol::Array {
        dims: dims.to_vec(),
        values: values.to_vec(),
      },
    );
    true
  }

  pub fn define_constant(
    &mut self,
    name: &str,
    value: NumericValue,
  ) -> &mut Self {
    self.symbols.insert(name.to_string(), Symbol::Constant(value));
    self
  }

  pub fn remove(&mut self, name: &str) -> Option<Symbol> {
    self.symbols.remove(name)
  }
}

impl SymbolResolver for SymbolTable {
  fn resolve(&self, name: &str) -> Symbol {
    self.symbols.get(name).cloned().unwrap_or(Symbol::Unknown)
  }
}
