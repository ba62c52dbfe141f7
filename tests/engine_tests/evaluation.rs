use super::*;

use formterm::NoSymbols;
use num_complex::Complex64;

fn value_of(text: &str, symbols: &dyn SymbolResolver) -> NumericValue {
  let mut tree = FormulaTree::new();
  let id = parse(&mut tree, text);
  eval(&tree, id, symbols)
}

fn real(text: &str) -> f64 {
  value_of(text, &NoSymbols).as_real().unwrap()
}

mod arithmetic {
  use super::*;

  #[test]
  fn precedence_and_associativity() {
    assert_eq!(real("2*(1+3)"), 8.0);
    assert_eq!(real("10-4-3"), 3.0);
    assert_eq!(real("8/2/2"), 2.0);
    assert_eq!(real("2^3^2"), 512.0);
    assert_eq!(real("-2^2"), -4.0);
    assert_eq!(real("2*-3"), -6.0);
    assert_eq!(real("2*+5"), 10.0);
  }

  #[test]
  fn scientific_notation() {
    assert_relative_eq!(real("1.5e-3*2"), 0.003);
    assert_relative_eq!(real("2e+2-1"), 199.0);
  }

  #[test]
  fn builtins() {
    assert_relative_eq!(real("sin(0)+cos(0)"), 1.0);
    assert_relative_eq!(real("hypot(3; 4)"), 5.0);
    assert_relative_eq!(real("max(1; 7; 3)-min(4; 2)"), 5.0);
    assert_relative_eq!(real("ln(exp(2))"), 2.0, max_relative = 1e-12);
    assert_relative_eq!(real("abs(-3)*sign(-2)"), -3.0);
  }

  #[test]
  fn complex_values() {
    let root = value_of("sqrt(-4)", &NoSymbols);
    assert_eq!(root.as_complex(), Some(Complex64::new(0.0, 2.0)));
    assert_eq!(root.as_real(), None);
    assert_eq!(value_of("2i*2i", &NoSymbols), NumericValue::Real(-4.0));
    assert_eq!(
      value_of("1+2i", &NoSymbols),
      NumericValue::Complex(Complex64::new(1.0, 2.0))
    );
  }

  #[test]
  fn text_is_not_a_number() {
    let value = value_of("1+\"a\"", &NoSymbols);
    assert_eq!(value.error_kind(), Some(ErrorKind::NotANumber));
  }
}

mod names {
  use super::*;

  #[test]
  fn constants() {
    let mut symbols = SymbolTable::new();
    symbols.define_constant("x", NumericValue::Real(3.0));
    assert_eq!(value_of("x^2+1", &symbols), NumericValue::Real(10.0));
  }

  #[test]
  fn unknown_variable() {
    let value = value_of("y+1", &NoSymbols);
    assert_eq!(value.error().unwrap().message(), "Unknown variable: y");
  }

  #[test]
  fn user_functions_bind_parameters() {
    let mut tree = FormulaTree::new();
    let body = parse(&mut tree, "x^2+y");
    let mut symbols = SymbolTable::new();
    symbols
      .define_function("f", body, &["x", "y"])
      .define_constant("x", NumericValue::Real(100.0));
    let call = parse(&mut tree, "f(3; 1)+f(x/50; 0)");
    assert_eq!(eval(&tree, call, &symbols), NumericValue::Real(14.0));
  }

  #[test]
  fn user_function_arity() {
    let mut tree = FormulaTree::new();
    let body = parse(&mut tree, "x*2");
    let mut symbols = SymbolTable::new();
    symbols.define_function("f", body, &["x"]);
    let call = parse(&mut tree, "f(1; 2)");
    assert_eq!(
      eval(&tree, call, &symbols).error_kind(),
      Some(ErrorKind::ArgumentCount)
    );
  }

  #[test]
  fn arrays_are_zero_based() {
    let mut symbols = SymbolTable::new();
    symbols.define_array("m", &[2, 3], &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(value_of("m[1; 2]", &symbols), NumericValue::ArrayElement(5.0));
    assert_eq!(value_of("m[0; 1]*2", &symbols), NumericValue::Real(2.0));
    for text in ["m[2; 0]", "m[0.5; 0]", "m[-1; 0]"] {
      assert_eq!(
        value_of(text, &symbols).error_kind(),
        Some(ErrorKind::IndexOutOfRange),
        "{}",
        text
      );
    }
  }

  #[test]
  fn wrong_kind_of_name() {
    let mut tree = FormulaTree::new();
    let body = parse(&mut tree, "x+1");
    let mut symbols = SymbolTable::new();
    symbols.define_function("f", body, &["x"]);
    symbols.define_array("m", &[1], &[1.0]);

    let cases = [
      ("f[0]", ErrorKind::NotAnArray),
      ("m(0)", ErrorKind::NotAFunction),
      ("g(0)", ErrorKind::UnknownFunction),
      ("a[0]", ErrorKind::UnknownArray),
      ("m+1", ErrorKind::NotANumber),
    ];
    for (text, kind) in cases {
      let id = parse(&mut tree, text);
      let value = eval(&tree, id, &symbols);
      assert_eq!(value.error_kind(), Some(kind), "{}", text);
    }
  }
}

mod fail_fast {
  use super::*;

  #[test]
  fn first_error_stops_the_remaining_terms() {
    let mut table = SymbolTable::new();
    table.define_constant("a", NumericValue::Real(1.0));
    table.define_constant("b", NumericValue::Real(2.0));
    let counting = Counting {
      table,
      asked: RefCell::new(Vec::new()),
    };

    let value = value_of("max(a; g(1); b)", &counting);
    assert_eq!(value.error_kind(), Some(ErrorKind::UnknownFunction));
    assert_eq!(*counting.asked.borrow(), vec!["a", "g"]);
  }

  #[test]
  fn left_operand_error_wins() {
    let value = value_of("p*q", &NoSymbols);
    assert_eq!(
      value.error(),
      Some(&TermError::with_detail(ErrorKind::UnknownVariable, "p"))
    );
  }
}

mod calculate {
  use super::*;

  #[test]
  fn marker_follows_the_result() {
    let mut tree = FormulaTree::new();
    let root = parse(&mut tree, "y+1");
    let mut symbols = SymbolTable::new();
    let mut recorder = Recorder::default();

    let mut host = Host::new(&symbols, &mut recorder);
    assert!(!tree.calculate(root, &mut host).is_valid());
    assert_eq!(
      recorder.errors,
      vec![(root, "Unknown variable: y".to_string())]
    );
    assert!(tree.node(root).unwrap().error().is_some());

    symbols.define_constant("y", NumericValue::Real(1.0));
    let mut host = Host::new(&symbols, &mut recorder);
    assert_eq!(tree.calculate(root, &mut host), NumericValue::Real(2.0));
    assert_eq!(recorder.cleared, vec![root]);
    assert_eq!(tree.node(root).unwrap().error(), None);
  }
}
