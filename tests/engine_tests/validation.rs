use super::*;

fn validate(
  tree: &mut FormulaTree,
  id: NodeId,
  symbols: &SymbolTable,
  recorder: &mut Recorder,
) -> Result<(), TermError> {
  let mut host = Host::new(symbols, recorder);
  tree.validate(id, ValidationPass::Full, &mut host)
}

#[test]
fn unknown_function_is_reported_on_its_node() {
  let mut tree = FormulaTree::new();
  let root = parse(&mut tree, "sin(x)+foo(1)");
  let foo = child(&tree, root, 1);
  let mut recorder = Recorder::default();

  let err = validate(&mut tree, root, &SymbolTable::new(), &mut recorder)
    .unwrap_err();
  assert_eq!(err, TermError::with_detail(ErrorKind::UnknownFunction, "foo"));
  assert_eq!(err.message(), "Unknown function: foo");
  let expected = (foo, "Unknown function: foo".to_string());
  assert!(recorder.errors.contains(&expected));
  assert_eq!(tree.node(root).unwrap().status(), ValidationStatus::Error);
  assert_eq!(
    tree.node(child(&tree, root, 0)).unwrap().status(),
    ValidationStatus::Valid
  );
}

#[test]
fn fixing_the_name_clears_the_marker() {
  let mut tree = FormulaTree::new();
  let body = parse(&mut tree, "x+1");
  let call = parse(&mut tree, "g(2)");
  let mut symbols = SymbolTable::new();
  let mut recorder = Recorder::default();

  assert!(validate(&mut tree, call, &symbols, &mut recorder).is_err());
  assert!(tree.node(call).unwrap().error().is_some());

  symbols.define_function("g", body, &["x"]);
  validate(&mut tree, call, &symbols, &mut recorder).unwrap();
  assert_eq!(tree.node(call).unwrap().error(), None);
  assert_eq!(recorder.cleared.last(), Some(&call));
}

#[test]
fn name_resolution_kinds() {
  let mut tree = FormulaTree::new();
  let body = parse(&mut tree, "x*y");
  let mut symbols = SymbolTable::new();
  symbols.define_function("g", body, &["x", "y"]);
  symbols.define_array("m", &[2], &[1.0, 2.0]);
  let mut recorder = Recorder::default();

  let cases = [
    ("g(1; 2)", None),
    ("g(1)", Some("Wrong number of arguments: g")),
    ("g[1]", Some("g is not an array")),
    ("m[1]", None),
    ("m[1; 1]", Some("Wrong number of arguments: m")),
    ("m(1)", Some("m is not a function")),
    ("q[1]", Some("Unknown array: q")),
    ("sin(1; 2)", Some("Wrong number of arguments: sin")),
  ];
  for (text, expected) in cases {
    let id = parse(&mut tree, text);
    let result = validate(&mut tree, id, &symbols, &mut recorder);
    let message = result.err().map(|e| e.message());
    assert_eq!(message.as_deref(), expected, "{}", text);
  }
}

#[test]
fn leaf_errors_are_kept_per_field() {
  let mut tree = FormulaTree::new();
  let root = parse(&mut tree, "max(1; 2 3; )");
  let symbols = SymbolTable::new();
  let err = validate(&mut tree, root, &symbols, &mut Recorder::default())
    .unwrap_err();
  assert_eq!(err, TermError::with_detail(ErrorKind::Syntax, "2 3"));

  let errors: Vec<Option<ErrorKind>> = tree
    .node(root)
    .unwrap()
    .terms()
    .iter()
    .map(|t| t.last_error().map(|e| e.kind))
    .collect();
  assert_eq!(
    errors,
    vec![None, Some(ErrorKind::Syntax), Some(ErrorKind::EmptyArgument)]
  );
}

#[test]
fn missing_operand() {
  let mut tree = FormulaTree::new();
  let root = parse(&mut tree, "1+");
  let symbols = SymbolTable::new();
  let err = validate(&mut tree, root, &symbols, &mut Recorder::default())
    .unwrap_err();
  assert_eq!(err.kind, ErrorKind::EmptyArgument);
  assert_eq!(err.message(), "Argument is empty");
}

#[test]
fn quoted_text_is_well_formed() {
  let mut tree = FormulaTree::new();
  let root = parse(&mut tree, "f(\"a \\\" (b\")");
  let mut symbols = SymbolTable::new();
  let body = parse(&mut tree, "s+1");
  symbols.define_function("f", body, &["s"]);
  validate(&mut tree, root, &symbols, &mut Recorder::default()).unwrap();
}

#[test]
fn single_formula_pass_reuses_child_results() {
  let mut tree = FormulaTree::new();
  let root = parse(&mut tree, "sin(x)+1");
  let symbols = SymbolTable::new();
  let mut recorder = Recorder::default();
  validate(&mut tree, root, &symbols, &mut recorder).unwrap();
  assert_eq!(recorder.cleared.len(), 2);

  let mut host = Host::new(&symbols, &mut recorder);
  tree
    .validate(root, ValidationPass::SingleFormula, &mut host)
    .unwrap();
  assert_eq!(recorder.cleared.len(), 3);
  assert_eq!(recorder.cleared.last(), Some(&root));
}

#[test]
fn single_formula_pass_revisits_edited_children() {
  let mut tree = FormulaTree::new();
  let root = parse(&mut tree, "sin(x)+1");
  let sin = child(&tree, root, 0);
  let symbols = SymbolTable::new();
  let mut recorder = Recorder::default();
  validate(&mut tree, root, &symbols, &mut recorder).unwrap();

  let arg = tree.field_at(sin, 0).unwrap();
  tree.set_text(arg, "");
  let mut host = Host::new(&symbols, &mut recorder);
  let err = tree
    .validate(root, ValidationPass::SingleFormula, &mut host)
    .unwrap_err();
  assert_eq!(err.kind, ErrorKind::EmptyArgument);
  assert_eq!(tree.node(sin).unwrap().status(), ValidationStatus::Error);
}

#[test]
fn first_error_matches_evaluation() {
  let mut tree = FormulaTree::new();
  let root = parse(&mut tree, "foo(bar(1))");
  let bar = child(&tree, root, 0);
  let symbols = SymbolTable::new();
  let mut recorder = Recorder::default();

  let err = validate(&mut tree, root, &symbols, &mut recorder).unwrap_err();
  assert_eq!(err, TermError::with_detail(ErrorKind::UnknownFunction, "bar"));
  assert_eq!(eval(&tree, root, &symbols).error(), Some(&err));
  let expected = (bar, "Unknown function: bar".to_string());
  assert!(recorder.errors.contains(&expected));
  let expected = (root, "Unknown function: bar".to_string());
  assert!(recorder.errors.contains(&expected));
}
