use super::*;

use formterm::{MAX_NESTING_DEPTH, TermKind};

mod delete {
  use super::*;

  #[test]
  fn sole_literal_argument_replaces_the_term() {
    let mut tree = FormulaTree::new();
    let root = parse(&mut tree, "1+f(5)");
    let f = child(&tree, root, 1);
    let slot = tree.field_at(root, 1).unwrap();
    let mut recorder = Recorder::default();

    let outcome = tree.on_delete(f, None, &mut recorder);
    assert_eq!(
      outcome,
      DeleteOutcome::ReplacedByText {
        field: slot,
        text: "5".to_string()
      }
    );
    assert_eq!(tree.to_text(root), "1+5");
    assert!(!tree.contains(f));
    assert_eq!(recorder.deleted, vec![vec![f]]);
    assert_eq!(recorder.checkpoints, 1);
    assert!(tree.is_consistent());
  }

  #[test]
  fn sole_term_argument_replaces_the_term() {
    let mut tree = FormulaTree::new();
    let root = parse(&mut tree, "1+f(g(2))");
    let f = child(&tree, root, 1);
    let g = child(&tree, f, 0);
    let slot = tree.field_at(root, 1).unwrap();

    let outcome = tree.on_delete(f, None, &mut NoopListener);
    assert_eq!(outcome, DeleteOutcome::ReplacedByTerm { field: slot, term: g });
    assert_eq!(tree.to_text(root), "1+g(2)");
    assert_eq!(tree.node(g).unwrap().parent(), Some(slot));
    assert_eq!(tree.len(), 2);
    assert!(tree.is_consistent());
  }

  #[test]
  fn term_is_preferred_over_text() {
    let mut tree = FormulaTree::new();
    let root = parse(&mut tree, "2*hypot(g(1); b)");
    let hypot = child(&tree, root, 1);
    tree.on_delete(hypot, None, &mut NoopListener);
    assert_eq!(tree.to_text(root), "2*g(1)");
  }

  #[test]
  fn last_matching_text_wins() {
    let mut tree = FormulaTree::new();
    let root = parse(&mut tree, "2*hypot(a; b)");
    let hypot = child(&tree, root, 1);
    tree.on_delete(hypot, None, &mut NoopListener);
    assert_eq!(tree.to_text(root), "2*b");
  }

  #[test]
  fn fixed_arity_keeps_the_other_argument() {
    let mut tree = FormulaTree::new();
    let root = parse(&mut tree, "1+hypot(3; 4)");
    let hypot = child(&tree, root, 1);
    let first = tree.field_at(hypot, 0).unwrap();
    tree.on_delete(hypot, Some(first.slot), &mut NoopListener);
    assert_eq!(tree.to_text(root), "1+4");
  }

  #[test]
  fn emptied_term_leaves_its_name() {
    let mut tree = FormulaTree::new();
    let root = parse(&mut tree, "1+sin()");
    let sin = child(&tree, root, 1);
    tree.on_delete(sin, None, &mut NoopListener);
    assert_eq!(tree.to_text(root), "1+sin");

    let root = parse(&mut tree, "1+f(5)");
    let f = child(&tree, root, 1);
    let only = tree.field_at(f, 0).unwrap();
    tree.on_delete(f, Some(only.slot), &mut NoopListener);
    assert_eq!(tree.to_text(root), "1+f");
  }

  #[test]
  fn root_is_left_to_the_document() {
    let mut tree = FormulaTree::new();
    let root = parse(&mut tree, "f(5)");
    let mut recorder = Recorder::default();
    assert_eq!(
      tree.on_delete(root, None, &mut recorder),
      DeleteOutcome::RootDelete
    );
    assert_eq!(recorder.root_deletes, vec![root]);
    assert_eq!(recorder.checkpoints, 0);
    assert_eq!(tree.to_text(root), "f(5)");
  }

  #[test]
  fn variadic_term_loses_one_argument() {
    let mut tree = FormulaTree::new();
    let id = parse(&mut tree, "max(1; g(2); 3)");
    let first = tree.field_at(id, 0).unwrap();
    let second = tree.field_at(id, 1).unwrap();
    let mut recorder = Recorder::default();

    let outcome = tree.on_delete(id, Some(second.slot), &mut recorder);
    assert_eq!(
      outcome,
      DeleteOutcome::ArgumentRemoved {
        focus: Some(first)
      }
    );
    assert_eq!(tree.to_text(id), "max(1; 3)");
    assert_eq!(tree.len(), 1);
    assert_eq!(recorder.checkpoints, 1);
    assert_eq!(recorder.manual_inputs, 1);
    assert_eq!(recorder.focus, Some(first));
    assert!(tree.is_consistent());
  }

  #[test]
  fn removing_the_first_argument_moves_focus_nowhere() {
    let mut tree = FormulaTree::new();
    let id = parse(&mut tree, "min(1; 2)");
    let first = tree.field_at(id, 0).unwrap();
    let mut recorder = Recorder::default();
    let outcome = tree.on_delete(id, Some(first.slot), &mut recorder);
    assert_eq!(outcome, DeleteOutcome::ArgumentRemoved { focus: None });
    assert_eq!(tree.to_text(id), "min(2)");
    assert_eq!(recorder.focus, None);
  }

  #[test]
  fn delete_argument_without_undo_state() {
    let mut tree = FormulaTree::new();
    let id = parse(&mut tree, "max(a; (b; c); d)");
    let last = tree.field_at(id, 2).unwrap();
    let mut recorder = Recorder::default();
    let focus = tree.delete_argument(id, last.slot, false, &mut recorder);
    assert_eq!(focus, tree.field_at(id, 1));
    assert_eq!(tree.to_text(id), "max(a; (b; c))");
    assert_eq!(recorder.checkpoints, 0);
  }

  #[test]
  fn bracketed_survivor_keeps_its_brackets() {
    let mut tree = FormulaTree::new();
    let id = parse(&mut tree, "max((1; 2); 3)");
    let second = tree.field_at(id, 1).unwrap();
    tree.delete_argument(id, second.slot, false, &mut NoopListener);
    assert_eq!(tree.to_text(id), "max((1; 2))");
    assert_eq!(tree.term_texts(id), vec!["(1; 2)"]);

    let id = parse(&mut tree, "max((x); 3)");
    let second = tree.field_at(id, 1).unwrap();
    tree.delete_argument(id, second.slot, false, &mut NoopListener);
    assert_eq!(tree.to_text(id), "max((x))");
    let group = child(&tree, id, 0);
    assert_eq!(tree.node(group).unwrap().kind(), &TermKind::Brackets);
    assert!(tree.is_consistent());
  }
}

mod arguments {
  use super::*;

  #[test]
  fn add_argument_appends_or_inserts() {
    let mut tree = FormulaTree::new();
    let id = parse(&mut tree, "max(1; 2)");
    tree.add_argument(id, None).unwrap();
    assert_eq!(tree.term_texts(id), vec!["1", "2", ""]);

    let first = tree.field_at(id, 0).unwrap();
    let added = tree.add_argument(id, Some(first.slot)).unwrap();
    assert_eq!(tree.field_at(id, 1), Some(added));
    assert_eq!(tree.term_texts(id), vec!["1", "", "2", ""]);
  }

  #[test]
  fn fixed_arity_refuses_more() {
    let mut tree = FormulaTree::new();
    let id = parse(&mut tree, "sin(x)");
    assert_eq!(tree.add_argument(id, None), None);
    let sum = parse(&mut tree, "a+b");
    assert_eq!(tree.add_argument(sum, None), None);
  }

  #[test]
  fn slot_ids_are_not_reused() {
    let mut tree = FormulaTree::new();
    let id = parse(&mut tree, "max(1; 2)");
    let second = tree.field_at(id, 1).unwrap();
    tree.delete_argument(id, second.slot, false, &mut NoopListener);
    let added = tree.add_argument(id, None).unwrap();
    assert_ne!(added.slot, second.slot);
  }
}

mod links {
  use super::*;

  #[test]
  fn cycles_are_refused() {
    let mut tree = FormulaTree::new();
    let root = parse(&mut tree, "f(g(1))");
    let g = child(&tree, root, 0);
    let inside_g = tree.field_at(g, 0).unwrap();
    assert!(!tree.attach_child(inside_g, root));
    assert!(tree.is_consistent());
    assert_eq!(tree.to_text(root), "f(g(1))");
  }

  #[test]
  fn moving_a_child_updates_both_ends() {
    let mut tree = FormulaTree::new();
    let sum = parse(&mut tree, "a+g(1)");
    let other = parse(&mut tree, "max(x)");
    let g = child(&tree, sum, 1);
    let target = tree.field_at(other, 0).unwrap();

    assert!(tree.attach_child(target, g));
    assert_eq!(tree.to_text(sum), "a+");
    assert_eq!(tree.to_text(other), "max(g(1))");
    assert_eq!(tree.node(g).unwrap().parent(), Some(target));
    assert!(tree.is_consistent());
  }

  #[test]
  fn set_text_destroys_the_child() {
    let mut tree = FormulaTree::new();
    let root = parse(&mut tree, "f(g(h(1)))");
    let field = tree.field_at(root, 0).unwrap();
    tree.set_text(field, "2");
    assert_eq!(tree.len(), 1);
    assert!(matches!(
      tree.field(field).unwrap().content(),
      FieldContent::Text(t) if t == "2"
    ));
    assert!(tree.is_consistent());
  }

  #[test]
  fn detached_child_becomes_a_root() {
    let mut tree = FormulaTree::new();
    let root = parse(&mut tree, "f(g(1))");
    let field = tree.field_at(root, 0).unwrap();
    let g = tree.detach_child(field).unwrap();
    assert_eq!(tree.roots(), vec![root, g]);
    assert!(tree.field(field).unwrap().is_empty());
    assert!(tree.is_consistent());
  }

  #[test]
  fn attaching_past_the_nesting_limit_is_refused() {
    let mut tree = FormulaTree::new();
    let deep = parse(&mut tree, &vec!["1"; MAX_NESTING_DEPTH + 2].join("+"));
    assert_eq!(tree.height(deep), MAX_NESTING_DEPTH);

    let holder = parse(&mut tree, "max(1)");
    let field = tree.field_at(holder, 0).unwrap();
    assert!(!tree.attach_child(field, deep));
    assert_eq!(tree.to_text(holder), "max(1)");
    assert_eq!(tree.node(deep).unwrap().parent(), None);
    assert!(tree.is_consistent());
  }

  #[test]
  fn removed_ids_stay_dead() {
    let mut tree = FormulaTree::new();
    let root = parse(&mut tree, "1+f(5)");
    let f = child(&tree, root, 1);
    tree.on_delete(f, None, &mut NoopListener);

    let other = parse(&mut tree, "sin(2)");
    assert_eq!(other.index(), f.index());
    assert_ne!(other, f);
    assert!(!tree.contains(f));
    assert!(tree.node(f).is_none());
    assert_eq!(tree.to_text(f), "");
    assert_eq!(tree.to_text(other), "sin(2)");
  }

  #[test]
  fn edits_reset_validation() {
    let mut tree = FormulaTree::new();
    let root = parse(&mut tree, "1+sin(x)");
    let sin = child(&tree, root, 1);
    let symbols = SymbolTable::new();
    let mut listener = NoopListener;
    let mut host = Host::new(&symbols, &mut listener);
    tree.validate(root, ValidationPass::Full, &mut host).unwrap();
    assert_eq!(tree.node(root).unwrap().status(), ValidationStatus::Valid);

    let arg = tree.field_at(sin, 0).unwrap();
    tree.set_text(arg, "y");
    assert_eq!(tree.node(sin).unwrap().status(), ValidationStatus::Unvalidated);
    assert_eq!(
      tree.node(root).unwrap().status(),
      ValidationStatus::Unvalidated
    );
  }
}
