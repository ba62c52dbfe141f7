use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use formterm::brackets::call_form;
use formterm::{
  FieldContent, FormulaTree, Host, NodeId, NoopListener, NumericValue,
  RecursionGuard, SymbolTable, TermKind, TreeConfig, ValidationPass,
  split_top_level,
};
use log::{LevelFilter, debug};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Log structural edits and evaluation steps to stderr
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Args)]
struct Bindings {
  /// Bind a variable, e.g. `--var x=2`
  #[arg(long = "var", value_name = "NAME=VALUE")]
  vars: Vec<String>,

  /// Define a function, e.g. `--def "f(x)=x^2+1"`
  #[arg(long = "def", value_name = "NAME(PARAMS)=BODY")]
  defs: Vec<String>,

  /// Argument separator inside function calls
  #[arg(long, default_value_t = ';')]
  separator: char,
}

#[derive(Subcommand)]
enum Commands {
  /// Evaluate a formula
  Eval {
    /// The formula to evaluate
    text: String,
    #[command(flatten)]
    bindings: Bindings,
  },
  /// Evaluate the derivative of a formula
  Diff {
    text: String,
    /// Variable to differentiate by
    #[arg(long)]
    by: String,
    #[command(flatten)]
    bindings: Bindings,
  },
  /// Split an argument list at top-level separators
  Split {
    text: String,
    #[arg(long, default_value_t = ';')]
    separator: char,
  },
  /// Print the term tree of a formula with its validation state
  Tree {
    text: String,
    #[command(flatten)]
    bindings: Bindings,
  },
}

fn init_logger(verbose: bool) {
  let level = if verbose {
    LevelFilter::Debug
  } else {
    LevelFilter::Warn
  };
  let _ = TermLogger::init(
    level,
    Config::default(),
    TerminalMode::Stderr,
    ColorChoice::Auto,
  );
}

/// Parse `text` into a root node. A plain literal gets a bracket group to
/// live in, so there is always a node to evaluate.
fn parse_root(tree: &mut FormulaTree, text: &str) -> Result<NodeId> {
  if let Some(id) = tree
    .parse_detached(text)
    .with_context(|| format!("cannot parse '{}'", text))?
  {
    return Ok(id);
  }
  let id = tree.new_node(TermKind::Brackets);
  let field = tree
    .push_field(id)
    .ok_or_else(|| anyhow!("cannot add a slot to {}", id))?;
  tree.set_text(field, text);
  Ok(id)
}

fn load_bindings(
  tree: &mut FormulaTree,
  bindings: &Bindings,
) -> Result<SymbolTable> {
  let mut symbols = SymbolTable::new();
  for var in &bindings.vars {
    let (name, value) = var
      .split_once('=')
      .with_context(|| format!("expected NAME=VALUE, got '{}'", var))?;
    let value: f64 = value
      .trim()
      .parse()
      .with_context(|| format!("'{}' is not a number", value.trim()))?;
    symbols.define_constant(name.trim(), NumericValue::Real(value));
  }
  for def in &bindings.defs {
    let (head, body) = def
      .split_once('=')
      .with_context(|| format!("expected NAME(PARAMS)=BODY, got '{}'", def))?;
    let Some((name, _, params)) = call_form(head) else {
      bail!("'{}' is not a function head", head.trim());
    };
    let params = split_top_level(params, bindings.separator)?;
    let params: Vec<&str> = params.iter().map(String::as_str).collect();
    let root = parse_root(tree, body)?;
    debug!("defined {} as {}", name, tree.to_text(root));
    symbols.define_function(name, root, &params);
  }
  Ok(symbols)
}

fn tree_for(bindings: &Bindings) -> FormulaTree {
  FormulaTree::with_config(TreeConfig {
    separator: bindings.separator,
    ..TreeConfig::default()
  })
}

fn print_tree(tree: &FormulaTree, id: NodeId, depth: usize) {
  let Some(node) = tree.node(id) else { return };
  let indent = "  ".repeat(depth);
  let label = match node.kind() {
    TermKind::Brackets => "( )".to_string(),
    _ => node.label(),
  };
  match node.error() {
    Some(err) => println!("{}{} [{:?}] {}", indent, label, node.status(), err),
    None => println!("{}{} [{:?}]", indent, label, node.status()),
  }
  for field in node.terms() {
    match field.content() {
      FieldContent::Term(child) => print_tree(tree, *child, depth + 1),
      FieldContent::Text(text) => match field.last_error() {
        Some(err) => println!("{}  {:?} ({})", indent, text, err),
        None => println!("{}  {:?}", indent, text),
      },
    }
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_logger(cli.verbose);

  match cli.command {
    Commands::Eval { text, bindings } => {
      let mut tree = tree_for(&bindings);
      let symbols = load_bindings(&mut tree, &bindings)?;
      let root = parse_root(&mut tree, &text)?;
      let mut listener = NoopListener;
      let mut host = Host::new(&symbols, &mut listener);
      println!("{}", tree.calculate(root, &mut host));
    }
    Commands::Diff {
      text,
      by,
      bindings,
    } => {
      let mut tree = tree_for(&bindings);
      let symbols = load_bindings(&mut tree, &bindings)?;
      let root = parse_root(&mut tree, &text)?;
      let mut guard = RecursionGuard::new();
      println!("{}", tree.differentiate(root, &by, &symbols, &mut guard));
    }
    Commands::Split { text, separator } => {
      for part in split_top_level(&text, separator)? {
        println!("{}", part);
      }
    }
    Commands::Tree { text, bindings } => {
      let mut tree = tree_for(&bindings);
      let symbols = load_bindings(&mut tree, &bindings)?;
      let root = parse_root(&mut tree, &text)?;
      let mut listener = NoopListener;
      let mut host = Host::new(&symbols, &mut listener);
      let _ = tree.validate(root, ValidationPass::Full, &mut host);
      println!("{}", tree.to_text(root));
      print_tree(&tree, root, 0);
    }
  }
  Ok(())
}
