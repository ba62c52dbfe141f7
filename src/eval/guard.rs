use log::debug;

use crate::tree::NodeId;

/// Longest call chain an evaluation may build before it is treated as
/// runaway recursion.
pub const MAX_CALL_DEPTH: usize = 250;

/// Identity registered while a call is in progress.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallKey {
  /// A function node of the tree.
  Node(NodeId),
  /// The body of a named user function.
  Definition(String),
}

/// The chain of calls currently being evaluated.
///
/// Keys are pushed on entry and popped on exit of that same call, so a
/// function may run any number of times in sibling branches. Only a key
/// that is already on the chain counts as a recursive call.
#[derive(Debug, Clone)]
pub struct RecursionGuard {
  chain: Vec<CallKey>,
  limit: usize,
  max_depth: usize,
}

impl Default for RecursionGuard {
  fn default() -> Self {
    Self::with_limit(MAX_CALL_DEPTH)
  }
}

impl RecursionGuard {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_limit(limit: usize) -> Self {
    RecursionGuard {
      chain: Vec::new(),
      limit,
      max_depth: 0,
    }
  }

  /// Register `key`. Returns `false`, without registering, if the key is
  /// already active or the chain is at its limit.
  pub fn enter(&mut self, key: CallKey) -> bool {
    if self.chain.contains(&key) {
      debug!("recursive call of {:?} at depth {}", key, self.chain.len());
      return false;
    }
    if self.chain.len() >= self.limit {
      debug!("call chain limit {} reached at {:?}", self.limit, key);
      return false;
    }
    self.chain.push(key);
    self.max_depth = self.max_depth.max(self.chain.len());
    true
  }

  /// Unregister `key`, which must be the innermost active call.
  pub fn leave(&mut self, key: &CallKey) {
    if self.chain.last() == Some(key) {
      self.chain.pop();
    } else if let Some(pos) = self.chain.iter().rposition(|k| k == key) {
      self.chain.truncate(pos);
    }
  }

  pub fn is_active(&self, key: &CallKey) -> bool {
    self.chain.contains(key)
  }

  /// Number of calls in progress.
  pub fn depth(&self) -> usize {
    self.chain.len()
  }

  /// Deepest chain seen since the guard was created.
  pub fn max_depth(&self) -> usize {
    self.max_depth
  }
}
