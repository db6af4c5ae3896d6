//! The optimistic update coordinator: an explicit state machine around a
//! mutation's cache side effects.

use tracing::{debug, warn};

use crate::cache::store::{CacheStore, UndoHandle};
use crate::entity::Entity;

/// Lifecycle of one update/delete operation's cache effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
  /// Effect applied eagerly (optimistic) or not yet applied (pessimistic).
  Pending,
  /// The network call succeeded; the effect stands.
  Committed,
  /// The network call failed; the optimistic effect was reversed.
  RolledBack,
}

/// One mutation instance. Holds the undo handles produced by its eager
/// patch/evict so that a transport failure can reverse them.
#[derive(Debug)]
pub struct Mutation<T> {
  phase: MutationPhase,
  handles: Vec<UndoHandle<T>>,
}

impl<T: Entity> Mutation<T> {
  /// An optimistic mutation whose effect was already applied. At most one
  /// optimistic application exists per instance.
  pub fn optimistic(handles: Vec<UndoHandle<T>>) -> Self {
    Self {
      phase: MutationPhase::Pending,
      handles,
    }
  }

  /// A pessimistic mutation: nothing applied yet, nothing to undo.
  pub fn pessimistic() -> Self {
    Self {
      phase: MutationPhase::Pending,
      handles: Vec::new(),
    }
  }

  pub fn phase(&self) -> MutationPhase {
    self.phase
  }

  /// The network call resolved; the applied effect reflects reality.
  pub fn commit(&mut self) {
    if self.phase == MutationPhase::Pending {
      self.phase = MutationPhase::Committed;
      debug!(handles = self.handles.len(), "mutation committed");
    }
  }

  /// Reverse every applied handle in production order. Idempotent: a
  /// second call (or a call after commit) does nothing, and handles whose
  /// views have since been evicted are silent per-handle no-ops.
  pub fn roll_back<S: CacheStore<T>>(&mut self, store: &S) {
    if self.phase != MutationPhase::Pending {
      return;
    }

    warn!(handles = self.handles.len(), "rolling back optimistic mutation");
    for handle in self.handles.drain(..) {
      store.apply_undo(handle);
    }
    self.phase = MutationPhase::RolledBack;
  }
}
