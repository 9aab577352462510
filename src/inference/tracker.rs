//! Change tracking for the entailment engine
//!
//! Records the statements asserted during the current logical transaction so
//! inference only rescans deltas. Any retraction sets a sticky flag and
//! drops the buffered delta: retractions can invalidate derivations in ways
//! no incremental delta can safely repair, so a full rescan follows.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::model::{Statement, StatementSet};
use crate::store::ConnectionListener;

#[derive(Default)]
struct TrackerState {
    statements_removed: bool,
    new_statements: StatementSet,
}

/// Listener recording the delta between inference passes.
///
/// Owned by one inferencing connection; interior synchronization only exists
/// because notification happens from whichever thread performs the mutation.
#[derive(Default)]
pub struct ChangeTracker {
    state: Mutex<TrackerState>,
}

impl ChangeTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// The tracker state, recovering a poisoned guard.
    ///
    /// A listener that panicked mid-notification poisons this mutex; the
    /// buffered delta is still valid and dropping it would make later
    /// flushes silently skip inference over those statements.
    fn state(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True if any statement was asserted since the last pass
    pub fn has_new_statements(&self) -> bool {
        !self.state().new_statements.is_empty()
    }

    /// True if any retraction occurred during the current transaction
    pub fn statements_removed(&self) -> bool {
        self.state().statements_removed
    }

    /// Take the accumulated delta, leaving an empty buffer
    pub fn take_new_statements(&self) -> StatementSet {
        std::mem::take(&mut self.state().new_statements)
    }

    /// Replace the delta wholesale (the full-rescan reload)
    pub fn replace_new_statements(&self, statements: StatementSet) {
        self.state().new_statements = statements;
    }

    /// Clear the removed flag once the full rescan has been loaded
    pub fn clear_removed_flag(&self) {
        self.state().statements_removed = false;
    }

    /// Forget everything; used on rollback
    pub fn reset(&self) {
        let mut state = self.state();
        state.statements_removed = false;
        state.new_statements.clear();
    }
}

impl ConnectionListener for ChangeTracker {
    fn statement_added(&self, statement: &Statement) {
        let mut state = self.state();
        if state.statements_removed {
            // Starting from scratch anyway, no need to record
            return;
        }
        state.new_statements.insert(statement.clone());
    }

    fn statement_removed(&self, _statement: &Statement) {
        let mut state = self.state();
        state.statements_removed = true;
        state.new_statements.clear();
    }
}
