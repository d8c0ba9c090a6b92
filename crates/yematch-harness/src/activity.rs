//! Activity abstraction
//!
//! Every unit the runner can execute is an [`Activity`]:
//! - `R..` Legacy steps, `S..` New steps, `P..` Parallel pairs
//! - arrange commands and parity asserts under descriptive names
//!
//! Activities never fail with `Err`; every failure is folded into the
//! returned [`Outcome`].

use crate::outcome::{Outcome, Status};
use dashmap::DashMap;
use std::sync::Arc;

/// Prefix marking a disabled step identifier
pub const DISABLED_PREFIX: char = '!';

/// One executable step
#[async_trait::async_trait]
pub trait Activity: Send + Sync {
    /// Catalog name
    fn name(&self) -> &str;

    /// Run to completion
    async fn execute(&self) -> Outcome;

    /// Whether executing calls the New system
    fn uses_new_system(&self) -> bool {
        false
    }
}

/// Shared handle stored in the catalog
pub type SharedActivity = Arc<dyn Activity>;

/// Name without its side prefix: `R13A` and `S13A` both give `13A`
#[must_use]
pub fn base_name(name: &str) -> &str {
    let mut chars = name.chars();
    chars.next();
    chars.as_str()
}

/// Split a step identifier into its enabled flag and bare identifier
#[must_use]
pub fn parse_step_identifier(identifier: &str) -> (bool, &str) {
    match identifier.strip_prefix(DISABLED_PREFIX) {
        Some(bare) => (false, bare),
        None => (true, identifier),
    }
}

/// Lifecycle of one activity within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityState {
    /// Not reached yet
    NotStarted,
    /// Executing now
    Running,
    /// Finished with this status
    Completed(Status),
}

/// Current state of every activity touched by a run
#[derive(Debug, Default)]
pub struct StateBoard {
    states: DashMap<String, ActivityState>,
}

impl StateBoard {
    /// Empty board
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// State of `name`; unknown names have not started
    #[must_use]
    pub fn get(&self, name: &str) -> ActivityState {
        self.states.get(name).map_or(ActivityState::NotStarted, |s| *s)
    }

    /// Mark `name` running
    pub fn start(&self, name: &str) {
        self.states.insert(name.to_string(), ActivityState::Running);
    }

    /// Record the final status of `name`
    pub fn complete(&self, name: &str, status: Status) {
        self.states.insert(name.to_string(), ActivityState::Completed(status));
    }

    /// Names completed with `status`
    #[must_use]
    pub fn completed_with(&self, status: Status) -> Vec<String> {
        let mut names: Vec<String> = self
            .states
            .iter()
            .filter(|e| *e.value() == ActivityState::Completed(status))
            .map(|e| e.key().clone())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_drops_side_prefix() {
        assert_eq!(base_name("R13A"), "13A");
        assert_eq!(base_name("S24B"), "24B");
        assert_eq!(base_name(""), "");
    }

    #[test]
    fn bang_disables_a_step() {
        assert_eq!(parse_step_identifier("!PROF-SHARE"), (false, "PROF-SHARE"));
        assert_eq!(parse_step_identifier("PROF-SHARE"), (true, "PROF-SHARE"));
    }

    #[test]
    fn state_moves_forward() {
        let board = StateBoard::new();
        assert_eq!(board.get("P17"), ActivityState::NotStarted);
        board.start("P17");
        assert_eq!(board.get("P17"), ActivityState::Running);
        board.complete("P17", Status::Ok);
        assert_eq!(board.get("P17"), ActivityState::Completed(Status::Ok));
        assert_eq!(board.completed_with(Status::Ok), vec!["P17".to_string()]);
        board.start("P17");
        assert_eq!(board.get("P17"), ActivityState::Running);
    }
}
