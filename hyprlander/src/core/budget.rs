//! Turn budget for the conversation loop.

use serde::Serialize;

/// Default number of turns per conversation.
pub const DEFAULT_TURN_LIMIT: u32 = 10;

/// 1-indexed turn counter bounded by a fixed limit.
///
/// Every call to [`TurnBudget::begin_turn`] consumes one turn, whatever the
/// turn ends up doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnBudget {
    limit: u32,
    next: u32,
}

impl TurnBudget {
    pub fn new(limit: u32) -> Self {
        Self { limit, next: 1 }
    }

    /// Start the next turn, returning its number, or `None` once the limit is
    /// reached.
    pub fn begin_turn(&mut self) -> Option<u32> {
        if self.next > self.limit {
            return None;
        }
        let turn = self.next;
        self.next += 1;
        Some(turn)
    }

    /// Turns consumed so far.
    pub fn used(&self) -> u32 {
        self.next - 1
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn is_exhausted(&self) -> bool {
        self.next > self.limit
    }
}

impl Default for TurnBudget {
    fn default() -> Self {
        Self::new(DEFAULT_TURN_LIMIT)
    }
}
