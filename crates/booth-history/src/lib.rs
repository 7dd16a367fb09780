//! Bounded per-(caller, character) conversation history.
//!
//! The store keeps the ten most recent turns for each caller/character pair,
//! in insertion order, entirely in memory. Readers never mutate; writers
//! evict the oldest turn once the cap is exceeded. Nothing is persisted and
//! there is no expiry path.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Per-pair turn cap; oldest turns are evicted first once exceeded.
pub const HISTORY_TURN_CAP: usize = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Role of a stored conversation turn.
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// One stored conversation turn.
pub struct HistoryTurn {
    pub role: TurnRole,
    pub text: String,
}

#[derive(Debug, Default)]
/// Mutex-guarded turn log keyed by (caller id, character id).
pub struct HistoryStore {
    entries: Mutex<HashMap<(String, String), Vec<HistoryTurn>>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn, evicting the oldest entry once the cap is exceeded.
    pub fn record_turn(&self, caller: &str, character: &str, role: TurnRole, text: &str) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let turns = entries
            .entry((caller.to_string(), character.to_string()))
            .or_default();
        turns.push(HistoryTurn {
            role,
            text: text.to_string(),
        });
        if turns.len() > HISTORY_TURN_CAP {
            let overflow = turns.len() - HISTORY_TURN_CAP;
            turns.drain(0..overflow);
        }
    }

    /// Returns the stored turns in insertion order, or empty when the pair
    /// has no history yet. Reading never creates or mutates an entry.
    pub fn get_turns(&self, caller: &str, character: &str) -> Vec<HistoryTurn> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries
            .get(&(caller.to_string(), character.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}
