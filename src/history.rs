use crate::counter::{MAX_FACE, MIN_FACE};
use serde_json::Value;
use std::collections::VecDeque;

pub const HISTORY_CAPACITY: usize = 10;

/// The last few rolls, oldest-first, bounded at `HISTORY_CAPACITY`.
///
/// Popping an entry is the only way a roll ever gets retracted from the
/// counter, which is what makes undo structurally safe.
#[derive(Debug, Clone, PartialEq)]
pub struct RollHistory {
    rolls: VecDeque<u8>,
}

impl RollHistory {
    pub fn new() -> Self {
        Self {
            rolls: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Appends a roll, evicting the oldest entry once the capacity is hit.
    pub fn push(&mut self, face: u8) {
        if self.rolls.len() >= HISTORY_CAPACITY {
            self.rolls.pop_front();
        }
        self.rolls.push_back(face);
    }

    /// Removes and returns the most recent roll, `None` when empty.
    pub fn pop(&mut self) -> Option<u8> {
        self.rolls.pop_back()
    }

    pub fn clear(&mut self) {
        self.rolls.clear();
    }

    pub fn len(&self) -> usize {
        self.rolls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rolls.is_empty()
    }

    /// Most-recent-first view for display. Stored order is untouched.
    pub fn recent_first(&self) -> impl Iterator<Item = u8> + '_ {
        self.rolls.iter().rev().copied()
    }

    pub fn display_line(&self) -> String {
        self.recent_first()
            .map(|face| face.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Serializes as a plain array of faces, oldest-first.
    pub fn to_json(&self) -> Value {
        Value::Array(self.rolls.iter().map(|&face| Value::from(face)).collect())
    }

    /// Rebuilds a history from a stored array. Entries outside 1..=20 are
    /// dropped and only the most recent `HISTORY_CAPACITY` survive.
    pub fn from_json(value: &Value) -> Self {
        let mut history = Self::new();
        let entries = match value {
            Value::Array(entries) => entries,
            _ => return history,
        };
        for entry in entries {
            match entry.as_u64() {
                Some(face) if (MIN_FACE as u64..=MAX_FACE as u64).contains(&face) => {
                    history.push(face as u8);
                }
                _ => continue,
            }
        }
        history
    }
}

// unit tests
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn push_caps_length_and_evicts_oldest() {
        let mut history = RollHistory::new();
        for face in 1..=11 {
            history.push(face);
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.to_json(), json!([2, 3, 4, 5, 6, 7, 8, 9, 10, 11]));
    }

    #[test]
    fn pop_returns_most_recent() {
        let mut history = RollHistory::new();
        history.push(4);
        history.push(19);
        assert_eq!(history.pop(), Some(19));
        assert_eq!(history.pop(), Some(4));
        assert_eq!(history.pop(), None);
    }

    #[test]
    fn display_is_most_recent_first() {
        let mut history = RollHistory::new();
        for face in [5, 12, 3] {
            history.push(face);
        }
        assert_eq!(history.display_line(), "3, 12, 5");
        // display must not disturb stored order
        assert_eq!(history.to_json(), json!([5, 12, 3]));
    }

    #[test]
    fn empty_display_is_empty_string() {
        assert_eq!(RollHistory::new().display_line(), "");
    }

    #[test]
    fn restore_drops_out_of_range_faces() {
        let history = RollHistory::from_json(&json!([0, 5, 21, 12, "x", null]));
        assert_eq!(history.to_json(), json!([5, 12]));
    }

    #[test]
    fn restore_keeps_only_most_recent_ten() {
        let blob = json!([1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
        let history = RollHistory::from_json(&blob);
        assert_eq!(history.to_json(), json!([3, 4, 5, 6, 7, 8, 9, 10, 11, 12]));
    }

    #[test]
    fn restore_tolerates_non_array_blob() {
        assert!(RollHistory::from_json(&json!({"a": 1})).is_empty());
    }
}
