//! Completion detection
//!
//! Derives the aggregate score from the placement set and fires the
//! completion transition exactly once per session. The "already celebrated"
//! guard is owned here, per session, so concurrent games never share it.

use serde::{Deserialize, Serialize};

use super::manifest::ItemId;
use super::store::Placement;

/// Aggregate progress of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionState {
    pub is_complete: bool,
    /// Current placements flagged correct
    pub correct_count: usize,
    /// Scorable items, fixed at session start
    pub total_count: usize,
    /// Incorrect drops over the whole session; never decremented
    pub mistakes: u32,
    pub started_at: f64,
    /// Elapsed play time, frozen once complete
    pub time_spent_ms: f64,
}

/// Result of one `evaluate` call
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub state: CompletionState,
    /// True only on the call that flipped the session to complete
    pub just_completed: bool,
}

/// Per-session completion tracker
#[derive(Debug, Clone)]
pub struct CompletionDetector {
    total_count: usize,
    started_at: f64,
    mistakes: u32,
    celebrated: bool,
    completed_at: Option<f64>,
}

impl CompletionDetector {
    pub fn new(total_count: usize, started_at: f64) -> Self {
        Self {
            total_count,
            started_at,
            mistakes: 0,
            celebrated: false,
            completed_at: None,
        }
    }

    /// Count a drop. Called by the session when a placement is recorded.
    pub fn record_attempt(&mut self, is_correct: bool) {
        if !is_correct {
            self.mistakes += 1;
        }
    }

    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    pub fn is_complete(&self) -> bool {
        self.celebrated
    }

    /// Recompute the state and flip to complete if every item is correctly placed.
    ///
    /// After the first flip, later calls report `is_complete` but never set
    /// `just_completed` again.
    pub fn evaluate(&mut self, placements: &[Placement], items: &[ItemId], now: f64) -> Evaluation {
        let mut just_completed = false;
        if !self.celebrated && all_correct(placements, items) {
            self.celebrated = true;
            self.completed_at = Some(now);
            just_completed = true;
            log::info!(
                "Session complete: {} items, {} mistakes",
                self.total_count,
                self.mistakes
            );
        }

        Evaluation {
            state: self.state(placements, now),
            just_completed,
        }
    }

    /// Read-only view; never fires the transition
    pub fn state(&self, placements: &[Placement], now: f64) -> CompletionState {
        let end = self.completed_at.unwrap_or(now);
        CompletionState {
            is_complete: self.celebrated,
            correct_count: placements.iter().filter(|p| p.is_correct).count(),
            total_count: self.total_count,
            mistakes: self.mistakes,
            started_at: self.started_at,
            time_spent_ms: (end - self.started_at).max(0.0),
        }
    }

    /// Forget progress and the guard; used by session reset
    pub fn reset(&mut self, total_count: usize, started_at: f64) {
        *self = Self::new(total_count, started_at);
    }
}

/// Every item has a placement and every placement is correct.
///
/// An empty manifest is never complete.
fn all_correct(placements: &[Placement], items: &[ItemId]) -> bool {
    if items.is_empty() || placements.len() != items.len() {
        return false;
    }
    placements.iter().all(|p| p.is_correct)
        && items
            .iter()
            .all(|id| placements.iter().any(|p| &p.item_id == id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(item: &str, target: &str, is_correct: bool) -> Placement {
        Placement {
            item_id: item.to_string(),
            target_id: target.to_string(),
            is_correct,
            placed_at: 0.0,
        }
    }

    fn ids(names: &[&str]) -> Vec<ItemId> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_completes_once() {
        let items = ids(&["fish"]);
        let placements = vec![placement("fish", "water", true)];
        let mut detector = CompletionDetector::new(1, 100.0);

        let first = detector.evaluate(&placements, &items, 600.0);
        assert!(first.just_completed);
        assert!(first.state.is_complete);
        assert_eq!(first.state.correct_count, 1);
        assert_eq!(first.state.time_spent_ms, 500.0);

        let second = detector.evaluate(&placements, &items, 900.0);
        assert!(!second.just_completed);
        assert!(second.state.is_complete);
        // Frozen at the completion instant
        assert_eq!(second.state.time_spent_ms, 500.0);
    }

    #[test]
    fn test_incorrect_placement_blocks_completion() {
        let items = ids(&["a", "b"]);
        let placements = vec![placement("a", "t1", true), placement("b", "t1", false)];
        let mut detector = CompletionDetector::new(2, 0.0);

        let eval = detector.evaluate(&placements, &items, 10.0);
        assert!(!eval.state.is_complete);
        assert_eq!(eval.state.correct_count, 1);
        assert_eq!(eval.state.time_spent_ms, 10.0);
    }

    #[test]
    fn test_partial_placement_not_complete() {
        let items = ids(&["a", "b"]);
        let placements = vec![placement("a", "t1", true)];
        let mut detector = CompletionDetector::new(2, 0.0);
        assert!(!detector.evaluate(&placements, &items, 1.0).state.is_complete);
    }

    #[test]
    fn test_foreign_placement_not_counted_as_item() {
        let items = ids(&["a", "b"]);
        let placements = vec![placement("a", "t1", true), placement("zzz", "t1", true)];
        let mut detector = CompletionDetector::new(2, 0.0);
        assert!(!detector.evaluate(&placements, &items, 1.0).state.is_complete);
    }

    #[test]
    fn test_empty_manifest_never_completes() {
        let mut detector = CompletionDetector::new(0, 0.0);
        for _ in 0..3 {
            let eval = detector.evaluate(&[], &[], 1.0);
            assert!(!eval.state.is_complete);
            assert!(!eval.just_completed);
        }
    }

    #[test]
    fn test_mistakes_are_monotonic() {
        let mut detector = CompletionDetector::new(1, 0.0);
        detector.record_attempt(false);
        detector.record_attempt(true);
        detector.record_attempt(false);
        assert_eq!(detector.mistakes(), 2);

        let items = ids(&["a"]);
        let eval = detector.evaluate(&[placement("a", "t", true)], &items, 1.0);
        assert!(eval.state.is_complete);
        assert_eq!(eval.state.mistakes, 2);
    }

    #[test]
    fn test_reset_clears_guard() {
        let items = ids(&["a"]);
        let placements = vec![placement("a", "t", true)];
        let mut detector = CompletionDetector::new(1, 0.0);
        detector.record_attempt(false);
        assert!(detector.evaluate(&placements, &items, 1.0).just_completed);

        detector.reset(1, 50.0);
        assert!(!detector.is_complete());
        assert_eq!(detector.mistakes(), 0);
        let eval = detector.evaluate(&placements, &items, 60.0);
        assert!(eval.just_completed);
        assert_eq!(eval.state.started_at, 50.0);
    }
}
