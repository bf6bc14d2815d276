//! Placement store
//!
//! Holds the current item -> target assignments. At most one placement per
//! item; any number of placements per target. Insertion order is preserved so
//! hosts can render stacked items on a target in a stable order.

use serde::{Deserialize, Serialize};

use super::manifest::{ItemId, TargetId};

/// One item sitting on one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub item_id: ItemId,
    pub target_id: TargetId,
    pub is_correct: bool,
    /// Milliseconds since the Unix epoch
    pub placed_at: f64,
}

/// Current placement set for a session
#[derive(Debug, Clone, Default)]
pub struct PlacementStore {
    placements: Vec<Placement>,
}

impl PlacementStore {
    pub fn new() -> Self {
        Self {
            placements: Vec::new(),
        }
    }

    /// Put `item_id` on `target_id`, replacing any earlier placement of the item.
    ///
    /// This is the only way to move an item: a re-drag is place-over-place.
    pub fn place(
        &mut self,
        item_id: &str,
        target_id: &str,
        is_correct: bool,
        placed_at: f64,
    ) -> &[Placement] {
        self.placements.retain(|p| p.item_id != item_id);
        self.placements.push(Placement {
            item_id: item_id.to_string(),
            target_id: target_id.to_string(),
            is_correct,
            placed_at,
        });
        &self.placements
    }

    /// Take an item off its target. Returns the removed placement, if any.
    pub fn remove(&mut self, item_id: &str) -> Option<Placement> {
        let index = self.placements.iter().position(|p| p.item_id == item_id)?;
        Some(self.placements.remove(index))
    }

    /// Placements on a target, in insertion order
    pub fn by_target(&self, target_id: &str) -> Vec<&Placement> {
        self.placements
            .iter()
            .filter(|p| p.target_id == target_id)
            .collect()
    }

    pub fn by_item(&self, item_id: &str) -> Option<&Placement> {
        self.placements.iter().find(|p| p.item_id == item_id)
    }

    pub fn all(&self) -> &[Placement] {
        &self.placements
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn clear(&mut self) {
        self.placements.clear();
    }
}
