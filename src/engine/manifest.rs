//! Item/target manifests and their validation
//!
//! The manifest is authored by the lesson editor and fixed for the lifetime
//! of a session. Problems in it are reported as diagnostics, never as hard
//! failures: an item that can't be scored is excluded from the session.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::profile::ConfigError;

/// Identifier of a draggable item (unique within a session)
pub type ItemId = String;
/// Identifier of a drop target (unique within a session)
pub type TargetId = String;

/// Rendering size bucket for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Small,
    #[default]
    Medium,
    Large,
}

/// Something the learner can drag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraggableItem {
    pub id: ItemId,
    /// Target this item belongs on; `None` once that target was deleted
    #[serde(default)]
    pub correct_target_id: Option<TargetId>,
    #[serde(default)]
    pub size_class: SizeClass,
    /// Opaque reference to the host's image/emoji/asset
    #[serde(default)]
    pub asset_ref: String,
}

impl DraggableItem {
    pub fn new(id: &str, correct_target_id: &str) -> Self {
        Self {
            id: id.to_string(),
            correct_target_id: Some(correct_target_id.to_string()),
            size_class: SizeClass::default(),
            asset_ref: String::new(),
        }
    }
}

/// A zone items can be dropped on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropTarget {
    pub id: TargetId,
    #[serde(default)]
    pub label: String,
    /// Overrides the profile's default snap tolerance
    #[serde(default)]
    pub tolerance_radius: Option<f32>,
    /// Informational; no cap on placements per target is enforced
    #[serde(default = "default_accepts_multiple")]
    pub accepts_multiple: bool,
    #[serde(default)]
    pub asset_ref: String,
}

fn default_accepts_multiple() -> bool {
    true
}

impl DropTarget {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            label: String::new(),
            tolerance_radius: None,
            accepts_multiple: true,
            asset_ref: String::new(),
        }
    }

    pub fn with_tolerance(mut self, radius: f32) -> Self {
        self.tolerance_radius = Some(radius);
        self
    }

    /// Tolerance override if it is usable, otherwise `default`
    pub fn tolerance_or(&self, default: f32) -> f32 {
        match self.tolerance_radius {
            Some(r) if valid_radius(r) => r,
            _ => default,
        }
    }
}

#[inline]
fn valid_radius(r: f32) -> bool {
    r.is_finite() && r > 0.0
}

/// Correctness check: does `target_id` match the item's declared target?
#[inline]
pub fn is_correct(item: &DraggableItem, target_id: &str) -> bool {
    item.correct_target_id.as_deref() == Some(target_id)
}

/// Non-fatal manifest problem surfaced to the host
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ManifestDiagnostic {
    #[error("item at index {index} has an empty id")]
    EmptyItemId { index: usize },
    #[error("target at index {index} has an empty id")]
    EmptyTargetId { index: usize },
    #[error("duplicate item id '{item_id}'")]
    DuplicateItem { item_id: ItemId },
    #[error("duplicate target id '{target_id}'")]
    DuplicateTarget { target_id: TargetId },
    #[error("item '{item_id}' references unknown target '{target_id}'")]
    UnknownTarget { item_id: ItemId, target_id: TargetId },
    #[error("item '{item_id}' has no correct target")]
    MissingCorrectTarget { item_id: ItemId },
    #[error("target '{target_id}' has invalid tolerance {radius}")]
    InvalidTolerance { target_id: TargetId, radius: f32 },
}

/// Outcome of validating a manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestReport {
    /// Scorable items, in manifest order
    pub valid_items: Vec<ItemId>,
    pub diagnostics: Vec<ManifestDiagnostic>,
}

impl ManifestReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Number of items that count toward completion
    pub fn total_count(&self) -> usize {
        self.valid_items.len()
    }

    pub fn is_valid(&self, item_id: &str) -> bool {
        self.valid_items.iter().any(|id| id == item_id)
    }
}

/// Ordered items and targets for one mini-game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub items: Vec<DraggableItem>,
    #[serde(default)]
    pub targets: Vec<DropTarget>,
}

impl Manifest {
    pub fn new(items: Vec<DraggableItem>, targets: Vec<DropTarget>) -> Self {
        Self { items, targets }
    }

    /// Parse a manifest from the host's JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// First item with this id
    pub fn item(&self, item_id: &str) -> Option<&DraggableItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// First target with this id
    pub fn target(&self, target_id: &str) -> Option<&DropTarget> {
        self.targets.iter().find(|t| t.id == target_id)
    }

    /// Targets eligible for snapping: first occurrence of each non-empty id,
    /// in manifest order
    pub fn registered_targets(&self) -> Vec<&DropTarget> {
        let mut seen = HashSet::new();
        self.targets
            .iter()
            .filter(|t| !t.id.is_empty() && seen.insert(t.id.as_str()))
            .collect()
    }

    /// Check ids and references; invalid items are left out of `valid_items`
    pub fn validate(&self) -> ManifestReport {
        let mut report = ManifestReport::default();

        let mut target_ids = HashSet::new();
        for (index, target) in self.targets.iter().enumerate() {
            if target.id.is_empty() {
                report.diagnostics.push(ManifestDiagnostic::EmptyTargetId { index });
                continue;
            }
            if !target_ids.insert(target.id.as_str()) {
                report.diagnostics.push(ManifestDiagnostic::DuplicateTarget {
                    target_id: target.id.clone(),
                });
                continue;
            }
            if let Some(radius) = target.tolerance_radius {
                if !valid_radius(radius) {
                    report.diagnostics.push(ManifestDiagnostic::InvalidTolerance {
                        target_id: target.id.clone(),
                        radius,
                    });
                }
            }
        }

        let mut item_ids = HashSet::new();
        for (index, item) in self.items.iter().enumerate() {
            if item.id.is_empty() {
                report.diagnostics.push(ManifestDiagnostic::EmptyItemId { index });
                continue;
            }
            if !item_ids.insert(item.id.as_str()) {
                report.diagnostics.push(ManifestDiagnostic::DuplicateItem {
                    item_id: item.id.clone(),
                });
                continue;
            }
            match item.correct_target_id.as_deref() {
                None | Some("") => {
                    report.diagnostics.push(ManifestDiagnostic::MissingCorrectTarget {
                        item_id: item.id.clone(),
                    });
                }
                Some(target_id) if !target_ids.contains(target_id) => {
                    report.diagnostics.push(ManifestDiagnostic::UnknownTarget {
                        item_id: item.id.clone(),
                        target_id: target_id.to_string(),
                    });
                }
                Some(_) => report.valid_items.push(item.id.clone()),
            }
        }

        report
    }

    /// Delete a target and clear every `correct_target_id` pointing at it.
    ///
    /// Returns the ids of items whose correct target was cleared.
    pub fn remove_target(&mut self, target_id: &str) -> Vec<ItemId> {
        self.targets.retain(|t| t.id != target_id);

        let mut cleared = Vec::new();
        for item in &mut self.items {
            if item.correct_target_id.as_deref() == Some(target_id) {
                item.correct_target_id = None;
                cleared.push(item.id.clone());
            }
        }
        cleared
    }
}
