//! Session orchestration
//!
//! A `Session` owns one mini-game: the validated manifest, the placement
//! store, the completion guard and the subscribed ports. Control flow for a
//! drag end:
//!
//! host point -> geometry -> snap -> correctness + store -> completion -> ports
//!
//! Per item: `Available -> Placed{correct|incorrect}`, re-drags move between
//! `Placed` states, and `remove` returns to `Available`. The session itself is
//! `Playing` until every scorable item is correctly placed, then `Completed`
//! until `reset` or a manifest change.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::completion::{CompletionDetector, CompletionState};
use super::events::{
    EngineEvent, FeedbackCue, FeedbackPort, Miss, PlacementChanged, PortRegistry, SubscriptionId,
};
use super::geometry::{PositionProvider, to_local};
use super::manifest::{
    DraggableItem, DropTarget, ItemId, Manifest, ManifestDiagnostic, ManifestReport, TargetId,
    is_correct,
};
use super::snap::{SnapCandidate, SnapHit, resolve};
use super::store::{Placement, PlacementStore};
use crate::is_finite_point;
use crate::platform::{Clock, SystemClock};
use crate::profile::AgeProfile;

/// Session-level state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// Accepting drags
    Playing,
    /// Every item correctly placed; terminal until reset
    Completed,
}

/// Where a single item stands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ItemState {
    /// Not on any target
    Available,
    #[serde(rename_all = "camelCase")]
    Placed { target_id: TargetId, is_correct: bool },
    /// Manifest problem; not draggable and not scored
    Excluded,
}

/// What a drag end did
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    Placed {
        placement: Placement,
        /// Target the item sat on before this drop, if it was a re-drag
        previous_target: Option<TargetId>,
        distance: f32,
        /// This drop completed the session
        completed: bool,
    },
    /// No qualifying target; nothing changed
    Missed,
}

/// Drag input the session refused; state is untouched
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DragError {
    #[error("unknown item '{item_id}'")]
    UnknownItem { item_id: ItemId },
    #[error("item '{item_id}' is excluded by a manifest problem")]
    ExcludedItem { item_id: ItemId },
    #[error("non-finite drop point ({x}, {y})")]
    NonFinitePoint { x: f32, y: f32 },
    #[error("session already completed")]
    SessionCompleted,
}

/// Render-ready copy of the session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub phase: SessionPhase,
    pub placements: Vec<Placement>,
    pub completion: CompletionState,
}

/// Result of deleting a target from a live session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetRemoval {
    /// Items whose correct target was the removed one
    pub cleared_items: Vec<ItemId>,
    /// Items that were sitting on the removed target
    pub unplaced_items: Vec<ItemId>,
}

/// Build a session from host manifests
pub fn create_session(
    items: Vec<DraggableItem>,
    targets: Vec<DropTarget>,
    profile: AgeProfile,
) -> Session {
    Session::new(Manifest::new(items, targets), profile)
}

/// One running mini-game (the host's engine handle)
pub struct Session {
    manifest: Manifest,
    report: ManifestReport,
    profile: AgeProfile,
    store: PlacementStore,
    detector: CompletionDetector,
    ports: PortRegistry,
    provider: Option<Box<dyn PositionProvider>>,
    clock: Box<dyn Clock>,
}

impl Session {
    pub fn new(manifest: Manifest, profile: AgeProfile) -> Self {
        let clock: Box<dyn Clock> = Box::new(SystemClock);
        let report = validate_manifest(&manifest);
        let detector = CompletionDetector::new(report.total_count(), clock.now_ms());

        log::info!(
            "Session created: {} items ({} scorable), {} targets",
            manifest.items.len(),
            report.total_count(),
            manifest.targets.len()
        );

        Self {
            manifest,
            report,
            profile,
            store: PlacementStore::new(),
            detector,
            ports: PortRegistry::default(),
            provider: None,
            clock,
        }
    }

    /// Swap the time source; restarts the session clock
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self.reset();
        self
    }

    pub fn with_position_provider(mut self, provider: Box<dyn PositionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn set_position_provider(&mut self, provider: Box<dyn PositionProvider>) {
        self.provider = Some(provider);
    }

    // --- Queries ---

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn profile(&self) -> &AgeProfile {
        &self.profile
    }

    pub fn report(&self) -> &ManifestReport {
        &self.report
    }

    pub fn diagnostics(&self) -> &[ManifestDiagnostic] {
        &self.report.diagnostics
    }

    pub fn phase(&self) -> SessionPhase {
        if self.detector.is_complete() {
            SessionPhase::Completed
        } else {
            SessionPhase::Playing
        }
    }

    pub fn placement_of(&self, item_id: &str) -> Option<&Placement> {
        self.store.by_item(item_id)
    }

    pub fn placements_on(&self, target_id: &str) -> Vec<&Placement> {
        self.store.by_target(target_id)
    }

    /// Per-item state, `None` for ids not in the manifest
    pub fn item_state(&self, item_id: &str) -> Option<ItemState> {
        self.manifest.item(item_id)?;
        if !self.report.is_valid(item_id) {
            return Some(ItemState::Excluded);
        }
        Some(match self.store.by_item(item_id) {
            Some(p) => ItemState::Placed {
                target_id: p.target_id.clone(),
                is_correct: p.is_correct,
            },
            None => ItemState::Available,
        })
    }

    pub fn completion(&self) -> CompletionState {
        self.detector.state(self.store.all(), self.clock.now_ms())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase(),
            placements: self.store.all().to_vec(),
            completion: self.completion(),
        }
    }

    /// Hover highlighting: which target would accept a drop here right now.
    ///
    /// Runs the same geometry and snap steps as a drag end, without mutating
    /// anything or notifying ports.
    pub fn preview(&self, global: Vec2) -> Option<SnapHit> {
        if !is_finite_point(global) {
            return None;
        }
        self.locate(global)
    }

    // --- Drag input ---

    /// Commit a finished drag of `item_id` released at `global`
    pub fn on_drag_end(&mut self, item_id: &str, global: Vec2) -> Result<DragOutcome, DragError> {
        let (item, hint) = self.check_drag(item_id, global).inspect_err(|e| {
            log::warn!("Drag end rejected: {}", e);
        })?;

        let Some(hit) = self.locate(global) else {
            log::debug!("{} dropped at {:?}: miss", item_id, global);
            let event = Miss {
                item_id: item_id.to_string(),
                hint_target_id: hint,
                cue: self.cue(),
            };
            self.ports.dispatch(&EngineEvent::Miss(event));
            return Ok(DragOutcome::Missed);
        };

        let correct = is_correct(&item, &hit.target_id);
        let previous_target = self.store.by_item(item_id).map(|p| p.target_id.clone());
        let now = self.clock.now_ms();

        self.store.place(item_id, &hit.target_id, correct, now);
        self.detector.record_attempt(correct);
        let eval = self
            .detector
            .evaluate(self.store.all(), &self.report.valid_items, now);

        log::debug!(
            "{} dropped on {} at distance {:.1} (correct: {})",
            item_id,
            hit.target_id,
            hit.distance,
            correct
        );

        let placement = Placement {
            item_id: item_id.to_string(),
            target_id: hit.target_id.clone(),
            is_correct: correct,
            placed_at: now,
        };

        let event = PlacementChanged {
            item_id: item_id.to_string(),
            target_id: Some(hit.target_id),
            is_correct: Some(correct),
            cue: self.cue(),
        };
        self.ports.dispatch(&EngineEvent::PlacementChanged(event));
        if eval.just_completed {
            self.ports.dispatch(&EngineEvent::Completion(eval.state));
        }

        Ok(DragOutcome::Placed {
            placement,
            previous_target,
            distance: hit.distance,
            completed: eval.just_completed,
        })
    }

    /// Take an item off its target (host-initiated, e.g. a "send back" button).
    ///
    /// Returns the removed placement; removing an unplaced item is a no-op.
    pub fn remove(&mut self, item_id: &str) -> Result<Option<Placement>, DragError> {
        if self.detector.is_complete() {
            return Err(DragError::SessionCompleted);
        }
        let removed = self.store.remove(item_id);
        if removed.is_some() {
            self.notify_removed(item_id);
        }
        Ok(removed)
    }

    /// Re-run completion detection (e.g. from a host re-render).
    ///
    /// Fires the completion event only if this call is the one that completes.
    pub fn evaluate(&mut self) -> CompletionState {
        let eval = self.detector.evaluate(
            self.store.all(),
            &self.report.valid_items,
            self.clock.now_ms(),
        );
        if eval.just_completed {
            self.ports.dispatch(&EngineEvent::Completion(eval.state.clone()));
        }
        eval.state
    }

    // --- Lifecycle ---

    /// Clear placements, counters and the completion guard; keep the manifest
    pub fn reset(&mut self) {
        self.store.clear();
        self.detector
            .reset(self.report.total_count(), self.clock.now_ms());
        log::info!("Session reset ({} scorable items)", self.report.total_count());
    }

    /// Author edited the manifest: revalidate and start over
    pub fn replace_manifest(&mut self, manifest: Manifest) {
        self.report = validate_manifest(&manifest);
        self.manifest = manifest;
        self.reset();
    }

    /// Delete a target: clear references to it, unplace whatever sat on it,
    /// then restart with the edited manifest.
    pub fn remove_target(&mut self, target_id: &str) -> TargetRemoval {
        let unplaced_items: Vec<ItemId> = self
            .store
            .by_target(target_id)
            .iter()
            .map(|p| p.item_id.clone())
            .collect();
        for item_id in &unplaced_items {
            self.store.remove(item_id);
            self.notify_removed(item_id);
        }

        let mut manifest = std::mem::take(&mut self.manifest);
        let cleared_items = manifest.remove_target(target_id);
        self.replace_manifest(manifest);

        TargetRemoval {
            cleared_items,
            unplaced_items,
        }
    }

    pub fn subscribe(&mut self, port: Box<dyn FeedbackPort>) -> SubscriptionId {
        let id = self.ports.subscribe(port);
        log::debug!("Feedback port {} subscribed ({} active)", id.0, self.ports.len());
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.ports.unsubscribe(id)
    }

    // --- Internals ---

    /// Validate drag input; returns the item and the miss hint
    fn check_drag(
        &self,
        item_id: &str,
        global: Vec2,
    ) -> Result<(DraggableItem, Option<TargetId>), DragError> {
        if self.detector.is_complete() {
            return Err(DragError::SessionCompleted);
        }
        let Some(item) = self.manifest.item(item_id) else {
            return Err(DragError::UnknownItem {
                item_id: item_id.to_string(),
            });
        };
        if !self.report.is_valid(item_id) {
            return Err(DragError::ExcludedItem {
                item_id: item_id.to_string(),
            });
        }
        if !is_finite_point(global) {
            return Err(DragError::NonFinitePoint {
                x: global.x,
                y: global.y,
            });
        }

        let hint = if self.profile.auto_complete_assist {
            item.correct_target_id.clone()
        } else {
            None
        };
        Ok((item.clone(), hint))
    }

    /// Geometry + snap for a global point; `None` is a miss
    fn locate(&self, global: Vec2) -> Option<SnapHit> {
        let provider = self.provider.as_deref()?;
        let container = provider.container()?;
        let local = to_local(&container, global)?;

        let default_radius = self.profile.snap_tolerance_default;
        let candidates: Vec<SnapCandidate<'_>> = self
            .manifest
            .registered_targets()
            .into_iter()
            .filter_map(|target| {
                let geometry = provider.target(&target.id)?;
                let radius = geometry
                    .radius
                    .filter(|r| r.is_finite() && *r > 0.0)
                    .unwrap_or_else(|| target.tolerance_or(default_radius));
                Some(SnapCandidate {
                    target_id: &target.id,
                    center: geometry.center,
                    radius,
                })
            })
            .collect();

        resolve(local, &candidates)
    }

    fn cue(&self) -> FeedbackCue {
        FeedbackCue::from(&self.profile)
    }

    fn notify_removed(&mut self, item_id: &str) {
        log::debug!("{} removed", item_id);
        let event = PlacementChanged {
            item_id: item_id.to_string(),
            target_id: None,
            is_correct: None,
            cue: self.cue(),
        };
        self.ports.dispatch(&EngineEvent::PlacementChanged(event));
    }
}

/// Validate and log manifest problems
fn validate_manifest(manifest: &Manifest) -> ManifestReport {
    let report = manifest.validate();
    for diagnostic in &report.diagnostics {
        log::warn!("Manifest: {}", diagnostic);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::EventLog;
    use crate::engine::geometry::{ContainerRect, StaticLayout, TargetGeometry};
    use crate::platform::ManualClock;

    fn layout() -> StaticLayout {
        StaticLayout::new(800.0, 600.0)
            .with_target("water", Vec2::new(100.0, 100.0))
            .with_target("sky", Vec2::new(500.0, 100.0))
    }

    fn session(profile: AgeProfile) -> (Session, EventLog, ManualClock) {
        let clock = ManualClock::new(1_000.0);
        let mut session = create_session(
            vec![DraggableItem::new("fish", "water"), DraggableItem::new("bird", "sky")],
            vec![DropTarget::new("water"), DropTarget::new("sky")],
            profile,
        )
        .with_clock(Box::new(clock.clone()))
        .with_position_provider(Box::new(layout()));
        let log = EventLog::new();
        session.subscribe(Box::new(log.clone()));
        (session, log, clock)
    }

    #[test]
    fn test_drag_end_places_and_completes() {
        let (mut session, log, clock) = session(AgeProfile::with_tolerance(100.0));

        clock.advance(500.0);
        let outcome = session.on_drag_end("fish", Vec2::new(110.0, 100.0)).unwrap();
        assert!(matches!(outcome, DragOutcome::Placed { completed: false, .. }));
        assert_eq!(session.phase(), SessionPhase::Playing);

        clock.advance(500.0);
        let outcome = session.on_drag_end("bird", Vec2::new(500.0, 90.0)).unwrap();
        assert!(matches!(outcome, DragOutcome::Placed { completed: true, .. }));
        assert_eq!(session.phase(), SessionPhase::Completed);

        let snapshot = session.snapshot();
        assert!(snapshot.completion.is_complete);
        assert_eq!(snapshot.completion.correct_count, 2);
        assert_eq!(snapshot.completion.time_spent_ms, 1_000.0);
        assert_eq!(log.completions(), 1);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_completed_session_rejects_input_until_reset() {
        let (mut session, _log, _clock) = session(AgeProfile::with_tolerance(100.0));
        session.on_drag_end("fish", Vec2::new(100.0, 100.0)).unwrap();
        session.on_drag_end("bird", Vec2::new(500.0, 100.0)).unwrap();

        assert_eq!(
            session.on_drag_end("fish", Vec2::new(500.0, 100.0)),
            Err(DragError::SessionCompleted)
        );
        assert_eq!(session.remove("fish"), Err(DragError::SessionCompleted));
        assert!(session.snapshot().completion.is_complete);

        session.reset();
        assert_eq!(session.phase(), SessionPhase::Playing);
        assert!(session.snapshot().placements.is_empty());
        assert_eq!(session.item_state("fish"), Some(ItemState::Available));
    }

    #[test]
    fn test_invalid_input_is_noop() {
        let (mut session, log, _clock) = session(AgeProfile::default());

        assert!(matches!(
            session.on_drag_end("whale", Vec2::new(100.0, 100.0)),
            Err(DragError::UnknownItem { .. })
        ));
        assert!(matches!(
            session.on_drag_end("fish", Vec2::new(f32::NAN, 100.0)),
            Err(DragError::NonFinitePoint { .. })
        ));
        assert!(session.snapshot().placements.is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn test_excluded_item_not_draggable_nor_scored() {
        let mut session = create_session(
            vec![DraggableItem::new("fish", "water"), DraggableItem::new("worm", "soil")],
            vec![DropTarget::new("water")],
            AgeProfile::default(),
        )
        .with_position_provider(Box::new(layout()));

        assert_eq!(session.diagnostics().len(), 1);
        assert_eq!(session.item_state("worm"), Some(ItemState::Excluded));
        assert_eq!(session.item_state("ghost"), None);
        assert!(matches!(
            session.on_drag_end("worm", Vec2::new(100.0, 100.0)),
            Err(DragError::ExcludedItem { .. })
        ));

        session.on_drag_end("fish", Vec2::new(100.0, 100.0)).unwrap();
        let completion = session.completion();
        assert_eq!(completion.total_count, 1);
        assert!(completion.is_complete);
    }

    #[test]
    fn test_missing_geometry_is_a_miss() {
        let (mut session, log, _clock) = session(AgeProfile::default());
        session.set_position_provider(Box::new(StaticLayout::default()));

        let outcome = session.on_drag_end("fish", Vec2::new(100.0, 100.0)).unwrap();
        assert_eq!(outcome, DragOutcome::Missed);
        assert_eq!(session.item_state("fish"), Some(ItemState::Available));
        assert_eq!(log.events()[0].kind(), "miss");
    }

    #[test]
    fn test_container_offset_applied() {
        let (mut session, _log, _clock) = session(AgeProfile::with_tolerance(20.0));
        let mut shifted = layout();
        shifted.container = Some(ContainerRect::new(1_000.0, 2_000.0, 800.0, 600.0));
        session.set_position_provider(Box::new(shifted));

        assert_eq!(
            session.on_drag_end("fish", Vec2::new(100.0, 100.0)).unwrap(),
            DragOutcome::Missed
        );
        let outcome = session.on_drag_end("fish", Vec2::new(1_100.0, 2_100.0)).unwrap();
        assert!(matches!(outcome, DragOutcome::Placed { .. }));
    }

    #[test]
    fn test_radius_precedence() {
        let mut session = create_session(
            vec![DraggableItem::new("fish", "water")],
            vec![DropTarget::new("water").with_tolerance(30.0)],
            AgeProfile::with_tolerance(100.0),
        );
        let mut provider = StaticLayout::new(800.0, 600.0).with_target("water", Vec2::ZERO);
        session.set_position_provider(Box::new(provider.clone()));

        // Manifest override (30) beats profile default (100)
        assert!(session.preview(Vec2::new(50.0, 0.0)).is_none());
        assert!(session.preview(Vec2::new(25.0, 0.0)).is_some());

        // Measured radius beats the manifest override
        provider.set_target("water", TargetGeometry::with_radius(Vec2::ZERO, 60.0));
        session.set_position_provider(Box::new(provider));
        assert!(session.preview(Vec2::new(50.0, 0.0)).is_some());
    }

    #[test]
    fn test_assist_hint_on_miss() {
        let mut profile = AgeProfile::with_tolerance(10.0);
        profile.auto_complete_assist = true;
        let (mut session, log, _clock) = session(profile);

        session.on_drag_end("fish", Vec2::new(300.0, 500.0)).unwrap();
        match &log.events()[0] {
            EngineEvent::Miss(miss) => assert_eq!(miss.hint_target_id.as_deref(), Some("water")),
            other => panic!("expected miss, got {:?}", other),
        }
    }

    #[test]
    fn test_remove_emits_only_when_placed() {
        let (mut session, log, _clock) = session(AgeProfile::default());
        assert_eq!(session.remove("fish"), Ok(None));
        assert!(log.is_empty());

        session.on_drag_end("fish", Vec2::new(100.0, 100.0)).unwrap();
        let removed = session.remove("fish").unwrap().unwrap();
        assert_eq!(removed.target_id, "water");
        assert_eq!(session.item_state("fish"), Some(ItemState::Available));

        match &log.events()[1] {
            EngineEvent::PlacementChanged(e) => {
                assert_eq!(e.target_id, None);
                assert_eq!(e.is_correct, None);
            }
            other => panic!("expected placement-changed, got {:?}", other),
        }
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let (mut session, log, _clock) = session(AgeProfile::default());
        session.on_drag_end("fish", Vec2::new(100.0, 100.0)).unwrap();
        session.on_drag_end("bird", Vec2::new(500.0, 100.0)).unwrap();

        assert!(session.evaluate().is_complete);
        assert!(session.evaluate().is_complete);
        assert_eq!(log.completions(), 1);
    }

    #[test]
    fn test_remove_target_unplaces_and_restarts() {
        let (mut session, log, _clock) = session(AgeProfile::default());
        session.on_drag_end("fish", Vec2::new(100.0, 100.0)).unwrap();
        log.clear();

        let removal = session.remove_target("water");
        assert_eq!(removal.unplaced_items, vec!["fish"]);
        assert_eq!(removal.cleared_items, vec!["fish"]);
        assert_eq!(log.len(), 1);

        assert!(session.manifest().target("water").is_none());
        assert_eq!(session.item_state("fish"), Some(ItemState::Excluded));
        assert_eq!(session.completion().total_count, 1);
        assert!(session.snapshot().placements.is_empty());
    }

    #[test]
    fn test_replace_manifest_resets() {
        let (mut session, _log, _clock) = session(AgeProfile::default());
        session.on_drag_end("fish", Vec2::new(500.0, 100.0)).unwrap();
        assert_eq!(session.completion().mistakes, 1);

        session.replace_manifest(Manifest::new(
            vec![DraggableItem::new("fish", "sky")],
            vec![DropTarget::new("sky")],
        ));
        let completion = session.completion();
        assert_eq!(completion.total_count, 1);
        assert_eq!(completion.mistakes, 0);
        assert!(session.snapshot().placements.is_empty());
    }

    #[test]
    fn test_item_state_json_shape() {
        let state = ItemState::Placed {
            target_id: "water".into(),
            is_correct: true,
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["state"], "placed");
        assert_eq!(json["targetId"], "water");
        assert_eq!(json["isCorrect"], true);
    }
}
