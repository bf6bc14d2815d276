//! Engine events and the feedback port
//!
//! The engine never plays sounds, confetti or haptics itself. It reports typed
//! outcomes to every subscribed `FeedbackPort`, synchronously and only after
//! the store and detector have finished mutating. A port that panics is
//! logged and skipped; it can't corrupt engine state or starve other ports.

use std::cell::RefCell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::completion::CompletionState;
use super::manifest::{ItemId, TargetId};
use crate::profile::{AgeProfile, FeedbackIntensity};

/// Profile-derived presentation hints attached to each event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackCue {
    pub intensity: FeedbackIntensity,
    pub animation_duration_ms: u32,
}

impl From<&AgeProfile> for FeedbackCue {
    fn from(profile: &AgeProfile) -> Self {
        Self {
            intensity: profile.feedback_intensity,
            animation_duration_ms: profile.animation_duration_ms,
        }
    }
}

/// An item was placed, re-placed or taken off its target.
///
/// `target_id`/`is_correct` are `None` for removals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementChanged {
    pub item_id: ItemId,
    pub target_id: Option<TargetId>,
    pub is_correct: Option<bool>,
    pub cue: FeedbackCue,
}

/// A drag ended with no qualifying target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Miss {
    pub item_id: ItemId,
    /// Correct target for this item, set only when the profile enables assist
    pub hint_target_id: Option<TargetId>,
    pub cue: FeedbackCue,
}

/// Everything a port can be told, in one stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EngineEvent {
    PlacementChanged(PlacementChanged),
    Miss(Miss),
    Completion(CompletionState),
}

impl EngineEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            EngineEvent::PlacementChanged(_) => "placement-changed",
            EngineEvent::Miss(_) => "miss",
            EngineEvent::Completion(_) => "completion",
        }
    }
}

/// Host-side sink for engine outcomes. All methods default to no-ops.
pub trait FeedbackPort {
    fn on_placement(&mut self, _event: &PlacementChanged) {}

    fn on_miss(&mut self, _event: &Miss) {}

    fn on_completion(&mut self, _state: &CompletionState) {}
}

/// Port that ignores everything (headless sessions)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPort;

impl FeedbackPort for NoopPort {}

/// Adapts a closure over the unified event stream into a port
pub struct FnPort<F>(pub F);

impl<F: FnMut(&EngineEvent)> FeedbackPort for FnPort<F> {
    fn on_placement(&mut self, event: &PlacementChanged) {
        (self.0)(&EngineEvent::PlacementChanged(event.clone()));
    }

    fn on_miss(&mut self, event: &Miss) {
        (self.0)(&EngineEvent::Miss(event.clone()));
    }

    fn on_completion(&mut self, state: &CompletionState) {
        (self.0)(&EngineEvent::Completion(state.clone()));
    }
}

/// Records events into a shared buffer; clones see the same buffer
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<EngineEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Number of completion events seen
    pub fn completions(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, EngineEvent::Completion(_)))
            .count()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn push(&self, event: EngineEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl FeedbackPort for EventLog {
    fn on_placement(&mut self, event: &PlacementChanged) {
        self.push(EngineEvent::PlacementChanged(event.clone()));
    }

    fn on_miss(&mut self, event: &Miss) {
        self.push(EngineEvent::Miss(event.clone()));
    }

    fn on_completion(&mut self, state: &CompletionState) {
        self.push(EngineEvent::Completion(state.clone()));
    }
}

/// Writes every event to the `log` facade (analytics-by-log hosts)
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPort;

impl FeedbackPort for LogPort {
    fn on_placement(&mut self, event: &PlacementChanged) {
        match (&event.target_id, event.is_correct) {
            (Some(target), Some(correct)) => {
                log::info!("placed {} on {} (correct: {})", event.item_id, target, correct)
            }
            _ => log::info!("removed {}", event.item_id),
        }
    }

    fn on_miss(&mut self, event: &Miss) {
        log::info!("missed {}", event.item_id);
    }

    fn on_completion(&mut self, state: &CompletionState) {
        log::info!(
            "completed {}/{} with {} mistakes in {:.0} ms",
            state.correct_count,
            state.total_count,
            state.mistakes,
            state.time_spent_ms
        );
    }
}

/// Handle returned by `Session::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u32);

/// Subscribed ports, dispatched in subscription order
#[derive(Default)]
pub(crate) struct PortRegistry {
    ports: Vec<(SubscriptionId, Box<dyn FeedbackPort>)>,
    next_id: u32,
}

impl PortRegistry {
    pub fn subscribe(&mut self, port: Box<dyn FeedbackPort>) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.ports.push((id, port));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.ports.len();
        self.ports.retain(|(sid, _)| *sid != id);
        self.ports.len() != before
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// Deliver one event to every port, isolating panics per call
    pub fn dispatch(&mut self, event: &EngineEvent) {
        for (id, port) in &mut self.ports {
            let result = catch_unwind(AssertUnwindSafe(|| match event {
                EngineEvent::PlacementChanged(e) => port.on_placement(e),
                EngineEvent::Miss(e) => port.on_miss(e),
                EngineEvent::Completion(s) => port.on_completion(s),
            }));
            if result.is_err() {
                log::warn!(
                    "feedback port {} panicked handling {}; ignored",
                    id.0,
                    event.kind()
                );
            }
        }
    }
}
