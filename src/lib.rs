//! Placement Engine - drag-and-drop scoring for lesson mini-games
//!
//! Core modules:
//! - `engine`: Framework-free placement logic (geometry, snapping, store, completion, events)
//! - `profile`: Age-tuned session configuration
//! - `platform`: Browser/native platform abstraction (time)
//! - `wasm`: JavaScript host binding (wasm32 only)

pub mod engine;
pub mod platform;
pub mod profile;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use engine::{
    CompletionState, DragError, DragOutcome, DraggableItem, DropTarget, FeedbackPort, Manifest,
    Placement, Session, Snapshot, create_session,
};
pub use profile::{AgeBand, AgeProfile, FeedbackIntensity};

use glam::Vec2;

/// Engine configuration constants
pub mod consts {
    /// Snap tolerance (px) used when no profile overrides it
    pub const DEFAULT_SNAP_TOLERANCE: f32 = 100.0;
    /// Snap/return animation length handed to feedback ports
    pub const DEFAULT_ANIMATION_MS: u32 = 300;
    /// Containers narrower or shorter than this are treated as unmeasured
    pub const MIN_CONTAINER_EXTENT: f32 = 0.5;
}

/// True when both coordinates are finite (no NaN/inf from a bad pointer event)
#[inline]
pub fn is_finite_point(point: Vec2) -> bool {
    point.x.is_finite() && point.y.is_finite()
}
