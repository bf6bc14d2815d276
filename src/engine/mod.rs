//! Placement engine module
//!
//! All interaction logic lives here. This module must stay framework-free:
//! - No rendering, DOM or animation dependencies
//! - Geometry only through `PositionProvider`
//! - Side effects only through `FeedbackPort`
//! - Stable iteration order (manifest order, insertion order)

pub mod completion;
pub mod events;
pub mod geometry;
pub mod manifest;
pub mod session;
pub mod snap;
pub mod store;

pub use completion::{CompletionDetector, CompletionState, Evaluation};
pub use events::{
    EngineEvent, EventLog, FeedbackCue, FeedbackPort, FnPort, LogPort, Miss, NoopPort,
    PlacementChanged, SubscriptionId,
};
pub use geometry::{ContainerRect, PositionProvider, StaticLayout, TargetGeometry, distance, to_local};
pub use manifest::{
    DraggableItem, DropTarget, ItemId, Manifest, ManifestDiagnostic, ManifestReport, SizeClass,
    TargetId, is_correct,
};
pub use session::{
    DragError, DragOutcome, ItemState, Session, SessionPhase, Snapshot, TargetRemoval,
    create_session,
};
pub use snap::{SnapCandidate, SnapHit, resolve};
pub use store::{Placement, PlacementStore};
