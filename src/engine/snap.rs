//! Nearest-target snapping
//!
//! A drop snaps to the closest registered target, and only if the drop point
//! lies strictly inside that target's tolerance radius ("magnetic zone").

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::distance;

/// One target as seen by the resolver for a single drop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapCandidate<'a> {
    pub target_id: &'a str,
    pub center: Vec2,
    /// Effective tolerance radius (already resolved against overrides/profile)
    pub radius: f32,
}

/// Accepted snap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapHit {
    pub target_id: String,
    pub distance: f32,
}

/// Pick the nearest candidate and accept it if it is within its radius.
///
/// Candidates are scanned in registration order and the running best is only
/// replaced on a strictly smaller distance, so exact ties keep the earlier
/// target. Only the nearest candidate is tested against its radius; a farther
/// target with a larger zone does not win over a nearer one.
pub fn resolve(point: Vec2, candidates: &[SnapCandidate<'_>]) -> Option<SnapHit> {
    let mut best: Option<(&SnapCandidate<'_>, f32)> = None;

    for candidate in candidates {
        let d = distance(point, candidate.center);
        // NaN distances never compare less, so they can't become the best
        let replace = match best {
            Some((_, best_d)) => d < best_d,
            None => !d.is_nan(),
        };
        if replace {
            best = Some((candidate, d));
        }
    }

    let (candidate, d) = best?;
    if d < candidate.radius {
        Some(SnapHit {
            target_id: candidate.target_id.to_string(),
            distance: d,
        })
    } else {
        None
    }
}
