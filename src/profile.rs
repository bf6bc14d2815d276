//! Age-tuned session profiles
//!
//! Selected once per session and never mutated by the engine.

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_ANIMATION_MS, DEFAULT_SNAP_TOLERANCE};

/// Errors loading host-provided configuration documents
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snap tolerance must be a positive finite number, got {0}")]
    InvalidTolerance(f32),
}

/// How loud/flashy host feedback should be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackIntensity {
    Subtle,
    #[default]
    Standard,
    Celebratory,
}

/// Learner age bands with recommended tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgeBand {
    /// 2-3 years
    Toddler,
    /// 4-5 years
    #[default]
    Preschool,
    /// 6-8 years
    Primary,
    /// 9 and up
    Older,
}

impl AgeBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeBand::Toddler => "Toddler",
            AgeBand::Preschool => "Preschool",
            AgeBand::Primary => "Primary",
            AgeBand::Older => "Older",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "toddler" => Some(AgeBand::Toddler),
            "preschool" | "pre-k" => Some(AgeBand::Preschool),
            "primary" | "early" => Some(AgeBand::Primary),
            "older" => Some(AgeBand::Older),
            _ => None,
        }
    }

    /// Magnetic zone size; small hands get big zones
    pub fn snap_tolerance(&self) -> f32 {
        match self {
            AgeBand::Toddler => 140.0,
            AgeBand::Preschool => DEFAULT_SNAP_TOLERANCE,
            AgeBand::Primary => 80.0,
            AgeBand::Older => 60.0,
        }
    }

    /// Snap/return animation length
    pub fn animation_duration_ms(&self) -> u32 {
        match self {
            AgeBand::Toddler => 500,
            AgeBand::Preschool => 400,
            AgeBand::Primary => DEFAULT_ANIMATION_MS,
            AgeBand::Older => 200,
        }
    }

    pub fn feedback_intensity(&self) -> FeedbackIntensity {
        match self {
            AgeBand::Toddler => FeedbackIntensity::Celebratory,
            AgeBand::Preschool => FeedbackIntensity::Celebratory,
            AgeBand::Primary => FeedbackIntensity::Standard,
            AgeBand::Older => FeedbackIntensity::Subtle,
        }
    }

    /// Whether misses should carry a hint toward the right target
    pub fn auto_complete_assist(&self) -> bool {
        matches!(self, AgeBand::Toddler | AgeBand::Preschool)
    }
}

/// Immutable per-session tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgeProfile {
    /// Tolerance radius for targets without their own override
    pub snap_tolerance_default: f32,
    /// Passed through to feedback ports
    pub animation_duration_ms: u32,
    pub feedback_intensity: FeedbackIntensity,
    /// Attach a hint target to miss events
    pub auto_complete_assist: bool,
}

impl Default for AgeProfile {
    fn default() -> Self {
        Self {
            snap_tolerance_default: DEFAULT_SNAP_TOLERANCE,
            animation_duration_ms: DEFAULT_ANIMATION_MS,
            feedback_intensity: FeedbackIntensity::Standard,
            auto_complete_assist: false,
        }
    }
}

impl AgeProfile {
    /// Recommended profile for an age band
    pub fn from_band(band: AgeBand) -> Self {
        Self {
            snap_tolerance_default: band.snap_tolerance(),
            animation_duration_ms: band.animation_duration_ms(),
            feedback_intensity: band.feedback_intensity(),
            auto_complete_assist: band.auto_complete_assist(),
        }
    }

    /// Default profile with a specific tolerance
    pub fn with_tolerance(snap_tolerance_default: f32) -> Self {
        Self {
            snap_tolerance_default,
            ..Self::default()
        }
    }

    /// Parse and validate a profile document; missing fields use defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.snap_tolerance_default;
        if !t.is_finite() || t <= 0.0 {
            return Err(ConfigError::InvalidTolerance(t));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_round_trip_names() {
        for band in [AgeBand::Toddler, AgeBand::Preschool, AgeBand::Primary, AgeBand::Older] {
            assert_eq!(AgeBand::from_str(band.as_str()), Some(band));
        }
        assert_eq!(AgeBand::from_str("PRE-K"), Some(AgeBand::Preschool));
        assert_eq!(AgeBand::from_str("teen"), None);
    }

    #[test]
    fn test_younger_bands_get_bigger_zones() {
        assert!(AgeBand::Toddler.snap_tolerance() > AgeBand::Preschool.snap_tolerance());
        assert!(AgeBand::Primary.snap_tolerance() > AgeBand::Older.snap_tolerance());
        assert!(AgeProfile::from_band(AgeBand::Toddler).auto_complete_assist);
        assert!(!AgeProfile::from_band(AgeBand::Older).auto_complete_assist);
    }

    #[test]
    fn test_from_json_partial_fills_defaults() {
        let profile = AgeProfile::from_json(r#"{"snapToleranceDefault": 75.0}"#).unwrap();
        assert_eq!(profile.snap_tolerance_default, 75.0);
        assert_eq!(profile.animation_duration_ms, DEFAULT_ANIMATION_MS);
        assert_eq!(profile.feedback_intensity, FeedbackIntensity::Standard);

        let profile = AgeProfile::from_json(r#"{"feedbackIntensity": "celebratory"}"#).unwrap();
        assert_eq!(profile.feedback_intensity, FeedbackIntensity::Celebratory);
        assert_eq!(profile.snap_tolerance_default, DEFAULT_SNAP_TOLERANCE);
    }

    #[test]
    fn test_from_json_rejects_bad_tolerance() {
        assert!(matches!(
            AgeProfile::from_json(r#"{"snapToleranceDefault": 0}"#),
            Err(ConfigError::InvalidTolerance(_))
        ));
        assert!(matches!(AgeProfile::from_json("[]"), Err(ConfigError::Json(_))));
    }
}
