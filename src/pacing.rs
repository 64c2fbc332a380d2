use serde::{Deserialize, Serialize};

use crate::error::{HelmError, Result};

/// Slides of slack either side of the expected position that still count as on track.
pub const ON_TRACK_WINDOW: i64 = 3;
/// Beyond this many slides of deviation the presenter is "way" ahead or behind.
pub const WAY_OFF_WINDOW: i64 = 6;

/// How far the presenter's slide position deviates from the time-proportional one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    strum_macros::Display,
)]
pub enum PacingState {
    #[serde(rename = "way behind")]
    #[strum(serialize = "way behind")]
    WayBehind,
    #[serde(rename = "behind")]
    #[strum(serialize = "behind")]
    Behind,
    #[serde(rename = "on track")]
    #[strum(serialize = "on track")]
    OnTrack,
    #[serde(rename = "ahead")]
    #[strum(serialize = "ahead")]
    Ahead,
    #[serde(rename = "way ahead")]
    #[strum(serialize = "way ahead")]
    WayAhead,
}

impl PacingState {
    pub const ALL: [PacingState; 5] = [
        PacingState::WayBehind,
        PacingState::Behind,
        PacingState::OnTrack,
        PacingState::Ahead,
        PacingState::WayAhead,
    ];

    /// Classify `diff = current_slide - expected_slide`.
    pub fn classify(diff: i64) -> Self {
        match diff {
            d if d.abs() <= ON_TRACK_WINDOW => PacingState::OnTrack,
            d if d > WAY_OFF_WINDOW => PacingState::WayAhead,
            d if d > ON_TRACK_WINDOW => PacingState::Ahead,
            d if d >= -WAY_OFF_WINDOW => PacingState::Behind,
            _ => PacingState::WayBehind,
        }
    }
}

/// Slide the presenter should be on after `elapsed_seconds` of a
/// `duration_minutes` budget, always within `[1, total_slides]`.
///
/// Halfway values round to even: 2.5 lands on slide 2, 7.5 on slide 8.
pub fn expected_slide(elapsed_seconds: u64, duration_minutes: u32, total_slides: u32) -> Result<u32> {
    if total_slides == 0 {
        return Err(HelmError::InvalidConfiguration(
            "total slides must be positive".to_string(),
        ));
    }
    if duration_minutes == 0 {
        return Err(HelmError::InvalidConfiguration(
            "duration must be at least one minute".to_string(),
        ));
    }

    let budget_secs = f64::from(duration_minutes) * 60.0;
    let raw = (elapsed_seconds as f64 / budget_secs) * f64::from(total_slides);
    let rounded = raw.round_ties_even() as i64;

    Ok(rounded.clamp(1, i64::from(total_slides)) as u32)
}

/// Fraction of the deck shown so far, clamped to `[0, 1]`.
pub fn progress_ratio(current_slide: u32, total_slides: u32) -> f64 {
    if total_slides == 0 {
        return 0.0;
    }
    (f64::from(current_slide) / f64::from(total_slides)).clamp(0.0, 1.0)
}

/// Seconds left of the budget, never negative.
pub fn remaining_seconds(elapsed_seconds: u64, duration_minutes: u32) -> u64 {
    (u64::from(duration_minutes) * 60).saturating_sub(elapsed_seconds)
}
