//! Post-hoc review of a finished session: per-slide dwell time and summary stats.
//!
//! Everything here is a pure function over a borrowed [`SessionRecord`].

use std::collections::BTreeMap;

use crate::error::{HelmError, Result};
use crate::pacing::PacingState;
use crate::session::SessionRecord;
use crate::util::mean;

/// Slide index to cumulative seconds spent on it.
pub type SlideDwell = BTreeMap<u32, u64>;

/// Attribute each interval between consecutive samples to the slide being left.
pub fn dwell_times(record: &SessionRecord) -> Result<SlideDwell> {
    let mut dwell = SlideDwell::new();

    for (index, pair) in record.entries.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.elapsed_seconds < prev.elapsed_seconds {
            return Err(HelmError::CorruptRecord {
                index: index + 1,
                previous: prev.elapsed_seconds,
                current: next.elapsed_seconds,
            });
        }
        *dwell.entry(prev.slide).or_insert(0) += next.elapsed_seconds - prev.elapsed_seconds;
    }

    Ok(dwell)
}

/// Mean seconds per slide, `0.0` when nothing was attributed.
pub fn average_dwell(dwell: &SlideDwell) -> f64 {
    let values: Vec<f64> = dwell.values().map(|&secs| secs as f64).collect();
    mean(&values).unwrap_or(0.0)
}

/// Slide with the most dwell time; the lowest index wins a tie.
pub fn longest_slide(dwell: &SlideDwell) -> Option<(u32, u64)> {
    // ascending key order, so only a strictly larger value replaces the leader
    dwell.iter().fold(None, |best, (&slide, &secs)| match best {
        Some((_, top)) if top >= secs => best,
        _ => Some((slide, secs)),
    })
}

/// Number of samples that landed in each pacing state.
pub fn pacing_breakdown(record: &SessionRecord) -> BTreeMap<PacingState, usize> {
    let mut counts = BTreeMap::new();
    for entry in &record.entries {
        *counts.entry(entry.pacing).or_insert(0) += 1;
    }
    counts
}

/// Everything the log viewer shows for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub dwell: SlideDwell,
    pub average_dwell: f64,
    pub longest_slide: Option<(u32, u64)>,
    pub pacing: BTreeMap<PacingState, usize>,
    pub samples: usize,
    pub elapsed_seconds: u64,
    pub budget_seconds: u64,
}

impl SessionSummary {
    pub fn from_record(record: &SessionRecord) -> Result<Self> {
        let dwell = dwell_times(record)?;
        Ok(Self {
            average_dwell: average_dwell(&dwell),
            longest_slide: longest_slide(&dwell),
            pacing: pacing_breakdown(record),
            samples: record.entries.len(),
            elapsed_seconds: record.last_elapsed(),
            budget_seconds: u64::from(record.duration_minutes) * 60,
            dwell,
        })
    }

    /// Seconds spent past the time budget.
    pub fn overrun_seconds(&self) -> u64 {
        self.elapsed_seconds.saturating_sub(self.budget_seconds)
    }

    /// Share of samples classified as `state`, in `[0, 1]`.
    pub fn pacing_share(&self, state: PacingState) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        self.pacing.get(&state).copied().unwrap_or(0) as f64 / self.samples as f64
    }

    pub fn stats_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Average time per slide: {:.2}s",
            self.average_dwell
        )];
        if let Some((slide, secs)) = self.longest_slide {
            lines.push(format!("Longest on slide: {slide} ({secs}s)"));
        }
        lines
    }
}
