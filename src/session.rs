use chrono::{NaiveDateTime, SubsecRound};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{HelmError, Result};
use crate::pacing::{self, PacingState};

/// Wall-clock format used for every timestamp in a session log.
pub const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serde adapter writing `NaiveDateTime` as `YYYY-MM-DD HH:MM:SS`.
pub mod log_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::LOG_TIME_FORMAT;

    pub fn serialize<S: Serializer>(t: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format(LOG_TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, LOG_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// One periodic observation of elapsed time and slide position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleEvent {
    #[serde(with = "log_time")]
    pub timestamp: NaiveDateTime,
    pub elapsed_seconds: u64,
    pub slide: u32,
    pub pacing: PacingState,
}

/// The persisted, read-only form of a completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(with = "log_time")]
    pub start_time: NaiveDateTime,
    pub duration_minutes: u32,
    pub slide_count: u32,
    pub entries: Vec<SampleEvent>,
}

impl SessionRecord {
    /// Elapsed seconds at the last sample, or zero for an empty log.
    pub fn last_elapsed(&self) -> u64 {
        self.entries.last().map_or(0, |e| e.elapsed_seconds)
    }
}

/// What the presenter surface shows after each sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresenterSnapshot {
    pub remaining_seconds: u64,
    pub elapsed_seconds: u64,
    pub current_slide: u32,
    pub total_slides: u32,
    pub expected_slide: u32,
    pub progress_ratio: f64,
    pub pacing: PacingState,
}

/// One timed presentation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    start_time: NaiveDateTime,
    duration_minutes: u32,
    total_slides: u32,
    entries: Vec<SampleEvent>,
}

impl Session {
    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    pub fn total_slides(&self) -> u32 {
        self.total_slides
    }

    pub fn entries(&self) -> &[SampleEvent] {
        &self.entries
    }

    pub fn budget_seconds(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }

    /// Build the presenter view of `event`.
    pub fn snapshot(&self, event: &SampleEvent) -> Result<PresenterSnapshot> {
        Ok(PresenterSnapshot {
            remaining_seconds: pacing::remaining_seconds(
                event.elapsed_seconds,
                self.duration_minutes,
            ),
            elapsed_seconds: event.elapsed_seconds,
            current_slide: event.slide,
            total_slides: self.total_slides,
            expected_slide: pacing::expected_slide(
                event.elapsed_seconds,
                self.duration_minutes,
                self.total_slides,
            )?,
            progress_ratio: pacing::progress_ratio(event.slide, self.total_slides),
            pacing: event.pacing,
        })
    }

    fn to_record(&self) -> SessionRecord {
        SessionRecord {
            start_time: self.start_time.trunc_subsecs(0),
            duration_minutes: self.duration_minutes,
            slide_count: self.total_slides,
            entries: self.entries.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TrackerState {
    #[strum(serialize = "idle")]
    Idle,
    #[strum(serialize = "running")]
    Running,
    #[strum(serialize = "ended")]
    Ended,
}

/// Drives a single session through `Idle -> Running -> Ended`.
///
/// Not meant for concurrent use: one control flow owns start, sample and end.
#[derive(Debug)]
pub struct SessionTracker {
    state: TrackerState,
    session: Option<Session>,
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTracker {
    pub fn new() -> Self {
        Self {
            state: TrackerState::Idle,
            session: None,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TrackerState::Running
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn start(
        &mut self,
        duration_minutes: u32,
        total_slides: u32,
        now: NaiveDateTime,
    ) -> Result<&Session> {
        if self.state != TrackerState::Idle {
            return Err(HelmError::InvalidTransition {
                operation: "start",
                state: self.state,
            });
        }
        if duration_minutes == 0 {
            return Err(HelmError::InvalidConfiguration(
                "duration must be at least one minute".to_string(),
            ));
        }
        if total_slides == 0 {
            return Err(HelmError::InvalidConfiguration(
                "presentation has no slides".to_string(),
            ));
        }

        info!("session started: {duration_minutes} min budget, {total_slides} slides");
        self.state = TrackerState::Running;
        Ok(&*self.session.insert(Session {
            start_time: now,
            duration_minutes,
            total_slides,
            entries: Vec::new(),
        }))
    }

    pub fn sample(&mut self, current_slide: u32, now: NaiveDateTime) -> Result<SampleEvent> {
        let session = match (self.state, self.session.as_mut()) {
            (TrackerState::Running, Some(session)) => session,
            (state, _) => {
                return Err(HelmError::InvalidTransition {
                    operation: "sample",
                    state,
                })
            }
        };

        let since_start = (now - session.start_time).num_seconds().max(0) as u64;
        let floor = session.entries.last().map_or(0, |e| e.elapsed_seconds);
        if since_start < floor {
            warn!("clock moved backwards ({since_start}s < {floor}s), holding elapsed time");
        }
        let elapsed_seconds = since_start.max(floor);

        let expected = pacing::expected_slide(
            elapsed_seconds,
            session.duration_minutes,
            session.total_slides,
        )?;
        let diff = i64::from(current_slide) - i64::from(expected);
        let event = SampleEvent {
            timestamp: now.trunc_subsecs(0),
            elapsed_seconds,
            slide: current_slide,
            pacing: PacingState::classify(diff),
        };
        debug!(
            "sample at {elapsed_seconds}s: slide {current_slide}, expected {expected}, {}",
            event.pacing
        );

        session.entries.push(event);
        Ok(event)
    }

    /// Finish the session. Returns a record only the first time and only when
    /// something was sampled.
    pub fn end(&mut self, now: NaiveDateTime) -> Option<SessionRecord> {
        if self.state != TrackerState::Running {
            return None;
        }
        self.state = TrackerState::Ended;

        let session = self.session.as_ref()?;
        let wall_secs = (now - session.start_time).num_seconds().max(0);
        if session.entries.is_empty() {
            info!("session ended after {wall_secs}s with no samples, nothing to keep");
            return None;
        }
        info!(
            "session ended after {wall_secs}s with {} samples",
            session.entries.len()
        );
        Some(session.to_record())
    }
}
