//! The scheduling loop that connects a presentation host, the session tracker and
//! a presenter surface.

use std::io;

use log::{debug, info, warn};
use thiserror::Error;

use crate::error::HelmError;
use crate::host::PresentationHost;
use crate::runtime::{Clock, DriverEvent, EventSource, Runner, Ticker};
use crate::session::{PresenterSnapshot, SessionRecord, SessionTracker};

/// Number of polls spent waiting for a slideshow before giving up.
pub const DEFAULT_STARTUP_ATTEMPTS: u32 = 10;

/// Anything that can show the presenter the current state.
pub trait PresenterSurface {
    fn render(&mut self, snapshot: &PresenterSnapshot) -> io::Result<()>;

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("no active slideshow after {0} attempts; start the slideshow and try again")]
    NoSlideshow(u32),

    #[error(transparent)]
    Engine(#[from] HelmError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverSettings {
    pub duration_minutes: u32,
    pub startup_attempts: u32,
}

impl DriverSettings {
    pub fn new(duration_minutes: u32) -> Self {
        Self {
            duration_minutes,
            startup_attempts: DEFAULT_STARTUP_ATTEMPTS,
        }
    }
}

/// Run one session to completion.
///
/// Waits for the host to report a slideshow, starts the tracker with the slide
/// count seen then, and samples once per tick until the slideshow goes away or
/// the presenter asks to end. Returns the record to persist, if any.
pub fn drive_session<E, T, H, C, S>(
    runner: &Runner<E, T>,
    host: &mut H,
    clock: &C,
    surface: &mut S,
    settings: DriverSettings,
) -> Result<Option<SessionRecord>, DriveError>
where
    E: EventSource,
    T: Ticker,
    H: PresentationHost + ?Sized,
    C: Clock + ?Sized,
    S: PresenterSurface + ?Sized,
{
    let mut tracker = SessionTracker::new();

    let mut attempts = 0;
    let total_slides = loop {
        attempts += 1;
        if let Some(pos) = host.poll_host() {
            break pos.total_slides;
        }
        if attempts >= settings.startup_attempts {
            return Err(DriveError::NoSlideshow(attempts));
        }
        debug!("waiting for slideshow (attempt {attempts})");
        if runner.step() == DriverEvent::EndRequested {
            info!("session cancelled before the slideshow started");
            return Ok(None);
        }
    };

    tracker.start(settings.duration_minutes, total_slides, clock.now())?;

    let mut last: Option<PresenterSnapshot> = None;
    let mut drift_reported = false;
    loop {
        match runner.step() {
            DriverEvent::Tick => {
                let Some(pos) = host.poll_host() else {
                    info!("slideshow closed, ending session");
                    break;
                };
                if pos.total_slides != total_slides && !drift_reported {
                    warn!(
                        "slide count changed from {total_slides} to {} mid-session; \
                         pacing keeps using {total_slides}",
                        pos.total_slides
                    );
                    drift_reported = true;
                }

                let event = tracker.sample(pos.current_slide, clock.now())?;
                if let Some(session) = tracker.session() {
                    let snapshot = session.snapshot(&event)?;
                    show(surface, &snapshot);
                    last = Some(snapshot);
                }
            }
            DriverEvent::Resize => {
                if let Some(snapshot) = &last {
                    show(surface, snapshot);
                }
            }
            DriverEvent::EndRequested => {
                info!("presenter ended the session");
                break;
            }
        }
    }

    if let Err(e) = surface.close() {
        warn!("closing presenter surface failed: {e}");
    }
    Ok(tracker.end(clock.now()))
}

fn show<S: PresenterSurface + ?Sized>(surface: &mut S, snapshot: &PresenterSnapshot) {
    if let Err(e) = surface.render(snapshot) {
        warn!("presenter surface failed to render: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostPosition, ScriptedHost};
    use crate::pacing::PacingState;
    use crate::runtime::{ChannelEventSource, FixedTicker, ManualClock};
    use assert_matches::assert_matches;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
    use std::sync::mpsc;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSurface {
        frames: Vec<PresenterSnapshot>,
        closed: bool,
    }

    impl PresenterSurface for RecordingSurface {
        fn render(&mut self, snapshot: &PresenterSnapshot) -> io::Result<()> {
            self.frames.push(*snapshot);
            Ok(())
        }

        fn close(&mut self) -> io::Result<()> {
            self.closed = true;
            Ok(())
        }
    }

    struct BrokenSurface;

    impl PresenterSurface for BrokenSurface {
        fn render(&mut self, _: &PresenterSnapshot) -> io::Result<()> {
            Err(io::Error::other("display unplugged"))
        }
    }

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 9, 9)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn fast_runner() -> (mpsc::Sender<DriverEvent>, Runner<ChannelEventSource, FixedTicker>) {
        let (tx, rx) = mpsc::channel();
        let runner = Runner::new(
            ChannelEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );
        (tx, runner)
    }

    fn positions(slides: &[u32], total: u32) -> Vec<Option<HostPosition>> {
        slides
            .iter()
            .map(|&s| Some(HostPosition::new(s, total)))
            .collect()
    }

    #[test]
    fn session_ends_when_slideshow_closes() {
        let (_tx, runner) = fast_runner();
        let mut host = ScriptedHost::new(positions(&[1, 1, 2, 3], 4));
        let clock = ManualClock::new(t0(), TimeDelta::seconds(15));
        let mut surface = RecordingSurface::default();

        let record = drive_session(&runner, &mut host, &clock, &mut surface, DriverSettings::new(1))
            .unwrap()
            .unwrap();

        assert_eq!(record.start_time, t0());
        assert_eq!(record.slide_count, 4);
        assert_eq!(record.duration_minutes, 1);
        let samples: Vec<(u64, u32)> = record
            .entries
            .iter()
            .map(|e| (e.elapsed_seconds, e.slide))
            .collect();
        assert_eq!(samples, vec![(15, 1), (30, 2), (45, 3)]);
        assert_eq!(surface.frames.len(), 3);
        assert_eq!(surface.frames[2].remaining_seconds, 15);
        assert!(surface.closed);
    }

    #[test]
    fn end_request_stops_sampling() {
        let (tx, runner) = fast_runner();
        let mut host = ScriptedHost::new(positions(&[1; 50], 10));
        let clock = ManualClock::new(t0(), TimeDelta::seconds(1));
        let mut surface = RecordingSurface::default();

        tx.send(DriverEvent::Resize).unwrap();
        tx.send(DriverEvent::EndRequested).unwrap();
        let record =
            drive_session(&runner, &mut host, &clock, &mut surface, DriverSettings::new(5))
                .unwrap();

        // resize before any sample renders nothing; the end request wins before a tick
        assert!(record.is_none());
        assert!(surface.frames.is_empty());
        assert!(surface.closed);
    }

    #[test]
    fn gives_up_without_slideshow() {
        let (_tx, runner) = fast_runner();
        let mut host = ScriptedHost::default();
        let clock = ManualClock::new(t0(), TimeDelta::seconds(1));
        let mut surface = RecordingSurface::default();
        let settings = DriverSettings {
            duration_minutes: 5,
            startup_attempts: 3,
        };

        let result = drive_session(&runner, &mut host, &clock, &mut surface, settings);
        assert_matches!(result, Err(DriveError::NoSlideshow(3)));
    }

    #[test]
    fn waits_for_slideshow_to_appear() {
        let (_tx, runner) = fast_runner();
        let mut steps = vec![None, None];
        steps.extend(positions(&[1, 2], 2));
        let mut host = ScriptedHost::new(steps);
        let clock = ManualClock::new(t0(), TimeDelta::seconds(30));
        let mut surface = RecordingSurface::default();

        let record = drive_session(&runner, &mut host, &clock, &mut surface, DriverSettings::new(1))
            .unwrap()
            .unwrap();
        assert_eq!(record.entries.len(), 1);
        assert_eq!(record.entries[0].slide, 2);
        assert_eq!(record.entries[0].pacing, PacingState::OnTrack);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let (_tx, runner) = fast_runner();
        let mut host = ScriptedHost::new(positions(&[1, 2], 2));
        let clock = ManualClock::new(t0(), TimeDelta::seconds(1));
        let mut surface = RecordingSurface::default();

        let result = drive_session(&runner, &mut host, &clock, &mut surface, DriverSettings::new(0));
        assert_matches!(
            result,
            Err(DriveError::Engine(HelmError::InvalidConfiguration(_)))
        );
    }

    #[test]
    fn slide_count_drift_keeps_start_value() {
        let (_tx, runner) = fast_runner();
        let mut host = ScriptedHost::new([
            Some(HostPosition::new(1, 10)),
            Some(HostPosition::new(2, 10)),
            Some(HostPosition::new(3, 12)),
        ]);
        let clock = ManualClock::new(t0(), TimeDelta::seconds(60));
        let mut surface = RecordingSurface::default();

        let record = drive_session(&runner, &mut host, &clock, &mut surface, DriverSettings::new(10))
            .unwrap()
            .unwrap();
        assert_eq!(record.slide_count, 10);
        assert!(surface.frames.iter().all(|f| f.total_slides == 10));
    }

    #[test]
    fn render_failures_do_not_lose_the_session() {
        let (_tx, runner) = fast_runner();
        let mut host = ScriptedHost::new(positions(&[1, 1, 2], 2));
        let clock = ManualClock::new(t0(), TimeDelta::seconds(1));

        let record = drive_session(&runner, &mut host, &clock, &mut BrokenSurface, DriverSettings::new(1))
            .unwrap()
            .unwrap();
        assert_eq!(record.entries.len(), 2);
    }
}
