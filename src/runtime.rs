use std::cell::Cell;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use chrono::{Local, NaiveDateTime, TimeDelta};
use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEventKind, KeyModifiers};

/// Unified event type consumed by the session driver
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriverEvent {
    /// The presenter asked to finish the session.
    EndRequested,
    Resize,
    Tick,
}

/// Source of presenter-side events (end signal, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<DriverEvent, RecvTimeoutError>;
}

/// Production event source using crossterm. Esc, `q` and Ctrl-C end the session.
pub struct CrosstermEventSource {
    rx: Receiver<DriverEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let ev = match event::read() {
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => match key.code {
                    KeyCode::Esc | KeyCode::Char('q') => Some(DriverEvent::EndRequested),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        Some(DriverEvent::EndRequested)
                    }
                    _ => None,
                },
                Ok(CtEvent::Resize(_, _)) => Some(DriverEvent::Resize),
                Ok(_) => None,
                Err(_) => break,
            };
            if let Some(ev) = ev {
                if tx.send(ev).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DriverEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Event source fed from a channel, for tests and simulated runs
pub struct ChannelEventSource {
    rx: Receiver<DriverEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<DriverEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DriverEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the driver one event/tick at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn interval(&self) -> Duration {
        self.ticker.interval()
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> DriverEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                DriverEvent::Tick
            }
        }
    }
}

/// Wall-clock time as seen by the driver.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Starts at a fixed instant and moves forward by `step` on every read.
#[derive(Debug)]
pub struct ManualClock {
    current: Cell<NaiveDateTime>,
    step: TimeDelta,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime, step: TimeDelta) -> Self {
        Self {
            current: Cell::new(start),
            step,
        }
    }

    /// Instant the next `now()` will return.
    pub fn peek(&self) -> NaiveDateTime {
        self.current.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        let t = self.current.get();
        self.current.set(t + self.step);
        t
    }
}
