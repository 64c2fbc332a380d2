//! The presentation program we observe but do not control.

use log::{debug, info};
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Live position of an active slideshow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostPosition {
    pub current_slide: u32,
    pub total_slides: u32,
}

impl HostPosition {
    pub fn new(current_slide: u32, total_slides: u32) -> Self {
        Self {
            current_slide,
            total_slides,
        }
    }

    /// Parse `current/total`, e.g. `4/20`.
    pub fn parse(text: &str) -> Option<Self> {
        let (current, total) = text.trim().split_once('/')?;
        Some(Self::new(current.trim().parse().ok()?, total.trim().parse().ok()?))
    }
}

/// Capability the driver needs from a presentation program.
pub trait PresentationHost {
    /// Current position, or `None` when no slideshow is running.
    fn poll_host(&mut self) -> Option<HostPosition>;

    /// Bring the presentation program up. Hosts that cannot launch anything succeed
    /// without doing work.
    fn launch_host(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Replays a fixed list of poll results, then reports no slideshow.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHost {
    steps: VecDeque<Option<HostPosition>>,
}

impl ScriptedHost {
    pub fn new<I: IntoIterator<Item = Option<HostPosition>>>(steps: I) -> Self {
        Self {
            steps: steps.into_iter().collect(),
        }
    }

    /// One poll result per line: `current/total`, or `end` for no slideshow.
    /// Blank lines and `#` comments are ignored.
    pub fn parse(script: &str) -> Result<Self, String> {
        let mut steps = VecDeque::new();
        for (lineno, line) in script.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.eq_ignore_ascii_case("end") {
                steps.push_back(None);
                continue;
            }
            match HostPosition::parse(line) {
                Some(pos) => steps.push_back(Some(pos)),
                None => return Err(format!("line {}: expected `n/total`, got `{line}`", lineno + 1)),
            }
        }
        Ok(Self { steps })
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl PresentationHost for ScriptedHost {
    fn poll_host(&mut self) -> Option<HostPosition> {
        self.steps.pop_front().flatten()
    }
}

/// Reads `current/total` from a status file kept up to date by an external
/// bridge to the presentation program.
#[derive(Debug)]
pub struct StatusFileHost {
    path: PathBuf,
    launch: Option<Vec<String>>,
}

impl StatusFileHost {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            launch: None,
        }
    }

    /// Command (program followed by its arguments) spawned by `launch_host`.
    pub fn with_launch_command(mut self, argv: Vec<String>) -> Self {
        self.launch = Some(argv).filter(|a| !a.is_empty());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PresentationHost for StatusFileHost {
    fn poll_host(&mut self) -> Option<HostPosition> {
        let text = fs::read_to_string(&self.path).ok()?;
        let pos = HostPosition::parse(&text);
        if pos.is_none() {
            debug!("no slideshow in {}", self.path.display());
        }
        pos.filter(|p| p.total_slides > 0)
    }

    fn launch_host(&mut self) -> io::Result<()> {
        let Some((program, args)) = self.launch.as_ref().and_then(|a| a.split_first()) else {
            return Ok(());
        };
        info!("launching presentation program: {program}");
        // detached: the program outlives the session
        Command::new(program).args(args).spawn()?;
        Ok(())
    }
}
