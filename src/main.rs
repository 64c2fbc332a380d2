use chrono::{NaiveDateTime, TimeDelta};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::info;
use ratatui::{backend::CrosstermBackend, Terminal};
use slidehelm::{
    analysis::SessionSummary,
    config::{ConfigStore, FileConfigStore},
    driver::{drive_session, DriverSettings},
    export::{write_dwell_csv, write_entries_csv},
    host::{PresentationHost, ScriptedHost, StatusFileHost},
    pacing::PacingState,
    runtime::{
        ChannelEventSource, Clock, CrosstermEventSource, FixedTicker, ManualClock, Runner,
        SystemClock,
    },
    session::{SessionRecord, LOG_TIME_FORMAT},
    store::LogStore,
    ui::{LineSurface, ReviewView, TerminalSurface},
    util::format_clock,
};
use std::{
    error::Error,
    fs,
    io::{self, stdin, Write},
    path::PathBuf,
    sync::mpsc,
    time::Duration,
};

/// presentation pacing coach with live hints and reviewable session logs
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "Tracks a live slideshow against a time budget, tells you whether you are on pace, and keeps a log of every session for later review."
)]
pub struct Cli {
    /// directory holding session logs (overrides the configured one)
    #[clap(long, global = true)]
    log_dir: Option<PathBuf>,

    /// config file to use instead of the default location
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// track a live slideshow whose position is published to a status file
    Run {
        /// presentation length in minutes [default: from config]
        #[clap(short = 'm', long)]
        minutes: Option<u32>,

        /// file an external bridge keeps updated with `current/total` of the slideshow
        #[clap(short = 's', long)]
        status_file: PathBuf,

        /// milliseconds between samples [default: from config]
        #[clap(long)]
        interval_ms: Option<u64>,

        /// command that starts the presentation program, e.g. `--launch soffice --show deck.odp`
        #[clap(long, num_args = 1.., allow_hyphen_values = true)]
        launch: Vec<String>,
    },

    /// replay a scripted slideshow against a simulated clock and save the log
    Simulate {
        /// script with one `current/total` line per tick; `end` stops the slideshow
        #[clap(long)]
        script: PathBuf,

        /// presentation length in minutes [default: from config]
        #[clap(short = 'm', long)]
        minutes: Option<u32>,

        /// simulated seconds between samples
        #[clap(long, default_value_t = 1)]
        step_secs: u32,

        /// simulated start time as `YYYY-MM-DD HH:MM:SS` [default: now]
        #[clap(long, value_parser = parse_log_time)]
        start: Option<NaiveDateTime>,

        /// do not print a status line per sample
        #[clap(short, long)]
        quiet: bool,
    },

    /// browse stored session logs
    Logs {
        #[clap(subcommand)]
        action: LogsCommand,
    },

    /// show or change saved defaults
    Config {
        #[clap(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum LogsCommand {
    /// list stored sessions, newest first
    List,

    /// summary statistics for a session (the latest one when NAME is omitted)
    Show {
        name: Option<String>,

        /// open an interactive chart of time spent per slide
        #[clap(long)]
        chart: bool,
    },

    /// delete a stored session
    Delete { name: String },

    /// write a session as CSV (the latest one when NAME is omitted)
    Export {
        name: Option<String>,

        /// output file [default: stdout]
        #[clap(short, long)]
        out: Option<PathBuf>,

        /// export per-slide dwell seconds instead of raw samples
        #[clap(long)]
        dwell: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// print the effective configuration
    Show,

    /// save new defaults; `--log-dir` given here is saved too
    Set {
        #[clap(short = 'm', long)]
        minutes: Option<u32>,

        #[clap(long)]
        interval_ms: Option<u64>,
    },
}

fn parse_log_time(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, LOG_TIME_FORMAT)
        .map_err(|e| format!("expected `YYYY-MM-DD HH:MM:SS`: {e}"))
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let config_store = cli
        .config
        .as_ref()
        .map(FileConfigStore::with_path)
        .unwrap_or_default();
    let mut config = config_store.load();
    let store = LogStore::new(
        cli.log_dir
            .clone()
            .unwrap_or_else(|| config.resolved_log_dir()),
    );

    match cli.command {
        Command::Run {
            minutes,
            status_file,
            interval_ms,
            launch,
        } => {
            let mut host = StatusFileHost::new(status_file).with_launch_command(launch);
            let interval = Duration::from_millis(interval_ms.unwrap_or(config.sample_interval_ms));
            run_live(
                &store,
                &mut host,
                minutes.unwrap_or(config.duration_minutes),
                interval,
            )
        }
        Command::Simulate {
            script,
            minutes,
            step_secs,
            start,
            quiet,
        } => {
            let text = fs::read_to_string(&script)?;
            let mut host =
                ScriptedHost::parse(&text).map_err(|e| format!("{}: {e}", script.display()))?;
            let clock = ManualClock::new(
                start.unwrap_or_else(|| SystemClock.now()),
                TimeDelta::seconds(i64::from(step_secs)),
            );

            // nothing ever sends, so every step is an immediate tick
            let (_, rx) = mpsc::channel();
            let runner = Runner::new(ChannelEventSource::new(rx), FixedTicker::new(Duration::ZERO));
            let out: Box<dyn Write> = if quiet {
                Box::new(io::sink())
            } else {
                Box::new(io::stdout())
            };
            let mut surface = LineSurface::new(out);

            let record = drive_session(
                &runner,
                &mut host,
                &clock,
                &mut surface,
                DriverSettings::new(minutes.unwrap_or(config.duration_minutes)),
            )?;
            finish(&store, record, clock.now())
        }
        Command::Logs { action } => match action {
            LogsCommand::List => {
                let logs = store.list()?;
                if logs.is_empty() {
                    println!("No session logs in {}", store.dir().display());
                }
                for log in logs {
                    println!("{}", log.describe());
                }
                Ok(())
            }
            LogsCommand::Show { name, chart } => {
                let path = pick_log(&store, name)?;
                let record = store.load(&path)?;
                let summary = SessionSummary::from_record(&record)?;
                let title = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if chart {
                    show_review(&title, &record, &summary)
                } else {
                    print_summary(&title, &record, &summary);
                    Ok(())
                }
            }
            LogsCommand::Delete { name } => {
                let path = store.resolve(&name);
                store.delete(&path)?;
                println!("Deleted {}", path.display());
                Ok(())
            }
            LogsCommand::Export { name, out, dwell } => {
                let path = pick_log(&store, name)?;
                let record = store.load(&path)?;
                let writer: Box<dyn Write> = match &out {
                    Some(file) => Box::new(fs::File::create(file)?),
                    None => Box::new(io::stdout()),
                };
                if dwell {
                    let summary = SessionSummary::from_record(&record)?;
                    write_dwell_csv(&summary.dwell, writer)?;
                } else {
                    write_entries_csv(&record, writer)?;
                }
                if let Some(file) = out {
                    eprintln!("Wrote {}", file.display());
                }
                Ok(())
            }
        },
        Command::Config { action } => {
            match action {
                ConfigCommand::Show => {}
                ConfigCommand::Set {
                    minutes,
                    interval_ms,
                } => {
                    if let Some(m) = minutes {
                        if m == 0 {
                            let mut cmd = Cli::command();
                            cmd.error(ErrorKind::InvalidValue, "minutes must be positive")
                                .exit();
                        }
                        config.duration_minutes = m;
                    }
                    if let Some(ms) = interval_ms {
                        config.sample_interval_ms = ms;
                    }
                    if let Some(dir) = cli.log_dir {
                        config.log_dir = Some(dir);
                    }
                    config_store.save(&config)?;
                    info!("config saved to {}", config_store.path().display());
                }
            }
            println!("config file: {}", config_store.path().display());
            println!("{}", serde_json::to_string_pretty(&config)?);
            println!("log dir: {}", config.resolved_log_dir().display());
            Ok(())
        }
    }
}

fn run_live<H: PresentationHost>(
    store: &LogStore,
    host: &mut H,
    minutes: u32,
    interval: Duration,
) -> Result<(), Box<dyn Error>> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    host.launch_host()?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut surface = TerminalSurface::new(Terminal::new(CrosstermBackend::new(stdout))?);
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::new(interval));

    let outcome = drive_session(
        &runner,
        host,
        &SystemClock,
        &mut surface,
        DriverSettings::new(minutes),
    );

    let mut terminal = surface.into_terminal();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    finish(store, outcome?, SystemClock.now())
}

/// Persist a finished session, if there is one, and print its summary.
fn finish(
    store: &LogStore,
    record: Option<SessionRecord>,
    created_at: NaiveDateTime,
) -> Result<(), Box<dyn Error>> {
    let Some(record) = record else {
        println!("Session ended before any samples were taken; nothing saved.");
        return Ok(());
    };

    let path = store.save(&record, created_at)?;
    let summary = SessionSummary::from_record(&record)?;
    let title = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    print_summary(&title, &record, &summary);
    println!("Saved {}", path.display());
    Ok(())
}

fn pick_log(store: &LogStore, name: Option<String>) -> Result<PathBuf, Box<dyn Error>> {
    match name {
        Some(name) => Ok(store.resolve(&name)),
        None => Ok(store
            .latest()?
            .map(|log| log.path)
            .ok_or("no session logs yet")?),
    }
}

fn print_summary(title: &str, record: &SessionRecord, summary: &SessionSummary) {
    println!(
        "{title} | {} min | {} slides",
        record.duration_minutes, record.slide_count
    );
    println!("Started: {}", record.start_time.format(LOG_TIME_FORMAT));
    println!(
        "Samples: {}, used {} of {}",
        summary.samples,
        format_clock(summary.elapsed_seconds),
        format_clock(summary.budget_seconds)
    );
    if summary.overrun_seconds() > 0 {
        println!("Over time by {}", format_clock(summary.overrun_seconds()));
    }
    for line in summary.stats_lines() {
        println!("{line}");
    }
    let pacing: Vec<String> = PacingState::ALL
        .iter()
        .filter(|state| summary.pacing.contains_key(*state))
        .map(|&state| format!("{state} {:.0}%", summary.pacing_share(state) * 100.0))
        .collect();
    if !pacing.is_empty() {
        println!("Pacing: {}", pacing.join(", "));
    }
    for (slide, secs) in &summary.dwell {
        println!("  slide {slide:>3}: {secs}s");
    }
}

fn show_review(
    title: &str,
    record: &SessionRecord,
    summary: &SessionSummary,
) -> Result<(), Box<dyn Error>> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = (|| -> io::Result<()> {
        loop {
            terminal.draw(|f| {
                f.render_widget(
                    ReviewView {
                        title,
                        record,
                        summary,
                    },
                    f.area(),
                )
            })?;
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter) {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(result?)
}
