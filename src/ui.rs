use std::io::{self, Write};

use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Gauge, Paragraph, Widget, Wrap},
    Terminal,
};

use crate::{
    analysis::SessionSummary,
    driver::PresenterSurface,
    pacing::PacingState,
    session::{PresenterSnapshot, SessionRecord, LOG_TIME_FORMAT},
    util::format_clock,
};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

pub fn pacing_message(pacing: PacingState) -> &'static str {
    match pacing {
        PacingState::OnTrack => "You're on track!",
        PacingState::Ahead => "You're ahead - consider slowing down.",
        PacingState::WayAhead => "You're well ahead - consider pacing yourself.",
        PacingState::Behind => "You're falling behind - pick up the pace.",
        PacingState::WayBehind => "You're well behind - consider skipping less critical slides.",
    }
}

pub fn pacing_color(pacing: PacingState) -> Color {
    match pacing {
        PacingState::OnTrack => Color::Green,
        PacingState::Ahead | PacingState::WayAhead => Color::Blue,
        PacingState::Behind => Color::Yellow,
        PacingState::WayBehind => Color::Red,
    }
}

/// Compact live view: time left, slide position, pacing hint and a progress bar.
pub struct OverlayView<'a> {
    pub snapshot: &'a PresenterSnapshot,
}

impl Widget for OverlayView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let snap = self.snapshot;
        let bold_style = Style::default().add_modifier(Modifier::BOLD);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(1), // status
                Constraint::Length(1), // pacing hint
                Constraint::Length(1), // progress
                Constraint::Min(0),
            ])
            .split(area);

        let status = Paragraph::new(Line::from(vec![
            Span::styled(
                format!("Time left: {}", format_clock(snap.remaining_seconds)),
                bold_style,
            ),
            Span::raw("   "),
            Span::styled(
                format!("Slide {} / {}", snap.current_slide, snap.total_slides),
                bold_style,
            ),
            Span::styled(
                format!("   (target {})", snap.expected_slide),
                Style::default().add_modifier(Modifier::DIM),
            ),
        ]));
        status.render(chunks[0], buf);

        let hint = Paragraph::new(Span::styled(
            pacing_message(snap.pacing),
            Style::default()
                .patch(bold_style)
                .fg(pacing_color(snap.pacing)),
        ));
        hint.render(chunks[1], buf);

        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(pacing_color(snap.pacing)))
            .ratio(snap.progress_ratio)
            .label(format!("{:.0}%", snap.progress_ratio * 100.0));
        gauge.render(chunks[2], buf);
    }
}

/// Post-session review: per-slide dwell chart plus the summary numbers.
pub struct ReviewView<'a> {
    pub title: &'a str,
    pub record: &'a SessionRecord,
    pub summary: &'a SessionSummary,
}

impl Widget for ReviewView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let summary = self.summary;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Min(3),    // chart
                Constraint::Length(2), // stats
                Constraint::Length(1), // pacing breakdown
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Line::from(vec![
            Span::styled(self.title, bold_style),
            Span::styled(
                format!(
                    "   started {}   budget {}   used {}",
                    self.record.start_time.format(LOG_TIME_FORMAT),
                    format_clock(summary.budget_seconds),
                    format_clock(summary.elapsed_seconds),
                ),
                dim_style,
            ),
        ]))
        .render(chunks[0], buf);

        if summary.dwell.is_empty() {
            Paragraph::new("Not enough samples to chart slide times.")
                .alignment(Alignment::Center)
                .style(dim_style)
                .block(Block::bordered().title("Slide Time Breakdown"))
                .render(chunks[1], buf);
        } else {
            let longest = summary.longest_slide.map(|(slide, _)| slide);
            let bars: Vec<Bar> = summary
                .dwell
                .iter()
                .map(|(&slide, &secs)| {
                    let style = if Some(slide) == longest {
                        Style::default().fg(Color::Magenta)
                    } else {
                        Style::default().fg(Color::Cyan)
                    };
                    Bar::default()
                        .value(secs)
                        .label(Line::from(slide.to_string()))
                        .style(style)
                })
                .collect();

            BarChart::default()
                .block(Block::bordered().title("Slide Time Breakdown (seconds per slide)"))
                .data(BarGroup::default().bars(&bars))
                .bar_width(3)
                .bar_gap(1)
                .render(chunks[1], buf);
        }

        let stats: Vec<Line> = summary
            .stats_lines()
            .into_iter()
            .map(|l| Line::from(Span::styled(l, bold_style)))
            .collect();
        Paragraph::new(stats).render(chunks[2], buf);

        let breakdown: Vec<Span> = PacingState::ALL
            .iter()
            .filter(|state| summary.pacing.contains_key(*state))
            .flat_map(|&state| {
                [
                    Span::styled(
                        format!("{state} {:.0}%", summary.pacing_share(state) * 100.0),
                        Style::default().fg(pacing_color(state)),
                    ),
                    Span::raw("   "),
                ]
            })
            .collect();
        Paragraph::new(Line::from(breakdown))
            .wrap(Wrap { trim: true })
            .render(chunks[3], buf);

        Paragraph::new(Span::styled("(q)uit", Style::default().add_modifier(Modifier::ITALIC)))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }
}

/// Presenter surface drawing the overlay into a ratatui terminal.
pub struct TerminalSurface<B: Backend> {
    terminal: Terminal<B>,
}

impl<B: Backend> TerminalSurface<B> {
    pub fn new(terminal: Terminal<B>) -> Self {
        Self { terminal }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn into_terminal(self) -> Terminal<B> {
        self.terminal
    }
}

impl<B: Backend> PresenterSurface for TerminalSurface<B> {
    fn render(&mut self, snapshot: &PresenterSnapshot) -> io::Result<()> {
        self.terminal
            .draw(|f| f.render_widget(OverlayView { snapshot }, f.area()))?;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.terminal.clear()
    }
}

/// Presenter surface printing one status line per sample, for non-interactive runs.
pub struct LineSurface<W: Write> {
    out: W,
}

impl<W: Write> LineSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn status_line(snap: &PresenterSnapshot) -> String {
    format!(
        "[{} left] slide {}/{} (target {}) {:>3.0}% {}",
        format_clock(snap.remaining_seconds),
        snap.current_slide,
        snap.total_slides,
        snap.expected_slide,
        snap.progress_ratio * 100.0,
        snap.pacing
    )
}

impl<W: Write> PresenterSurface for LineSurface<W> {
    fn render(&mut self, snapshot: &PresenterSnapshot) -> io::Result<()> {
        writeln!(self.out, "{}", status_line(snapshot))
    }

    fn close(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
