pub mod charting;
pub mod screen;

use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use tapwise::comparator::{self, Verdict};
use tapwise::session::{Renderer, SessionSnapshot, SessionState, SessionSummary};
use tapwise::text::ReferenceText;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const TAB_WIDTH: usize = 4;

/// Keeps the most recent snapshot pushed by the session until the next frame.
#[derive(Clone, Debug, Default)]
pub struct SnapshotSlot(Rc<RefCell<Option<SessionSnapshot>>>);

impl SnapshotSlot {
    pub fn take(&self) -> Option<SessionSnapshot> {
        self.0.borrow_mut().take()
    }
}

impl Renderer for SnapshotSlot {
    fn render(&mut self, snapshot: &SessionSnapshot) {
        *self.0.borrow_mut() = Some(snapshot.clone());
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

fn verdict_style(verdict: Verdict) -> Style {
    match verdict {
        Verdict::Correct => bold().fg(Color::Green),
        Verdict::Incorrect => bold().fg(Color::Red),
        Verdict::Untyped => dim_bold(),
    }
}

struct Segment {
    verdict: Verdict,
    style: Style,
    range: Range<usize>,
}

/// Verdict runs, with the character under the cursor split out.
fn segments(verdicts: &[Verdict], cursor: Option<usize>) -> Vec<Segment> {
    let mut out = Vec::new();
    for run in comparator::verdict_runs(verdicts) {
        let Range { start, end } = run.range;
        if run.verdict == Verdict::Untyped && cursor == Some(start) {
            out.push(Segment {
                verdict: run.verdict,
                style: dim_bold().add_modifier(Modifier::UNDERLINED),
                range: start..start + 1,
            });
            if start + 1 < end {
                out.push(Segment {
                    verdict: run.verdict,
                    style: verdict_style(run.verdict),
                    range: start + 1..end,
                });
            }
        } else {
            out.push(Segment {
                verdict: run.verdict,
                style: verdict_style(run.verdict),
                range: start..end,
            });
        }
    }
    out
}

/// Colour the reference text by verdict. Newlines become line breaks
/// (with a visible marker so they can be typed), tabs are expanded.
pub fn prompt_lines(
    reference: &ReferenceText,
    verdicts: &[Verdict],
    cursor: Option<usize>,
) -> Vec<Line<'static>> {
    let chars = reference.chars();
    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();

    for segment in segments(verdicts, cursor) {
        let mut text = String::new();
        for &c in chars.get(segment.range.clone()).unwrap_or_default() {
            match c {
                '\n' => {
                    text.push('↵');
                    spans.push(Span::styled(std::mem::take(&mut text), segment.style));
                    lines.push(Line::from(std::mem::take(&mut spans)));
                }
                '\t' => text.push_str(&" ".repeat(TAB_WIDTH)),
                ' ' if segment.verdict == Verdict::Incorrect => text.push('·'),
                c => text.push(c),
            }
        }
        if !text.is_empty() {
            spans.push(Span::styled(text, segment.style));
        }
    }
    lines.push(Line::from(spans));
    lines
}

fn occupied_lines(reference: &ReferenceText, max_chars_per_line: u16) -> u16 {
    let max = usize::from(max_chars_per_line.max(1));
    reference
        .to_string()
        .split('\n')
        .map(|line| {
            let width = line.replace('\t', &" ".repeat(TAB_WIDTH)).width() + 1;
            width.div_ceil(max).max(1)
        })
        .sum::<usize>()
        .try_into()
        .unwrap_or(u16::MAX)
}

fn live_stats(snapshot: &SessionSnapshot) -> String {
    format!(
        "{} wpm   {}% acc   {} err",
        snapshot.metrics.words_per_minute,
        snapshot.metrics.accuracy_percent,
        snapshot.metrics.error_count
    )
}

/// The prompt while a session is idle or running.
pub struct TypingView<'a> {
    pub reference: &'a ReferenceText,
    pub snapshot: &'a SessionSnapshot,
    /// Show how to end a session that never finishes by itself.
    pub finish_hint: bool,
}

impl Widget for TypingView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2);
        let prompt_lines_needed = occupied_lines(self.reference, max_chars_per_line);
        let single_line = !self.reference.chars().contains(&'\n')
            && self.reference.to_string().width() < usize::from(max_chars_per_line);
        let padding = area.height.saturating_sub(prompt_lines_needed + 4) / 2;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(padding),
                Constraint::Length(2), // timer
                Constraint::Length(prompt_lines_needed),
                Constraint::Length(1), // padding
                Constraint::Length(1), // live stats
                Constraint::Min(0),
            ])
            .split(area);

        let cursor = match self.snapshot.state {
            SessionState::Finished => None,
            _ => Some(
                self.snapshot
                    .verdicts
                    .iter()
                    .take_while(|v| **v != Verdict::Untyped)
                    .count(),
            ),
        };

        Paragraph::new(prompt_lines(self.reference, &self.snapshot.verdicts, cursor))
            .alignment(if single_line {
                // short prompts read better centered
                Alignment::Center
            } else {
                Alignment::Left
            })
            .wrap(Wrap { trim: false })
            .render(chunks[2], buf);

        let clock = match self.snapshot.remaining {
            Some(remaining) => format!("{:.1}", remaining.as_secs_f64()),
            None => format!("{:.1}s", self.snapshot.elapsed.as_secs_f64()),
        };
        Paragraph::new(Span::styled(clock, dim_bold()))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        let mut status = match self.snapshot.state {
            SessionState::Idle => "start typing to begin".to_string(),
            _ => live_stats(self.snapshot),
        };
        if self.finish_hint && self.snapshot.state != SessionState::Finished {
            status.push_str("   (ctrl-d) finish");
        }
        Paragraph::new(Span::styled(status, dim_bold()))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }
}

/// WPM chart, final metrics and the key legend.
pub struct ResultsView<'a> {
    pub summary: &'a SessionSummary,
}

impl Widget for ResultsView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let summary = self.summary;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(1),    // chart
                Constraint::Length(1), // stats
                Constraint::Length(1), // details
                Constraint::Length(1), // padding
                Constraint::Length(1), // legend
            ])
            .split(area);

        let points: Vec<(f64, f64)> = summary
            .wpm_samples
            .iter()
            .copied()
            .map(Into::into)
            .collect();
        let (overall_duration, highest_wpm) =
            charting::compute_chart_params(&points, summary.elapsed.as_secs_f64());

        let datasets = vec![Dataset::default()
            .marker(ratatui::symbols::Marker::Braille)
            .style(Style::default().fg(Color::Magenta))
            .graph_type(GraphType::Line)
            .data(&points)];

        Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .title("seconds")
                    .bounds([1.0, overall_duration])
                    .labels(vec![
                        Span::styled("1", bold()),
                        Span::styled(charting::format_label(overall_duration), bold()),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title("wpm")
                    .bounds([0.0, highest_wpm])
                    .labels(vec![
                        Span::styled("0", bold()),
                        Span::styled(charting::format_label(highest_wpm), bold()),
                    ]),
            )
            .render(chunks[0], buf);

        Paragraph::new(Span::styled(
            format!(
                "{} wpm   {}% acc   {:.2} sd",
                summary.metrics.words_per_minute,
                summary.metrics.accuracy_percent,
                summary.consistency
            ),
            bold(),
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        Paragraph::new(Span::styled(
            format!(
                "{} mode   {} errors   {:.1}s",
                summary.mode,
                summary.metrics.error_count,
                summary.elapsed.as_secs_f64()
            ),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

        Paragraph::new(Span::styled(
            "(r)etry / (n)ew / (esc)ape",
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[4], buf);
    }
}
