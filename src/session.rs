use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::comparator::{self, Verdict};
use crate::metrics::MetricsSnapshot;
use crate::policy::{EditProposal, EditRejection, Mode, ModePolicy, Progress};
use crate::text::{ReferenceText, TypedInput};
use crate::time_series::{TimeSeriesPoint, WpmSeries};
use crate::timer::{TickSignal, TimerController};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Running,
    Finished,
}

/// Read-only view of a session, pushed to the renderer after every
/// accepted event.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub verdicts: Vec<Verdict>,
    pub metrics: MetricsSnapshot,
    pub elapsed: Duration,
    pub remaining: Option<Duration>,
}

/// Receives snapshots; knows nothing about the session itself.
pub trait Renderer {
    fn render(&mut self, snapshot: &SessionSnapshot);
}

/// Final results, fixed when the session finishes.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSummary {
    pub mode: Mode,
    pub metrics: MetricsSnapshot,
    pub elapsed: Duration,
    pub wpm_samples: Vec<TimeSeriesPoint>,
    pub consistency: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EditOutcome {
    Accepted,
    /// The edit was accepted and finished the session.
    Completed(SessionSummary),
    /// The policy refused the edit; nothing changed.
    Rejected(EditRejection),
    /// The session is not running.
    Ignored,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    Advanced,
    Completed(SessionSummary),
    Ignored,
}

/// One typing test: a reference text, the input typed against it, a clock
/// and the rules of the selected mode.
///
/// Events are processed synchronously through `&mut self`, so a session
/// never sees overlapping updates. Once finished it is frozen: later edits
/// and ticks are no-ops.
pub struct TypingSession {
    reference: ReferenceText,
    policy: ModePolicy,
    input: TypedInput,
    timer: TimerController,
    state: SessionState,
    metrics: MetricsSnapshot,
    series: WpmSeries,
    summary: Option<SessionSummary>,
    renderer: Option<Box<dyn Renderer>>,
}

impl TypingSession {
    pub fn new(reference: ReferenceText, policy: ModePolicy) -> Self {
        Self {
            timer: TimerController::new(policy.duration()),
            reference,
            policy,
            input: TypedInput::new(),
            state: SessionState::Idle,
            metrics: MetricsSnapshot::initial(),
            series: WpmSeries::new(),
            summary: None,
            renderer: None,
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn start(&mut self) {
        if self.state != SessionState::Idle {
            return;
        }
        self.timer.start();
        self.state = SessionState::Running;
        info!(
            mode = %self.policy.mode(),
            chars = self.reference.len(),
            "session started"
        );
        // a zero-length clock is exhausted before any tick arrives
        if self.is_complete() {
            self.finish();
            return;
        }
        self.publish();
    }

    /// Propose a replacement for the whole typed input.
    pub fn edit(&mut self, proposed: impl Into<TypedInput>) -> EditOutcome {
        if self.state != SessionState::Running {
            debug!(state = ?self.state, "edit ignored");
            return EditOutcome::Ignored;
        }

        let proposed = proposed.into();
        let proposal = EditProposal {
            reference: &self.reference,
            current: &self.input,
            proposed: &proposed,
            remaining: self.timer.remaining(),
        };
        if let Err(reason) = self.policy.validate_edit(&proposal) {
            debug!(%reason, "edit rejected");
            return EditOutcome::Rejected(reason);
        }

        self.input = proposed;
        self.recompute();

        if self.is_complete() {
            return EditOutcome::Completed(self.finish());
        }
        self.publish();
        EditOutcome::Accepted
    }

    /// Append one character.
    pub fn type_char(&mut self, c: char) -> EditOutcome {
        let proposed = self.input.pushed(c);
        self.edit(proposed)
    }

    /// Remove the last character, if the policy allows corrections.
    pub fn backspace(&mut self) -> EditOutcome {
        let proposed = self.input.popped();
        self.edit(proposed)
    }

    /// Advance the session clock.
    pub fn tick(&mut self, by: Duration) -> TickOutcome {
        if self.state != SessionState::Running {
            return TickOutcome::Ignored;
        }

        if self.timer.advance(by) == TickSignal::Expired {
            debug!(elapsed = self.timer.elapsed_secs(), "clock expired");
        }
        self.series.observe(self.timer.elapsed_secs(), self.input.len());
        self.recompute();

        if self.is_complete() {
            return TickOutcome::Completed(self.finish());
        }
        self.publish();
        TickOutcome::Advanced
    }

    /// End a running session early. A no-op in any other state.
    pub fn stop(&mut self) {
        if self.state == SessionState::Running {
            info!("session stopped");
            self.finish();
        }
    }

    /// Back to idle with the same text and rules.
    pub fn restart(&mut self) {
        if self.state == SessionState::Idle {
            return;
        }
        self.input = TypedInput::new();
        self.timer.reset();
        self.series.clear();
        self.metrics = MetricsSnapshot::initial();
        self.summary = None;
        self.state = SessionState::Idle;
        debug!("session restarted");
        self.publish();
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn reference(&self) -> &ReferenceText {
        &self.reference
    }

    pub fn policy(&self) -> &ModePolicy {
        &self.policy
    }

    pub fn input(&self) -> &TypedInput {
        &self.input
    }

    pub fn clock(&self) -> &TimerController {
        &self.timer
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics
    }

    pub fn verdicts(&self) -> Vec<Verdict> {
        comparator::compare(self.reference.chars(), self.input.chars())
    }

    /// Final results; `None` until the session has finished.
    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            verdicts: self.verdicts(),
            metrics: self.metrics,
            elapsed: self.timer.elapsed(),
            remaining: self.timer.remaining(),
        }
    }

    fn recompute(&mut self) {
        let correct = comparator::correct_count(self.reference.chars(), self.input.chars());
        self.metrics =
            MetricsSnapshot::calculate(self.input.len(), correct, self.timer.elapsed_secs());
    }

    fn is_complete(&self) -> bool {
        self.policy.is_complete(&Progress {
            reference: &self.reference,
            input: &self.input,
            remaining: self.timer.remaining(),
        })
    }

    fn finish(&mut self) -> SessionSummary {
        self.timer.stop();
        self.state = SessionState::Finished;

        let summary = SessionSummary {
            mode: self.policy.mode(),
            metrics: self.metrics,
            elapsed: self.timer.elapsed(),
            wpm_samples: self.series.points().to_vec(),
            consistency: self.series.consistency(),
        };
        info!(
            wpm = summary.metrics.words_per_minute,
            accuracy = summary.metrics.accuracy_percent,
            errors = summary.metrics.error_count,
            elapsed = summary.elapsed.as_secs_f64(),
            "session finished"
        );
        self.summary = Some(summary.clone());
        self.publish();
        summary
    }

    fn publish(&mut self) {
        if self.renderer.is_none() {
            return;
        }
        let snapshot = self.snapshot();
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.render(&snapshot);
        }
    }
}

impl fmt::Debug for TypingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypingSession")
            .field("reference", &self.reference.to_string())
            .field("input", &self.input.to_string())
            .field("state", &self.state)
            .field("metrics", &self.metrics)
            .field("timer", &self.timer)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
