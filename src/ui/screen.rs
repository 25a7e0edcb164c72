use ratatui::Frame;

use super::{ResultsView, TypingView};
use crate::{App, AppState};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

pub struct TypingScreen;

impl Screen for TypingScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(
            TypingView {
                reference: app.session.reference(),
                snapshot: &app.latest,
                finish_hint: !app.session.policy().finishes_on_its_own(),
            },
            f.area(),
        );
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        match app.session.summary() {
            Some(summary) => f.render_widget(ResultsView { summary }, f.area()),
            // results are only shown for finished sessions
            None => TypingScreen.render(app, f),
        }
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Typing => Box::new(TypingScreen),
        AppState::Results => Box::new(ResultsScreen),
    }
}
