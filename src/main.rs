mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::Duration,
};
use tracing::info;

use tapwise::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    content::{self, words_for_duration, ContentRequest, Library},
    logging,
    policy::{Mode, ModePolicy, DEFAULT_TIMED_SECS, TIMED_DURATIONS},
    runtime::{AppEvent, CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    session::{SessionSnapshot, SessionState, TickOutcome, TypingSession},
    text::ReferenceText,
    TICK_RATE_MS,
};
use ui::SnapshotSlot;

/// typing speed and accuracy tests in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Typing speed and accuracy tests in the terminal. Practice freely, without corrections, against the clock or on real code snippets."
)]
pub struct Cli {
    /// easy: corrections allowed, hard: no backspace, timed: race the clock, code: type a snippet
    #[clap(short = 'm', long, value_enum)]
    mode: Option<Mode>,

    /// number of words to use in test
    #[clap(short = 'w', long)]
    number_of_words: Option<usize>,

    /// number of sentences to use in test
    #[clap(short = 'f', long = "full-sentences")]
    number_of_sentences: Option<usize>,

    /// number of seconds to run test (15, 30, 60 or 90)
    #[clap(short = 's', long, value_parser = parse_duration_secs)]
    number_of_secs: Option<u64>,

    /// custom prompt to use
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// language of the snippet in code mode (e.g. rust, python, go)
    #[clap(short = 'c', long)]
    snippet_language: Option<String>,

    /// remember the given options as defaults for later runs
    #[clap(long)]
    save_defaults: bool,
}

impl Cli {
    /// Layer the flags given on the command line over stored defaults.
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }
        if let Some(words) = self.number_of_words {
            cfg.number_of_words = words;
        }
        if self.number_of_sentences.is_some() {
            cfg.number_of_sentences = self.number_of_sentences;
        }
        if self.number_of_secs.is_some() {
            cfg.number_of_secs = self.number_of_secs;
        }
        if self.snippet_language.is_some() {
            cfg.snippet_language = self.snippet_language.clone();
        }
        cfg
    }
}

fn parse_duration_secs(arg: &str) -> Result<u64, String> {
    let secs: u64 = arg.parse().map_err(|err| format!("{err}"))?;
    if TIMED_DURATIONS.contains(&secs) {
        Ok(secs)
    } else {
        Err(format!("must be one of {TIMED_DURATIONS:?}"))
    }
}

/// What to ask the content library for.
fn content_request(settings: &Config, prompt: Option<&str>) -> ContentRequest {
    if let Some(prompt) = prompt {
        return ContentRequest::Custom(prompt.to_string());
    }
    match (settings.mode, settings.number_of_sentences) {
        (Mode::Code, _) => ContentRequest::Snippet {
            language: settings.snippet_language.clone(),
        },
        (_, Some(count)) => ContentRequest::Sentences { count },
        (Mode::Timed, None) => {
            let secs = settings.number_of_secs.unwrap_or(DEFAULT_TIMED_SECS);
            ContentRequest::Words {
                count: settings.number_of_words.max(words_for_duration(secs)),
            }
        }
        (_, None) => ContentRequest::Words {
            count: settings.number_of_words,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Typing,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App {
    settings: Config,
    prompt: Option<String>,
    library: Library,
    slot: SnapshotSlot,
    pub session: TypingSession,
    /// Last snapshot pushed by the session, drawn on the next frame.
    pub latest: SessionSnapshot,
    pub state: AppState,
}

impl App {
    pub fn new(settings: Config, prompt: Option<String>, library: Library) -> Self {
        let slot = SnapshotSlot::default();
        let reference = content::fetch_or_fallback(
            &library,
            &content_request(&settings, prompt.as_deref()),
        );
        let session = Self::build_session(&settings, &slot, reference);
        Self {
            latest: session.snapshot(),
            settings,
            prompt,
            library,
            slot,
            session,
            state: AppState::Typing,
        }
    }

    fn build_session(
        settings: &Config,
        slot: &SnapshotSlot,
        reference: ReferenceText,
    ) -> TypingSession {
        let policy = ModePolicy::for_mode(settings.mode, settings.duration());
        TypingSession::new(reference, policy).with_renderer(Box::new(slot.clone()))
    }

    /// Same text, fresh attempt.
    pub fn retry(&mut self) {
        self.session.restart();
        self.state = AppState::Typing;
    }

    /// Fresh text from the library.
    pub fn new_text(&mut self) {
        let request = content_request(&self.settings, self.prompt.as_deref());
        let reference = content::fetch_or_fallback(&self.library, &request);
        self.session = Self::build_session(&self.settings, &self.slot, reference);
        self.latest = self.session.snapshot();
        self.state = AppState::Typing;
    }

    /// Pick up the newest snapshot. Returns true if there was one.
    pub fn refresh(&mut self) -> bool {
        match self.slot.take() {
            Some(snapshot) => {
                self.latest = snapshot;
                true
            }
            None => false,
        }
    }

    pub fn on_tick(&mut self, by: Duration) {
        if let TickOutcome::Completed(_) = self.session.tick(by) {
            self.state = AppState::Results;
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Control {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if key.code == KeyCode::Esc || (ctrl && key.code == KeyCode::Char('c')) {
            return Control::Quit;
        }

        match self.state {
            AppState::Typing => self.on_typing_key(key.code, ctrl),
            AppState::Results => match key.code {
                KeyCode::Char('r') => self.retry(),
                KeyCode::Char('n') => self.new_text(),
                _ => {}
            },
        }
        Control::Continue
    }

    fn on_typing_key(&mut self, code: KeyCode, ctrl: bool) {
        match code {
            KeyCode::Char('d') if ctrl => self.session.stop(),
            KeyCode::Left => self.retry(),
            KeyCode::Right => self.new_text(),
            KeyCode::Backspace => {
                self.session.backspace();
            }
            KeyCode::Enter => self.type_char('\n'),
            KeyCode::Tab => self.type_char('\t'),
            KeyCode::Char(c) if !ctrl => self.type_char(c),
            _ => {}
        }
        if self.session.state() == SessionState::Finished {
            self.state = AppState::Results;
        }
    }

    /// The first keystroke starts the clock.
    fn type_char(&mut self, c: char) {
        self.session.start();
        self.session.type_char(c);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(path) = AppDirs::log_path() {
        logging::init(&path);
    }

    let store = FileConfigStore::new();
    let settings = cli.apply(store.load());
    if cli.save_defaults {
        store.save(&settings)?;
        info!(path = %store.path().display(), "saved defaults");
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let library = Library::bundled()?;
    let mut app = App::new(settings, cli.prompt.clone(), library);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = run_app(&mut terminal, &mut app, &mut runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &mut Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| draw(app, f))?;

    loop {
        let redraw = match runner.step() {
            AppEvent::Key(key) => {
                if app.on_key(key) == Control::Quit {
                    break;
                }
                true
            }
            AppEvent::Resize => true,
            AppEvent::Tick(by) => {
                app.on_tick(by);
                false
            }
        };

        if app.refresh() || redraw {
            terminal.draw(|f| draw(app, f))?;
        }
    }

    Ok(())
}

fn draw(app: &App, f: &mut Frame) {
    ui::screen::current_screen(&app.state).render(app, f);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use std::sync::mpsc;
    use tapwise::runtime::TestEventSource;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn app(mode: Mode, prompt: &str) -> App {
        let settings = Config {
            mode,
            ..Config::default()
        };
        App::new(
            settings,
            Some(prompt.to_string()),
            Library::bundled().unwrap(),
        )
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.on_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn cli_defaults_leave_stored_config_alone() {
        let cli = Cli::parse_from(["tapwise"]);
        let stored = Config {
            mode: Mode::Hard,
            number_of_words: 30,
            ..Config::default()
        };
        assert_eq!(cli.apply(stored.clone()), stored);
        assert!(!cli.save_defaults);
    }

    #[test]
    fn cli_flags_override_config() {
        let cli = Cli::parse_from([
            "tapwise",
            "--mode",
            "code",
            "-w",
            "25",
            "-s",
            "60",
            "--snippet-language",
            "go",
            "--save-defaults",
        ]);
        let cfg = cli.apply(Config::default());
        assert_eq!(cfg.mode, Mode::Code);
        assert_eq!(cfg.number_of_words, 25);
        assert_eq!(cfg.number_of_secs, Some(60));
        assert_eq!(cfg.snippet_language.as_deref(), Some("go"));
        assert!(cli.save_defaults);
    }

    #[test]
    fn cli_short_flags() {
        let cli = Cli::parse_from(["tapwise", "-m", "timed", "-f", "3", "-p", "hello world"]);
        assert_eq!(cli.mode, Some(Mode::Timed));
        assert_eq!(cli.number_of_sentences, Some(3));
        assert_eq!(cli.prompt.as_deref(), Some("hello world"));
        assert!(Cli::try_parse_from(["tapwise", "--mode", "turbo"]).is_err());
    }

    #[test]
    fn cli_only_accepts_offered_durations() {
        for secs in ["15", "30", "60", "90"] {
            assert!(Cli::try_parse_from(["tapwise", "-s", secs]).is_ok());
        }
        for secs in ["0", "45", "-5", "soon"] {
            assert!(Cli::try_parse_from(["tapwise", "-s", secs]).is_err());
        }
    }

    #[test]
    fn requests_follow_settings() {
        let mut cfg = Config::default();
        assert_eq!(
            content_request(&cfg, Some("abc")),
            ContentRequest::Custom("abc".into())
        );
        assert_eq!(
            content_request(&cfg, None),
            ContentRequest::Words { count: 15 }
        );

        cfg.mode = Mode::Timed;
        assert_eq!(
            content_request(&cfg, None),
            ContentRequest::Words { count: 25 }
        );
        cfg.number_of_secs = Some(60);
        assert_eq!(
            content_request(&cfg, None),
            ContentRequest::Words { count: 50 }
        );

        cfg.number_of_sentences = Some(2);
        assert_eq!(
            content_request(&cfg, None),
            ContentRequest::Sentences { count: 2 }
        );

        cfg.mode = Mode::Code;
        cfg.snippet_language = Some("rust".into());
        assert_eq!(
            content_request(&cfg, None),
            ContentRequest::Snippet {
                language: Some("rust".into())
            }
        );
    }

    #[test]
    fn first_key_starts_the_session() {
        let mut app = app(Mode::Easy, "hello");
        assert_eq!(app.session.state(), SessionState::Idle);

        // ticks before the first key do nothing
        app.on_tick(Duration::from_secs(1));
        assert_eq!(app.session.clock().elapsed(), Duration::ZERO);

        type_str(&mut app, "he");
        assert_eq!(app.session.state(), SessionState::Running);
        assert_eq!(app.session.input().to_string(), "he");
        assert!(app.refresh());
        assert_eq!(app.latest.state, SessionState::Running);
    }

    #[test]
    fn hard_mode_ignores_backspace_and_finishes_at_the_end() {
        let mut app = app(Mode::Hard, "hi");
        type_str(&mut app, "x");
        app.on_key(key(KeyCode::Backspace));
        assert_eq!(app.session.input().to_string(), "x");

        type_str(&mut app, "i");
        assert_eq!(app.state, AppState::Results);
        assert_eq!(app.session.summary().unwrap().metrics.error_count, 1);
    }

    #[test]
    fn ctrl_d_stops_and_shows_results() {
        let mut app = app(Mode::Easy, "hello");
        type_str(&mut app, "hel");
        app.on_tick(Duration::from_secs(1));
        app.on_key(ctrl('d'));
        assert_eq!(app.state, AppState::Results);
        assert_eq!(app.session.summary().unwrap().elapsed, Duration::from_secs(1));
    }

    #[test]
    fn enter_and_tab_are_typed() {
        let mut app = app(Mode::Code, "a\n\tb");
        type_str(&mut app, "a");
        app.on_key(key(KeyCode::Enter));
        app.on_key(key(KeyCode::Tab));
        assert_eq!(app.session.input().to_string(), "a\n\t");
        type_str(&mut app, "b");
        assert_eq!(app.state, AppState::Results);
    }

    #[test]
    fn timed_mode_finishes_on_ticks() {
        let settings = Config {
            mode: Mode::Timed,
            number_of_secs: Some(1),
            ..Config::default()
        };
        let mut app = App::new(settings, None, Library::bundled().unwrap());
        type_str(&mut app, "x");
        for _ in 0..10 {
            app.on_tick(Duration::from_millis(TICK_RATE_MS));
        }
        assert_eq!(app.state, AppState::Results);
        assert_eq!(app.session.clock().remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn results_keys_retry_and_renew() {
        let mut app = app(Mode::Hard, "ok");
        type_str(&mut app, "ok");
        assert_eq!(app.state, AppState::Results);

        app.on_key(key(KeyCode::Char('r')));
        assert_eq!(app.state, AppState::Typing);
        assert_eq!(app.session.state(), SessionState::Idle);
        assert_eq!(app.session.reference().to_string(), "ok");

        type_str(&mut app, "ok");
        app.on_key(key(KeyCode::Char('n')));
        assert_eq!(app.state, AppState::Typing);
        assert!(app.session.input().is_empty());
        assert!(app.session.summary().is_none());
    }

    #[test]
    fn arrows_retry_or_replace_while_typing() {
        let mut app = app(Mode::Easy, "hello");
        type_str(&mut app, "hex");
        app.on_tick(Duration::from_secs(1));

        app.on_key(key(KeyCode::Left));
        assert_eq!(app.state, AppState::Typing);
        assert_eq!(app.session.state(), SessionState::Idle);
        assert!(app.session.input().is_empty());
        assert_eq!(app.session.clock().elapsed(), Duration::ZERO);
        assert_eq!(app.session.reference().to_string(), "hello");

        type_str(&mut app, "he");
        app.on_key(key(KeyCode::Right));
        assert_eq!(app.state, AppState::Typing);
        assert_eq!(app.session.state(), SessionState::Idle);
        assert!(app.session.input().is_empty());
        assert_eq!(app.latest.state, SessionState::Idle);
    }

    #[test]
    fn escape_and_ctrl_c_quit() {
        let mut app = app(Mode::Easy, "hello");
        assert_eq!(app.on_key(key(KeyCode::Esc)), Control::Quit);
        assert_eq!(app.on_key(ctrl('c')), Control::Quit);
        assert_eq!(app.on_key(key(KeyCode::Char('c'))), Control::Continue);
    }

    #[test]
    fn run_app_drives_a_session_to_results() {
        let (tx, rx) = mpsc::channel();
        for c in "hi".chars() {
            tx.send(AppEvent::Key(key(KeyCode::Char(c)))).unwrap();
        }
        tx.send(AppEvent::Key(key(KeyCode::Esc))).unwrap();

        let mut runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
        );
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut app = app(Mode::Hard, "hi");

        run_app(&mut terminal, &mut app, &mut runner).unwrap();

        assert_eq!(app.state, AppState::Results);
        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(screen.contains("(r)etry / (n)ew / (esc)ape"));
    }
}
