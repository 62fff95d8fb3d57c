use crate::result::ResultSink;
use crate::runtime::Event;
use crate::session::{Session, SessionPhase};
use crate::source::TextSource;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Typing,
    Results,
}

/// Application state: one live session plus the collaborators that feed it
/// (text source) and drain it (result sink). All mutation happens here, in
/// response to events from the runtime.
pub struct App {
    pub session: Session,
    pub screen: Screen,
    pub status: Option<String>,
    pub quit: bool,
    source: Box<dyn TextSource>,
    sink: Box<dyn ResultSink>,
    banner: Option<String>,
}

impl App {
    pub fn new(
        mut source: Box<dyn TextSource>,
        sink: Box<dyn ResultSink>,
        time_limit_secs: u32,
    ) -> Self {
        let target = source.next_text();
        let mode = source.mode().to_string();
        let banner = source.banner();
        Self {
            session: Session::new(&target, time_limit_secs, &mode),
            screen: Screen::Typing,
            status: None,
            quit: false,
            source,
            sink,
            banner,
        }
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn on_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.on_key(key),
            Event::Tick => self.on_tick(),
            // a redraw follows every event anyway
            Event::Resize => {}
        }
    }

    fn on_tick(&mut self) {
        self.session.tick();
        if self.session.has_finished() {
            self.screen = Screen::Results;
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match self.screen {
            Screen::Typing => self.on_typing_key(key),
            Screen::Results => self.on_results_key(key),
        }
    }

    fn on_typing_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.quit = true;
            }
            KeyCode::Char('p') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                match self.session.phase() {
                    SessionPhase::Running => self.session.pause(),
                    SessionPhase::Paused => self.session.start(),
                    _ => {}
                }
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.new_drill();
            }
            KeyCode::Backspace => self.erase_char(),
            KeyCode::Enter => self.type_char('\n'),
            KeyCode::Char(c) => self.type_char(c),
            _ => {}
        }
    }

    fn on_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.quit = true;
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Char('r') | KeyCode::Tab => self.new_drill(),
            _ => {}
        }
    }

    /// The first keystroke of an idle session starts the clock.
    fn type_char(&mut self, c: char) {
        if self.session.phase() == SessionPhase::Idle {
            self.session.start();
        }
        if self.session.phase() != SessionPhase::Running {
            return;
        }
        let mut text = self.session.typed_text();
        text.push(c);
        self.session.on_input(&text);
    }

    fn erase_char(&mut self) {
        let mut text = self.session.typed_text();
        text.pop();
        self.session.on_input(&text);
    }

    fn submit(&mut self) {
        match self.session.submit(self.sink.as_mut()) {
            Ok(true) => self.status = Some("Result saved.".to_string()),
            Ok(false) => {}
            Err(e) => {
                log::warn!("failed to save result: {e}");
                self.status = Some("Failed to save result; press enter to retry.".to_string());
            }
        }
    }

    fn new_drill(&mut self) {
        let target = self.source.next_text();
        self.session.reset(Some(&target));
        self.banner = self.source.banner();
        self.status = None;
        self.screen = Screen::Typing;
    }
}
