use crate::keypad::{Key, Session};
use crossterm::event::{KeyCode, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Press(Key),
    ScrollHistory(i32),
    ToggleDetails,
    ShowHelp,
    Quit,
}

/// Maps a key event on the main screen to an action.
pub fn map_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
    if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return match code {
            KeyCode::Char('c') | KeyCode::Char('C') if modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Quit)
            }
            _ => None,
        };
    }

    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
        KeyCode::Char('c') | KeyCode::Char('C') => Some(Action::Press(Key::Clear)),
        KeyCode::Char('d') | KeyCode::Char('D') => Some(Action::ToggleDetails),
        KeyCode::Char(c) => Key::from_char(c).map(Action::Press),
        KeyCode::Enter => Some(Action::Press(Key::Equals)),
        KeyCode::Backspace => Some(Action::Press(Key::Backspace)),
        KeyCode::Delete => Some(Action::Press(Key::Clear)),
        KeyCode::Up | KeyCode::PageUp => Some(Action::ScrollHistory(-1)),
        KeyCode::Down | KeyCode::PageDown => Some(Action::ScrollHistory(1)),
        KeyCode::F(1) => Some(Action::ShowHelp),
        KeyCode::Esc => Some(Action::Quit),
        _ => None,
    }
}

pub struct App {
    pub session: Session,
    pub last_pressed: Option<Key>,
    pub should_quit: bool,
    pub show_help: bool,
    pub help_scroll: usize,
    pub show_details: bool,
    pub list_height: usize,
    /// Wrapped lines in the history list as of the last draw.
    pub history_lines: usize,
    pub history_scroll: usize,
    pub scroll_to_bottom: bool,
    pub terminal_too_small: bool,
}

impl App {
    pub fn new(show_details: bool) -> Self {
        App {
            session: Session::new(),
            last_pressed: None,
            should_quit: false,
            show_help: false,
            help_scroll: 0,
            show_details,
            list_height: 5,
            history_lines: 0,
            history_scroll: 0,
            scroll_to_bottom: false,
            terminal_too_small: false,
        }
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Press(key) => self.press(key),
            Action::ScrollHistory(direction) => self.scroll_history(direction),
            Action::ToggleDetails => self.show_details = !self.show_details,
            Action::ShowHelp => {
                self.show_help = true;
                self.help_scroll = 0;
            }
            Action::Quit => self.should_quit = true,
        }
    }

    pub fn press(&mut self, key: Key) {
        let entries_before = self.session.history().len();
        self.session.press(key);
        self.last_pressed = Some(key);

        if key == Key::Clear {
            self.history_scroll = 0;
        } else if self.session.history().len() != entries_before {
            self.scroll_to_bottom = true;
        }
    }

    pub fn scroll_history(&mut self, direction: i32) {
        let step = self.list_height.saturating_sub(1).max(1);
        if direction < 0 {
            self.history_scroll = self.history_scroll.saturating_sub(step);
        } else {
            self.history_scroll = self.history_scroll.saturating_add(step).min(self.max_history_scroll());
        }
        self.scroll_to_bottom = false;
    }

    /// Offset that leaves the last page of the history list on screen.
    pub fn max_history_scroll(&self) -> usize {
        self.history_lines.saturating_sub(self.list_height)
    }
}
