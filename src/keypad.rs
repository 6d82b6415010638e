//! Keypad state shared by every front-end: the expression being typed, the
//! history of finished calculations and the equals flow that ties them to the
//! evaluator.

use crate::calc_engine::{evaluate_traced, is_division_by_zero, EvaluationTrace, Operator, Step};
use crate::format::format_result;
use std::fmt;
use tracing::{debug, warn};

/// One logical keypad action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A digit `0-9` or the decimal point.
    Digit(char),
    Operator(Operator),
    Percent,
    Equals,
    Clear,
    Backspace,
}

impl Key {
    pub fn from_char(c: char) -> Option<Key> {
        match c {
            '0'..='9' | '.' => Some(Key::Digit(c)),
            '%' => Some(Key::Percent),
            '=' => Some(Key::Equals),
            _ => Operator::from_char(c).map(Key::Operator),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Digit(c) => write!(f, "{}", c),
            Key::Operator(op) => write!(f, "{}", op),
            Key::Percent => write!(f, "%"),
            Key::Equals => write!(f, "="),
            Key::Clear => write!(f, "C"),
            Key::Backspace => write!(f, "<<"),
        }
    }
}

/// Button panel, top row first.
pub const KEYPAD_LAYOUT: [[Key; 4]; 5] = [
    [Key::Clear, Key::Backspace, Key::Percent, Key::Operator(Operator::Pow)],
    [Key::Digit('7'), Key::Digit('8'), Key::Digit('9'), Key::Operator(Operator::Add)],
    [Key::Digit('4'), Key::Digit('5'), Key::Digit('6'), Key::Operator(Operator::Sub)],
    [Key::Digit('1'), Key::Digit('2'), Key::Digit('3'), Key::Operator(Operator::Mul)],
    [Key::Digit('.'), Key::Digit('0'), Key::Equals, Key::Operator(Operator::Div)],
];

/// The expression under construction.
#[derive(Debug, Default, Clone)]
pub struct InputBuffer {
    text: String,
}

impl InputBuffer {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn append_digit_or_point(&mut self, ch: char) {
        self.text.push(ch);
    }

    /// Dropped silently when the buffer is empty or already ends with an
    /// operator.
    pub fn append_operator(&mut self, op: Operator) {
        if self.accepts_operator() {
            self.text.push(op.symbol());
        }
    }

    /// `%` is typed as a division by one hundred.
    pub fn append_percent(&mut self) {
        if self.accepts_operator() {
            self.text.push_str("/100");
        }
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn replace(&mut self, text: String) {
        self.text = text;
    }

    fn accepts_operator(&self) -> bool {
        self.text
            .chars()
            .last()
            .is_some_and(|c| Operator::from_char(c).is_none())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub expression: String,
    pub result: String,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.expression, self.result)
    }
}

/// Finished calculations, oldest first.
#[derive(Debug, Default)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn record(&mut self, expression: &str, result: &str) {
        self.entries.push(HistoryEntry {
            expression: expression.to_string(),
            result: result.to_string(),
        });
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Input,
    Error,
}

pub struct Session {
    input: InputBuffer,
    history: HistoryLog,
    state: DisplayState,
    last_steps: Vec<Step>,
}

impl Session {
    pub fn new() -> Self {
        Session {
            input: InputBuffer::default(),
            history: HistoryLog::default(),
            state: DisplayState::Input,
            last_steps: Vec::new(),
        }
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    /// Operator applications of the most recent equals press.
    pub fn last_steps(&self) -> &[Step] {
        &self.last_steps
    }

    /// What the display line shows right now.
    pub fn display(&self) -> &str {
        match self.state {
            DisplayState::Error => "Error",
            DisplayState::Input => self.input.as_str(),
        }
    }

    pub fn press(&mut self, key: Key) {
        if key != Key::Equals {
            self.state = DisplayState::Input;
        }

        match key {
            Key::Digit(c) => self.input.append_digit_or_point(c),
            Key::Operator(op) => self.input.append_operator(op),
            Key::Percent => self.input.append_percent(),
            Key::Backspace => self.input.backspace(),
            Key::Clear => {
                self.input.clear();
                self.history.clear();
                self.last_steps.clear();
            }
            Key::Equals => self.equals(),
        }
    }

    fn equals(&mut self) {
        let expression = self.input.as_str().to_string();
        let mut trace = EvaluationTrace::new(true);

        match evaluate_traced(&expression, &mut trace) {
            Ok(value) if value.is_finite() => {
                let formatted = format_result(value);
                debug!(%expression, result = %formatted, "recorded calculation");
                self.history.record(&expression, &formatted);
                self.input.replace(formatted);
                self.state = DisplayState::Input;
            }
            Ok(value) if is_division_by_zero(value) => {
                warn!(%expression, "division by zero");
                self.fail();
            }
            Ok(value) => {
                warn!(%expression, value, "result is not a finite number");
                self.fail();
            }
            Err(err) => {
                warn!(%expression, error = %err, "evaluation failed");
                self.fail();
            }
        }

        self.last_steps = trace.steps;
    }

    fn fail(&mut self) {
        self.input.clear();
        self.state = DisplayState::Error;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_keys(session: &mut Session, keys: &str) {
        for c in keys.chars() {
            let key = Key::from_char(c).unwrap_or_else(|| panic!("unmapped key {c:?}"));
            session.press(key);
        }
    }

    #[test]
    fn test_digits_append_unconditionally() {
        let mut buffer = InputBuffer::default();
        for c in "1.2.3".chars() {
            buffer.append_digit_or_point(c);
        }
        assert_eq!(buffer.as_str(), "1.2.3");
    }

    #[test]
    fn test_operator_rejected_on_empty_buffer() {
        let mut buffer = InputBuffer::default();
        buffer.append_operator(Operator::Add);
        assert_eq!(buffer.as_str(), "");
    }

    #[test]
    fn test_operator_rejected_after_operator() {
        let mut buffer = InputBuffer::default();
        buffer.append_digit_or_point('3');
        buffer.append_operator(Operator::Add);
        buffer.append_operator(Operator::Add);
        buffer.append_operator(Operator::Mul);
        assert_eq!(buffer.as_str(), "3+");
    }

    #[test]
    fn test_percent_rewrites_to_division() {
        let mut buffer = InputBuffer::default();
        buffer.append_percent();
        assert_eq!(buffer.as_str(), "");

        buffer.append_digit_or_point('1');
        buffer.append_digit_or_point('0');
        buffer.append_percent();
        assert_eq!(buffer.as_str(), "10/100");

        buffer.append_percent();
        assert_eq!(buffer.as_str(), "10/100/100");

        buffer.append_operator(Operator::Sub);
        buffer.append_percent();
        assert_eq!(buffer.as_str(), "10/100/100-");
    }

    #[test]
    fn test_backspace() {
        let mut buffer = InputBuffer::default();
        buffer.backspace();
        assert_eq!(buffer.as_str(), "");

        buffer.append_digit_or_point('4');
        buffer.append_operator(Operator::Pow);
        buffer.backspace();
        assert_eq!(buffer.as_str(), "4");
    }

    #[test]
    fn test_equals_records_history_and_chains() {
        let mut session = Session::new();
        type_keys(&mut session, "3+4*2=");
        assert_eq!(session.display(), "11");
        assert_eq!(session.history().last().unwrap().to_string(), "3+4*2 = 11");

        type_keys(&mut session, "-1=");
        assert_eq!(session.display(), "10");
        let lines: Vec<String> = session.history().entries().iter().map(|e| e.to_string()).collect();
        assert_eq!(lines, vec!["3+4*2 = 11", "11-1 = 10"]);
    }

    #[test]
    fn test_percent_key() {
        let mut session = Session::new();
        type_keys(&mut session, "10%=");
        assert_eq!(session.display(), "0.1");
        assert_eq!(session.history().last().unwrap().to_string(), "10/100 = 0.1");
    }

    #[test]
    fn test_repeated_equals_is_stable() {
        let mut session = Session::new();
        type_keys(&mut session, "7*6=");
        assert_eq!(session.display(), "42");
        type_keys(&mut session, "=");
        assert_eq!(session.display(), "42");
        type_keys(&mut session, "=");
        assert_eq!(session.display(), "42");
        assert_eq!(session.history().len(), 3);
    }

    #[test]
    fn test_division_by_zero_shows_error() {
        let mut session = Session::new();
        type_keys(&mut session, "5/0=");
        assert_eq!(session.state(), DisplayState::Error);
        assert_eq!(session.display(), "Error");
        assert!(session.history().is_empty());

        // The failed input is gone, not just hidden behind "Error".
        session.press(Key::Backspace);
        assert_eq!(session.display(), "");
    }

    #[test]
    fn test_malformed_input_shows_error() {
        let mut session = Session::new();
        type_keys(&mut session, "5+=");
        assert_eq!(session.display(), "Error");

        type_keys(&mut session, "=");
        assert_eq!(session.display(), "Error");
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_typing_after_error_resumes_input() {
        let mut session = Session::new();
        type_keys(&mut session, "1/0=");
        type_keys(&mut session, "2");
        assert_eq!(session.state(), DisplayState::Input);
        assert_eq!(session.display(), "2");
    }

    #[test]
    fn test_negative_result_cannot_chain_an_operator() {
        let mut session = Session::new();
        type_keys(&mut session, "3-8=");
        assert_eq!(session.display(), "-5");
        type_keys(&mut session, "+1=");
        assert_eq!(session.display(), "Error");
    }

    #[test]
    fn test_clear_resets_input_and_history() {
        let mut session = Session::new();
        type_keys(&mut session, "1+1=");
        type_keys(&mut session, "+3");
        session.press(Key::Clear);
        assert_eq!(session.display(), "");
        assert!(session.history().is_empty());
        assert!(session.last_steps().is_empty());
    }

    #[test]
    fn test_last_steps_follow_evaluation() {
        let mut session = Session::new();
        type_keys(&mut session, "2^3^2=");
        assert_eq!(session.display(), "64");
        let ops: Vec<&str> = session.last_steps().iter().map(|s| s.operation.as_str()).collect();
        assert_eq!(ops, vec!["2 ^ 3", "8 ^ 2"]);
    }

    #[test]
    fn test_unmapped_chars() {
        assert_eq!(Key::from_char('x'), None);
        assert_eq!(Key::from_char(' '), None);
        assert_eq!(Key::from_char('('), None);
        assert_eq!(Key::from_char('%'), Some(Key::Percent));
        assert_eq!(Key::from_char('*'), Some(Key::Operator(Operator::Mul)));
    }

    #[test]
    fn test_keypad_labels() {
        let labels: Vec<String> = KEYPAD_LAYOUT
            .iter()
            .flat_map(|row| row.iter().map(|k| k.to_string()))
            .collect();
        assert_eq!(
            labels,
            vec![
                "C", "<<", "%", "^", "7", "8", "9", "+", "4", "5", "6", "-", "1", "2", "3", "*",
                ".", "0", "=", "/"
            ]
        );
    }
}
