use crate::format::format_result;
use crate::keypad::{DisplayState, Key, Session};
use anyhow::Result;
use std::io::{stdin, stdout, Write};
use termion::{clear::CurrentLine as ClearLine, event::Key as TermKey, input::TermRead, raw::IntoRawMode};

const PROMPT: &str = "Expression: ";

pub fn run_line(show_details: bool) -> Result<()> {
    println!("Keypad Calculator");
    println!("Keys: 0-9 . + - * / ^ %   Enter or = to calculate");
    println!("Backspace undoes, Esc or Ctrl+L clears input and history, q or Ctrl+C quits\n");

    let mut stdout = stdout().into_raw_mode()?;
    let mut session = Session::new();

    draw_prompt(&mut stdout, &session)?;

    for key in stdin().keys() {
        let pressed = match key? {
            TermKey::Char('q') | TermKey::Ctrl('c') => break,
            TermKey::Char('\n') => Key::Equals,
            TermKey::Backspace => Key::Backspace,
            TermKey::Esc | TermKey::Ctrl('l') => Key::Clear,
            TermKey::Char(c) => match Key::from_char(c) {
                Some(key) => key,
                None => continue,
            },
            _ => continue,
        };

        session.press(pressed);

        match pressed {
            Key::Equals => {
                write!(stdout, "\r\n")?;
                report_equals(&mut stdout, &session, show_details)?;
            }
            Key::Clear => write!(stdout, "\r{}History cleared\r\n", ClearLine)?,
            _ => {}
        }
        draw_prompt(&mut stdout, &session)?;
    }

    write!(stdout, "\r\nGoodbye!\r\n")?;
    stdout.flush()?;
    Ok(())
}

fn draw_prompt(stdout: &mut impl Write, session: &Session) -> Result<()> {
    write!(stdout, "\r{}{}{}", ClearLine, PROMPT, session.display())?;
    stdout.flush()?;
    Ok(())
}

fn report_equals(stdout: &mut impl Write, session: &Session, show_details: bool) -> Result<()> {
    match session.state() {
        DisplayState::Error => write!(stdout, "  Error\r\n")?,
        DisplayState::Input => {
            if let Some(entry) = session.history().last() {
                write!(stdout, "  {}\r\n", entry)?;
            }
        }
    }

    if show_details {
        for (i, step) in session.last_steps().iter().enumerate() {
            write!(stdout, "    Step {}: {} = {}\r\n", i + 1, step.operation, format_result(step.result))?;
        }
    }
    Ok(())
}
