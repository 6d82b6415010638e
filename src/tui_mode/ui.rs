use super::app::{map_key, Action, App};
use super::helpers::{format_with_spaces, highlight_expression, wrap_text};
use crate::format::format_result;
use crate::keypad::{DisplayState, Key, KEYPAD_LAYOUT};
use crate::render_help::render_help;
use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseEventKind};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::time::Duration;

const MIN_TERMINAL_WIDTH: u16 = 50;
const MIN_TERMINAL_HEIGHT: u16 = 19;
const KEYPAD_WIDTH: u16 = 29;
const DETAILS_HEIGHT: u16 = 8;

const EQUALS_COLOR: Color = Color::Rgb(255, 127, 80);
const OPERATOR_COLOR: Color = Color::Rgb(5, 153, 140);

pub fn run_ui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| {
            if app.show_help {
                render_help(f, app);
            } else {
                ui(f, app);
            }
        })?;

        if app.should_quit {
            break;
        }

        if crossterm::event::poll(Duration::from_millis(50))? {
            match crossterm::event::read()? {
                Event::Key(KeyEvent { code, modifiers, kind, .. }) if kind == KeyEventKind::Press => {
                    handle_key_event(app, code, modifiers);
                }
                Event::Mouse(event) => {
                    handle_mouse_event(app, event);
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn handle_key_event(app: &mut App, code: KeyCode, modifiers: crossterm::event::KeyModifiers) {
    if app.show_help {
        match code {
            KeyCode::Down => app.help_scroll = app.help_scroll.saturating_add(1),
            KeyCode::Up => app.help_scroll = app.help_scroll.saturating_sub(1),
            KeyCode::PageDown => app.help_scroll = app.help_scroll.saturating_add(10),
            KeyCode::PageUp => app.help_scroll = app.help_scroll.saturating_sub(10),
            KeyCode::Esc | KeyCode::F(1) => {
                app.show_help = false;
                app.help_scroll = 0;
            }
            _ => {}
        }
    } else if let Some(action) = map_key(code, modifiers) {
        app.apply(action);
    }
}

fn handle_mouse_event(app: &mut App, event: crossterm::event::MouseEvent) {
    if app.show_help {
        match event.kind {
            MouseEventKind::ScrollDown => app.help_scroll = app.help_scroll.saturating_add(3),
            MouseEventKind::ScrollUp => app.help_scroll = app.help_scroll.saturating_sub(3),
            _ => {}
        }
    } else {
        match event.kind {
            MouseEventKind::ScrollDown => app.apply(Action::ScrollHistory(1)),
            MouseEventKind::ScrollUp => app.apply(Action::ScrollHistory(-1)),
            _ => {}
        }
    }
}

fn ui(frame: &mut Frame, app: &mut App) {
    let terminal_size = frame.size();

    app.terminal_too_small = terminal_size.width < MIN_TERMINAL_WIDTH ||
                             terminal_size.height < MIN_TERMINAL_HEIGHT;

    if app.terminal_too_small {
        render_resize_message(frame, terminal_size);
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Min(15),
            Constraint::Length(1),
        ])
        .split(terminal_size);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Length(KEYPAD_WIDTH), Constraint::Min(20)])
        .split(layout[1]);

    render_display(frame, app, layout[0]);
    render_keypad(frame, app, body[0]);

    if app.show_details {
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Min(3), Constraint::Length(DETAILS_HEIGHT)])
            .split(body[1]);
        render_history(frame, app, right[0]);
        render_details(frame, app, right[1]);
    } else {
        render_history(frame, app, body[1]);
    }

    render_status(frame, layout[2]);
}

fn render_resize_message(frame: &mut Frame, area: Rect) {
    let message = format!(
        "Terminal too small! Min size: {}x{}. Current: {}x{}",
        MIN_TERMINAL_WIDTH,
        MIN_TERMINAL_HEIGHT,
        area.width,
        area.height
    );

    let text = vec![
        Line::from(Span::styled(
            message,
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Please resize your terminal window",
            Style::default().fg(Color::Yellow)
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Resize Required ")
        .title_alignment(Alignment::Center);

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn render_display(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let style = match app.session.state() {
        DisplayState::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        DisplayState::Input => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    };

    // Keep the end of a long expression visible.
    let text = app.session.display();
    let width = inner_area.width as usize;
    let skip = text.chars().count().saturating_sub(width);
    let visible: String = text.chars().skip(skip).collect();

    let paragraph = Paragraph::new(Span::styled(visible, style)).alignment(Alignment::Right);
    frame.render_widget(paragraph, inner_area);
}

fn key_style(key: Key) -> Style {
    match key {
        Key::Equals => Style::default().bg(EQUALS_COLOR).fg(Color::White),
        Key::Digit(_) => Style::default().bg(Color::Gray).fg(Color::Black),
        _ => Style::default().bg(OPERATOR_COLOR).fg(Color::Black),
    }
}

fn render_keypad(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, KEYPAD_LAYOUT.len() as u32); KEYPAD_LAYOUT.len()])
        .split(area);

    for (row_area, row) in rows.iter().zip(KEYPAD_LAYOUT.iter()) {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, row.len() as u32); row.len()])
            .split(*row_area);

        for (cell, key) in cells.iter().zip(row.iter()) {
            let mut style = key_style(*key).add_modifier(Modifier::BOLD);
            if app.last_pressed == Some(*key) {
                style = style.add_modifier(Modifier::REVERSED);
            }

            let button = Paragraph::new(key.to_string())
                .alignment(Alignment::Center)
                .style(style)
                .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Black)));
            frame.render_widget(button, *cell);
        }
    }
}

fn render_history(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" History ")
        .title_alignment(Alignment::Center);

    let inner_area = block.inner(area);
    frame.render_widget(block, area);
    app.list_height = inner_area.height as usize;

    if app.session.history().is_empty() {
        let empty_msg = Paragraph::new("No calculations yet.")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(empty_msg, inner_area);
        return;
    }

    let mut items = Vec::new();
    let wrap_width = inner_area.width.saturating_sub(2) as usize;
    let base_style = Style::default().fg(Color::Cyan);

    for entry in app.session.history().entries() {
        let input = format_with_spaces(&entry.expression);
        let input_lines = wrap_text(&input, wrap_width);
        let last_line = input_lines.len().saturating_sub(1);

        for (line_idx, line) in input_lines.into_iter().enumerate() {
            let mut spans = vec![if line_idx == 0 {
                Span::styled("> ", Style::default().fg(Color::Green))
            } else {
                Span::raw("  ")
            }];
            spans.extend(highlight_expression(&line, base_style));

            if line_idx == last_line {
                spans.push(Span::styled(" = ", Style::default().fg(Color::Gray)));
                spans.push(Span::styled(
                    entry.result.clone(),
                    Style::default().fg(Color::LightMagenta).add_modifier(Modifier::BOLD),
                ));
            }
            items.push(ListItem::new(Line::from(spans)));
        }
    }

    app.history_lines = items.len();
    if app.scroll_to_bottom {
        app.history_scroll = app.max_history_scroll();
        app.scroll_to_bottom = false;
    } else {
        app.history_scroll = app.history_scroll.min(app.max_history_scroll());
    }

    let list = List::new(items);
    let mut state = ListState::default().with_offset(app.history_scroll);
    frame.render_stateful_widget(list, inner_area, &mut state);
}

fn render_details(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Details ")
        .title_alignment(Alignment::Center);

    let steps = app.session.last_steps();
    let lines: Vec<Line> = if steps.is_empty() {
        vec![Line::from(Span::styled(
            "Press = to see each step",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                Line::from(Span::styled(
                    format!("Step {}: {} = {}", i + 1, step.operation, format_result(step.result)),
                    Style::default().fg(Color::DarkGray),
                ))
            })
            .collect()
    };

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_status(frame: &mut Frame, area: Rect) {
    let keys = [
        ("Enter/=", "Calculate"),
        ("Bksp", "Undo"),
        ("C", "Clear"),
        ("D", "Details"),
        ("F1", "Help"),
        ("Q", "Quit"),
    ];

    let spans: Vec<Span> = keys
        .iter()
        .flat_map(|(key, desc)| {
            vec![
                Span::styled(
                    *key,
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" {} ", desc),
                    Style::default().fg(Color::DarkGray),
                ),
            ]
        })
        .collect();

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
