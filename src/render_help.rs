use crate::tui_mode::app::App;
use crate::tui_mode::*;

pub fn render_help(frame: &mut Frame, app: &mut App) {
    let help_text = help_text();
    clamp_help_scroll(app, help_text.len());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Keypad Calculator Help ")
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(Color::Black));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll as u16, 0));

    frame.render_widget(Clear, frame.size());
    frame.render_widget(paragraph, frame.size());
}

/// Keeps at least the last help line on screen.
fn clamp_help_scroll(app: &mut App, line_count: usize) {
    app.help_scroll = app.help_scroll.min(line_count.saturating_sub(1));
}

fn help_text() -> Vec<Line<'static>> {
    let section = Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED);

    vec![
        Line::from(Span::styled("Keypad Calculator", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled("Operators (no parentheses, no unary minus):", section)),
        Line::from("  + : Addition        (e.g., 5+3 = 8)"),
        Line::from("  - : Subtraction     (e.g., 10-4 = 6)"),
        Line::from("  * : Multiplication  (e.g., 6*7 = 42)"),
        Line::from("  / : Division        (e.g., 15/3 = 5, 5/0 = Error)"),
        Line::from("  ^ : Power           (e.g., 2^3 = 8)"),
        Line::from("  % : Percent, typed as /100 (e.g., 10% = 0.1)"),
        Line::from(""),
        Line::from(Span::styled("Precedence:", section)),
        Line::from("  ^ binds tighter than * and /, which bind tighter than + and -"),
        Line::from("  Operators of equal rank run left to right: 2^3^2 = 64"),
        Line::from(""),
        Line::from(Span::styled("Keys:", section)),
        Line::from("  0-9 .       : Digits and decimal point"),
        Line::from("  Enter or =  : Calculate; the result stays as the next input"),
        Line::from("  Backspace   : Remove the last character"),
        Line::from("  C or Delete : Clear input and history"),
        Line::from("  D           : Show or hide the step-by-step details"),
        Line::from("  Up/Down     : Scroll history (also PgUp/PgDn, mouse wheel)"),
        Line::from("  F1          : Show this help screen"),
        Line::from("  Q or Esc    : Quit"),
        Line::from(""),
        Line::from(Span::styled("Notes:", section)),
        Line::from("  An operator right after another operator is ignored."),
        Line::from("  Results show at most six decimals."),
        Line::from(""),
        Line::from(Span::styled("Esc or F1 closes this screen", Style::default().fg(Color::DarkGray))),
    ]
}
