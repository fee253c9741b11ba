//! Terminal lifecycle, event loop, and rendering.

use std::error::Error;
use std::io;
use std::time::Duration;

use ratatui::{
    backend::CrosstermBackend,
    crossterm::{
        event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
        execute,
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    },
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tui_textarea::TextArea;

use crate::core::dispatch::DispatchOutcome;
use crate::ui::app::{App, InputMode};

const SCROLL_STEP: u16 = 5;

/// Run the interactive chat session until the user quits. The terminal is
/// restored on every exit path, including errors from the loop body.
pub async fn run_chat(
    mut app: App,
    mut rx: mpsc::UnboundedReceiver<(DispatchOutcome, u64)>,
) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, &mut rx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rx: &mut mpsc::UnboundedReceiver<(DispatchOutcome, u64)>,
) -> Result<(), Box<dyn Error>> {
    let mut input = TextArea::default();
    input.set_cursor_line_style(Style::default());

    loop {
        while let Ok((outcome, request_id)) = rx.try_recv() {
            app.on_outcome(request_id, outcome);
        }

        input.set_block(input_block(app));
        terminal.draw(|frame| render(frame, app, &input))?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if handle_key(app, &mut input, key) {
            return Ok(());
        }
    }
}

/// Returns true when the user asked to quit.
fn handle_key(app: &mut App, input: &mut TextArea<'static>, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('q') if ctrl => return true,
        KeyCode::Char('c') if ctrl => app.clear_transcript(),
        KeyCode::Char('p') if ctrl => app.next_provider(),
        KeyCode::Char('n') if ctrl => app.next_model(),
        KeyCode::Char('k') if ctrl => {
            app.toggle_key_entry();
            reset_input(input, app);
        }
        KeyCode::Esc => {
            if app.input_mode == InputMode::ApiKey {
                app.cancel_key_entry();
                reset_input(input, app);
            }
        }
        KeyCode::Enter => {
            let text = input.lines().join("\n");
            let consumed = match app.input_mode {
                InputMode::Message => app.begin_send(&text),
                InputMode::ApiKey => app.save_api_key(&text),
            };
            if consumed {
                reset_input(input, app);
            }
        }
        KeyCode::PageDown => app.scroll_offset = app.scroll_offset.saturating_add(SCROLL_STEP),
        KeyCode::PageUp => app.scroll_offset = app.scroll_offset.saturating_sub(SCROLL_STEP),
        _ => {
            input.input(key);
        }
    }
    false
}

fn reset_input(input: &mut TextArea<'static>, app: &App) {
    *input = TextArea::default();
    input.set_cursor_line_style(Style::default());
    if app.input_mode == InputMode::ApiKey {
        input.set_mask_char('•');
    }
}

fn input_block(app: &App) -> Block<'static> {
    let title = match app.input_mode {
        InputMode::Message => "Message (Enter to send)".to_string(),
        InputMode::ApiKey => format!(
            "API key for {} (Enter to save, Esc to cancel)",
            app.selected_provider().display_name
        ),
    };
    Block::default().borders(Borders::ALL).title(title)
}

fn render(frame: &mut Frame, app: &App, input: &TextArea) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_transcript(frame, app, chunks[1]);
    frame.render_widget(input, chunks[2]);
    render_status(frame, app, chunks[3]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let provider = app.selected_provider();
    let key_status = if !provider.requires_api_key {
        "no key needed"
    } else if app.key_configured() {
        "key saved"
    } else {
        "no key"
    };

    let line = Line::from(vec![
        Span::styled("chatmux", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(
            format!(
                "{} · {} · {}",
                provider.display_name,
                app.selected_model(),
                key_status
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_transcript(frame: &mut Frame, app: &App, area: Rect) {
    let lines = transcript_lines(app);

    let visible_height = area.height.saturating_sub(2);
    let max_offset = (lines.len() as u16).saturating_sub(visible_height);
    let offset = app.scroll_offset.min(max_offset);

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Conversation"))
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    frame.render_widget(paragraph, area);
}

fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if let Some(pending) = &app.pending {
        lines.push(user_line(&pending.user_text));
        lines.push(Line::from(Span::styled(
            format!("{} is thinking…", pending.provider_name),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
        lines.push(Line::from(""));
    }

    for turn in &app.turns {
        lines.push(user_line(&turn.user_text));
        match &turn.outcome {
            Ok(text) => {
                lines.push(Line::from(Span::styled(
                    format!("{}:", turn.provider_name),
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                )));
                for content_line in text.lines() {
                    lines.push(Line::from(content_line.to_string()));
                }
            }
            Err(err) => {
                lines.push(Line::from(Span::styled(
                    format!("Error: {err}"),
                    Style::default().fg(Color::Red),
                )));
            }
        }
        lines.push(Line::from(""));
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "Pick a provider with Ctrl+P, save an API key with Ctrl+K, and say hello.",
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines
}

fn user_line(text: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            "You: ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(text.to_string(), Style::default().fg(Color::Cyan)),
    ])
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = Line::from(vec![
        Span::styled(app.status.clone(), Style::default().fg(Color::DarkGray)),
        Span::styled(
            "  —  Enter send · Ctrl+K key · Ctrl+P provider · Ctrl+N model · Ctrl+C clear · Ctrl+Q quit",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
