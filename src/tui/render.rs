/// Ratatui draw entry-point for filechat.
/// Thin dispatcher — most rendering lives in chat.rs, files.rs and overlays.rs.
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use super::chat::{spinner_frame, truncate_middle};
use super::selection_view::SearchScope;
use super::{AppState, Mode};
use crate::session::Phase;

/// Width of the file pane when visible.
const FILES_PANE_WIDTH: u16 = 34;

// ── Main draw entry point ─────────────────────────────────────────────────────

pub fn draw(f: &mut Frame, state: &AppState) {
    let area = f.area();

    // Horizontal split when the file pane is visible
    let main_area = if state.files_visible {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(FILES_PANE_WIDTH), Constraint::Min(0)])
            .split(area);
        super::files::draw_files(f, state, cols[0]);
        cols[1]
    } else {
        area
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // conversation
            Constraint::Length(1), // status bar
            Constraint::Length(1), // selection chips
            Constraint::Length(3), // input box
        ])
        .split(main_area);

    super::chat::draw_history(f, state, chunks[0]);
    draw_status_bar(f, state, chunks[1]);
    super::chat::draw_chips(f, state, chunks[2]);
    draw_input(f, state, chunks[3]);

    match state.mode {
        Mode::Palette => super::overlays::draw_palette(f, state, area),
        Mode::SlashComplete => super::overlays::draw_slash_complete(f, state, area),
        Mode::Normal => {}
    }
    if let Some(dialog) = &state.dialog {
        super::overlays::draw_dialog(f, dialog, area);
    }
}

// ── Status bar ────────────────────────────────────────────────────────────────

fn draw_status_bar(f: &mut Frame, state: &AppState, area: Rect) {
    let view = &state.selection_view;

    // Animated spinner glyph while a request is outstanding
    let (status_glyph, status_color) = if state.is_loading() {
        let (g, _, color) = spinner_frame(state.spinner_tick);
        (g, color)
    } else {
        ("▲", Color::White)
    };

    let scope_color = match view.scope {
        SearchScope::All => Color::Rgb(90, 160, 120),
        SearchScope::Selected => Color::Rgb(220, 170, 40),
    };

    let mut spans = vec![
        Span::raw(" "),
        Span::styled(status_glyph, Style::default().fg(status_color).add_modifier(Modifier::BOLD)),
        Span::styled(" filechat", Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(state.profile.clone(), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled("  ·  ", Style::default().fg(Color::DarkGray)),
        Span::styled(view.scope.label(), Style::default().fg(scope_color).add_modifier(Modifier::BOLD)),
        Span::styled("  ·  ", Style::default().fg(Color::DarkGray)),
        Span::styled(view.count_label.clone(), Style::default().fg(Color::Rgb(170, 165, 210))),
        Span::raw("  "),
        Span::styled(truncate_middle(&state.endpoint, 32), Style::default().fg(Color::DarkGray)),
    ];

    match state.session.phase() {
        Phase::Sending => {
            spans.push(Span::styled("  sending…", Style::default().fg(Color::Cyan)));
        }
        Phase::AwaitingResponse => {
            let (_, msg, color) = spinner_frame(state.spinner_tick);
            spans.push(Span::styled(format!("  {msg}"), Style::default().fg(color)));
        }
        _ => {
            spans.push(Span::styled(
                "  Ctrl+B files  Ctrl+P commands",
                Style::default().fg(Color::Rgb(55, 50, 90)),
            ));
        }
    }

    let bar_style = if state.session.is_busy() {
        Style::default().bg(Color::Rgb(15, 15, 25))
    } else {
        Style::default().bg(Color::Rgb(10, 10, 18))
    };

    f.render_widget(Paragraph::new(Line::from(spans)).style(bar_style), area);
}

// ── Input box ─────────────────────────────────────────────────────────────────

fn draw_input(f: &mut Frame, state: &AppState, area: Rect) {
    let busy = state.session.is_busy();
    let (border_color, prompt_color, prompt_char) = match state.mode {
        Mode::Palette                   => (Color::Cyan,             Color::Cyan,     "⌘"),
        Mode::SlashComplete             => (Color::Cyan,             Color::Cyan,     "/"),
        Mode::Normal if busy            => (Color::Rgb(40, 40, 60),  Color::DarkGray, "·"),
        Mode::Normal if state.files_focused => (Color::Rgb(40, 40, 60), Color::DarkGray, "❯"),
        Mode::Normal if state.session.can_submit() => (Color::Cyan, Color::Cyan, "❯"),
        Mode::Normal                    => (Color::Rgb(60, 60, 80),  Color::Cyan,     "❯"),
    };

    let prompt_span = Span::styled(
        format!("  {prompt_char} "),
        Style::default().fg(prompt_color).add_modifier(Modifier::BOLD),
    );

    let input_text = if state.mode == Mode::Palette {
        state.palette_query.as_str()
    } else {
        state.session.input()
    };

    let content_span = if !input_text.is_empty() {
        Span::styled(input_text.to_string(), Style::default().fg(Color::White))
    } else if state.mode == Mode::Palette {
        Span::styled("search commands and questions…", Style::default().fg(Color::Rgb(70, 70, 90)))
    } else if busy {
        Span::styled(
            "waiting for the answer · you can keep typing",
            Style::default().fg(Color::Rgb(60, 60, 80)),
        )
    } else {
        Span::styled(
            "ask about your files · / commands · Tab file pane · Ctrl+P suggestions",
            Style::default().fg(Color::Rgb(70, 70, 90)),
        )
    };

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(Color::Rgb(8, 8, 14)));

    let paragraph = Paragraph::new(Line::from(vec![prompt_span, content_span]))
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, area);

    // Position cursor at the actual edit cursor, not end of string
    if state.dialog.is_none() && !state.files_focused {
        use unicode_width::UnicodeWidthStr;
        // prompt is "  ❯ " — 4 visible cols
        let prompt_width: u16 = 4;
        let cursor_byte = if state.mode == Mode::Palette {
            input_text.len()
        } else {
            state.cursor.min(input_text.len())
        };
        let cursor_x = area.x + prompt_width + input_text[..cursor_byte].width() as u16;
        let cursor_y = area.y + 1; // +1 for top border
        if cursor_x < area.x + area.width {
            f.set_cursor_position((cursor_x, cursor_y));
        }
    }
}
