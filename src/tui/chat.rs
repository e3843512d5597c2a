/// Chat history pane rendering — build_items, draw_history, draw_chips, spinner, utilities.
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, List, ListItem, Paragraph},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::AppState;
use super::transcript_view::Node;
use crate::session::{ChatMessage, Sender};
use crate::ui::icon_glyph;

// ── Spinner ────────────────────────────────────────────────────────────────────

const SPINNER_GLYPHS: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];
/// Frames each status message stays up (16 × 120ms ticks ≈ 2s).
const MSG_FRAMES: usize = 16;
const SPINNER_MSGS: [(&str, Color); 5] = [
    ("thinking…",          Color::Cyan),
    ("reading files…",     Color::Cyan),
    ("searching…",         Color::Rgb(0, 200, 255)),
    ("crafting answer…",   Color::Rgb(0, 220, 180)),
    ("almost there…",      Color::Rgb(100, 200, 255)),
];

/// Glyph, status message and colour for animation frame `tick`.
pub fn spinner_frame(tick: u32) -> (&'static str, &'static str, Color) {
    let tick = tick as usize;
    let (msg, color) = SPINNER_MSGS[(tick / MSG_FRAMES) % SPINNER_MSGS.len()];
    (SPINNER_GLYPHS[tick % SPINNER_GLYPHS.len()], msg, color)
}

// ── History items builder ──────────────────────────────────────────────────────

pub fn build_items(state: &AppState, term_width: u16) -> Vec<ListItem<'static>> {
    let mut items: Vec<ListItem<'static>> = Vec::new();

    for node in state.transcript.nodes() {
        match node {
            Node::Message(msg) if msg.sender == Sender::User => {
                push_user_bubble(&mut items, msg, state.show_timestamps, term_width);
            }
            Node::Message(msg) => {
                push_bot_lines(&mut items, msg, state.show_timestamps, term_width);
            }
            Node::Typing(_) => {
                let (glyph, _, color) = spinner_frame(state.spinner_tick);
                items.push(ListItem::new(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(format!("{glyph} "), Style::default().fg(color).add_modifier(Modifier::BOLD)),
                    Span::styled("typing…", Style::default().fg(Color::Rgb(90, 90, 120)).add_modifier(Modifier::ITALIC)),
                ])));
            }
            Node::Notice(text) => {
                for line in text.lines() {
                    items.push(ListItem::new(Line::from(vec![
                        Span::raw("  "),
                        Span::styled(line.to_string(), Style::default().fg(Color::DarkGray)),
                    ])));
                }
            }
        }
    }

    items
}

fn push_user_bubble(items: &mut Vec<ListItem<'static>>, msg: &ChatMessage, timestamps: bool, term_width: u16) {
    let bg = Color::Rgb(22, 30, 44);
    let label_fg = Color::Rgb(120, 190, 255);
    let body_style = Style::default().fg(Color::Rgb(228, 236, 250)).bg(bg);
    let edge_style = Style::default().fg(Color::Rgb(70, 120, 190)).bg(bg);

    // 2 cols left margin, 1 right
    let inner_w = (term_width as usize).saturating_sub(3).max(10);
    let stamp = if timestamps { format!(" · {}", msg.timestamp) } else { String::new() };
    // "╭─ " + "you" + stamp + " " + dashes + "╮"
    let dash_total = inner_w.saturating_sub(3 + 3 + stamp.width() + 2);
    items.push(ListItem::new(Line::from(vec![
        Span::raw("  "),
        Span::styled("╭─ ", edge_style),
        Span::styled("you", Style::default().fg(label_fg).bg(bg).add_modifier(Modifier::BOLD)),
        Span::styled(stamp, Style::default().fg(Color::Rgb(90, 80, 150)).bg(bg)),
        Span::styled(format!(" {}╮", "─".repeat(dash_total)), edge_style),
    ])));

    let wrap_width = inner_w.saturating_sub(2).max(10);
    for line in msg.text.lines().flat_map(|l| wrap_text(l, wrap_width)) {
        items.push(ListItem::new(Line::from(vec![
            Span::raw("  "),
            Span::styled("│ ", edge_style),
            Span::styled(line, body_style),
        ])));
    }

    items.push(ListItem::new(Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("╰{}╯", "─".repeat(inner_w.saturating_sub(2))), edge_style),
    ])));
    items.push(ListItem::new(Line::raw("")));
}

fn push_bot_lines(items: &mut Vec<ListItem<'static>>, msg: &ChatMessage, timestamps: bool, term_width: u16) {
    // "  bot   " = 8 cols of indent
    let wrap_width = (term_width as usize).saturating_sub(8).max(20);
    let label_fg = Color::Rgb(90, 220, 160);
    let text_fg = Color::Rgb(215, 225, 235);

    let mut first = true;
    for w in msg.text.lines().flat_map(|l| wrap_text(l, wrap_width)) {
        if first {
            first = false;
            items.push(ListItem::new(Line::from(vec![
                Span::raw("  "),
                Span::styled("bot", Style::default().fg(label_fg).add_modifier(Modifier::BOLD)),
                Span::raw("   "),
                Span::styled(w, Style::default().fg(text_fg)),
            ])));
        } else {
            items.push(ListItem::new(Line::from(vec![
                Span::raw("        "),
                Span::styled(w, Style::default().fg(text_fg)),
            ])));
        }
    }
    if first {
        // Empty answer still gets its label
        items.push(ListItem::new(Line::from(Span::styled(
            "  bot",
            Style::default().fg(label_fg).add_modifier(Modifier::BOLD),
        ))));
    }
    if timestamps {
        items.push(ListItem::new(Line::from(Span::styled(
            format!("        {}", msg.timestamp),
            Style::default().fg(Color::Rgb(60, 60, 85)),
        ))));
    }
    items.push(ListItem::new(Line::raw("")));
}

// ── Draw functions ─────────────────────────────────────────────────────────────

pub fn draw_history(f: &mut Frame, state: &AppState, area: Rect) {
    let items = build_items(state, area.width);
    // `scroll` counts lines up from the bottom
    let overflow = items.len().saturating_sub(area.height as usize);
    let first = overflow.saturating_sub(state.scroll);
    let list = List::new(items.into_iter().skip(first).collect::<Vec<_>>())
        .block(Block::default().style(Style::default().bg(Color::Rgb(8, 8, 14))));
    f.render_widget(list, area);
}

pub fn draw_chips(f: &mut Frame, state: &AppState, area: Rect) {
    let view = &state.selection_view;
    let mut spans = vec![Span::styled(" ⊂ ", Style::default().fg(Color::DarkGray))];

    if let Some(placeholder) = view.placeholder() {
        spans.push(Span::styled(placeholder, Style::default().fg(Color::Rgb(70, 70, 90))));
    }
    for (i, chip) in view.chips.iter().enumerate() {
        let focused = state.focused_chip == Some(i);
        let (bg, fg) = if focused {
            (Color::Cyan, Color::Black)
        } else {
            (Color::DarkGray, Color::White)
        };
        spans.push(Span::styled(
            format!(" {} {} ✕ ", icon_glyph(chip.icon), truncate_middle(&chip.name, 24)),
            Style::default().fg(fg).bg(bg),
        ));
        spans.push(Span::raw(" "));
    }
    if !view.chips.is_empty() {
        spans.push(Span::styled(
            " Ctrl+O to focus · Del to remove ",
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ── Utilities ──────────────────────────────────────────────────────────────────

/// Word-wrap a single line of text to `max_width` display columns.
/// Splits on whitespace; a word wider than the line is hard-split.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for word in text.split_whitespace() {
        let word_width = word.width();
        if current_width > 0 && current_width + 1 + word_width <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_width;
            continue;
        }
        if current_width > 0 {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }
        for c in word.chars() {
            let w = c.width().unwrap_or(0);
            if current_width + w > max_width && current_width > 0 {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }
            current.push(c);
            current_width += w;
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Shorten to `max` chars, keeping both ends: `http://exa…com:5000`.
pub fn truncate_middle(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if count <= max || max < 3 {
        return s.to_string();
    }
    let keep = max - 1;
    let head = keep.div_ceil(2);
    let tail = keep - head;
    let start: String = s.chars().take(head).collect();
    let end: String = s.chars().skip(count - tail).collect();
    format!("{start}…{end}")
}
