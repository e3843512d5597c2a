/// Overlay/popup draw functions — palette, slash-complete, dialogs.
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use super::chat::wrap_text;
use super::{AppState, Dialog, PaletteItem, palette_items, slash_filtered};

/// Centered popup of at most `width` × `height`, inset from the screen edge.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect { x, y, width, height }
}

// ── Command palette ────────────────────────────────────────────────────────────

pub fn draw_palette(f: &mut Frame, state: &AppState, area: Rect) {
    let popup_area = centered(area, 64, 16);
    f.render_widget(Clear, popup_area);

    let entries = palette_items(&state.palette_query, &state.suggestions);
    let sel = state.palette_selected;

    let items: Vec<ListItem<'static>> = entries
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let highlighted = i == sel;
            let (key, label, key_fg) = match item {
                PaletteItem::Command(c) => (c.key.to_string(), c.label.to_string(), Color::Cyan),
                PaletteItem::Suggestion(q) => ("?".to_string(), q.clone(), Color::Rgb(220, 170, 40)),
            };
            let (key_style, label_style) = if highlighted {
                (
                    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
                    Style::default().fg(Color::Black).bg(Color::Cyan),
                )
            } else {
                (Style::default().fg(key_fg), Style::default().fg(Color::DarkGray))
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("  {key:<14}"), key_style),
                Span::styled(label, label_style),
            ]))
        })
        .collect();

    let outer_block = Block::default()
        .title(Span::styled(
            " Commands & Questions ",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = outer_block.inner(popup_area);
    f.render_widget(outer_block, popup_area);

    // Search bar at top of inner area
    let search_area = Rect { height: 1, ..inner };
    let list_area = Rect {
        y: inner.y + 2,
        height: inner.height.saturating_sub(2),
        ..inner
    };

    let search_line = Line::from(vec![
        Span::styled("  ❯ ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(state.palette_query.clone()),
    ]);
    f.render_widget(Paragraph::new(search_line), search_area);

    if items.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled("  nothing matches", Style::default().fg(Color::DarkGray))),
            list_area,
        );
        return;
    }

    // Scroll to keep selected visible
    let visible = list_area.height as usize;
    let skip = if visible > 0 && sel >= visible { sel - visible + 1 } else { 0 };
    let sliced: Vec<ListItem<'static>> = items.into_iter().skip(skip).take(visible).collect();
    f.render_widget(List::new(sliced), list_area);
}

// ── Slash autocomplete ─────────────────────────────────────────────────────────

pub fn draw_slash_complete(f: &mut Frame, state: &AppState, area: Rect) {
    let matches = slash_filtered(state.session.input());
    if matches.is_empty() {
        return;
    }

    let count = matches.len() as u16;
    let height = (count + 2).min(14).min(area.height.saturating_sub(4));
    let width = 62u16.min(area.width.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    // Anchor above the input box
    let y = area.y + area.height.saturating_sub(height + 4);
    let popup_area = Rect { x, y, width, height };

    f.render_widget(Clear, popup_area);

    let sel = state.slash_complete_selected;
    let items: Vec<ListItem<'static>> = matches
        .iter()
        .enumerate()
        .map(|(i, cmd)| {
            let (key_style, label_style) = if i == sel {
                (
                    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
                    Style::default().fg(Color::Black).bg(Color::Cyan),
                )
            } else {
                (Style::default().fg(Color::Cyan), Style::default().fg(Color::DarkGray))
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("  {:<16}", cmd.key), key_style),
                Span::styled(cmd.label.to_string(), label_style),
            ]))
        })
        .collect();

    let block = Block::default()
        .title(Span::styled(
            " Commands  ↑↓ navigate  Tab complete  Enter run  Esc cancel ",
            Style::default().fg(Color::DarkGray),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(popup_area);
    f.render_widget(block, popup_area);

    let visible = inner.height as usize;
    let skip = if visible > 0 && sel >= visible { sel - visible + 1 } else { 0 };
    let visible_items: Vec<ListItem<'static>> = items.into_iter().skip(skip).take(visible).collect();
    f.render_widget(List::new(visible_items), inner);
}

// ── Dialogs ────────────────────────────────────────────────────────────────────

pub fn draw_dialog(f: &mut Frame, dialog: &Dialog, area: Rect) {
    let (title, message, accent, hint) = match dialog {
        Dialog::Confirm { message, .. } => (
            " Confirm ",
            message.as_str(),
            Color::Rgb(220, 170, 40),
            vec![
                Span::styled("  y", Style::default().fg(Color::Rgb(220, 170, 40)).add_modifier(Modifier::BOLD)),
                Span::styled("/Enter confirm  ", Style::default().fg(Color::DarkGray)),
                Span::styled("n", Style::default().fg(Color::Rgb(220, 170, 40)).add_modifier(Modifier::BOLD)),
                Span::styled("/Esc cancel", Style::default().fg(Color::DarkGray)),
            ],
        ),
        Dialog::Alert { message } => (
            " filechat ",
            message.as_str(),
            Color::Rgb(110, 90, 200),
            vec![
                Span::styled("  Enter", Style::default().fg(Color::Rgb(160, 140, 255)).add_modifier(Modifier::BOLD)),
                Span::styled(" to close", Style::default().fg(Color::DarkGray)),
            ],
        ),
    };

    // Size to the wrapped message: borders + blank + hint
    let width = 60u16.min(area.width.saturating_sub(4));
    let text_width = (width as usize).saturating_sub(4);
    let body_lines = message
        .lines()
        .flat_map(|l| wrap_text(l, text_width))
        .count() as u16;
    let popup_area = centered(area, width, body_lines + 4);

    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(Span::styled(title, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
        .style(Style::default().bg(Color::Rgb(12, 12, 22)));

    let inner = block.inner(popup_area);
    f.render_widget(block, popup_area);

    let hint_area = Rect {
        y: inner.y + inner.height.saturating_sub(1),
        height: 1,
        ..inner
    };
    let body_area = Rect {
        x: inner.x + 1,
        width: inner.width.saturating_sub(2),
        height: inner.height.saturating_sub(2),
        ..inner
    };

    let body: Vec<Line<'static>> = message
        .lines()
        .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(Color::Rgb(225, 222, 245)))))
        .collect();
    f.render_widget(Paragraph::new(body).wrap(Wrap { trim: false }), body_area);
    f.render_widget(Paragraph::new(Line::from(hint)), hint_area);
}

#[cfg(test)]
mod tests {
    use super::centered;
    use ratatui::layout::Rect;

    #[test]
    fn test_centered_fits_small_screens() {
        let area = Rect { x: 0, y: 0, width: 30, height: 10 };
        let r = centered(area, 60, 16);
        assert_eq!((r.width, r.height), (26, 6));
        assert_eq!((r.x, r.y), (2, 2));

        let big = Rect { x: 0, y: 0, width: 100, height: 40 };
        let r = centered(big, 60, 16);
        assert_eq!((r.x, r.y, r.width, r.height), (20, 12, 60, 16));
    }
}
