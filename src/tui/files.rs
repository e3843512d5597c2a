/// File pane — collapsible left panel listing the registry rows with checkboxes.
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};
use unicode_width::UnicodeWidthStr;

use super::AppState;
use super::chat::spinner_frame;
use crate::ui::{icon_glyph, row_icon};

/// Header, divider, footer divider, footer hint.
const CHROME_ROWS: usize = 4;

pub fn draw_files(f: &mut Frame, state: &AppState, area: Rect) {
    let focused = state.files_focused;
    let border_color = if focused { Color::Cyan } else { Color::Rgb(40, 38, 60) };

    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(Color::Rgb(6, 6, 12)));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let w = inner.width as usize;
    let mut items: Vec<ListItem<'static>> = Vec::new();

    // Header
    let ctrl_hint = if focused { " Esc=exit" } else { " Tab=focus" };
    let header_pad = w.saturating_sub(6 + ctrl_hint.len());
    items.push(ListItem::new(Line::from(vec![
        Span::styled(" Files", Style::default().fg(Color::Rgb(100, 95, 150)).add_modifier(Modifier::BOLD)),
        Span::raw(" ".repeat(header_pad)),
        Span::styled(ctrl_hint, Style::default().fg(Color::Rgb(50, 47, 75))),
    ])));
    items.push(ListItem::new(Line::from(Span::styled(
        "─".repeat(w),
        Style::default().fg(Color::Rgb(35, 33, 55)),
    ))));

    let list_rows = (inner.height as usize).saturating_sub(CHROME_ROWS);

    if state.registry.is_empty() {
        let (text, fg) = if state.registry_loading {
            let (glyph, _, color) = spinner_frame(state.spinner_tick);
            (format!(" {glyph} loading…"), color)
        } else {
            (" no files listed · r to refresh".to_string(), Color::Rgb(50, 47, 75))
        };
        items.push(ListItem::new(Line::from(Span::styled(text, Style::default().fg(fg)))));
    } else {
        // Scroll to keep the highlighted row visible
        let sel = state.files_selected;
        let skip = if list_rows > 0 && sel >= list_rows { sel + 1 - list_rows } else { 0 };

        for (i, row) in state.registry.rows().iter().enumerate().skip(skip).take(list_rows) {
            let highlighted = focused && i == sel;
            let checked = state.selection_view.is_checked(i);

            let (bg, name_fg) = match (highlighted, checked) {
                (true, _)      => (Color::Rgb(28, 26, 48), Color::White),
                (false, true)  => (Color::Reset, Color::Rgb(220, 200, 120)),
                (false, false) => (Color::Reset, Color::Rgb(150, 145, 190)),
            };
            let check = if checked { "[x]" } else { "[ ]" };
            let check_fg = if checked { Color::Rgb(220, 170, 40) } else { Color::Rgb(60, 57, 90) };
            let glyph = icon_glyph(row_icon(&row.file.kind, &row.file.extension));
            let indent = "  ".repeat(row.depth.min(6));

            // " [x] " + indent + glyph + " " + name
            let used = 5 + indent.len() + glyph.width() + 1;
            let name = fit(&row.file.name, w.saturating_sub(used));
            let name_style = if row.file.is_folder() {
                Style::default().fg(name_fg).bg(bg).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(name_fg).bg(bg)
            };
            items.push(ListItem::new(Line::from(vec![
                Span::styled(format!(" {check} "), Style::default().fg(check_fg).bg(bg)),
                Span::styled(indent, Style::default().bg(bg)),
                Span::styled(format!("{glyph} "), Style::default().fg(Color::Rgb(110, 105, 160)).bg(bg)),
                Span::styled(name, name_style),
            ])));
        }

        // Pad so the footer sits at the bottom
        let shown = state.registry.len().saturating_sub(skip).min(list_rows);
        for _ in shown..list_rows {
            items.push(ListItem::new(Line::raw("")));
        }
    }

    items.push(ListItem::new(Line::from(Span::styled(
        "─".repeat(w),
        Style::default().fg(Color::Rgb(35, 33, 55)),
    ))));
    let footer = if focused {
        " Space toggle  a all  c clear  r refresh"
    } else {
        " /all  /none  /refresh"
    };
    items.push(ListItem::new(Line::from(Span::styled(
        footer,
        Style::default().fg(Color::Rgb(55, 52, 80)),
    ))));

    f.render_widget(List::new(items), inner);
}

/// Cut `name` to `max` display columns, marking the cut with `…`.
fn fit(name: &str, max: usize) -> String {
    if name.width() <= max {
        return name.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for c in name.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if width + cw + 1 > max {
            break;
        }
        out.push(c);
        width += cw;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::fit;

    #[test]
    fn test_fit() {
        assert_eq!(fit("a.pdf", 10), "a.pdf");
        assert_eq!(fit("quarterly.pdf", 6), "quart…");
        assert_eq!(fit("abc", 0), "…");
    }
}
