use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs};
use ratatui::Frame;
use strum::IntoEnumIterator;
use time::{macros::format_description, OffsetDateTime};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{AdvancedFocus, AdvancedTagEditor, AppState, BasicInfoEditor, EditorTab, TextField};
use crate::config::Palette;
use crate::poi::{TagField, TagWarnings};

const HIGHLIGHT_SYMBOL: &str = "▸ ";
const KEY_VALUE_SEPARATOR: &str = " = ";

pub fn draw_app(frame: &mut Frame, state: &AppState, palette: &Palette) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(2),
        ])
        .split(frame.size());

    draw_tabs(frame, state, palette, vertical[0]);
    match state.tab() {
        EditorTab::Basic => draw_basic(frame, state.basic(), palette, vertical[1]),
        EditorTab::Advanced => draw_advanced(frame, state.advanced(), palette, vertical[1]),
    }
    frame.render_widget(
        Paragraph::new(build_status_lines(state, palette)),
        vertical[2],
    );
}

fn draw_tabs(frame: &mut Frame, state: &AppState, palette: &Palette, area: Rect) {
    let dirty = if state.is_dirty() { " *" } else { "" };
    let title = format!(
        "{} [{}]{}",
        state.title(),
        state.document.action,
        dirty
    );
    let tabs = Tabs::new(EditorTab::iter().map(|tab| tab.to_string()).collect::<Vec<_>>())
        .select(state.tab().index())
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent)),
        )
        .highlight_style(
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        );
    frame.render_widget(tabs, area);
}

fn draw_basic(frame: &mut Frame, editor: &BasicInfoEditor, palette: &Palette, area: Rect) {
    let label_width = editor
        .fields()
        .iter()
        .map(|field| field.key.width())
        .max()
        .unwrap_or(0);
    let items: Vec<ListItem> = editor
        .fields()
        .iter()
        .map(|field| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<label_width$}  ", field.key),
                    Style::default().fg(palette.muted),
                ),
                Span::raw(field.input.text().to_string()),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(Block::default().title("Basic").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .fg(palette.selection_fg)
                .bg(palette.selection_bg),
        )
        .highlight_symbol(HIGHLIGHT_SYMBOL);
    let mut list_state = ListState::default();
    if !editor.fields().is_empty() {
        list_state.select(Some(editor.selected()));
    }
    frame.render_stateful_widget(list, area, &mut list_state);

    if let Some(field) = editor.fields().get(editor.selected()) {
        let row = editor.selected().saturating_sub(list_state.offset()) as u16;
        let x = area.x + 1 + HIGHLIGHT_SYMBOL.width() as u16 + label_width as u16 + 2;
        place_cursor(frame, area, x + cursor_offset(&field.input), area.y + 1 + row);
    }
}

fn draw_advanced(frame: &mut Frame, editor: &AdvancedTagEditor, palette: &Palette, area: Rect) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(3),
        ])
        .split(area);
    let new_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(layout[0]);

    let focus = editor.focus();
    let input_block = |title: &'static str, focused: bool| {
        let style = if focused {
            Style::default().fg(palette.accent)
        } else {
            Style::default()
        };
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(style)
    };
    frame.render_widget(
        Paragraph::new(editor.new_key().text().to_string())
            .block(input_block("New key", focus == AdvancedFocus::NewKey)),
        new_row[0],
    );
    frame.render_widget(
        Paragraph::new(editor.new_value().text().to_string())
            .block(input_block("Value (Enter to add)", focus == AdvancedFocus::NewValue)),
        new_row[1],
    );

    let suggestion_line = if editor.suggestions().is_empty() {
        Line::from(Span::styled(
            format!("{} tag(s)", editor.rows().len()),
            Style::default().fg(palette.muted),
        ))
    } else {
        let chips = editor
            .suggestions()
            .iter()
            .enumerate()
            .map(|(idx, key)| format!("{}:{key}", idx + 1))
            .collect::<Vec<_>>()
            .join("  ");
        Line::from(Span::styled(
            format!("Alt+1-9: {chips}"),
            Style::default().fg(palette.status),
        ))
    };
    frame.render_widget(Paragraph::new(suggestion_line), layout[1]);

    let list_area = layout[2];
    let inner_width = list_area.width.saturating_sub(2 + HIGHLIGHT_SYMBOL.width() as u16) as usize;
    let key_width = key_column_width(editor, inner_width);
    let value_width = inner_width.saturating_sub(key_width + KEY_VALUE_SEPARATOR.width());

    let focused_row = match focus {
        AdvancedFocus::Row { index, field } => Some((index, field)),
        _ => None,
    };
    let selected_style = Style::default()
        .fg(palette.selection_fg)
        .bg(palette.selection_bg)
        .add_modifier(Modifier::BOLD);
    let items: Vec<ListItem> = editor
        .rows()
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let field_style = |field: TagField| match focused_row {
                Some((focused, focused_field)) if focused == idx && focused_field == field => {
                    selected_style
                }
                _ => Style::default(),
            };
            let mut spans = vec![
                Span::styled(
                    pad_to_width(&fit_width(row.key().text(), key_width), key_width),
                    field_style(TagField::Key).add_modifier(Modifier::BOLD),
                ),
                Span::styled(KEY_VALUE_SEPARATOR, Style::default().fg(palette.muted)),
                Span::styled(
                    fit_width(row.value().text(), value_width),
                    field_style(TagField::Value),
                ),
            ];
            if row.warnings() != TagWarnings::empty() {
                spans.push(Span::styled(
                    format!("  ! {}", row.warnings().describe().join(", ")),
                    Style::default().fg(palette.warning),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    let items = if items.is_empty() {
        vec![ListItem::new(Span::styled(
            "No tags yet. Type a key above and press Enter.",
            Style::default().fg(palette.muted),
        ))]
    } else {
        items
    };
    let list = List::new(items)
        .block(
            Block::default()
                .title("Tags (Ctrl-d delete row)")
                .borders(Borders::ALL),
        )
        .highlight_symbol(HIGHLIGHT_SYMBOL);
    let mut list_state = ListState::default();
    list_state.select(focused_row.map(|(index, _)| index));
    frame.render_stateful_widget(list, list_area, &mut list_state);

    match focus {
        AdvancedFocus::NewKey => place_cursor(
            frame,
            new_row[0],
            new_row[0].x + 1 + cursor_offset(editor.new_key()),
            new_row[0].y + 1,
        ),
        AdvancedFocus::NewValue => place_cursor(
            frame,
            new_row[1],
            new_row[1].x + 1 + cursor_offset(editor.new_value()),
            new_row[1].y + 1,
        ),
        AdvancedFocus::Row { index, field } => {
            if let Some(row) = editor.rows().get(index) {
                let line = index.saturating_sub(list_state.offset()) as u16;
                let mut x = list_area.x + 1 + HIGHLIGHT_SYMBOL.width() as u16;
                if field == TagField::Value {
                    x += (key_width + KEY_VALUE_SEPARATOR.width()) as u16;
                }
                let input = row.field(field);
                place_cursor(frame, list_area, x + cursor_offset(input), list_area.y + 1 + line);
            }
        }
    }
}

fn key_column_width(editor: &AdvancedTagEditor, inner_width: usize) -> usize {
    let widest = editor
        .rows()
        .iter()
        .map(|row| row.key().text().width())
        .max()
        .unwrap_or(0)
        .max(3);
    widest.min(inner_width / 3).max(1)
}

fn cursor_offset(field: &TextField) -> u16 {
    field.text()[..field.cursor()].width() as u16
}

/// Keeps the cursor inside the bordered area it belongs to.
fn place_cursor(frame: &mut Frame, area: Rect, x: u16, y: u16) {
    let max_x = area.x + area.width.saturating_sub(2);
    let max_y = area.y + area.height.saturating_sub(2);
    frame.set_cursor(x.min(max_x), y.min(max_y));
}

/// Truncates to `width` terminal columns, marking the cut with an ellipsis.
fn fit_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

fn pad_to_width(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(pad))
}

fn build_status_lines(state: &AppState, palette: &Palette) -> Vec<Line<'static>> {
    let message = state
        .status_message()
        .or_else(|| match state.tab() {
            EditorTab::Advanced => state.advanced().status(),
            EditorTab::Basic => None,
        })
        .map(str::to_string);
    let mut first = Vec::new();
    if let Some(message) = message {
        first.push(Span::styled(message, Style::default().fg(palette.status)));
    } else {
        let saved = state
            .document
            .modified_at()
            .map(|dt| format!("saved {}", format_time_short(dt)))
            .unwrap_or_else(|| "not saved yet".to_string());
        first.push(Span::styled(saved, Style::default().fg(palette.muted)));
    }
    let hints = match state.tab() {
        EditorTab::Advanced => {
            "Tab/↑↓ move • Enter add • Ctrl-d delete • Ctrl-t basic • Ctrl-s save • Ctrl-r reload • Esc quit"
        }
        EditorTab::Basic => {
            "↑↓ field • type to edit • Ctrl-t advanced • Ctrl-s save • Ctrl-r reload • Esc quit"
        }
    };
    vec![
        Line::from(first),
        Line::from(Span::styled(hints, Style::default().fg(palette.muted))),
    ]
}

fn format_time_short(dt: OffsetDateTime) -> String {
    dt.format(&format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|_| dt.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::poi::{PoiDocument, Tag};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn render(state: &AppState) -> String {
        let backend = TestBackend::new(80, 20);
        let mut terminal = Terminal::new(backend).expect("terminal");
        let palette = AppConfig::default().palette();
        terminal
            .draw(|frame| draw_app(frame, state, &palette))
            .expect("draw");
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn advanced_tab_lists_rows_and_warnings() {
        let mut doc = PoiDocument::new(0.0, 0.0);
        doc.tags = vec![
            Tag::new("name", "Cafe"),
            Tag::new("name", "Other"),
            Tag::new("amenity", "cafe"),
        ];
        let mut state = AppState::new(doc, &AppConfig::default());
        let screen = render(&state);
        assert!(screen.contains("Advanced"));
        assert!(screen.contains("amenity"));
        assert!(screen.contains("duplicate key"));
        assert!(screen.contains("Cafe [create]"));

        state.with_advanced(|editor, data| {
            editor.focus_vertical(1);
            editor.focus_next();
            editor.insert_char(data, '!');
        });
        let screen = render(&state);
        assert!(screen.contains("Cafe! [create] *"));
    }

    #[test]
    fn basic_tab_shows_configured_fields() {
        let mut doc = PoiDocument::new(0.0, 0.0);
        doc.tags = vec![Tag::new("phone", "+43 1 234")];
        let mut state = AppState::new(doc, &AppConfig::default());
        state.switch_tab(EditorTab::Basic);
        let screen = render(&state);
        assert!(screen.contains("opening_hours"));
        assert!(screen.contains("+43 1 234"));
    }

    #[test]
    fn fit_width_marks_truncation() {
        assert_eq!(fit_width("opening_hours", 8), "opening…");
        assert_eq!(fit_width("name", 8), "name");
        assert_eq!(pad_to_width("ab", 4), "ab  ");
    }
}
