//! Entity table component - the list screen shared by every resource
//!
//! Key handling lives on the component; rendering is a free function over
//! a render context because it needs the table controller and the app
//! context, both owned by `App`.

use crate::action::Action;
use crate::component::Component;
use crate::components::layout::{calculate_main_layout, fit};
use crate::model::context::{AppContext, ToastLevel};
use crate::model::pagination::PaginationMode;
use crate::model::row::{display_value, lookup, UiRow};
use crate::model::schema::EntitySchema;
use crate::model::table::{LoadState, TableController};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

const MIN_COLUMN_WIDTH: usize = 4;
const MAX_COLUMN_WIDTH: usize = 32;
const STATUS_WIDTH: usize = 12;
/// Selection marker, expansion marker and cursor prefix
const ROW_PREFIX_WIDTH: usize = 8;

// ═══════════════════════════════════════════════════════════════════════════════
// Entity Table Component
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct EntityTableComponent;

impl EntityTableComponent {
    pub fn new() -> Self {
        Self
    }
}

impl Component for EntityTableComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let action = match key.code {
            // Rows
            KeyCode::Char('j') | KeyCode::Down => Some(Action::NextItem),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::PrevItem),
            KeyCode::Char('g') | KeyCode::Home => Some(Action::FirstItem),
            KeyCode::Char('G') | KeyCode::End => Some(Action::LastItem),

            // Pages
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Char(']') | KeyCode::PageDown => {
                Some(Action::NextPage)
            }
            KeyCode::Char('h') | KeyCode::Left | KeyCode::Char('[') | KeyCode::PageUp => {
                Some(Action::PrevPage)
            }
            KeyCode::Char('{') => Some(Action::FirstPage),
            KeyCode::Char('}') => Some(Action::LastPage),
            KeyCode::Char('z') => Some(Action::CycleRowsPerPage),

            // Selection
            KeyCode::Char('a') if ctrl => Some(Action::SelectAll),
            KeyCode::Char(' ') => Some(Action::ToggleSelection),
            KeyCode::Enter => Some(Action::ToggleExpand),
            KeyCode::Esc => Some(Action::ClearSelection),

            // Search
            KeyCode::Char('/') => Some(Action::OpenSearch),

            // Mutations
            KeyCode::Char('c') | KeyCode::Char('n') => Some(Action::OpenCreateForm),
            KeyCode::Char('e') => Some(Action::OpenEditForm),
            KeyCode::Char('d') | KeyCode::Delete => Some(Action::RequestDelete),
            KeyCode::Char('a') => Some(Action::RequestApprove),
            KeyCode::Char('o') => Some(Action::OpenDocuments),

            // Data
            KeyCode::Char('r') => Some(Action::Refresh),
            KeyCode::Char('t') => Some(Action::OpenResourcePicker),
            KeyCode::Char('L') => Some(Action::ToggleLanguage),
            KeyCode::Char('x') => Some(Action::DismissToast),

            KeyCode::Char('?') => Some(Action::OpenHelp),
            KeyCode::Char('q') => Some(Action::OpenQuitDialog),
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, _frame: &mut Frame, _area: Rect) -> Result<()> {
        // Drawing needs the table and app context, see draw_table_screen
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Rendering Functions
// ═══════════════════════════════════════════════════════════════════════════════

/// Context needed for rendering the table screen
pub struct TableRenderContext<'a> {
    pub table: &'a TableController,
    pub ctx: &'a AppContext,
    /// Requests still running in the background
    pub in_flight: usize,
}

/// Draw the table screen
pub fn draw_table_screen(frame: &mut Frame, area: Rect, render: &TableRenderContext) -> Result<()> {
    let layout = calculate_main_layout(area);

    render_header(frame, layout.header, render);
    render_body(frame, layout.table, render);
    render_footer(frame, layout.footer, render.table);
    render_status_bar(frame, layout.status, render);
    render_help_bar(frame, layout.help, render.table);
    Ok(())
}

fn render_header(frame: &mut Frame, area: Rect, render: &TableRenderContext) {
    let table = render.table;
    let mut spans = vec![
        Span::styled(
            format!(" {} ", table.schema.title),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", table.schema.resource),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("  [{}]", render.ctx.language),
            Style::default().fg(Color::Magenta),
        ),
    ];

    let summary = table.search.summary(&table.schema);
    if !summary.is_empty() {
        spans.push(Span::styled(
            format!("  search: {}", summary),
            Style::default().fg(Color::Yellow),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(paragraph, area);
}

fn render_body(frame: &mut Frame, area: Rect, render: &TableRenderContext) {
    let table = render.table;
    let mut title = format!(" {} ", table.schema.title);
    let selected = table.selection.selected_count();
    if selected > 0 {
        title = format!(" {} [{}✓] ", table.schema.title, selected);
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match table.load_state() {
        LoadState::Loading => {
            render_message(frame, inner, "Loading…", Color::Yellow, None);
        }
        LoadState::Failed(message) => {
            render_message(frame, inner, message, Color::Red, Some("Press r to try again"));
        }
        _ => {
            let rows = table.visible_rows();
            if rows.is_empty() {
                let text = if table.search.is_active(&table.schema) {
                    "No records match the search"
                } else {
                    "No records found"
                };
                render_message(frame, inner, text, Color::DarkGray, None);
            } else {
                render_rows(frame, inner, render, &rows);
            }
        }
    }
}

fn render_message(frame: &mut Frame, area: Rect, text: &str, color: Color, hint: Option<&str>) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            text.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
    ];
    if let Some(hint) = hint {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            hint.to_string(),
            Style::default().fg(Color::DarkGray),
        )));
    }
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

/// Width for each schema column from its header and cells
pub fn column_widths(schema: &EntitySchema, headers: &[String], rows: &[&UiRow]) -> Vec<usize> {
    schema
        .columns
        .iter()
        .zip(headers)
        .map(|(column, header)| {
            if let Some(width) = column.width {
                return width as usize;
            }
            rows.iter()
                .map(|row| row.cell(&column.key).width())
                .fold(header.width(), usize::max)
                .clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
        })
        .collect()
}

/// Label/value pairs shown under an expanded row
pub fn expanded_details(schema: &EntitySchema, ctx: &AppContext, row: &UiRow) -> Vec<(String, String)> {
    let mut details: Vec<(String, String)> = if schema.form.is_empty() {
        schema
            .columns
            .iter()
            .map(|c| {
                (
                    ctx.label(&c.label_id, &c.fallback_label).to_string(),
                    row.cell(&c.key).to_string(),
                )
            })
            .collect()
    } else {
        schema
            .form
            .iter()
            .map(|f| {
                (
                    ctx.label(&f.label_id, &f.fallback_label).to_string(),
                    display_value(lookup(&row.raw, &f.path)),
                )
            })
            .collect()
    };
    if let Some(uuid) = &row.uuid {
        details.push(("UUID".to_string(), uuid.clone()));
    }
    details
}

fn render_rows(frame: &mut Frame, area: Rect, render: &TableRenderContext, rows: &[&UiRow]) {
    let table = render.table;
    let schema = &table.schema;
    let headers: Vec<String> = schema
        .columns
        .iter()
        .map(|c| render.ctx.label(&c.label_id, &c.fallback_label).to_string())
        .collect();
    let widths = column_widths(schema, &headers, rows);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(area);

    // Header
    let mut header_spans = vec![Span::raw(" ".repeat(ROW_PREFIX_WIDTH))];
    for (header, width) in headers.iter().zip(&widths) {
        header_spans.push(Span::styled(
            fit(header, *width),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
        header_spans.push(Span::raw(" │ "));
    }
    header_spans.push(Span::styled(
        fit("Status", STATUS_WIDTH),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ));
    let separator: String = widths
        .iter()
        .chain(std::iter::once(&STATUS_WIDTH))
        .map(|w| "─".repeat(*w))
        .collect::<Vec<_>>()
        .join("─┼─");
    frame.render_widget(
        Paragraph::new(vec![
            Line::from(header_spans),
            Line::from(Span::styled(
                format!("{}{}", "─".repeat(ROW_PREFIX_WIDTH), separator),
                Style::default().fg(Color::DarkGray),
            )),
        ]),
        chunks[0],
    );

    // Rows, with detail lines under expanded ones
    let mut lines: Vec<Line> = Vec::new();
    let mut cursor_line = 0;
    for (index, row) in rows.iter().enumerate() {
        let focused = index == table.cursor();
        if focused {
            cursor_line = lines.len();
        }
        let selected = row.id.is_some_and(|id| table.selection.is_selected(id));
        let expanded = row.id.is_some_and(|id| table.selection.is_expanded(id));

        let base = if focused {
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else if selected {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::White)
        };

        let mut spans = vec![
            Span::styled(if focused { "▶ " } else { "  " }, base),
            Span::styled(if selected { "[x] " } else { "[ ] " }, base),
            Span::styled(if expanded { "▾ " } else { "▸ " }, base),
        ];
        for (column, width) in schema.columns.iter().zip(&widths) {
            spans.push(Span::styled(fit(row.cell(&column.key), *width), base));
            spans.push(Span::styled(" │ ", base));
        }
        spans.push(Span::styled(
            fit(&row.status, STATUS_WIDTH),
            base.fg(status_color(&row.status, focused)),
        ));
        lines.push(Line::from(spans));

        if expanded {
            for (label, value) in expanded_details(schema, render.ctx, row) {
                lines.push(Line::from(vec![
                    Span::raw(" ".repeat(ROW_PREFIX_WIDTH + 2)),
                    Span::styled(format!("{}: ", label), Style::default().fg(Color::DarkGray)),
                    Span::styled(value, Style::default().fg(Color::Gray)),
                ]));
            }
        }
    }

    // Keep the cursor row on screen
    let height = chunks[1].height as usize;
    let offset = if height == 0 || cursor_line < height {
        0
    } else {
        cursor_line + 1 - height
    };
    frame.render_widget(
        Paragraph::new(lines).scroll((offset as u16, 0)),
        chunks[1],
    );
}

fn status_color(status: &str, focused: bool) -> Color {
    if focused {
        return Color::White;
    }
    match status.to_uppercase().as_str() {
        "ACTIVE" | "APPROVED" => Color::Green,
        "PENDING" | "DRAFT" | "SUBMITTED" => Color::Yellow,
        "REJECTED" | "INACTIVE" | "CLOSED" => Color::Red,
        _ => Color::Gray,
    }
}

/// `Rows per page: 20 │ 41-45 of 45 │ Page 3/3`
pub fn footer_text(table: &TableController) -> String {
    let window = table.window();
    let mode = match table.pagination.mode() {
        PaginationMode::Server(_) => "server",
        PaginationMode::Client { .. } => "filtered",
    };
    format!(
        " Rows per page: {} │ {}-{} of {} │ Page {}/{} │ {}",
        table.pagination.page_size(),
        window.start_item,
        window.end_item,
        window.total_rows,
        window.page,
        window.total_pages,
        mode
    )
}

fn render_footer(frame: &mut Frame, area: Rect, table: &TableController) {
    let paragraph = Paragraph::new(Line::from(Span::styled(
        footer_text(table),
        Style::default().fg(Color::Cyan),
    )));
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, area: Rect, render: &TableRenderContext) {
    let mut spans = vec![];

    if let Some(toast) = render.ctx.toast() {
        let color = match toast.level {
            ToastLevel::Success => Color::Green,
            ToastLevel::Error => Color::Red,
            ToastLevel::Info => Color::Yellow,
        };
        spans.push(Span::styled(
            format!(" {} ", toast.at.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
        spans.push(Span::styled(
            toast.message.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    } else {
        if let Some(row) = render.table.focused_row() {
            spans.push(Span::styled(
                format!(" {} ", row.describe()),
                Style::default().fg(Color::White),
            ));
        }
        if let Some(at) = render.table.last_refreshed() {
            spans.push(Span::styled(
                format!(" refreshed {} ", at.format("%H:%M:%S")),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }

    if render.in_flight > 0 {
        spans.push(Span::styled(
            format!(" ⟳ {} ", render.in_flight),
            Style::default().fg(Color::Yellow),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_help_bar(frame: &mut Frame, area: Rect, table: &TableController) {
    let key = |k: &'static str, color: Color| {
        Span::styled(k, Style::default().fg(color).add_modifier(Modifier::BOLD))
    };

    let help_spans = if table.selection.selected_count() > 0 {
        vec![
            key(" Space ", Color::Green),
            Span::raw("Toggle "),
            key(" Ctrl+a ", Color::Green),
            Span::raw("All "),
            key(" Esc ", Color::Yellow),
            Span::raw("Clear "),
            Span::styled(
                format!("{} selected", table.selection.selected_count()),
                Style::default().fg(Color::Cyan),
            ),
        ]
    } else {
        let mut spans = vec![
            key(" q ", Color::Yellow),
            Span::raw("Quit "),
            key(" / ", Color::Cyan),
            Span::raw("Search "),
            key(" c ", Color::Green),
            Span::raw("Create "),
            key(" e ", Color::Green),
            Span::raw("Edit "),
            key(" d ", Color::Red),
            Span::raw("Delete "),
        ];
        if table.schema.approvable {
            spans.push(key(" a ", Color::Magenta));
            spans.push(Span::raw("Approve "));
        }
        if table.schema.documents {
            spans.push(key(" o ", Color::Magenta));
            spans.push(Span::raw("Docs "));
        }
        spans.extend([
            key(" ←/→ ", Color::Cyan),
            Span::raw("Page "),
            key(" t ", Color::Cyan),
            Span::raw("Resource "),
            key(" ? ", Color::White),
            Span::raw("Help"),
        ]);
        spans
    };

    frame.render_widget(Paragraph::new(Line::from(help_spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::pagination::PageMeta;
    use crate::model::schema::SchemaRegistry;
    use crate::services::api::PageResponse;
    use crossterm::event::KeyEvent;
    use serde_json::json;
    use std::time::Duration;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn loaded_table(total: usize) -> TableController {
        let schema = SchemaRegistry::builtin().get("parties").unwrap().clone();
        let mut table = TableController::new(schema, 20, Duration::ZERO);
        let ticket = table.refresh();
        let content = (1..=total.min(20))
            .map(|i| json!({ "id": i, "partyFullName": format!("Party {}", i) }))
            .collect();
        let page = PageResponse {
            content,
            page: PageMeta {
                size: 20,
                number: 0,
                total_elements: total,
                total_pages: 0,
            },
        };
        table.apply_page(ticket.generation, &page);
        table
    }

    #[test]
    fn test_key_map() {
        let mut component = EntityTableComponent::new();
        let cases = [
            (KeyCode::Char('j'), Action::NextItem),
            (KeyCode::Right, Action::NextPage),
            (KeyCode::Char('['), Action::PrevPage),
            (KeyCode::Char('}'), Action::LastPage),
            (KeyCode::Char('d'), Action::RequestDelete),
            (KeyCode::Char('/'), Action::OpenSearch),
            (KeyCode::Char('r'), Action::Refresh),
            (KeyCode::Enter, Action::ToggleExpand),
        ];
        for (code, expected) in cases {
            assert_eq!(component.handle_key_event(key(code)).unwrap(), Some(expected));
        }

        let ctrl_a = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL);
        assert_eq!(component.handle_key_event(ctrl_a).unwrap(), Some(Action::SelectAll));
        assert_eq!(
            component.handle_key_event(key(KeyCode::Char('a'))).unwrap(),
            Some(Action::RequestApprove)
        );
    }

    #[test]
    fn test_footer_text_on_server_page() {
        let table = loaded_table(45);
        assert_eq!(
            footer_text(&table),
            " Rows per page: 20 │ 1-20 of 45 │ Page 1/3 │ server"
        );
    }

    #[test]
    fn test_column_widths_are_clamped() {
        let table = loaded_table(2);
        let headers: Vec<String> = table
            .schema
            .columns
            .iter()
            .map(|c| c.fallback_label.clone())
            .collect();
        let rows = table.visible_rows();
        let widths = column_widths(&table.schema, &headers, &rows);
        assert_eq!(widths.len(), table.schema.columns.len());
        assert!(widths
            .iter()
            .all(|w| (MIN_COLUMN_WIDTH..=MAX_COLUMN_WIDTH).contains(w)));
    }

    #[test]
    fn test_expanded_details_follow_form_fields() {
        let table = loaded_table(1);
        let row = table.focused_row().unwrap();
        let details = expanded_details(&table.schema, &AppContext::default(), row);
        assert!(details.iter().any(|(_, v)| v == "Party 1"));
        assert_eq!(details.len(), table.schema.form.len());
    }
}
