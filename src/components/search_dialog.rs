//! Search dialog - one input per searchable column
//!
//! The query lives in the table controller; this component only maps keys
//! and draws the inputs.

use crate::action::Action;
use crate::component::Component;
use crate::components::centered_popup;
use crate::model::context::AppContext;
use crate::model::table::TableController;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

#[derive(Default)]
pub struct SearchDialog;

impl Component for SearchDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Esc | KeyCode::Enter => Some(Action::CloseModal),
            KeyCode::Tab | KeyCode::Down => Some(Action::SearchNextField),
            KeyCode::Backspace => Some(Action::SearchBackspace),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::ClearSearch)
            }
            KeyCode::Char(c) => Some(Action::SearchInput(c)),
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, _frame: &mut Frame, _area: Rect) -> Result<()> {
        // Needs the table's search state, see draw_with_table
        Ok(())
    }
}

impl SearchDialog {
    pub fn draw_with_table(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        table: &TableController,
        ctx: &AppContext,
    ) -> Result<()> {
        let columns = table.schema.search_columns();
        let height = (columns.len() as u16 + 2).max(3) + 3;
        let popup_area = centered_popup(area, 60, height);
        frame.render_widget(Clear, popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(popup_area);

        let active = table.search_field();
        let lines: Vec<Line> = columns
            .iter()
            .map(|column| {
                let is_active = active == Some(column.key.as_str());
                let label = ctx.label(&column.label_id, &column.fallback_label);
                let value = table.search.get(&column.key);
                let label_style = if is_active {
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                let cursor = if is_active { "_" } else { "" };
                Line::from(vec![
                    Span::styled(if is_active { "▶ " } else { "  " }, label_style),
                    Span::styled(format!("{:<18}", label), label_style),
                    Span::styled(
                        format!("{}{}", value, cursor),
                        Style::default().fg(Color::White),
                    ),
                ])
            })
            .collect();

        let matches = table.filtered_rows().len();
        let inputs = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(format!(" Search this page ({} of {} rows) ", matches, table.rows().len()))
                .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        );
        frame.render_widget(inputs, chunks[0]);

        let help = Paragraph::new(Line::from(vec![
            Span::styled(" Tab ", Style::default().fg(Color::Cyan)),
            Span::raw("Next field  "),
            Span::styled(" Ctrl+u ", Style::default().fg(Color::Yellow)),
            Span::raw("Clear  "),
            Span::styled(" Enter/Esc ", Style::default().fg(Color::Yellow)),
            Span::raw("Close"),
        ]))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, chunks[1]);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_maps_to_search_actions() {
        let mut dialog = SearchDialog;
        let press = |dialog: &mut SearchDialog, code, modifiers| {
            dialog
                .handle_key_event(KeyEvent::new(code, modifiers))
                .unwrap()
        };
        assert_eq!(
            press(&mut dialog, KeyCode::Char('J'), KeyModifiers::SHIFT),
            Some(Action::SearchInput('J'))
        );
        assert_eq!(
            press(&mut dialog, KeyCode::Char('u'), KeyModifiers::CONTROL),
            Some(Action::ClearSearch)
        );
        assert_eq!(
            press(&mut dialog, KeyCode::Tab, KeyModifiers::NONE),
            Some(Action::SearchNextField)
        );
        assert_eq!(
            press(&mut dialog, KeyCode::Enter, KeyModifiers::NONE),
            Some(Action::CloseModal)
        );
    }
}
