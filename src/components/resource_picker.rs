//! Resource picker dialog
//!
//! Lists every configured entity schema and switches the table to the
//! chosen one.

use crate::action::Action;
use crate::component::Component;
use crate::model::schema::SchemaRegistry;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

pub struct ResourcePicker {
    /// `(name, title)` for each schema
    pub entries: Vec<(String, String)>,
    pub selected_index: usize,
    pub list_state: ListState,
    /// Schema currently shown in the table
    pub current: String,
}

impl Default for ResourcePicker {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourcePicker {
    pub fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            entries: Vec::new(),
            selected_index: 0,
            list_state,
            current: String::new(),
        }
    }

    /// Load the schemas and preselect the current one
    pub fn set_resources(&mut self, registry: &SchemaRegistry, current: &str) {
        self.entries = registry
            .all()
            .iter()
            .map(|s| (s.name.clone(), s.title.clone()))
            .collect();
        self.current = current.to_string();
        self.selected_index = self
            .entries
            .iter()
            .position(|(name, _)| name == current)
            .unwrap_or(0);
        self.list_state.select(Some(self.selected_index));
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.entries
            .get(self.selected_index)
            .map(|(name, _)| name.as_str())
    }

    fn select_next(&mut self) {
        if self.selected_index + 1 < self.entries.len() {
            self.selected_index += 1;
            self.list_state.select(Some(self.selected_index));
        }
    }

    fn select_prev(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
            self.list_state.select(Some(self.selected_index));
        }
    }
}

impl Component for ResourcePicker {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Esc | KeyCode::Char('t') | KeyCode::Char('q') => Some(Action::CloseModal),
            KeyCode::Enter => self
                .selected_name()
                .map(|name| Action::SwitchResource(name.to_string())),
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_prev();
                Some(Action::ModalUp)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_next();
                Some(Action::ModalDown)
            }
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let popup_width = 50u16.min(area.width.saturating_sub(4));
        let popup_height = (self.entries.len() as u16 + 8)
            .min(area.height.saturating_sub(2))
            .max(10);

        let x = area.x + (area.width.saturating_sub(popup_width)) / 2;
        let y = area.y + (area.height.saturating_sub(popup_height)) / 2;
        let popup_area = Rect::new(x, y, popup_width, popup_height);
        frame.render_widget(Clear, popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(popup_area);

        let header = Paragraph::new(Line::from(Span::styled(
            format!("Current: {}", self.current),
            Style::default().fg(Color::Cyan),
        )))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Switch Resource ")
                .title_style(
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                ),
        );
        frame.render_widget(header, chunks[0]);

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .map(|(name, title)| {
                let is_current = *name == self.current;
                ListItem::new(Line::from(vec![
                    Span::styled(
                        if is_current { "● " } else { "  " },
                        Style::default().fg(Color::Green),
                    ),
                    Span::styled(format!("{:<22}", title), Style::default().fg(Color::White)),
                    Span::styled(name.clone(), Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, chunks[1], &mut self.list_state);

        let help = Paragraph::new(Line::from(vec![
            Span::styled(" Enter ", Style::default().fg(Color::Yellow)),
            Span::raw("Open  "),
            Span::styled(" j/k ", Style::default().fg(Color::Cyan)),
            Span::raw("Navigate  "),
            Span::styled(" Esc ", Style::default().fg(Color::Yellow)),
            Span::raw("Cancel"),
        ]))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, chunks[2]);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(picker: &mut ResourcePicker, code: KeyCode) -> Option<Action> {
        picker
            .handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    #[test]
    fn test_preselects_current_resource() {
        let mut picker = ResourcePicker::new();
        picker.set_resources(&SchemaRegistry::builtin(), "parties");
        assert_eq!(picker.selected_name(), Some("parties"));
    }

    #[test]
    fn test_enter_switches_to_selection() {
        let mut picker = ResourcePicker::new();
        picker.set_resources(&SchemaRegistry::builtin(), "agreements");
        assert_eq!(press(&mut picker, KeyCode::Char('j')), Some(Action::ModalDown));
        assert_eq!(
            press(&mut picker, KeyCode::Enter),
            Some(Action::SwitchResource("parties".to_string()))
        );
    }

    #[test]
    fn test_navigation_stops_at_edges() {
        let mut picker = ResourcePicker::new();
        picker.set_resources(&SchemaRegistry::builtin(), "agreements");
        press(&mut picker, KeyCode::Up);
        assert_eq!(picker.selected_index, 0);
        for _ in 0..50 {
            press(&mut picker, KeyCode::Down);
        }
        assert_eq!(picker.selected_index, picker.entries.len() - 1);
    }
}
