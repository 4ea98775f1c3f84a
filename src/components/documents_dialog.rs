//! Documents dialog - list a record's documents and upload new ones

use crate::action::Action;
use crate::component::Component;
use crate::model::row::RowId;
use crate::services::documents::DocumentEntry;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentsState {
    Loading,
    Failed(String),
    Loaded(Vec<DocumentEntry>),
}

pub struct DocumentsDialog {
    pub module: String,
    pub record_id: Option<RowId>,
    pub label: String,
    pub state: DocumentsState,
    pub list_state: ListState,
    /// Path being typed, `None` when not in upload mode
    pub upload_path: Option<String>,
    pub uploading: bool,
    pub error: Option<String>,
}

impl Default for DocumentsDialog {
    fn default() -> Self {
        Self {
            module: String::new(),
            record_id: None,
            label: String::new(),
            state: DocumentsState::Loading,
            list_state: ListState::default(),
            upload_path: None,
            uploading: false,
            error: None,
        }
    }
}

impl DocumentsDialog {
    pub fn open(&mut self, module: &str, record_id: RowId, label: &str) {
        *self = Self {
            module: module.to_string(),
            record_id: Some(record_id),
            label: label.to_string(),
            ..Self::default()
        };
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }

    /// Whether a reply belongs to the record on screen
    pub fn is_for(&self, module: &str, record_id: RowId) -> bool {
        self.module == module && self.record_id == Some(record_id)
    }

    pub fn reload(&mut self) {
        self.state = DocumentsState::Loading;
    }

    pub fn set_documents(&mut self, result: Result<Vec<DocumentEntry>, String>) {
        self.state = match result {
            Ok(documents) => {
                self.list_state
                    .select(if documents.is_empty() { None } else { Some(0) });
                DocumentsState::Loaded(documents)
            }
            Err(message) => DocumentsState::Failed(message),
        };
    }

    pub fn begin_upload(&mut self) {
        self.uploading = true;
        self.error = None;
    }

    pub fn finish_upload(&mut self, result: Result<(), String>) {
        self.uploading = false;
        match result {
            Ok(()) => {
                self.upload_path = None;
                self.error = None;
            }
            Err(message) => self.error = Some(message),
        }
    }

    fn document_count(&self) -> usize {
        match &self.state {
            DocumentsState::Loaded(documents) => documents.len(),
            _ => 0,
        }
    }
}

impl Component for DocumentsDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if let Some(path) = self.upload_path.as_mut() {
            let action = match key.code {
                KeyCode::Esc => {
                    self.upload_path = None;
                    self.error = None;
                    None
                }
                KeyCode::Enter if !self.uploading => Some(Action::UploadDocument(path.clone())),
                KeyCode::Backspace => {
                    path.pop();
                    None
                }
                KeyCode::Char(c) => {
                    path.push(c);
                    None
                }
                _ => None,
            };
            return Ok(action);
        }

        let action = match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Some(Action::CloseModal),
            KeyCode::Char('u') => {
                self.upload_path = Some(String::new());
                None
            }
            KeyCode::Char('r') => Some(Action::Refresh),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::ModalDown),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::ModalUp),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        let count = self.document_count();
        if count == 0 {
            return Ok(None);
        }
        let current = self.list_state.selected().unwrap_or(0);
        match action {
            Action::ModalDown => self.list_state.select(Some((current + 1).min(count - 1))),
            Action::ModalUp => self.list_state.select(Some(current.saturating_sub(1))),
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        frame.render_widget(Clear, area);

        let margin = 3;
        let dialog_area = Rect::new(
            area.x + margin,
            area.y + margin,
            area.width.saturating_sub(margin * 2),
            area.height.saturating_sub(margin * 2),
        );

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(dialog_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta))
            .title(format!(" Documents: {} ", self.label))
            .title_style(Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD));

        match &self.state {
            DocumentsState::Loading => {
                let paragraph = Paragraph::new("Loading documents…")
                    .style(Style::default().fg(Color::Yellow))
                    .alignment(Alignment::Center)
                    .block(block);
                frame.render_widget(paragraph, chunks[0]);
            }
            DocumentsState::Failed(message) => {
                let paragraph = Paragraph::new(vec![
                    Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red))),
                    Line::from(Span::styled("Press r to try again", Style::default().fg(Color::DarkGray))),
                ])
                .alignment(Alignment::Center)
                .block(block);
                frame.render_widget(paragraph, chunks[0]);
            }
            DocumentsState::Loaded(documents) if documents.is_empty() => {
                let paragraph = Paragraph::new("No documents uploaded yet")
                    .style(Style::default().fg(Color::DarkGray))
                    .alignment(Alignment::Center)
                    .block(block);
                frame.render_widget(paragraph, chunks[0]);
            }
            DocumentsState::Loaded(documents) => {
                let items: Vec<ListItem> = documents
                    .iter()
                    .map(|doc| {
                        ListItem::new(Line::from(vec![
                            Span::styled(format!("{:<40}", doc.display_name()), Style::default().fg(Color::White)),
                            Span::styled(doc.uploaded_display(), Style::default().fg(Color::DarkGray)),
                            Span::styled(
                                format!("  {}", doc.storage_type.as_deref().unwrap_or("")),
                                Style::default().fg(Color::DarkGray),
                            ),
                        ]))
                    })
                    .collect();
                let list = List::new(items)
                    .block(block)
                    .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
                    .highlight_symbol("▶ ");
                frame.render_stateful_widget(list, chunks[0], &mut self.list_state);
            }
        }

        let (input, style) = match (&self.upload_path, self.uploading) {
            (Some(path), true) => (format!("Uploading {}…", path), Style::default().fg(Color::Yellow)),
            (Some(path), false) => (format!("File: {}_", path), Style::default().fg(Color::Cyan)),
            (None, _) => ("Press u to upload a file".to_string(), Style::default().fg(Color::DarkGray)),
        };
        let mut input_line = vec![Span::styled(input, style)];
        if let Some(error) = &self.error {
            input_line.push(Span::styled(format!("  {}", error), Style::default().fg(Color::Red)));
        }
        frame.render_widget(
            Paragraph::new(Line::from(input_line)).block(Block::default().borders(Borders::ALL)),
            chunks[1],
        );

        let help = if self.upload_path.is_some() {
            vec![
                Span::styled(" Enter ", Style::default().fg(Color::Green)),
                Span::raw("Upload  "),
                Span::styled(" Esc ", Style::default().fg(Color::Yellow)),
                Span::raw("Cancel"),
            ]
        } else {
            vec![
                Span::styled(" u ", Style::default().fg(Color::Green)),
                Span::raw("Upload  "),
                Span::styled(" r ", Style::default().fg(Color::Cyan)),
                Span::raw("Reload  "),
                Span::styled(" Esc ", Style::default().fg(Color::Yellow)),
                Span::raw("Close"),
            ]
        };
        frame.render_widget(
            Paragraph::new(Line::from(help))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL)),
            chunks[2],
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(dialog: &mut DocumentsDialog, code: KeyCode) -> Option<Action> {
        dialog
            .handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    #[test]
    fn test_upload_path_input() {
        let mut dialog = DocumentsDialog::default();
        dialog.open("PARTY", 7, "Acme (#7)");
        assert_eq!(press(&mut dialog, KeyCode::Char('u')), None);
        for c in "/tmp/a.pdf".chars() {
            press(&mut dialog, KeyCode::Char(c));
        }
        assert_eq!(
            press(&mut dialog, KeyCode::Enter),
            Some(Action::UploadDocument("/tmp/a.pdf".to_string()))
        );

        dialog.begin_upload();
        assert_eq!(press(&mut dialog, KeyCode::Enter), None);
        dialog.finish_upload(Ok(()));
        assert!(dialog.upload_path.is_none());
    }

    #[test]
    fn test_escape_leaves_upload_mode_before_closing() {
        let mut dialog = DocumentsDialog::default();
        dialog.open("PARTY", 7, "Acme (#7)");
        press(&mut dialog, KeyCode::Char('u'));
        assert_eq!(press(&mut dialog, KeyCode::Esc), None);
        assert_eq!(press(&mut dialog, KeyCode::Esc), Some(Action::CloseModal));
    }

    #[test]
    fn test_replies_are_matched_to_record() {
        let mut dialog = DocumentsDialog::default();
        dialog.open("PARTY", 7, "Acme (#7)");
        assert!(dialog.is_for("PARTY", 7));
        assert!(!dialog.is_for("PARTY", 8));
        dialog.close();
        assert!(!dialog.is_for("PARTY", 7));
    }

    #[test]
    fn test_list_navigation_is_clamped() {
        let mut dialog = DocumentsDialog::default();
        dialog.open("PARTY", 7, "Acme (#7)");
        dialog.set_documents(Ok(vec![DocumentEntry::default(), DocumentEntry::default()]));
        dialog.update(Action::ModalDown).unwrap();
        dialog.update(Action::ModalDown).unwrap();
        assert_eq!(dialog.list_state.selected(), Some(1));
        dialog.update(Action::ModalUp).unwrap();
        dialog.update(Action::ModalUp).unwrap();
        assert_eq!(dialog.list_state.selected(), Some(0));
    }
}
