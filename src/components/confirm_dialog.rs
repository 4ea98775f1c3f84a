//! Yes/no confirmation dialog used for quit, delete and approve

use crate::action::Action;
use crate::component::Component;
use crate::components::centered_popup;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub struct ConfirmDialog {
    pub title: String,
    pub question: String,
    /// Record echoed under the question
    pub subject: Option<String>,
    /// Action emitted on `y`
    pub on_confirm: Action,
    pub accent: Color,
}

impl Default for ConfirmDialog {
    fn default() -> Self {
        Self::quit()
    }
}

impl ConfirmDialog {
    pub fn quit() -> Self {
        Self {
            title: " Quit? ".to_string(),
            question: "Are you sure you want to quit?".to_string(),
            subject: None,
            on_confirm: Action::ForceQuit,
            accent: Color::Yellow,
        }
    }

    pub fn delete(subject: &str) -> Self {
        Self {
            title: " Delete ".to_string(),
            question: "Delete this record? This cannot be undone.".to_string(),
            subject: Some(subject.to_string()),
            on_confirm: Action::ConfirmModal,
            accent: Color::Red,
        }
    }

    pub fn approve(subject: &str) -> Self {
        Self {
            title: " Submit for Approval ".to_string(),
            question: "Send this record to the approval workflow?".to_string(),
            subject: Some(subject.to_string()),
            on_confirm: Action::ConfirmModal,
            accent: Color::Magenta,
        }
    }
}

impl Component for ConfirmDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(self.on_confirm.clone()),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(Action::CloseModal),
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let popup_area = centered_popup(area, 56, 9);

        frame.render_widget(Clear, popup_area);

        let mut content = vec![
            Line::from(""),
            Line::from(Span::styled(
                self.question.clone(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )),
        ];
        if let Some(subject) = &self.subject {
            content.push(Line::from(Span::styled(
                subject.clone(),
                Style::default().fg(Color::Cyan),
            )));
        }
        content.push(Line::from(""));
        content.push(Line::from(vec![
            Span::styled(
                " y ",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("Yes  "),
            Span::styled(
                " n/Esc ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::raw("No, cancel"),
        ]));

        let paragraph = Paragraph::new(content)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.accent))
                    .title(self.title.clone())
                    .title_style(
                        Style::default()
                            .fg(self.accent)
                            .add_modifier(Modifier::BOLD),
                    ),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });

        frame.render_widget(paragraph, popup_area);
        Ok(())
    }
}
