//! Create/edit form panel
//!
//! Owns the `FormState` while the panel is open. Keystrokes are applied in
//! `update`; submitting is left to `App`, which owns the job runner.

use crate::action::Action;
use crate::component::Component;
use crate::components::centered_popup;
use crate::model::context::AppContext;
use crate::model::form::{FormMode, FormState};
use crate::model::schema::FieldKind;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

#[derive(Default)]
pub struct FormDialog {
    pub form: Option<FormState>,
    pub title: String,
    /// Validation or server error shown under the fields
    pub error: Option<String>,
    /// Request sent, waiting for the reply
    pub saving: bool,
}

impl FormDialog {
    pub fn open(&mut self, form: FormState, title: String) {
        self.form = Some(form);
        self.title = title;
        self.error = None;
        self.saving = false;
    }

    pub fn close(&mut self) {
        self.form = None;
        self.error = None;
        self.saving = false;
    }

    pub fn is_open(&self) -> bool {
        self.form.is_some()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.saving = false;
    }
}

impl Component for FormDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Esc => Some(Action::CloseModal),
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::SubmitForm)
            }
            KeyCode::Enter => Some(Action::SubmitForm),
            KeyCode::Tab | KeyCode::Down => Some(Action::FormNextField),
            KeyCode::BackTab | KeyCode::Up => Some(Action::FormPrevField),
            KeyCode::Backspace => Some(Action::FormBackspace),
            KeyCode::Char(c) => Some(Action::FormInput(c)),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        if self.saving {
            return Ok(None);
        }
        let Some(form) = self.form.as_mut() else {
            return Ok(None);
        };
        match action {
            Action::FormInput(c) => form.push_char(c),
            Action::FormBackspace => form.pop_char(),
            Action::FormNextField => form.focus_next(),
            Action::FormPrevField => form.focus_prev(),
            _ => return Ok(None),
        }
        self.error = None;
        Ok(None)
    }

    fn draw(&mut self, _frame: &mut Frame, _area: Rect) -> Result<()> {
        // Labels come from the app context, see draw_with_context
        Ok(())
    }
}

impl FormDialog {
    pub fn draw_with_context(&mut self, frame: &mut Frame, area: Rect, ctx: &AppContext) -> Result<()> {
        let Some(form) = &self.form else {
            return Ok(());
        };

        let height = form.fields.len() as u16 + 9;
        let popup_area = centered_popup(area, 70, height);
        frame.render_widget(Clear, popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(popup_area);

        let lines: Vec<Line> = form
            .fields
            .iter()
            .enumerate()
            .map(|(index, field)| {
                let focused = index == form.focus;
                let mut label = ctx
                    .label(&field.spec.label_id, &field.spec.fallback_label)
                    .to_string();
                if field.spec.required {
                    label.push('*');
                }
                let label_style = if focused {
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                let value = match field.spec.kind {
                    FieldKind::Flag => {
                        let on = field.value.trim().eq_ignore_ascii_case("true");
                        format!("[{}]", if on { "x" } else { " " })
                    }
                    FieldKind::Date if field.value.is_empty() && !focused => "YYYY-MM-DD".to_string(),
                    _ if focused => format!("{}_", field.value),
                    _ => field.value.clone(),
                };
                let value_style = if field.is_changed() {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default().fg(Color::White)
                };
                Line::from(vec![
                    Span::styled(if focused { "▶ " } else { "  " }, label_style),
                    Span::styled(format!("{:<22}", label), label_style),
                    Span::styled(value, value_style),
                ])
            })
            .collect();

        let accent = match form.mode {
            FormMode::Create => Color::Green,
            FormMode::Edit { .. } => Color::Cyan,
        };
        let fields = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent))
                .title(format!(" {} ", self.title))
                .title_style(Style::default().fg(accent).add_modifier(Modifier::BOLD)),
        );
        frame.render_widget(fields, chunks[0]);

        let (message, color) = match (&self.error, self.saving) {
            (_, true) => ("Saving…".to_string(), Color::Yellow),
            (Some(error), false) => (error.clone(), Color::Red),
            (None, false) => ("* required".to_string(), Color::DarkGray),
        };
        let status = Paragraph::new(Line::from(Span::styled(message, Style::default().fg(color))))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(status, chunks[1]);

        let help = Paragraph::new(Line::from(vec![
            Span::styled(" Enter ", Style::default().fg(Color::Green)),
            Span::raw("Save  "),
            Span::styled(" Tab/↑↓ ", Style::default().fg(Color::Cyan)),
            Span::raw("Field  "),
            Span::styled(" Space ", Style::default().fg(Color::Cyan)),
            Span::raw("Toggle flag  "),
            Span::styled(" Esc ", Style::default().fg(Color::Yellow)),
            Span::raw("Cancel"),
        ]))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, chunks[2]);

        Ok(())
    }
}
