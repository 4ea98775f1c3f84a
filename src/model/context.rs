//! Application-wide context: language, labels and notifications
//!
//! Owned by the root `App` and lent to whatever needs to read labels or post
//! a toast.

use super::labels::{LabelCatalog, DEFAULT_LANGUAGE};
use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

/// How long a toast stays on screen
pub const TOAST_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub at: DateTime<Local>,
    shown: Instant,
}

impl Toast {
    fn new(level: ToastLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            at: Local::now(),
            shown: Instant::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppContext {
    pub language: String,
    pub labels: LabelCatalog,
    toast: Option<Toast>,
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

impl AppContext {
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_uppercase(),
            labels: LabelCatalog::new(),
            toast: None,
        }
    }

    /// Resolve a configured label in the current language
    pub fn label<'a>(&'a self, config_id: &str, fallback: &'a str) -> &'a str {
        self.labels.resolve(config_id, &self.language, fallback)
    }

    pub fn notify_success(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::new(ToastLevel::Success, message));
    }

    pub fn notify_error(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::new(ToastLevel::Error, message));
    }

    pub fn notify_info(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::new(ToastLevel::Info, message));
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    pub fn dismiss_toast(&mut self) {
        self.toast = None;
    }

    /// Drop the toast once it has been visible for `TOAST_TTL`
    pub fn expire_toast(&mut self, now: Instant) {
        if self
            .toast
            .as_ref()
            .is_some_and(|t| now.duration_since(t.shown) >= TOAST_TTL)
        {
            self.toast = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::api::LabelEntry;

    #[test]
    fn test_label_follows_language() {
        let mut ctx = AppContext::new("en");
        ctx.labels.load(
            "CURRENCY",
            vec![LabelEntry {
                config_id: "CDL_CCY_CODE".to_string(),
                language_code: "AR".to_string(),
                label: "رمز".to_string(),
            }],
        );
        assert_eq!(ctx.label("CDL_CCY_CODE", "Code"), "Code");
        ctx.language = "AR".to_string();
        assert_eq!(ctx.label("CDL_CCY_CODE", "Code"), "رمز");
    }

    #[test]
    fn test_toast_expires() {
        let mut ctx = AppContext::default();
        ctx.notify_error("Delete failed");
        assert_eq!(ctx.toast().map(|t| t.level), Some(ToastLevel::Error));

        ctx.expire_toast(Instant::now());
        assert!(ctx.toast().is_some());
        ctx.expire_toast(Instant::now() + TOAST_TTL);
        assert!(ctx.toast().is_none());
    }
}
