//! Action enum - All possible application actions
//!
//! Actions are discrete operations that the application can perform.
//! Components emit Actions in response to events, and the App processes
//! them to update state.

use std::fmt;

/// All possible actions in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ─────────────────────────────────────────────────────────────────────────
    // App Lifecycle
    // ─────────────────────────────────────────────────────────────────────────
    /// Regular tick: drain finished requests, fire due refetches
    Tick,
    /// Terminal was resized
    Resize(u16, u16),
    /// Force quit without confirmation
    ForceQuit,

    // ─────────────────────────────────────────────────────────────────────────
    // Row Navigation
    // ─────────────────────────────────────────────────────────────────────────
    NextItem,
    PrevItem,
    FirstItem,
    LastItem,

    // ─────────────────────────────────────────────────────────────────────────
    // Paging
    // ─────────────────────────────────────────────────────────────────────────
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    /// Step through the rows-per-page options
    CycleRowsPerPage,

    // ─────────────────────────────────────────────────────────────────────────
    // Data
    // ─────────────────────────────────────────────────────────────────────────
    /// Refetch the current page (also the "try again" after a failure)
    Refresh,
    /// Switch the table to another entity schema
    SwitchResource(String),
    /// Alternate between English and Arabic labels
    ToggleLanguage,

    // ─────────────────────────────────────────────────────────────────────────
    // Modals
    // ─────────────────────────────────────────────────────────────────────────
    OpenQuitDialog,
    OpenHelp,
    OpenResourcePicker,
    /// Close the current modal
    CloseModal,
    /// Confirm the current modal action
    ConfirmModal,
    ModalUp,
    ModalDown,

    // ─────────────────────────────────────────────────────────────────────────
    // Search
    // ─────────────────────────────────────────────────────────────────────────
    OpenSearch,
    SearchInput(char),
    SearchBackspace,
    /// Move input to the next searchable field
    SearchNextField,
    ClearSearch,

    // ─────────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────────
    ToggleSelection,
    ToggleExpand,
    SelectAll,
    ClearSelection,

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────
    OpenCreateForm,
    OpenEditForm,
    FormInput(char),
    FormBackspace,
    FormNextField,
    FormPrevField,
    SubmitForm,
    /// Ask to delete the focused row
    RequestDelete,
    /// Ask to submit the focused row for approval
    RequestApprove,

    // ─────────────────────────────────────────────────────────────────────────
    // Documents
    // ─────────────────────────────────────────────────────────────────────────
    OpenDocuments,
    /// Upload the file at the given path for the open record
    UploadDocument(String),
    /// Dismiss the current toast
    DismissToast,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Tick => write!(f, "Tick"),
            Action::Resize(w, h) => write!(f, "Resize({}, {})", w, h),
            Action::ForceQuit => write!(f, "ForceQuit"),
            Action::NextItem => write!(f, "NextItem"),
            Action::PrevItem => write!(f, "PrevItem"),
            Action::FirstItem => write!(f, "FirstItem"),
            Action::LastItem => write!(f, "LastItem"),
            Action::NextPage => write!(f, "NextPage"),
            Action::PrevPage => write!(f, "PrevPage"),
            Action::FirstPage => write!(f, "FirstPage"),
            Action::LastPage => write!(f, "LastPage"),
            Action::CycleRowsPerPage => write!(f, "CycleRowsPerPage"),
            Action::Refresh => write!(f, "Refresh"),
            Action::SwitchResource(name) => write!(f, "SwitchResource({})", name),
            Action::ToggleLanguage => write!(f, "ToggleLanguage"),
            Action::OpenQuitDialog => write!(f, "OpenQuitDialog"),
            Action::OpenHelp => write!(f, "OpenHelp"),
            Action::OpenResourcePicker => write!(f, "OpenResourcePicker"),
            Action::CloseModal => write!(f, "CloseModal"),
            Action::ConfirmModal => write!(f, "ConfirmModal"),
            Action::ModalUp => write!(f, "ModalUp"),
            Action::ModalDown => write!(f, "ModalDown"),
            Action::OpenSearch => write!(f, "OpenSearch"),
            Action::SearchInput(c) => write!(f, "SearchInput('{}')", c),
            Action::SearchBackspace => write!(f, "SearchBackspace"),
            Action::SearchNextField => write!(f, "SearchNextField"),
            Action::ClearSearch => write!(f, "ClearSearch"),
            Action::ToggleSelection => write!(f, "ToggleSelection"),
            Action::ToggleExpand => write!(f, "ToggleExpand"),
            Action::SelectAll => write!(f, "SelectAll"),
            Action::ClearSelection => write!(f, "ClearSelection"),
            Action::OpenCreateForm => write!(f, "OpenCreateForm"),
            Action::OpenEditForm => write!(f, "OpenEditForm"),
            Action::FormInput(c) => write!(f, "FormInput('{}')", c),
            Action::FormBackspace => write!(f, "FormBackspace"),
            Action::FormNextField => write!(f, "FormNextField"),
            Action::FormPrevField => write!(f, "FormPrevField"),
            Action::SubmitForm => write!(f, "SubmitForm"),
            Action::RequestDelete => write!(f, "RequestDelete"),
            Action::RequestApprove => write!(f, "RequestApprove"),
            Action::OpenDocuments => write!(f, "OpenDocuments"),
            Action::UploadDocument(path) => write!(f, "UploadDocument({})", path),
            Action::DismissToast => write!(f, "DismissToast"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_payload() {
        assert_eq!(Action::SearchInput('j').to_string(), "SearchInput('j')");
        assert_eq!(
            Action::SwitchResource("parties".into()).to_string(),
            "SwitchResource(parties)"
        );
        assert_eq!(Action::Resize(80, 24).to_string(), "Resize(80, 24)");
    }
}
