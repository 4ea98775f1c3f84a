//! UI Components
//!
//! Each component encapsulates its own state, event handling, and rendering logic.
//! Components communicate through Actions rather than direct state mutation.

pub mod confirm_dialog;
pub mod documents_dialog;
pub mod entity_table;
pub mod form_dialog;
pub mod help_dialog;
pub mod layout;
pub mod resource_picker;
pub mod search_dialog;

pub use confirm_dialog::ConfirmDialog;
pub use documents_dialog::DocumentsDialog;
pub use entity_table::{draw_table_screen, EntityTableComponent, TableRenderContext};
pub use form_dialog::FormDialog;
pub use help_dialog::HelpDialog;
pub use layout::{calculate_main_layout, centered_popup};
pub use resource_picker::ResourcePicker;
pub use search_dialog::SearchDialog;
