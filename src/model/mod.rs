//! Model layer - state behind the console
//!
//! - `schema` / `row` - entity configuration and row projection
//! - `search` / `pagination` / `selection` - the list pipeline stages
//! - `mutation` / `form` - create, edit, delete and approve bookkeeping
//! - `table` - the controller composing all of the above
//! - `context` / `labels` - language, label catalog and toasts
//! - `modal` - modal overlay management

pub mod context;
pub mod form;
pub mod labels;
pub mod modal;
pub mod mutation;
pub mod pagination;
pub mod row;
pub mod schema;
pub mod search;
pub mod selection;
pub mod table;
