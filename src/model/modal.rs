//! Modal stack for managing overlays
//!
//! Only the top modal receives input; everything below it is drawn but
//! inert.

use super::row::RowId;

/// Represents a modal overlay that can be displayed on top of the table
#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    QuitConfirm,
    /// Delete confirmation; the row is tracked by the mutation coordinator
    DeleteConfirm,
    ApproveConfirm { id: RowId, label: String },
    /// Create/edit panel; the form state lives in the form dialog
    Form,
    Search,
    ResourcePicker { selected_index: usize },
    Documents { record_id: RowId, label: String },
    Help { scroll_offset: usize },
}

/// A stack of modal overlays
#[derive(Debug, Default)]
pub struct ModalStack {
    stack: Vec<Modal>,
}

impl ModalStack {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn push(&mut self, modal: Modal) {
        self.stack.push(modal);
    }

    pub fn pop(&mut self) -> Option<Modal> {
        self.stack.pop()
    }

    pub fn top(&self) -> Option<&Modal> {
        self.stack.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Modal> {
        self.stack.last_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Pop the top modal only if it matches
    pub fn pop_if(&mut self, pred: impl Fn(&Modal) -> bool) -> Option<Modal> {
        if self.top().is_some_and(pred) {
            return self.stack.pop();
        }
        None
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modal_stack_push_pop() {
        let mut stack = ModalStack::new();
        assert!(stack.top().is_none());

        stack.push(Modal::Search);
        stack.push(Modal::QuitConfirm);

        assert_eq!(stack.pop(), Some(Modal::QuitConfirm));
        assert_eq!(stack.pop(), Some(Modal::Search));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_pop_if_only_matches_top() {
        let mut stack = ModalStack::new();
        stack.push(Modal::Form);
        stack.push(Modal::Help { scroll_offset: 0 });

        assert_eq!(stack.pop_if(|m| *m == Modal::Form), None);
        assert_eq!(
            stack.pop_if(|m| matches!(m, Modal::Help { .. })),
            Some(Modal::Help { scroll_offset: 0 })
        );
        assert_eq!(stack.pop_if(|m| *m == Modal::Form), Some(Modal::Form));
    }

    #[test]
    fn test_modal_stack_top_mut() {
        let mut stack = ModalStack::new();
        stack.push(Modal::ResourcePicker { selected_index: 0 });

        if let Some(Modal::ResourcePicker { selected_index }) = stack.top_mut() {
            *selected_index = 2;
        }

        assert_eq!(stack.top(), Some(&Modal::ResourcePicker { selected_index: 2 }));
    }
}
