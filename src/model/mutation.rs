//! Mutation coordinator - create/update/delete/approve bookkeeping
//!
//! A delete goes `Idle -> Confirming -> InFlight -> Idle`. At most one delete
//! is in flight per table, and saves are latched per record so a second
//! save for the same row is refused while the first is pending. Nothing is
//! updated optimistically: the table only changes after a confirmed
//! success, via a refetch scheduled after a short settle delay.

use super::pagination::PageRequest;
use super::row::{RowId, UiRow};
use crate::error::FormError;
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Default wait between a confirmed mutation and the refetch
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(400);

/// What a mutation does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update(RowId),
    Delete(RowId),
    Approve(RowId),
}

impl MutationKind {
    /// Latch key for this mutation
    pub fn target(&self) -> MutationTarget {
        match self {
            MutationKind::Create => MutationTarget::New,
            MutationKind::Update(id) | MutationKind::Delete(id) | MutationKind::Approve(id) => {
                MutationTarget::Row(*id)
            }
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            MutationKind::Create => "Created",
            MutationKind::Update(_) => "Updated",
            MutationKind::Delete(_) => "Deleted",
            MutationKind::Approve(_) => "Submitted for approval",
        }
    }
}

/// Record a mutation is latched on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationTarget {
    New,
    Row(RowId),
}

/// Delete lifecycle for one table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeletePhase {
    #[default]
    Idle,
    /// Waiting for the user to confirm; `label` is echoed in the dialog
    Confirming { id: RowId, label: String },
    InFlight { id: RowId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScheduledRefetch {
    due: Instant,
    request: PageRequest,
}

/// Serializes mutations and schedules the follow-up refetch
#[derive(Debug, Clone)]
pub struct MutationCoordinator {
    delete: DeletePhase,
    in_flight: HashSet<MutationTarget>,
    settle_delay: Duration,
    pending_refetch: Option<ScheduledRefetch>,
}

impl Default for MutationCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_DELAY)
    }
}

impl MutationCoordinator {
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            delete: DeletePhase::Idle,
            in_flight: HashSet::new(),
            settle_delay,
            pending_refetch: None,
        }
    }

    pub fn delete_phase(&self) -> &DeletePhase {
        &self.delete
    }

    pub fn is_in_flight(&self, target: MutationTarget) -> bool {
        self.in_flight.contains(&target)
    }

    pub fn has_in_flight(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Ask for confirmation before deleting `row`.
    ///
    /// Refused (returns false) while another delete is confirming or in
    /// flight, while the row itself is latched, or when the row has no id.
    pub fn request_delete(&mut self, row: &UiRow) -> bool {
        let Some(id) = row.id else {
            return false;
        };
        if self.delete != DeletePhase::Idle || self.is_in_flight(MutationTarget::Row(id)) {
            return false;
        }
        self.delete = DeletePhase::Confirming {
            id,
            label: row.describe(),
        };
        true
    }

    /// Back out of the confirmation without touching the network
    pub fn cancel_delete(&mut self) -> bool {
        if matches!(self.delete, DeletePhase::Confirming { .. }) {
            self.delete = DeletePhase::Idle;
            return true;
        }
        false
    }

    /// Confirm the pending delete, returning the id to send
    pub fn confirm_delete(&mut self) -> Option<RowId> {
        match self.delete {
            DeletePhase::Confirming { id, .. } => {
                self.delete = DeletePhase::InFlight { id };
                self.in_flight.insert(MutationTarget::Row(id));
                Some(id)
            }
            _ => None,
        }
    }

    /// Latch a create/update/approve before sending it
    pub fn begin(&mut self, kind: &MutationKind) -> Result<(), FormError> {
        if matches!(kind, MutationKind::Delete(_)) {
            return Err(FormError::Busy);
        }
        if !self.in_flight.insert(kind.target()) {
            return Err(FormError::Busy);
        }
        Ok(())
    }

    /// Release the latch for a finished mutation.
    ///
    /// On success `request` is scheduled to be fetched once the settle delay
    /// has passed.
    pub fn complete(&mut self, kind: &MutationKind, succeeded: bool, request: PageRequest, now: Instant) {
        self.in_flight.remove(&kind.target());
        if let MutationKind::Delete(id) = kind {
            if self.delete == (DeletePhase::InFlight { id: *id }) {
                self.delete = DeletePhase::Idle;
            }
        }
        if succeeded {
            self.pending_refetch = Some(ScheduledRefetch {
                due: now + self.settle_delay,
                request,
            });
        }
    }

    /// Take the scheduled refetch once it is due
    pub fn take_due_refetch(&mut self, now: Instant) -> Option<PageRequest> {
        match self.pending_refetch {
            Some(scheduled) if now >= scheduled.due => {
                self.pending_refetch = None;
                Some(scheduled.request)
            }
            _ => None,
        }
    }

    pub fn has_pending_refetch(&self) -> bool {
        self.pending_refetch.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::row::project_row;
    use crate::model::schema::SchemaRegistry;
    use serde_json::json;

    fn row(id: i64) -> UiRow {
        let schema = SchemaRegistry::builtin().get("currencies").unwrap().clone();
        project_row(&schema, &json!({ "id": id, "currencyCode": "USD" }))
    }

    const REQ: PageRequest = PageRequest { page: 0, size: 20 };

    #[test]
    fn test_delete_lifecycle() {
        let mut c = MutationCoordinator::new(Duration::from_millis(100));
        assert!(c.request_delete(&row(1)));
        assert_eq!(
            c.delete_phase(),
            &DeletePhase::Confirming {
                id: 1,
                label: "USD (#1)".to_string()
            }
        );
        assert_eq!(c.confirm_delete(), Some(1));
        assert_eq!(c.delete_phase(), &DeletePhase::InFlight { id: 1 });
        assert!(c.is_in_flight(MutationTarget::Row(1)));

        let now = Instant::now();
        c.complete(&MutationKind::Delete(1), true, REQ, now);
        assert_eq!(c.delete_phase(), &DeletePhase::Idle);
        assert!(!c.has_in_flight());
        assert!(c.has_pending_refetch());
    }

    #[test]
    fn test_cancelled_delete_sends_nothing() {
        let mut c = MutationCoordinator::default();
        assert!(c.request_delete(&row(1)));
        assert!(c.cancel_delete());
        assert_eq!(c.delete_phase(), &DeletePhase::Idle);
        assert_eq!(c.confirm_delete(), None);
        assert!(!c.has_in_flight());
        assert!(!c.has_pending_refetch());
    }

    #[test]
    fn test_second_delete_while_in_flight_is_noop() {
        let mut c = MutationCoordinator::default();
        c.request_delete(&row(1));
        c.confirm_delete();

        assert!(!c.request_delete(&row(2)));
        assert!(!c.request_delete(&row(1)));
        assert_eq!(c.delete_phase(), &DeletePhase::InFlight { id: 1 });
    }

    #[test]
    fn test_save_latched_per_record() {
        let mut c = MutationCoordinator::default();
        assert!(c.begin(&MutationKind::Update(5)).is_ok());
        assert_eq!(c.begin(&MutationKind::Update(5)), Err(FormError::Busy));
        assert!(c.begin(&MutationKind::Update(6)).is_ok());
        assert!(c.begin(&MutationKind::Create).is_ok());

        c.complete(&MutationKind::Update(5), false, REQ, Instant::now());
        assert!(c.begin(&MutationKind::Update(5)).is_ok());
    }

    #[test]
    fn test_failure_surfaces_without_refetch() {
        let mut c = MutationCoordinator::default();
        c.request_delete(&row(3));
        c.confirm_delete();
        c.complete(&MutationKind::Delete(3), false, REQ, Instant::now());

        assert_eq!(c.delete_phase(), &DeletePhase::Idle);
        assert!(!c.has_pending_refetch());
    }

    #[test]
    fn test_refetch_waits_for_settle_delay() {
        let mut c = MutationCoordinator::new(Duration::from_millis(250));
        let now = Instant::now();
        c.begin(&MutationKind::Create).unwrap();
        c.complete(&MutationKind::Create, true, REQ, now);

        assert_eq!(c.take_due_refetch(now), None);
        assert_eq!(c.take_due_refetch(now + Duration::from_millis(100)), None);
        assert_eq!(c.take_due_refetch(now + Duration::from_millis(250)), Some(REQ));
        assert_eq!(c.take_due_refetch(now + Duration::from_secs(5)), None);
    }

    #[test]
    fn test_row_without_id_cannot_be_deleted() {
        let schema = SchemaRegistry::builtin().get("currencies").unwrap().clone();
        let orphan = project_row(&schema, &json!({ "currencyCode": "EUR" }));
        let mut c = MutationCoordinator::default();
        assert!(!c.request_delete(&orphan));
    }
}
