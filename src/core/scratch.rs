//! Per-user scratch state.
//!
//! Short-lived data that a multi-step flow needs between two events: the
//! product wizard draft, which product field is being edited, the support
//! thread a message should go to, the order a delivery photo belongs to.
//! Nothing here is durable. Every flow clears its slot when it completes or is
//! cancelled.
//!
//! The store is a mutex-guarded map keyed by user id. The lock is only held for
//! the duration of a map operation and never across an `.await`.

use crate::core::token::ProductField;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Product being assembled by the admin wizard
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub stock: Option<i32>,
    pub category: Option<String>,
    pub city: Option<String>,
}

/// What an admin in a product state is doing
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdminTask {
    /// Walking through the creation wizard
    Create(ProductDraft),
    /// Changing one field of an existing product
    Edit {
        product_id: i64,
        field: ProductField,
    },
}

/// Delivery report being assembled for an order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryDraft {
    pub order_id: i64,
    pub photo: Option<String>,
}

/// Support thread an admin is answering
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SupportReply {
    pub order_id: i64,
    pub client_id: i64,
}

/// Everything a single user may have in flight
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scratch {
    pub admin_task: Option<AdminTask>,
    pub delivery: Option<DeliveryDraft>,
    pub delivery_time_order: Option<i64>,
    pub support_reply: Option<SupportReply>,
    /// Thread a client's next support message belongs to
    pub support_order: Option<i64>,
    /// Category to return to from a product card
    pub last_category: Option<String>,
}

impl Scratch {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Guarded map of scratch state keyed by user id
#[derive(Debug, Default)]
pub struct ScratchStore {
    entries: Mutex<HashMap<i64, Scratch>>,
}

impl ScratchStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i64, Scratch>> {
        // A panic while holding the lock leaves plain data behind; keep using it.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of a user's scratch state.
    #[must_use]
    pub fn get(&self, user_id: i64) -> Scratch {
        self.lock().get(&user_id).cloned().unwrap_or_default()
    }

    /// Applies `change` to a user's scratch state and returns its result.
    /// Entries that end up empty are dropped.
    pub fn update<T>(&self, user_id: i64, change: impl FnOnce(&mut Scratch) -> T) -> T {
        let mut entries = self.lock();
        let entry = entries.entry(user_id).or_default();
        let result = change(entry);
        if entry.is_empty() {
            entries.remove(&user_id);
        }
        result
    }

    /// Forgets everything about a user.
    pub fn clear(&self, user_id: i64) {
        self.lock().remove(&user_id);
    }

    /// Starts a fresh wizard draft, discarding any task already in progress.
    pub fn start_draft(&self, admin_id: i64) {
        self.update(admin_id, |scratch| {
            scratch.admin_task = Some(AdminTask::Create(ProductDraft::default()));
        });
    }

    /// Records a single-field edit, discarding any task already in progress.
    pub fn start_edit(&self, admin_id: i64, product_id: i64, field: ProductField) {
        self.update(admin_id, |scratch| {
            scratch.admin_task = Some(AdminTask::Edit { product_id, field });
        });
    }

    /// Current admin task, if any.
    #[must_use]
    pub fn admin_task(&self, admin_id: i64) -> Option<AdminTask> {
        self.get(admin_id).admin_task
    }

    /// Applies `change` to the wizard draft. Returns `None` when the admin has
    /// no draft in progress.
    pub fn update_draft<T>(
        &self,
        admin_id: i64,
        change: impl FnOnce(&mut ProductDraft) -> T,
    ) -> Option<T> {
        self.update(admin_id, |scratch| match scratch.admin_task.as_mut() {
            Some(AdminTask::Create(draft)) => Some(change(draft)),
            _ => None,
        })
    }

    /// Removes and returns the admin task.
    pub fn take_admin_task(&self, admin_id: i64) -> Option<AdminTask> {
        self.update(admin_id, |scratch| scratch.admin_task.take())
    }

    /// Number of users with something in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nobody has anything in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_drafts_are_isolated_per_admin() {
        let store = ScratchStore::new();
        store.start_draft(1);
        store.start_draft(2);

        store.update_draft(1, |draft| draft.name = Some("Widget".to_string()));
        store.update_draft(2, |draft| draft.name = Some("Gadget".to_string()));

        let Some(AdminTask::Create(first)) = store.admin_task(1) else {
            panic!("missing draft");
        };
        let Some(AdminTask::Create(second)) = store.admin_task(2) else {
            panic!("missing draft");
        };
        assert_eq!(first.name.as_deref(), Some("Widget"));
        assert_eq!(second.name.as_deref(), Some("Gadget"));
    }

    #[test]
    fn test_new_draft_discards_previous() {
        let store = ScratchStore::new();
        store.start_draft(1);
        store.update_draft(1, |draft| draft.stock = Some(4));
        store.start_draft(1);
        assert_eq!(
            store.admin_task(1),
            Some(AdminTask::Create(ProductDraft::default()))
        );
    }

    #[test]
    fn test_update_draft_without_draft() {
        let store = ScratchStore::new();
        assert_eq!(store.update_draft(9, |draft| draft.stock = Some(1)), None);
        store.start_edit(9, 3, ProductField::Price);
        assert_eq!(store.update_draft(9, |draft| draft.stock = Some(1)), None);
    }

    #[test]
    fn test_empty_entries_are_dropped() {
        let store = ScratchStore::new();
        store.update(5, |scratch| scratch.support_order = Some(0));
        assert_eq!(store.len(), 1);
        store.update(5, |scratch| scratch.support_order = None);
        assert!(store.is_empty());

        store.start_draft(5);
        assert!(store.take_admin_task(5).is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_forgets_everything() {
        let store = ScratchStore::new();
        store.start_draft(1);
        store.update(1, |scratch| scratch.last_category = Some("tea".to_string()));
        store.clear(1);
        assert_eq!(store.get(1), Scratch::default());
    }

    #[test]
    fn test_concurrent_updates() {
        let store = Arc::new(ScratchStore::new());
        let handles: Vec<_> = (0..8)
            .map(|admin| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.start_draft(admin);
                    for stock in 0..100 {
                        store.update_draft(admin, |draft| draft.stock = Some(stock));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        for admin in 0..8 {
            let Some(AdminTask::Create(draft)) = store.admin_task(admin) else {
                panic!("missing draft for {admin}");
            };
            assert_eq!(draft.stock, Some(99));
        }
    }
}
