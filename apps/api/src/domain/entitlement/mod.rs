//! Entitlement lifecycle of a subscription's item queue.
//!
//! Everything in here is a pure function of the item set and an explicit
//! `now`. Callers fetch the items, sweep them with [`advance_queue`], persist
//! the returned transitions and only then classify or project.

pub mod benefits;
pub mod queue;

use thiserror::Error;
use uuid::Uuid;

pub use benefits::{Benefits, current_benefits, days_remaining};
pub use queue::{
    ItemTransition, PlanSnapshot, active_item, advance_queue, cancelled_items, enqueue,
    expired_items, pending_items,
};

/// Data-integrity faults in a subscription's items.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntitlementError {
    #[error("More than one active item: {0:?}")]
    MultipleActiveItems(Vec<Uuid>),

    #[error("Item {item_id} has a non-numeric cost: {raw:?}")]
    InvalidCost { item_id: Uuid, raw: String },

    #[error("Item validity window does not fit in the calendar")]
    WindowOverflow,
}
