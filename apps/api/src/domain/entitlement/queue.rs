use std::cmp::Ordering;

use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::EntitlementError;
use crate::domain::entities::{
    membership_plan::MembershipPlan,
    subscription_item::{ItemStatus, NewSubscriptionItem, SubscriptionItem},
};

/// A status change applied by [`advance_queue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemTransition {
    pub item_id: Uuid,
    pub from: ItemStatus,
    pub to: ItemStatus,
}

/// Plan attributes copied onto a new item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSnapshot {
    pub membership_plan_id: Option<Uuid>,
    pub name: String,
    pub cost: String,
    pub max_classes_assistance: i32,
    pub max_gym_assistance: i32,
    pub duration_months: i32,
}

impl From<&MembershipPlan> for PlanSnapshot {
    fn from(plan: &MembershipPlan) -> Self {
        Self {
            membership_plan_id: Some(plan.id),
            name: plan.name.clone(),
            cost: plan.cost.to_string(),
            max_classes_assistance: plan.max_classes_assistance,
            max_gym_assistance: plan.max_gym_assistance,
            duration_months: plan.duration_months,
        }
    }
}

/// The single active item, if any.
pub fn active_item(items: &[SubscriptionItem]) -> Result<Option<&SubscriptionItem>, EntitlementError> {
    Ok(active_index(items)?.map(|idx| &items[idx]))
}

/// Pending items in the order they will be activated.
pub fn pending_items(items: &[SubscriptionItem]) -> Vec<&SubscriptionItem> {
    let mut pending: Vec<_> = with_status(items, ItemStatus::Pending).collect();
    pending.sort_by(|a, b| queue_order(a, b));
    pending
}

/// Expired items, most recently ended first.
pub fn expired_items(items: &[SubscriptionItem]) -> Vec<&SubscriptionItem> {
    let mut expired: Vec<_> = with_status(items, ItemStatus::Expired).collect();
    expired.sort_by(|a, b| history_order(b, a));
    expired
}

/// Cancelled items, most recently purchased first.
pub fn cancelled_items(items: &[SubscriptionItem]) -> Vec<&SubscriptionItem> {
    let mut cancelled: Vec<_> = with_status(items, ItemStatus::Cancelled).collect();
    cancelled.sort_by(|a, b| {
        b.purchase_date
            .cmp(&a.purchase_date)
            .then_with(|| b.id.cmp(&a.id))
    });
    cancelled
}

/// Expire the active item once `now` reaches its end and promote the head of
/// the pending queue, repeating until the queue is settled.
///
/// Promoted items keep the dates fixed at purchase. A queue that runs dry
/// leaves no active item, which is a valid state. Calling again with the same
/// `now` changes nothing.
pub fn advance_queue(
    items: &mut [SubscriptionItem],
    now: DateTime<Utc>,
) -> Result<Vec<ItemTransition>, EntitlementError> {
    let mut active = active_index(items)?;
    let mut transitions = Vec::new();

    loop {
        if let Some(idx) = active {
            if now < items[idx].end_date {
                break;
            }
            transitions.push(set_status(&mut items[idx], ItemStatus::Expired));
        }

        let Some(next) = next_pending_index(items) else {
            break;
        };
        transitions.push(set_status(&mut items[next], ItemStatus::Active));
        active = Some(next);
    }

    Ok(transitions)
}

/// Build the item that buying `plan` at `now` appends to the queue.
///
/// Expects items already swept for `now`. With nothing active or pending the
/// new item starts right away; otherwise it starts when the last queued item
/// ends.
pub fn enqueue(
    subscription_id: Uuid,
    items: &[SubscriptionItem],
    plan: PlanSnapshot,
    now: DateTime<Utc>,
) -> Result<NewSubscriptionItem, EntitlementError> {
    let queue_tail = items
        .iter()
        .filter(|item| item.status.is_open())
        .map(|item| item.end_date)
        .max();

    let (status, start_date) = match queue_tail {
        Some(tail) => (ItemStatus::Pending, tail.max(now)),
        None => (ItemStatus::Active, now),
    };

    let months = u32::try_from(plan.duration_months).map_err(|_| EntitlementError::WindowOverflow)?;
    let end_date = start_date
        .checked_add_months(Months::new(months))
        .ok_or(EntitlementError::WindowOverflow)?;
    if end_date <= start_date {
        return Err(EntitlementError::WindowOverflow);
    }

    Ok(NewSubscriptionItem {
        subscription_id,
        membership_plan_id: plan.membership_plan_id,
        name: plan.name,
        cost: plan.cost,
        max_classes_assistance: plan.max_classes_assistance,
        max_gym_assistance: plan.max_gym_assistance,
        duration_months: plan.duration_months,
        purchase_date: now,
        start_date,
        end_date,
        status,
    })
}

fn with_status(
    items: &[SubscriptionItem],
    status: ItemStatus,
) -> impl Iterator<Item = &SubscriptionItem> {
    items.iter().filter(move |item| item.status == status)
}

fn active_index(items: &[SubscriptionItem]) -> Result<Option<usize>, EntitlementError> {
    let active: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.status == ItemStatus::Active)
        .map(|(idx, _)| idx)
        .collect();

    match active.as_slice() {
        [] => Ok(None),
        [idx] => Ok(Some(*idx)),
        _ => Err(EntitlementError::MultipleActiveItems(
            active.iter().map(|idx| items[*idx].id).collect(),
        )),
    }
}

fn next_pending_index(items: &[SubscriptionItem]) -> Option<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.status == ItemStatus::Pending)
        .min_by(|(_, a), (_, b)| queue_order(a, b))
        .map(|(idx, _)| idx)
}

fn set_status(item: &mut SubscriptionItem, to: ItemStatus) -> ItemTransition {
    let transition = ItemTransition {
        item_id: item.id,
        from: item.status,
        to,
    };
    item.status = to;
    transition
}

// First purchased, first served on equal start dates.
fn queue_order(a: &SubscriptionItem, b: &SubscriptionItem) -> Ordering {
    a.start_date
        .cmp(&b.start_date)
        .then_with(|| a.purchase_date.cmp(&b.purchase_date))
        .then_with(|| a.id.cmp(&b.id))
}

fn history_order(a: &SubscriptionItem, b: &SubscriptionItem) -> Ordering {
    a.end_date
        .cmp(&b.end_date)
        .then_with(|| a.purchase_date.cmp(&b.purchase_date))
        .then_with(|| a.id.cmp(&b.id))
}
