use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{EntitlementError, queue::active_item};
use crate::domain::entities::subscription_item::SubscriptionItem;

const MILLIS_PER_DAY: u64 = 86_400_000;

/// Benefits granted by the active item, ready for display and quota checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Benefits {
    pub cost: Decimal,
    pub classes: i32,
    pub gym: i32,
    pub duration_months: i32,
    pub valid_until: Option<DateTime<Utc>>,
    pub name: Option<String>,
}

impl Benefits {
    /// "No entitlement": every quota zero, no validity, no name.
    pub fn none() -> Self {
        Self {
            cost: Decimal::ZERO,
            classes: 0,
            gym: 0,
            duration_months: 0,
            valid_until: None,
            name: None,
        }
    }

    fn from_item(item: &SubscriptionItem) -> Result<Self, EntitlementError> {
        Ok(Self {
            cost: parse_cost(item)?,
            classes: item.max_classes_assistance,
            gym: item.max_gym_assistance,
            duration_months: item.duration_months,
            valid_until: Some(item.end_date),
            name: Some(item.name.clone()),
        })
    }
}

/// Benefits of the active item, or [`Benefits::none`] when nothing is active.
pub fn current_benefits(items: &[SubscriptionItem]) -> Result<Benefits, EntitlementError> {
    match active_item(items)? {
        Some(item) => Benefits::from_item(item),
        None => Ok(Benefits::none()),
    }
}

/// Whole days left on the active item, rounded up and never negative.
///
/// A partial day counts as a full day since access is still granted for part
/// of it.
pub fn days_remaining(
    items: &[SubscriptionItem],
    now: DateTime<Utc>,
) -> Result<u32, EntitlementError> {
    let Some(item) = active_item(items)? else {
        return Ok(0);
    };

    let remaining_ms = (item.end_date - now).num_milliseconds();
    let Ok(remaining_ms) = u64::try_from(remaining_ms) else {
        return Ok(0);
    };

    let days = remaining_ms.div_ceil(MILLIS_PER_DAY);
    Ok(u32::try_from(days).unwrap_or(u32::MAX))
}

fn parse_cost(item: &SubscriptionItem) -> Result<Decimal, EntitlementError> {
    let raw = item.cost.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| EntitlementError::InvalidCost {
            item_id: item.id,
            raw: item.cost.clone(),
        })
}
