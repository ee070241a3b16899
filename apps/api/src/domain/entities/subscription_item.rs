use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Lifecycle status of one purchased membership period.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    AsRefStr,
    Display,
    EnumString,
)]
#[sqlx(type_name = "subscription_item_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ItemStatus {
    /// Waiting in the queue for the active item to run out
    Pending,
    /// Currently grants benefits; at most one per subscription
    Active,
    /// Validity window has passed
    Expired,
    /// Withdrawn by staff
    Cancelled,
}

impl ItemStatus {
    /// Statuses that still take part in the queue.
    pub fn is_open(&self) -> bool {
        matches!(self, ItemStatus::Pending | ItemStatus::Active)
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(&self) -> &'static [ItemStatus] {
        match self {
            ItemStatus::Pending => &[ItemStatus::Active, ItemStatus::Cancelled],
            ItemStatus::Active => &[ItemStatus::Expired, ItemStatus::Cancelled],
            ItemStatus::Expired | ItemStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: ItemStatus) -> bool {
        self.valid_transitions().contains(&next)
    }
}

/// One purchased membership period inside a subscription's queue.
///
/// `name`, `cost`, the two quotas and `duration_months` are copied from the
/// plan at purchase time and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionItem {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub membership_plan_id: Option<Uuid>,
    pub name: String,
    /// Decimal amount exactly as the store delivers it. Parsed on projection.
    #[serde(deserialize_with = "deserialize_cost")]
    pub cost: String,
    pub max_classes_assistance: i32,
    pub max_gym_assistance: i32,
    pub duration_months: i32,
    pub purchase_date: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: ItemStatus,
}

/// Item ready to be persisted, before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscriptionItem {
    pub subscription_id: Uuid,
    pub membership_plan_id: Option<Uuid>,
    pub name: String,
    pub cost: String,
    pub max_classes_assistance: i32,
    pub max_gym_assistance: i32,
    pub duration_months: i32,
    pub purchase_date: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: ItemStatus,
}

impl NewSubscriptionItem {
    pub fn into_item(self, id: Uuid) -> SubscriptionItem {
        SubscriptionItem {
            id,
            subscription_id: self.subscription_id,
            membership_plan_id: self.membership_plan_id,
            name: self.name,
            cost: self.cost,
            max_classes_assistance: self.max_classes_assistance,
            max_gym_assistance: self.max_gym_assistance,
            duration_months: self.duration_months,
            purchase_date: self.purchase_date,
            start_date: self.start_date,
            end_date: self.end_date,
            status: self.status,
        }
    }
}

/// Decimal columns often travel through JSON as strings ("99.99"), sometimes
/// as numbers. Both are kept as text.
fn deserialize_cost<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCost {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawCost::deserialize(deserializer)? {
        RawCost::Text(text) => text,
        RawCost::Number(number) => number.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_json(cost: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "id": "6f1f7a5e-41b7-4b68-9a8e-0c8d2c6d1a01",
            "subscriptionId": "6f1f7a5e-41b7-4b68-9a8e-0c8d2c6d1a02",
            "membershipPlanId": null,
            "name": "Monthly",
            "cost": cost,
            "maxClassesAssistance": 20,
            "maxGymAssistance": 30,
            "durationMonths": 1,
            "purchaseDate": "2024-01-01T00:00:00Z",
            "startDate": "2024-01-01T00:00:00Z",
            "endDate": "2024-02-01T00:00:00Z",
            "status": "active"
        })
    }

    #[test]
    fn test_cost_accepts_decimal_string() {
        let item: SubscriptionItem = serde_json::from_value(item_json("99.99".into())).unwrap();
        assert_eq!(item.cost, "99.99");
        assert_eq!(item.status, ItemStatus::Active);
    }

    #[test]
    fn test_cost_accepts_number() {
        let item: SubscriptionItem =
            serde_json::from_value(item_json(serde_json::json!(45.5))).unwrap();
        assert_eq!(item.cost, "45.5");
    }

    #[test]
    fn test_cost_keeps_garbage_for_projection_to_reject() {
        let item: SubscriptionItem = serde_json::from_value(item_json("n/a".into())).unwrap();
        assert_eq!(item.cost, "n/a");
    }

    #[test]
    fn test_status_parse_accepts_both_cases() {
        assert_eq!("cancelled".parse::<ItemStatus>().unwrap(), ItemStatus::Cancelled);
        assert_eq!("PENDING".parse::<ItemStatus>().unwrap(), ItemStatus::Pending);
        assert!("paused".parse::<ItemStatus>().is_err());
        assert_eq!(ItemStatus::Expired.as_ref(), "expired");
    }

    #[test]
    fn test_valid_transitions() {
        assert!(ItemStatus::Pending.can_transition_to(ItemStatus::Active));
        assert!(ItemStatus::Pending.can_transition_to(ItemStatus::Cancelled));
        assert!(!ItemStatus::Pending.can_transition_to(ItemStatus::Expired));

        assert!(ItemStatus::Active.can_transition_to(ItemStatus::Expired));
        assert!(ItemStatus::Active.can_transition_to(ItemStatus::Cancelled));
        assert!(!ItemStatus::Active.can_transition_to(ItemStatus::Pending));

        assert!(ItemStatus::Expired.valid_transitions().is_empty());
        assert!(ItemStatus::Cancelled.valid_transitions().is_empty());
    }
}
