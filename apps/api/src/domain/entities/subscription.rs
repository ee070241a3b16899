use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::subscription_item::SubscriptionItem;

/// A member's subscription and every item ever purchased into it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Staff switch, independent of item status.
    pub is_active: bool,
    #[serde(skip)]
    pub items: Vec<SubscriptionItem>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
