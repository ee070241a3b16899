use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::{
        entities::{subscription::Subscription, subscription_item::SubscriptionItem},
        entitlement::{self, Benefits, EntitlementError, ItemTransition},
    },
};

/// Upper bound on memberships sold in one checkout.
pub const MAX_BATCH_ITEMS: usize = 12;

/// Persistence port for subscriptions and their item queues.
///
/// Implementations must serialise `add_item` and `advance` per subscription:
/// the queue is read, swept and written back as one atomic step.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// `None` means the user has no subscription yet.
    async fn fetch_subscription(&self, user_id: Uuid) -> AppResult<Option<Subscription>>;
    async fn get_subscription(&self, subscription_id: Uuid) -> AppResult<Option<Subscription>>;
    /// Returns the existing subscription if the user already has one.
    async fn create_subscription(&self, user_id: Uuid) -> AppResult<Subscription>;
    /// Snapshot `plan_id` into a new item placed at the end of the queue.
    async fn add_item(
        &self,
        subscription_id: Uuid,
        plan_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<SubscriptionItem>;
    /// Sweep the stored queue for `now` under the subscription lock, persist
    /// the transitions and return the settled subscription with them.
    async fn advance(
        &self,
        subscription_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<(Subscription, Vec<ItemTransition>)>;
    async fn cancel_item(&self, subscription_id: Uuid, item_id: Uuid)
    -> AppResult<SubscriptionItem>;
    async fn set_active(&self, subscription_id: Uuid, is_active: bool) -> AppResult<Subscription>;
    /// Subscriptions that still have pending or active items.
    async fn list_sweepable(&self) -> AppResult<Vec<Uuid>>;
}

/// Classified queue and projected benefits of one subscription at an instant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionOverview {
    pub subscription: Subscription,
    pub active_item: Option<SubscriptionItem>,
    pub pending_items: Vec<SubscriptionItem>,
    pub expired_items: Vec<SubscriptionItem>,
    pub cancelled_items: Vec<SubscriptionItem>,
    pub benefits: Benefits,
    pub days_remaining: u32,
}

impl SubscriptionOverview {
    /// Expects items already swept for `now`.
    pub fn project(subscription: Subscription, now: DateTime<Utc>) -> Result<Self, EntitlementError> {
        let items = &subscription.items;
        let active_item = entitlement::active_item(items)?.cloned();
        let benefits = entitlement::current_benefits(items)?;
        let days_remaining = entitlement::days_remaining(items, now)?;
        let pending_items = entitlement::pending_items(items).into_iter().cloned().collect();
        let expired_items = entitlement::expired_items(items).into_iter().cloned().collect();
        let cancelled_items = entitlement::cancelled_items(items)
            .into_iter()
            .cloned()
            .collect();

        Ok(Self {
            subscription,
            active_item,
            pending_items,
            expired_items,
            cancelled_items,
            benefits,
            days_remaining,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub subscriptions: usize,
    pub transitions: usize,
    pub failures: usize,
}

#[derive(Clone)]
pub struct SubscriptionUseCases {
    store: Arc<dyn SubscriptionStore>,
}

impl SubscriptionUseCases {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    /// Sweep the user's queue for `now`, persist the result and project it.
    #[instrument(skip(self))]
    pub async fn overview(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SubscriptionOverview>> {
        let Some(snapshot) = self.store.fetch_subscription(user_id).await? else {
            return Ok(None);
        };
        let (subscription, transitions) = self.store.advance(snapshot.id, now).await?;
        if !transitions.is_empty() {
            info!(
                subscription_id = %subscription.id,
                transitions = transitions.len(),
                "Queue advanced on read"
            );
        }
        Ok(Some(SubscriptionOverview::project(subscription, now)?))
    }

    #[instrument(skip(self))]
    pub async fn create_subscription(&self, user_id: Uuid) -> AppResult<Subscription> {
        self.store.create_subscription(user_id).await
    }

    /// Add one item per plan, in order, stopping at the first failure.
    ///
    /// Items added before a failure stay in place. When at least one item
    /// made it the error is [`AppError::PartialBatch`], so the caller knows to
    /// re-fetch. `cancel` is checked before every item.
    #[instrument(skip(self, cancel))]
    pub async fn add_memberships(
        &self,
        subscription_id: Uuid,
        plan_ids: &[Uuid],
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<SubscriptionItem>> {
        if plan_ids.is_empty() {
            return Err(AppError::InvalidInput("No memberships selected".into()));
        }
        if plan_ids.len() > MAX_BATCH_ITEMS {
            return Err(AppError::InvalidInput(format!(
                "At most {MAX_BATCH_ITEMS} memberships per checkout"
            )));
        }
        self.store
            .get_subscription(subscription_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut added = Vec::with_capacity(plan_ids.len());
        for plan_id in plan_ids {
            let result = if cancel.is_cancelled() {
                Err(AppError::Cancelled)
            } else {
                self.store.add_item(subscription_id, *plan_id, now).await
            };

            match result {
                Ok(item) => {
                    info!(
                        subscription_id = %subscription_id,
                        item_id = %item.id,
                        status = %item.status,
                        "Membership added to queue"
                    );
                    added.push(item);
                }
                Err(err) if added.is_empty() => return Err(err),
                Err(err) => {
                    warn!(
                        subscription_id = %subscription_id,
                        added = added.len(),
                        error = %err,
                        "Membership batch stopped part way"
                    );
                    return Err(AppError::PartialBatch {
                        added: added.len(),
                        source: Box::new(err),
                    });
                }
            }
        }

        Ok(added)
    }

    #[instrument(skip(self))]
    pub async fn cancel_item(
        &self,
        subscription_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<SubscriptionItem> {
        let item = self.store.cancel_item(subscription_id, item_id).await?;
        info!(subscription_id = %subscription_id, item_id = %item_id, "Item cancelled");
        Ok(item)
    }

    #[instrument(skip(self))]
    pub async fn set_active(
        &self,
        subscription_id: Uuid,
        is_active: bool,
    ) -> AppResult<Subscription> {
        self.store.set_active(subscription_id, is_active).await
    }

    /// Sweep one subscription and persist its transitions.
    pub async fn sweep_subscription(
        &self,
        subscription_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<ItemTransition>> {
        let (_, transitions) = self.store.advance(subscription_id, now).await?;
        Ok(transitions)
    }

    /// Sweep every subscription with an open queue. Failures are counted and
    /// logged, not propagated, so one broken subscription cannot stall the rest.
    #[instrument(skip(self))]
    pub async fn sweep_all(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        let ids = self.store.list_sweepable().await?;
        let mut report = SweepReport {
            subscriptions: ids.len(),
            ..SweepReport::default()
        };

        for subscription_id in ids {
            match self.sweep_subscription(subscription_id, now).await {
                Ok(transitions) => report.transitions += transitions.len(),
                Err(err) => {
                    report.failures += 1;
                    warn!(subscription_id = %subscription_id, error = ?err, "Sweep failed");
                }
            }
        }

        Ok(report)
    }
}
