//! In-memory mock implementation of the subscription store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::InMemoryMembershipPlanRepo;
use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::{membership::MembershipPlanRepo, subscription::SubscriptionStore},
    domain::{
        entities::{
            subscription::Subscription,
            subscription_item::{ItemStatus, SubscriptionItem},
        },
        entitlement::{self, ItemTransition, PlanSnapshot},
    },
};

/// In-memory implementation of SubscriptionStore for testing.
///
/// Items keep their insertion order. Plans are looked up in a shared
/// [`InMemoryMembershipPlanRepo`] so catalogue edits are visible.
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    pub subscriptions: Mutex<Vec<Subscription>>,
    plans: Arc<InMemoryMembershipPlanRepo>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with initial subscriptions for testing.
    pub fn with_subscriptions(subscriptions: Vec<Subscription>) -> Self {
        Self {
            subscriptions: Mutex::new(subscriptions),
            plans: Arc::default(),
        }
    }

    pub fn with_plans(self, plans: InMemoryMembershipPlanRepo) -> Self {
        self.with_shared_plans(Arc::new(plans))
    }

    pub fn with_shared_plans(mut self, plans: Arc<InMemoryMembershipPlanRepo>) -> Self {
        self.plans = plans;
        self
    }

    fn with_subscription<T>(
        &self,
        subscription_id: Uuid,
        f: impl FnOnce(&mut Subscription) -> AppResult<T>,
    ) -> AppResult<T> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let subscription = subscriptions
            .iter_mut()
            .find(|s| s.id == subscription_id)
            .ok_or(AppError::NotFound)?;
        f(subscription)
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn fetch_subscription(&self, user_id: Uuid) -> AppResult<Option<Subscription>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn get_subscription(&self, subscription_id: Uuid) -> AppResult<Option<Subscription>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == subscription_id)
            .cloned())
    }

    async fn create_subscription(&self, user_id: Uuid) -> AppResult<Subscription> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        if let Some(existing) = subscriptions.iter().find(|s| s.user_id == user_id) {
            return Ok(existing.clone());
        }

        let now = Utc::now();
        let subscription = Subscription {
            id: Uuid::new_v4(),
            user_id,
            is_active: true,
            items: Vec::new(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        subscriptions.push(subscription.clone());
        Ok(subscription)
    }

    async fn add_item(
        &self,
        subscription_id: Uuid,
        plan_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<SubscriptionItem> {
        let plan = self
            .plans
            .get_by_id(plan_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if plan.is_archived {
            return Err(AppError::InvalidInput(
                "Archived memberships cannot be sold".into(),
            ));
        }

        self.with_subscription(subscription_id, |subscription| {
            entitlement::advance_queue(&mut subscription.items, now)?;
            let item = entitlement::enqueue(
                subscription_id,
                &subscription.items,
                PlanSnapshot::from(&plan),
                now,
            )?
            .into_item(Uuid::new_v4());
            subscription.items.push(item.clone());
            Ok(item)
        })
    }

    async fn advance(
        &self,
        subscription_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<(Subscription, Vec<ItemTransition>)> {
        self.with_subscription(subscription_id, |subscription| {
            // Swept on a copy so a violation leaves the stored queue untouched.
            let mut items = subscription.items.clone();
            let transitions = entitlement::advance_queue(&mut items, now)?;
            subscription.items = items;
            Ok((subscription.clone(), transitions))
        })
    }

    async fn cancel_item(
        &self,
        subscription_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<SubscriptionItem> {
        self.with_subscription(subscription_id, |subscription| {
            let item = subscription
                .items
                .iter_mut()
                .find(|i| i.id == item_id)
                .ok_or(AppError::NotFound)?;
            if !item.status.can_transition_to(ItemStatus::Cancelled) {
                return Err(AppError::InvalidInput(format!(
                    "Cannot cancel a {} item",
                    item.status
                )));
            }
            item.status = ItemStatus::Cancelled;
            Ok(item.clone())
        })
    }

    async fn set_active(&self, subscription_id: Uuid, is_active: bool) -> AppResult<Subscription> {
        self.with_subscription(subscription_id, |subscription| {
            subscription.is_active = is_active;
            subscription.updated_at = Some(Utc::now());
            Ok(subscription.clone())
        })
    }

    async fn list_sweepable(&self) -> AppResult<Vec<Uuid>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.items.iter().any(|i| i.status.is_open()))
            .map(|s| s.id)
            .collect())
    }
}
