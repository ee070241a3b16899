use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgExecutor, Row};
use tracing::debug;
use uuid::Uuid;

use crate::{
    adapters::persistence::{
        PostgresPersistence,
        membership_plan::{PLAN_COLS, row_to_plan},
    },
    app_error::{AppError, AppResult},
    application::use_cases::subscription::SubscriptionStore,
    domain::{
        entities::{
            subscription::Subscription,
            subscription_item::{ItemStatus, SubscriptionItem},
        },
        entitlement::{self, ItemTransition, PlanSnapshot},
    },
};

// Cost is read back as text so the exact stored decimal reaches projection.
const ITEM_COLS: &str = r#"
    id, subscription_id, membership_plan_id, name, cost::text AS cost,
    max_classes_assistance, max_gym_assistance, duration_months,
    purchase_date, start_date, end_date, status
"#;

const SUBSCRIPTION_COLS: &str = "id, user_id, is_active, created_at, updated_at";

fn row_to_item(row: sqlx::postgres::PgRow) -> SubscriptionItem {
    SubscriptionItem {
        id: row.get("id"),
        subscription_id: row.get("subscription_id"),
        membership_plan_id: row.get("membership_plan_id"),
        name: row.get("name"),
        cost: row.get("cost"),
        max_classes_assistance: row.get("max_classes_assistance"),
        max_gym_assistance: row.get("max_gym_assistance"),
        duration_months: row.get("duration_months"),
        purchase_date: row.get("purchase_date"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        status: row.get("status"),
    }
}

fn row_to_subscription(row: sqlx::postgres::PgRow, items: Vec<SubscriptionItem>) -> Subscription {
    Subscription {
        id: row.get("id"),
        user_id: row.get("user_id"),
        is_active: row.get("is_active"),
        items,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

async fn load_items<'e>(
    executor: impl PgExecutor<'e>,
    subscription_id: Uuid,
) -> AppResult<Vec<SubscriptionItem>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM subscription_items WHERE subscription_id = $1 ORDER BY purchase_date, id",
        ITEM_COLS
    ))
    .bind(subscription_id)
    .fetch_all(executor)
    .await
    .map_err(AppError::from)?;
    Ok(rows.into_iter().map(row_to_item).collect())
}

/// Transitions are written in order, so an expiry lands before the promotion
/// that follows it. Rows whose status moved on meanwhile are left alone.
async fn write_transitions(
    conn: &mut PgConnection,
    subscription_id: Uuid,
    transitions: &[ItemTransition],
) -> AppResult<()> {
    for transition in transitions {
        let result = sqlx::query(
            r#"
            UPDATE subscription_items SET status = $3
            WHERE id = $1 AND subscription_id = $2 AND status = $4
            "#,
        )
        .bind(transition.item_id)
        .bind(subscription_id)
        .bind(transition.to)
        .bind(transition.from)
        .execute(&mut *conn)
        .await
        .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            debug!(
                item_id = %transition.item_id,
                from = %transition.from,
                to = %transition.to,
                "Transition already applied"
            );
        }
    }
    Ok(())
}

/// Lock the subscription row for the rest of the transaction.
async fn lock_subscription(
    conn: &mut PgConnection,
    subscription_id: Uuid,
) -> AppResult<sqlx::postgres::PgRow> {
    sqlx::query(&format!(
        "SELECT {} FROM subscriptions WHERE id = $1 FOR UPDATE",
        SUBSCRIPTION_COLS
    ))
    .bind(subscription_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(AppError::from)?
    .ok_or(AppError::NotFound)
}

#[async_trait]
impl SubscriptionStore for PostgresPersistence {
    async fn fetch_subscription(&self, user_id: Uuid) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE user_id = $1",
            SUBSCRIPTION_COLS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let items = load_items(&self.pool, row.get("id")).await?;
        Ok(Some(row_to_subscription(row, items)))
    }

    async fn get_subscription(&self, subscription_id: Uuid) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE id = $1",
            SUBSCRIPTION_COLS
        ))
        .bind(subscription_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let items = load_items(&self.pool, subscription_id).await?;
        Ok(Some(row_to_subscription(row, items)))
    }

    async fn create_subscription(&self, user_id: Uuid) -> AppResult<Subscription> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        self.fetch_subscription(user_id)
            .await?
            .ok_or_else(|| AppError::Internal("Subscription vanished after insert".into()))
    }

    async fn add_item(
        &self,
        subscription_id: Uuid,
        plan_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<SubscriptionItem> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        lock_subscription(&mut tx, subscription_id).await?;

        let plan = sqlx::query(&format!(
            "SELECT {} FROM membership_plans WHERE id = $1",
            PLAN_COLS
        ))
        .bind(plan_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::from)?
        .map(row_to_plan)
        .ok_or(AppError::NotFound)?;
        if plan.is_archived {
            return Err(AppError::InvalidInput(
                "Archived memberships cannot be sold".into(),
            ));
        }

        let mut items = load_items(&mut *tx, subscription_id).await?;
        let transitions = entitlement::advance_queue(&mut items, now)?;
        write_transitions(&mut tx, subscription_id, &transitions).await?;

        let new_item =
            entitlement::enqueue(subscription_id, &items, PlanSnapshot::from(&plan), now)?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO subscription_items
                (id, subscription_id, membership_plan_id, name, cost,
                 max_classes_assistance, max_gym_assistance, duration_months,
                 purchase_date, start_date, end_date, status)
            VALUES ($1, $2, $3, $4, $5::numeric, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            ITEM_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(new_item.subscription_id)
        .bind(new_item.membership_plan_id)
        .bind(&new_item.name)
        .bind(&new_item.cost)
        .bind(new_item.max_classes_assistance)
        .bind(new_item.max_gym_assistance)
        .bind(new_item.duration_months)
        .bind(new_item.purchase_date)
        .bind(new_item.start_date)
        .bind(new_item.end_date)
        .bind(new_item.status)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;

        sqlx::query("UPDATE subscriptions SET updated_at = CURRENT_TIMESTAMP WHERE id = $1")
            .bind(subscription_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(row_to_item(row))
    }

    async fn advance(
        &self,
        subscription_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<(Subscription, Vec<ItemTransition>)> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;
        let row = lock_subscription(&mut tx, subscription_id).await?;

        let mut items = load_items(&mut *tx, subscription_id).await?;
        let transitions = entitlement::advance_queue(&mut items, now)?;
        if !transitions.is_empty() {
            write_transitions(&mut tx, subscription_id, &transitions).await?;
        }

        tx.commit().await.map_err(AppError::from)?;
        Ok((row_to_subscription(row, items), transitions))
    }

    async fn cancel_item(
        &self,
        subscription_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<SubscriptionItem> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;
        lock_subscription(&mut tx, subscription_id).await?;

        let status: ItemStatus = sqlx::query(
            "SELECT status FROM subscription_items WHERE id = $1 AND subscription_id = $2",
        )
        .bind(item_id)
        .bind(subscription_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::from)?
        .map(|row| row.get("status"))
        .ok_or(AppError::NotFound)?;

        if !status.can_transition_to(ItemStatus::Cancelled) {
            return Err(AppError::InvalidInput(format!(
                "Cannot cancel a {status} item"
            )));
        }

        let row = sqlx::query(&format!(
            r#"
            UPDATE subscription_items SET status = $3
            WHERE id = $1 AND subscription_id = $2
            RETURNING {}
            "#,
            ITEM_COLS
        ))
        .bind(item_id)
        .bind(subscription_id)
        .bind(ItemStatus::Cancelled)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(row_to_item(row))
    }

    async fn set_active(&self, subscription_id: Uuid, is_active: bool) -> AppResult<Subscription> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE subscriptions SET is_active = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING {}
            "#,
            SUBSCRIPTION_COLS
        ))
        .bind(subscription_id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::NotFound)?;

        let items = load_items(&self.pool, subscription_id).await?;
        Ok(row_to_subscription(row, items))
    }

    async fn list_sweepable(&self) -> AppResult<Vec<Uuid>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT subscription_id FROM subscription_items
            WHERE status IN ('pending', 'active')
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.into_iter().map(|row| row.get("subscription_id")).collect())
    }
}
