use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::membership::{
        CreateMembershipInput, MembershipPlanRepo, UpdateMembershipInput,
    },
    domain::entities::membership_plan::MembershipPlan,
};

pub(crate) fn row_to_plan(row: sqlx::postgres::PgRow) -> MembershipPlan {
    MembershipPlan {
        id: row.get("id"),
        name: row.get("name"),
        cost: row.get("cost"),
        max_classes_assistance: row.get("max_classes_assistance"),
        max_gym_assistance: row.get("max_gym_assistance"),
        duration_months: row.get("duration_months"),
        is_archived: row.get("is_archived"),
        archived_at: row.get("archived_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub(crate) const PLAN_COLS: &str = r#"
    id, name, cost, max_classes_assistance, max_gym_assistance, duration_months,
    is_archived, archived_at, created_at, updated_at
"#;

#[async_trait]
impl MembershipPlanRepo for PostgresPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<MembershipPlan>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM membership_plans WHERE id = $1",
            PLAN_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_plan))
    }

    async fn list(&self, include_archived: bool) -> AppResult<Vec<MembershipPlan>> {
        let query = if include_archived {
            format!(
                "SELECT {} FROM membership_plans ORDER BY is_archived, name, created_at",
                PLAN_COLS
            )
        } else {
            format!(
                "SELECT {} FROM membership_plans WHERE is_archived = false ORDER BY name, created_at",
                PLAN_COLS
            )
        };
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(rows.into_iter().map(row_to_plan).collect())
    }

    async fn create(&self, input: &CreateMembershipInput) -> AppResult<MembershipPlan> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO membership_plans
                (id, name, cost, max_classes_assistance, max_gym_assistance, duration_months)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            PLAN_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(input.cost)
        .bind(input.max_classes_assistance)
        .bind(input.max_gym_assistance)
        .bind(input.duration_months)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_plan(row))
    }

    async fn update(&self, id: Uuid, input: &UpdateMembershipInput) -> AppResult<MembershipPlan> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE membership_plans SET
                name = COALESCE($2, name),
                cost = COALESCE($3, cost),
                max_classes_assistance = COALESCE($4, max_classes_assistance),
                max_gym_assistance = COALESCE($5, max_gym_assistance),
                duration_months = COALESCE($6, duration_months),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING {}
            "#,
            PLAN_COLS
        ))
        .bind(id)
        .bind(&input.name)
        .bind(input.cost)
        .bind(input.max_classes_assistance)
        .bind(input.max_gym_assistance)
        .bind(input.duration_months)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_plan(row))
    }

    async fn archive(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE membership_plans SET
                is_archived = true,
                archived_at = COALESCE(archived_at, CURRENT_TIMESTAMP),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
