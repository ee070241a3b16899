use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::membership_plan::MembershipPlan,
};

const MAX_NAME_LEN: usize = 100;
const MAX_DURATION_MONTHS: i32 = 120;
const MAX_COST_SCALE: u32 = 2;
const MAX_COST_EXCLUSIVE: i64 = 100_000_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMembershipInput {
    pub name: String,
    pub cost: Decimal,
    pub max_classes_assistance: i32,
    pub max_gym_assistance: i32,
    pub duration_months: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMembershipInput {
    pub name: Option<String>,
    pub cost: Option<Decimal>,
    pub max_classes_assistance: Option<i32>,
    pub max_gym_assistance: Option<i32>,
    pub duration_months: Option<i32>,
}

#[async_trait]
pub trait MembershipPlanRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<MembershipPlan>>;
    async fn list(&self, include_archived: bool) -> AppResult<Vec<MembershipPlan>>;
    async fn create(&self, input: &CreateMembershipInput) -> AppResult<MembershipPlan>;
    async fn update(&self, id: Uuid, input: &UpdateMembershipInput) -> AppResult<MembershipPlan>;
    async fn archive(&self, id: Uuid) -> AppResult<()>;
}

#[derive(Clone)]
pub struct MembershipUseCases {
    plan_repo: Arc<dyn MembershipPlanRepo>,
}

impl MembershipUseCases {
    pub fn new(plan_repo: Arc<dyn MembershipPlanRepo>) -> Self {
        Self { plan_repo }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, include_archived: bool) -> AppResult<Vec<MembershipPlan>> {
        self.plan_repo.list(include_archived).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<MembershipPlan> {
        self.plan_repo.get_by_id(id).await?.ok_or(AppError::NotFound)
    }

    #[instrument(skip(self))]
    pub async fn create(&self, mut input: CreateMembershipInput) -> AppResult<MembershipPlan> {
        input.name = validate_name(&input.name)?;
        validate_cost(input.cost)?;
        validate_quota("maxClassesAssistance", input.max_classes_assistance)?;
        validate_quota("maxGymAssistance", input.max_gym_assistance)?;
        validate_duration(input.duration_months)?;

        self.plan_repo.create(&input).await
    }

    /// Edits apply to future purchases only; items already bought keep their
    /// snapshot.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: Uuid,
        mut input: UpdateMembershipInput,
    ) -> AppResult<MembershipPlan> {
        let plan = self.get(id).await?;
        if plan.is_archived {
            return Err(AppError::InvalidInput(
                "Archived memberships cannot be edited".into(),
            ));
        }

        if let Some(name) = input.name.as_deref() {
            input.name = Some(validate_name(name)?);
        }
        if let Some(cost) = input.cost {
            validate_cost(cost)?;
        }
        if let Some(classes) = input.max_classes_assistance {
            validate_quota("maxClassesAssistance", classes)?;
        }
        if let Some(gym) = input.max_gym_assistance {
            validate_quota("maxGymAssistance", gym)?;
        }
        if let Some(months) = input.duration_months {
            validate_duration(months)?;
        }

        self.plan_repo.update(id, &input).await
    }

    #[instrument(skip(self))]
    pub async fn archive(&self, id: Uuid) -> AppResult<()> {
        let plan = self.get(id).await?;
        if plan.is_archived {
            return Ok(());
        }
        self.plan_repo.archive(id).await
    }
}

// ============================================================================
// Validation
// ============================================================================

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::InvalidInput(format!(
            "Membership name must be 1-{MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

// Matches the NUMERIC(10, 2) cost columns.
fn validate_cost(cost: Decimal) -> AppResult<()> {
    if cost < Decimal::ZERO {
        return Err(AppError::InvalidInput("Cost cannot be negative".into()));
    }
    if cost.normalize().scale() > MAX_COST_SCALE {
        return Err(AppError::InvalidInput(format!(
            "Cost allows at most {MAX_COST_SCALE} decimal places"
        )));
    }
    if cost >= Decimal::new(MAX_COST_EXCLUSIVE, 0) {
        return Err(AppError::InvalidInput(format!(
            "Cost must be below {MAX_COST_EXCLUSIVE}"
        )));
    }
    Ok(())
}

fn validate_quota(field: &str, value: i32) -> AppResult<()> {
    if value < 0 {
        return Err(AppError::InvalidInput(format!("{field} cannot be negative")));
    }
    Ok(())
}

fn validate_duration(months: i32) -> AppResult<()> {
    if !(1..=MAX_DURATION_MONTHS).contains(&months) {
        return Err(AppError::InvalidInput(format!(
            "Duration must be 1-{MAX_DURATION_MONTHS} months"
        )));
    }
    Ok(())
}
