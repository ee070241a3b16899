//! In-memory mock implementation of the membership catalogue.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::membership::{
        CreateMembershipInput, MembershipPlanRepo, UpdateMembershipInput,
    },
    domain::entities::membership_plan::MembershipPlan,
};

/// In-memory implementation of MembershipPlanRepo for testing.
#[derive(Default)]
pub struct InMemoryMembershipPlanRepo {
    pub plans: Mutex<HashMap<Uuid, MembershipPlan>>,
}

impl InMemoryMembershipPlanRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repo with initial plans for testing.
    pub fn with_plans(plans: Vec<MembershipPlan>) -> Self {
        Self {
            plans: Mutex::new(plans.into_iter().map(|p| (p.id, p)).collect()),
        }
    }
}

#[async_trait]
impl MembershipPlanRepo for InMemoryMembershipPlanRepo {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<MembershipPlan>> {
        Ok(self.plans.lock().unwrap().get(&id).cloned())
    }

    async fn list(&self, include_archived: bool) -> AppResult<Vec<MembershipPlan>> {
        let mut plans: Vec<_> = self
            .plans
            .lock()
            .unwrap()
            .values()
            .filter(|p| include_archived || !p.is_archived)
            .cloned()
            .collect();
        plans.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(plans)
    }

    async fn create(&self, input: &CreateMembershipInput) -> AppResult<MembershipPlan> {
        let now = Utc::now();
        let plan = MembershipPlan {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            cost: input.cost,
            max_classes_assistance: input.max_classes_assistance,
            max_gym_assistance: input.max_gym_assistance,
            duration_months: input.duration_months,
            is_archived: false,
            archived_at: None,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.plans.lock().unwrap().insert(plan.id, plan.clone());
        Ok(plan)
    }

    async fn update(&self, id: Uuid, input: &UpdateMembershipInput) -> AppResult<MembershipPlan> {
        let mut plans = self.plans.lock().unwrap();
        let plan = plans.get_mut(&id).ok_or(AppError::NotFound)?;

        if let Some(name) = &input.name {
            plan.name = name.clone();
        }
        if let Some(cost) = input.cost {
            plan.cost = cost;
        }
        if let Some(classes) = input.max_classes_assistance {
            plan.max_classes_assistance = classes;
        }
        if let Some(gym) = input.max_gym_assistance {
            plan.max_gym_assistance = gym;
        }
        if let Some(months) = input.duration_months {
            plan.duration_months = months;
        }
        plan.updated_at = Some(Utc::now());

        Ok(plan.clone())
    }

    async fn archive(&self, id: Uuid) -> AppResult<()> {
        let mut plans = self.plans.lock().unwrap();
        let plan = plans.get_mut(&id).ok_or(AppError::NotFound)?;
        plan.is_archived = true;
        plan.archived_at = Some(Utc::now());
        Ok(())
    }
}
