//! Builder for an [`AppState`] backed by in-memory mocks.

use std::sync::Arc;

use axum::http::HeaderValue;
use gymflow_types::Role;
use secrecy::SecretString;
use uuid::Uuid;

use super::{InMemoryMembershipPlanRepo, InMemorySubscriptionStore};
use crate::{
    adapters::http::app_state::AppState,
    application::jwt,
    domain::entities::{membership_plan::MembershipPlan, subscription::Subscription},
    infra::config::AppConfig,
    use_cases::{membership::MembershipUseCases, subscription::SubscriptionUseCases},
};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-bytes!";

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: SecretString::new(TEST_JWT_SECRET.into()),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        sweep_interval: std::time::Duration::from_secs(300),
        log_file: None,
    }
}

/// Bearer token for `user_id` signed with the test secret.
pub fn test_token(user_id: Uuid, roles: &[Role]) -> String {
    jwt::issue(
        user_id,
        roles.to_vec(),
        &SecretString::new(TEST_JWT_SECRET.into()),
        time::Duration::hours(1),
    )
    .unwrap()
}

#[derive(Default)]
pub struct TestAppStateBuilder {
    subscriptions: Vec<Subscription>,
    plans: Vec<MembershipPlan>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscription(mut self, subscription: Subscription) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    pub fn with_plan(mut self, plan: MembershipPlan) -> Self {
        self.plans.push(plan);
        self
    }

    pub fn build(self) -> AppState {
        let plans = Arc::new(InMemoryMembershipPlanRepo::with_plans(self.plans));
        let store = Arc::new(
            InMemorySubscriptionStore::with_subscriptions(self.subscriptions)
                .with_shared_plans(plans.clone()),
        );

        AppState {
            config: Arc::new(test_config()),
            subscription_use_cases: Arc::new(SubscriptionUseCases::new(store)),
            membership_use_cases: Arc::new(MembershipUseCases::new(plans)),
        }
    }
}
