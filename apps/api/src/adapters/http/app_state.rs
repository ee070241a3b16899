use std::sync::Arc;

use crate::{
    infra::config::AppConfig,
    use_cases::{membership::MembershipUseCases, subscription::SubscriptionUseCases},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub subscription_use_cases: Arc<SubscriptionUseCases>,
    pub membership_use_cases: Arc<MembershipUseCases>,
}
