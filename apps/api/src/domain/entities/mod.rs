pub mod membership_plan;
pub mod subscription;
pub mod subscription_item;
