//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::entities::{
    membership_plan::MembershipPlan,
    subscription::Subscription,
    subscription_item::{ItemStatus, SubscriptionItem},
};

/// Midnight UTC on the given date.
pub fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .expect("valid test date")
}

/// Create a test membership plan with sensible defaults.
pub fn create_test_plan(overrides: impl FnOnce(&mut MembershipPlan)) -> MembershipPlan {
    let mut plan = MembershipPlan {
        id: Uuid::new_v4(),
        name: "Monthly".to_string(),
        cost: Decimal::new(4500, 2),
        max_classes_assistance: 8,
        max_gym_assistance: 30,
        duration_months: 1,
        is_archived: false,
        archived_at: None,
        created_at: Some(utc(2023, 12, 1)),
        updated_at: Some(utc(2023, 12, 1)),
    };
    overrides(&mut plan);
    plan
}

/// Create a test subscription item. Defaults to an active one-month item
/// covering January 2024.
pub fn create_test_item(overrides: impl FnOnce(&mut SubscriptionItem)) -> SubscriptionItem {
    let mut item = SubscriptionItem {
        id: Uuid::new_v4(),
        subscription_id: Uuid::new_v4(),
        membership_plan_id: None,
        name: "Monthly".to_string(),
        cost: "45.00".to_string(),
        max_classes_assistance: 8,
        max_gym_assistance: 30,
        duration_months: 1,
        purchase_date: utc(2024, 1, 1),
        start_date: utc(2024, 1, 1),
        end_date: utc(2024, 2, 1),
        status: ItemStatus::Active,
    };
    overrides(&mut item);
    item
}

/// Create an active test subscription with no items.
pub fn create_test_subscription(overrides: impl FnOnce(&mut Subscription)) -> Subscription {
    let mut subscription = Subscription {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        is_active: true,
        items: Vec::new(),
        created_at: Some(utc(2023, 12, 1)),
        updated_at: Some(utc(2023, 12, 1)),
    };
    overrides(&mut subscription);
    subscription
}
