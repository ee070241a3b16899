//! Test utilities for integration testing.
//!
//! This module provides:
//! - Test data factories for creating valid test fixtures
//! - In-memory repository implementations for mocking persistence
//! - A builder for an `AppState` wired to those mocks

mod app_state_builder;
mod factories;
mod membership_mocks;
mod subscription_mocks;

pub use app_state_builder::*;
pub use factories::*;
pub use membership_mocks::*;
pub use subscription_mocks::*;
