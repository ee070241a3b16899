//! Shared types for the gymflow API.
//!
//! This crate provides:
//! - The closed set of staff and member roles (`Role`)
//! - JWT claims carried by access tokens (`AccessClaims`)
//! - API error codes returned in error bodies (`ErrorCode`)

mod claims;
mod errors;
mod role;

pub use claims::AccessClaims;
pub use errors::{ErrorCode, RoleParseError};
pub use role::Role;
