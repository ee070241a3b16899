pub mod entitlement;
pub mod entities;
