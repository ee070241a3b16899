pub mod membership;
pub mod subscription;
