//! restage-aws — AWS implementations of the control-plane traits.
//!
//! A shared [`SdkConfig`](aws_config::SdkConfig) is loaded once from
//! the environment at the entry point; each facade wraps its own
//! service client built from it. Credentials and region resolution are
//! entirely the SDK's business.

pub mod ecs;
pub mod rds;
mod util;

pub use ecs::EcsControlPlane;
pub use rds::RdsControlPlane;
