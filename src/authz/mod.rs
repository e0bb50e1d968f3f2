//! Role model and the access policies evaluated against it.

mod policy;
mod role;

pub use policy::{has_permission, AccessPolicy, ExactAllowlistPolicy, RankedPolicy};
pub use role::{rank_of, Role};
