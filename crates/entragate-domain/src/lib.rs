pub mod error;
pub mod types;
pub mod validate;

pub use error::DomainError;
pub use types::{
    entra_group_name, Environment, GroupId, ManagementGroup, PermissionLabel, RoleLabel,
    SubscriptionId, UserId, VNetType,
};

#[cfg(test)]
mod tests;
