use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid ProjectName: {0}")]
    InvalidProjectName(String),

    #[error("invalid Environment: {0}")]
    InvalidEnvironment(String),

    #[error("invalid Email: {0}")]
    InvalidEmail(String),

    #[error("invalid Emails: {0}")]
    InvalidEmails(String),

    #[error("invalid Permission: {0}")]
    InvalidPermission(String),

    #[error("invalid AssignRole: {0}")]
    InvalidAssignRole(String),

    #[error("invalid VNetType: {0}")]
    InvalidVNetType(String),

    #[error("invalid ManagementGroups: {0}")]
    InvalidManagementGroup(String),
}
