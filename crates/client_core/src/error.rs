use shared::{domain::UserId, error::ApiError};
use thiserror::Error;

use crate::view::ViewMode;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("server rejected request: {0}")]
    Api(ApiError),
    #[error("failed to decode response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("server rejected request: {0}")]
    Api(ApiError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("no user with id {0} in the working collection")]
    UnknownUser(UserId),
    #[error("user {0} holds the admin role and cannot be edited")]
    AdminNotEditable(UserId),
    #[error("the admin role cannot be assigned from the user table")]
    RoleNotAssignable,
    #[error(transparent)]
    Mode(#[from] ModeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{operation} is not available while {mode:?}")]
pub struct ModeError {
    pub operation: &'static str,
    pub mode: ViewMode,
}
