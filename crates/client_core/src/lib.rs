use async_trait::async_trait;
use shared::protocol::{ArticlePreview, CurrentUser, UpdateDiffEntry, UserRecord};

pub mod article_list;
pub mod credentials;
pub mod error;
pub mod transport;
pub mod user_list;
pub mod view;

pub use article_list::ArticleListController;
pub use credentials::{CredentialStore, FileCredentialStore, StaticCredentials};
pub use error::{EditError, FetchError, ModeError, MutationError};
pub use transport::HttpAdminClient;
pub use user_list::{CommitOutcome, UserListController};

/// Read side of the admin API.
#[async_trait]
pub trait DataFetchClient: Send + Sync {
    async fn get_articles(&self) -> Result<Vec<ArticlePreview>, FetchError>;
    /// Resolves the account that owns `token`.
    async fn get_user(&self, token: &str) -> Result<CurrentUser, FetchError>;
    async fn get_all_users(&self) -> Result<Vec<UserRecord>, FetchError>;
}

/// Write side of the admin API.
#[async_trait]
pub trait DataMutationClient: Send + Sync {
    async fn set_roles(&self, entries: &[UpdateDiffEntry]) -> Result<(), MutationError>;
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
