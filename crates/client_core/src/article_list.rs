use std::sync::Arc;

use shared::protocol::{ArticlePreview, CurrentUser};
use tracing::{debug, info, warn};

use crate::{
    credentials::CredentialStore,
    view::{derive_article_view, page_count, ArticleListView, LoadStatus, PageState, SortKey},
    DataFetchClient, FetchError,
};

/// Sortable, client-side paginated article listing.
pub struct ArticleListController {
    fetch: Arc<dyn DataFetchClient>,
    credentials: Arc<dyn CredentialStore>,
    articles: Vec<ArticlePreview>,
    status: LoadStatus,
    last_error: Option<FetchError>,
    sort: SortKey,
    page: PageState,
    viewer: Option<CurrentUser>,
}

impl ArticleListController {
    pub fn new(fetch: Arc<dyn DataFetchClient>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            fetch,
            credentials,
            articles: Vec::new(),
            status: LoadStatus::Idle,
            last_error: None,
            sort: SortKey::default(),
            page: PageState::default(),
            viewer: None,
        }
    }

    /// Fetches the article collection and the signed-in account.
    pub async fn load(&mut self) {
        self.start_loading();
        let result = self.fetch.get_articles().await;
        self.apply_articles(result);
        self.refresh_viewer().await;
    }

    pub fn start_loading(&mut self) {
        self.status = LoadStatus::Loading;
    }

    pub fn apply_articles(&mut self, result: Result<Vec<ArticlePreview>, FetchError>) {
        match result {
            Ok(articles) => {
                info!(count = articles.len(), "article list loaded");
                self.articles = articles;
                self.status = LoadStatus::Ready;
                self.last_error = None;
            }
            Err(err) => {
                warn!(error = %err, "failed to load article list");
                self.status = LoadStatus::Failed;
                self.last_error = Some(err);
            }
        }
    }

    async fn refresh_viewer(&mut self) {
        let Some(token) = self.credentials.access_token() else {
            self.viewer = None;
            return;
        };
        match self.fetch.get_user(&token).await {
            Ok(user) => self.viewer = Some(user),
            Err(err) => {
                warn!(error = %err, "failed to resolve current user");
                self.viewer = None;
            }
        }
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        debug!(%sort, "article sort changed");
        self.sort = sort;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = PageState::new(page);
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page.page
    }

    pub fn page_count(&self) -> usize {
        page_count(self.articles.len())
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn viewer(&self) -> Option<&CurrentUser> {
        self.viewer.as_ref()
    }

    pub fn view(&self) -> ArticleListView {
        derive_article_view(
            &self.articles,
            self.sort,
            self.page,
            self.status,
            self.viewer.as_ref(),
        )
    }
}

#[cfg(test)]
#[path = "tests/article_list_tests.rs"]
mod tests;
