//! reqwest-backed implementation of the admin API clients.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    error::ApiError,
    protocol::{ArticlePreview, CurrentUser, UpdateDiffEntry, UserRecord},
};
use tracing::debug;
use url::Url;

use crate::{
    credentials::CredentialStore, DataFetchClient, DataMutationClient, FetchError, MutationError,
};

pub struct HttpAdminClient {
    http: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialStore>,
}

impl HttpAdminClient {
    pub fn new(base_url: Url, credentials: Arc<dyn CredentialStore>) -> Self {
        Self::with_http_client(Client::new(), base_url, credentials)
    }

    pub fn with_http_client(
        http: Client,
        base_url: Url,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            http,
            base_url,
            credentials,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, FetchError> {
        let res = request.send().await.map_err(FetchError::Transport)?;
        if !res.status().is_success() {
            let (status, api_error) = rejection(res).await;
            return Err(match api_error {
                Some(err) => FetchError::Api(err),
                None => FetchError::Status(status),
            });
        }
        let body = res.bytes().await.map_err(FetchError::Transport)?;
        serde_json::from_slice(&body).map_err(|err| FetchError::Decode(err.to_string()))
    }
}

async fn rejection(res: Response) -> (u16, Option<ApiError>) {
    let status = res.status().as_u16();
    let api_error = match res.bytes().await {
        Ok(body) => serde_json::from_slice::<ApiError>(&body).ok(),
        Err(_) => None,
    };
    (status, api_error)
}

#[async_trait]
impl DataFetchClient for HttpAdminClient {
    async fn get_articles(&self) -> Result<Vec<ArticlePreview>, FetchError> {
        debug!(base_url = %self.base_url, "fetching articles");
        let request = self.authorized(self.http.get(self.endpoint("articles")));
        self.fetch_json(request).await
    }

    async fn get_user(&self, token: &str) -> Result<CurrentUser, FetchError> {
        let request = self
            .http
            .get(self.endpoint("auth/user"))
            .bearer_auth(token);
        self.fetch_json(request).await
    }

    async fn get_all_users(&self) -> Result<Vec<UserRecord>, FetchError> {
        debug!(base_url = %self.base_url, "fetching users");
        let request = self.authorized(self.http.get(self.endpoint("users")));
        self.fetch_json(request).await
    }
}

#[async_trait]
impl DataMutationClient for HttpAdminClient {
    async fn set_roles(&self, entries: &[UpdateDiffEntry]) -> Result<(), MutationError> {
        debug!(count = entries.len(), "submitting role changes");
        let res = self
            .authorized(self.http.put(self.endpoint("users/roles")))
            .json(entries)
            .send()
            .await
            .map_err(MutationError::Transport)?;
        if res.status().is_success() {
            return Ok(());
        }
        let (status, api_error) = rejection(res).await;
        Err(match api_error {
            Some(err) => MutationError::Api(err),
            None => MutationError::Status(status),
        })
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
