//! Shared fakes and fixtures for controller tests.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::{get, put},
    Json, Router,
};
use chrono::{TimeZone, Utc};
use shared::{
    domain::{ArticleId, UserId, UserRole},
    error::{ApiError, ErrorCode},
    protocol::{ArticlePreview, CurrentUser, UpdateDiffEntry, UserRecord},
};
use tokio::{net::TcpListener, sync::Mutex};
use url::Url;

use crate::{DataFetchClient, DataMutationClient, FetchError, MutationError};

pub(crate) fn article(id: usize, name: &str, author: &str, day: u32) -> ArticlePreview {
    ArticlePreview {
        id: ArticleId::new(format!("a-{id}")),
        name: name.to_string(),
        author: author.to_string(),
        created: Utc
            .with_ymd_and_hms(2024, 1, day, 9, 0, 0)
            .single()
            .expect("valid fixture date"),
        description: None,
        image: None,
        tags: Vec::new(),
    }
}

/// 25 articles created on Jan 1..=25. Names are a permutation of
/// `title-00..title-24` that disagrees with creation order.
pub(crate) fn twenty_five_articles() -> Vec<ArticlePreview> {
    (1..=25u32)
        .map(|day| {
            let name = format!("title-{:02}", (day * 7) % 25);
            let author = format!("author{}", day % 4);
            article(day as usize, &name, &author, day)
        })
        .collect()
}

pub(crate) fn user(id: &str, user_name: &str, email: &str, role: UserRole) -> UserRecord {
    UserRecord {
        id: UserId::new(id),
        user_name: user_name.to_string(),
        email: email.to_string(),
        role,
    }
}

pub(crate) fn sample_users() -> Vec<UserRecord> {
    vec![
        user("1", "Quill", "quill@example.com", UserRole::User),
        user("2", "Inkwell", "ink@example.com", UserRole::Author),
        user("3", "Root", "root@example.com", UserRole::Admin),
        user("4", "marginalia", "notes@Example.org", UserRole::User),
    ]
}

/// In-memory admin API. Accepted role updates are applied to the stored users
/// so a refetch observes them.
#[derive(Default)]
pub(crate) struct FakeApi {
    pub articles: Mutex<Vec<ArticlePreview>>,
    pub users: Mutex<Vec<UserRecord>>,
    pub current_user: Mutex<Option<CurrentUser>>,
    pub seen_tokens: Mutex<Vec<String>>,
    pub submitted: Mutex<Vec<Vec<UpdateDiffEntry>>>,
    pub user_fetches: Mutex<u32>,
    pub fail_articles: AtomicBool,
    pub fail_users: AtomicBool,
    pub fail_set_roles: AtomicBool,
}

impl FakeApi {
    pub fn with_articles(articles: Vec<ArticlePreview>) -> Self {
        Self {
            articles: Mutex::new(articles),
            ..Self::default()
        }
    }

    pub fn with_users(users: Vec<UserRecord>) -> Self {
        Self {
            users: Mutex::new(users),
            ..Self::default()
        }
    }
}

#[async_trait]
impl DataFetchClient for FakeApi {
    async fn get_articles(&self) -> Result<Vec<ArticlePreview>, FetchError> {
        if self.fail_articles.load(Ordering::SeqCst) {
            return Err(FetchError::Status(500));
        }
        Ok(self.articles.lock().await.clone())
    }

    async fn get_user(&self, token: &str) -> Result<CurrentUser, FetchError> {
        self.seen_tokens.lock().await.push(token.to_string());
        self.current_user
            .lock()
            .await
            .clone()
            .ok_or_else(|| FetchError::Api(ApiError::new(ErrorCode::Unauthorized, "bad token")))
    }

    async fn get_all_users(&self) -> Result<Vec<UserRecord>, FetchError> {
        *self.user_fetches.lock().await += 1;
        if self.fail_users.load(Ordering::SeqCst) {
            return Err(FetchError::Status(503));
        }
        Ok(self.users.lock().await.clone())
    }
}

#[async_trait]
impl DataMutationClient for FakeApi {
    async fn set_roles(&self, entries: &[UpdateDiffEntry]) -> Result<(), MutationError> {
        self.submitted.lock().await.push(entries.to_vec());
        if self.fail_set_roles.load(Ordering::SeqCst) {
            return Err(MutationError::Api(ApiError::new(
                ErrorCode::Forbidden,
                "role updates disabled",
            )));
        }
        let mut users = self.users.lock().await;
        for entry in entries {
            if let Some(user) = users.iter_mut().find(|user| user.id == entry.user_id) {
                user.role = entry.role;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub(crate) struct AdminServerState {
    pub articles: Arc<Mutex<Vec<ArticlePreview>>>,
    pub users: Arc<Mutex<Vec<UserRecord>>>,
    pub authorization: Arc<Mutex<Vec<Option<String>>>>,
    pub role_updates: Arc<Mutex<Vec<Vec<UpdateDiffEntry>>>>,
    pub reject_roles: Arc<AtomicBool>,
}

type Rejection = (StatusCode, Json<ApiError>);

async fn record_authorization(state: &AdminServerState, headers: &HeaderMap) {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.authorization.lock().await.push(value);
}

async fn serve_articles(
    State(state): State<AdminServerState>,
    headers: HeaderMap,
) -> Json<Vec<ArticlePreview>> {
    record_authorization(&state, &headers).await;
    Json(state.articles.lock().await.clone())
}

async fn serve_current_user(
    State(state): State<AdminServerState>,
    headers: HeaderMap,
) -> Result<Json<CurrentUser>, Rejection> {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .is_some_and(|value| value == "Bearer admin-token");
    if !authorized {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiError::new(ErrorCode::Unauthorized, "invalid token")),
        ));
    }
    let admin = state
        .users
        .lock()
        .await
        .iter()
        .find(|user| user.role == UserRole::Admin)
        .cloned();
    admin.map(Json).ok_or((
            StatusCode::NOT_FOUND,
            Json(ApiError::new(ErrorCode::NotFound, "no admin account")),
        ))
}

async fn serve_users(
    State(state): State<AdminServerState>,
    headers: HeaderMap,
) -> Json<Vec<UserRecord>> {
    record_authorization(&state, &headers).await;
    Json(state.users.lock().await.clone())
}

async fn update_roles(
    State(state): State<AdminServerState>,
    Json(entries): Json<Vec<UpdateDiffEntry>>,
) -> Result<StatusCode, Rejection> {
    state.role_updates.lock().await.push(entries.clone());
    if state.reject_roles.load(Ordering::SeqCst) {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiError::new(ErrorCode::Forbidden, "admins only")),
        ));
    }
    let mut users = state.users.lock().await;
    for entry in entries {
        if let Some(user) = users.iter_mut().find(|user| user.id == entry.user_id) {
            user.role = entry.role;
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Serves the admin API under `/api`, plus `/broken` (plain 500s) and
/// `/garbage` (200 with a non-JSON body). Returns the `/api/` base URL.
pub(crate) async fn spawn_admin_server(state: AdminServerState) -> std::io::Result<Url> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let api = Router::new()
        .route("/articles", get(serve_articles))
        .route("/auth/user", get(serve_current_user))
        .route("/users", get(serve_users))
        .route("/users/roles", put(update_roles));
    let app = Router::new()
        .nest("/api", api)
        .route(
            "/broken/users",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
        )
        .route(
            "/broken/users/roles",
            put(|| async { (StatusCode::BAD_GATEWAY, "try later") }),
        )
        .route("/garbage/articles", get(|| async { "<html>not json</html>" }))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(Url::parse(&format!("http://{addr}/api/")).expect("server url"))
}
