//! Pure derivations from controller state to display models.
//!
//! Controllers own the mutable inputs (fetched collections, local role overlay,
//! sort/page/filter selections) and call into this module whenever a render is
//! needed. Nothing here touches the network or keeps state between calls.

use std::{collections::HashMap, fmt, str::FromStr};

use shared::{
    domain::{UserId, UserRole},
    protocol::{ArticlePreview, CurrentUser, UpdateDiffEntry, UserRecord},
};
use thiserror::Error;

pub const PAGE_SIZE: usize = 10;

pub const ARTICLES_FETCH_NOTICE: &str = "Something went wrong... Try to update page.";
pub const USERS_FETCH_NOTICE: &str = "Oops, something went wrong. Try to update the page.";
pub const ROLES_NOT_UPDATED_ALERT: &str = "New roles did not update";
pub const NOTHING_TO_UPDATE: &str = "There is no data to update...";

/// Local, unsaved role edits keyed by user id.
pub type RoleOverlay = HashMap<UserId, UserRole>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    #[default]
    ByDate,
    ByAuthor,
    ByName,
    /// Keep the order the server returned.
    ServerOrder,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::ByDate => "date",
            SortKey::ByAuthor => "author",
            SortKey::ByName => "name",
            SortKey::ServerOrder => "default",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort key '{0}' (expected date, author, name or default)")]
pub struct UnknownSortKey(pub String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "date" | "bydate" | "latest" => Ok(SortKey::ByDate),
            "author" | "byauthor" => Ok(SortKey::ByAuthor),
            "name" | "byname" => Ok(SortKey::ByName),
            "default" | "all" => Ok(SortKey::ServerOrder),
            _ => Err(UnknownSortKey(value.to_string())),
        }
    }
}

/// 1-based page selection. Never clamped; page 0 or a page past the end
/// renders as an empty slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub page: usize,
}

impl PageState {
    pub fn new(page: usize) -> Self {
        Self { page }
    }
}

impl Default for PageState {
    fn default() -> Self {
        Self { page: 1 }
    }
}

pub fn sort_articles(articles: &[ArticlePreview], key: SortKey) -> Vec<ArticlePreview> {
    let mut sorted = articles.to_vec();
    match key {
        SortKey::ByDate => sorted.sort_by(|a, b| b.created.cmp(&a.created)),
        SortKey::ByAuthor => sorted.sort_by(|a, b| a.author.cmp(&b.author)),
        SortKey::ByName => sorted.sort_by(|a, b| a.name.cmp(&b.name)),
        SortKey::ServerOrder => {}
    }
    sorted
}

pub fn page_slice<T>(items: &[T], page: PageState) -> &[T] {
    let Some(start) = page
        .page
        .checked_sub(1)
        .and_then(|index| index.checked_mul(PAGE_SIZE))
    else {
        return &[];
    };
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(PAGE_SIZE).min(items.len());
    &items[start..end]
}

pub fn page_count(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleListBody {
    Loading,
    Failed { notice: &'static str },
    Articles(Vec<ArticlePreview>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleListView {
    pub sort: SortKey,
    pub page: usize,
    pub page_count: usize,
    pub show_admin_menu: bool,
    pub body: ArticleListBody,
}

pub fn derive_article_view(
    articles: &[ArticlePreview],
    sort: SortKey,
    page: PageState,
    status: LoadStatus,
    viewer: Option<&CurrentUser>,
) -> ArticleListView {
    // A hidden list has no pages.
    let (body, pages) = match status {
        LoadStatus::Loading => (ArticleListBody::Loading, 0),
        LoadStatus::Failed => (
            ArticleListBody::Failed {
                notice: ARTICLES_FETCH_NOTICE,
            },
            0,
        ),
        LoadStatus::Idle | LoadStatus::Ready => {
            let sorted = sort_articles(articles, sort);
            (
                ArticleListBody::Articles(page_slice(&sorted, page).to_vec()),
                page_count(sorted.len()),
            )
        }
    };

    ArticleListView {
        sort,
        page: page.page,
        page_count: pages,
        show_admin_menu: viewer.is_some_and(|user| user.role.is_admin()),
        body,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleFilter {
    #[default]
    All,
    Only(UserRole),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role filter '{0}' (expected all, author or user)")]
pub struct UnknownRoleFilter(pub String);

impl FromStr for RoleFilter {
    type Err = UnknownRoleFilter;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(RoleFilter::All);
        }
        match value.parse::<UserRole>() {
            Ok(role) if role.is_assignable() => Ok(RoleFilter::Only(role)),
            _ => Err(UnknownRoleFilter(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserFilter {
    pub keyword: Option<String>,
    pub role: RoleFilter,
}

impl UserFilter {
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn role(mut self, role: UserRole) -> Self {
        self.role = RoleFilter::Only(role);
        self
    }

    pub fn is_unconstrained(&self) -> bool {
        self.role == RoleFilter::All && self.keyword.as_deref().map_or(true, str::is_empty)
    }
}

/// Server snapshot with the local overlay applied. Admin-tier records never
/// take an overlay.
pub fn working_collection(snapshot: &[UserRecord], overlay: &RoleOverlay) -> Vec<UserRecord> {
    snapshot
        .iter()
        .map(|user| {
            let mut user = user.clone();
            if !user.role.is_admin() {
                if let Some(role) = overlay.get(&user.id) {
                    user.role = *role;
                }
            }
            user
        })
        .collect()
}

pub fn filter_users(users: &[UserRecord], filter: &UserFilter) -> Vec<UserRecord> {
    let keyword = filter
        .keyword
        .as_deref()
        .filter(|keyword| !keyword.is_empty())
        .map(str::to_lowercase);

    users
        .iter()
        .filter(|user| match filter.role {
            RoleFilter::All => true,
            RoleFilter::Only(role) => user.role == role,
        })
        .filter(|user| match &keyword {
            None => true,
            Some(keyword) => {
                user.email.to_lowercase().contains(keyword.as_str())
                    || user.user_name.to_lowercase().contains(keyword.as_str())
            }
        })
        .cloned()
        .collect()
}

/// Every non-admin user whose overlaid role differs from the snapshot role.
pub fn compute_diff(snapshot: &[UserRecord], overlay: &RoleOverlay) -> Vec<UpdateDiffEntry> {
    let server_roles: HashMap<&UserId, UserRole> =
        snapshot.iter().map(|user| (&user.id, user.role)).collect();

    working_collection(snapshot, overlay)
        .into_iter()
        .filter(|user| !user.role.is_admin())
        .filter(|user| match server_roles.get(&user.id) {
            Some(server_role) => !server_role.is_admin() && *server_role != user.role,
            None => true,
        })
        .map(|user| UpdateDiffEntry {
            user_id: user.id,
            role: user.role,
            user_name: user.user_name,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Editing,
    PreviewingChanges,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: UserId,
    pub user_name: String,
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserListBody {
    Editing {
        loading: bool,
        rows: Vec<UserRow>,
        role_options: Vec<UserRole>,
    },
    Previewing {
        entries: Vec<UpdateDiffEntry>,
        committing: bool,
    },
}

impl UserListBody {
    /// Message shown in place of the preview table when nothing changed.
    pub fn empty_preview_message(&self) -> Option<&'static str> {
        match self {
            UserListBody::Previewing { entries, .. } if entries.is_empty() => {
                Some(NOTHING_TO_UPDATE)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserListView {
    pub notice: Option<&'static str>,
    pub body: UserListBody,
}

pub struct UserViewInput<'a> {
    pub snapshot: &'a [UserRecord],
    pub overlay: &'a RoleOverlay,
    pub filter: &'a UserFilter,
    pub mode: ViewMode,
    pub staged: &'a [UpdateDiffEntry],
    pub status: LoadStatus,
    pub committing: bool,
}

pub fn derive_user_view(input: UserViewInput<'_>) -> UserListView {
    let notice = (input.status == LoadStatus::Failed).then_some(USERS_FETCH_NOTICE);

    let body = match input.mode {
        ViewMode::Editing => {
            let working = working_collection(input.snapshot, input.overlay);
            let rows = filter_users(&working, input.filter)
                .into_iter()
                .filter(|user| !user.role.is_admin())
                .map(|user| UserRow {
                    id: user.id,
                    user_name: user.user_name,
                    email: user.email,
                    role: user.role,
                })
                .collect();
            UserListBody::Editing {
                loading: input.status == LoadStatus::Loading,
                rows,
                role_options: UserRole::assignable().collect(),
            }
        }
        ViewMode::PreviewingChanges => UserListBody::Previewing {
            entries: input.staged.to_vec(),
            committing: input.committing,
        },
    };

    UserListView { notice, body }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
