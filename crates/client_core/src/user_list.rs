//! Role management table: load, edit locally, filter, preview the diff, commit.

use std::sync::Arc;

use shared::{
    domain::{UserId, UserRole},
    protocol::{UpdateDiffEntry, UserRecord},
};
use tracing::{debug, info, warn};

use crate::{
    view::{
        compute_diff, derive_user_view, working_collection, LoadStatus, RoleOverlay, UserFilter,
        UserListView, UserViewInput, ViewMode, ROLES_NOT_UPDATED_ALERT,
    },
    DataFetchClient, DataMutationClient, EditError, FetchError, ModeError, MutationError,
};

#[derive(Debug)]
pub enum CommitOutcome {
    Committed { count: usize },
    /// The staged diff was empty, so nothing was sent.
    NothingToCommit,
    /// The server rejected the update. The list was refetched anyway.
    Rejected(MutationError),
}

pub struct UserListController {
    fetch: Arc<dyn DataFetchClient>,
    mutate: Arc<dyn DataMutationClient>,
    snapshot: Vec<UserRecord>,
    overlay: RoleOverlay,
    filter: UserFilter,
    mode: ViewMode,
    staged: Vec<UpdateDiffEntry>,
    status: LoadStatus,
    last_error: Option<FetchError>,
    committing: bool,
    alert: Option<&'static str>,
}

impl UserListController {
    pub fn new(fetch: Arc<dyn DataFetchClient>, mutate: Arc<dyn DataMutationClient>) -> Self {
        Self {
            fetch,
            mutate,
            snapshot: Vec::new(),
            overlay: RoleOverlay::new(),
            filter: UserFilter::default(),
            mode: ViewMode::Editing,
            staged: Vec::new(),
            status: LoadStatus::Idle,
            last_error: None,
            committing: false,
            alert: None,
        }
    }

    fn ensure_mode(&self, expected: ViewMode, operation: &'static str) -> Result<(), ModeError> {
        if self.mode == expected {
            Ok(())
        } else {
            Err(ModeError {
                operation,
                mode: self.mode,
            })
        }
    }

    /// Replaces the server snapshot and working collection with a fresh fetch.
    /// Unsaved edits and the active filter are dropped.
    pub async fn load_users(&mut self) -> Result<(), ModeError> {
        self.ensure_mode(ViewMode::Editing, "load_users")?;
        self.start_loading();
        let result = self.fetch.get_all_users().await;
        self.apply_users(result);
        Ok(())
    }

    pub fn start_loading(&mut self) {
        self.status = LoadStatus::Loading;
    }

    pub fn apply_users(&mut self, result: Result<Vec<UserRecord>, FetchError>) {
        self.apply_snapshot(result, false);
    }

    fn apply_snapshot(&mut self, result: Result<Vec<UserRecord>, FetchError>, keep_edits: bool) {
        match result {
            Ok(users) => {
                info!(count = users.len(), keep_edits, "user list loaded");
                self.snapshot = users;
                if !keep_edits {
                    self.overlay.clear();
                }
                self.filter = UserFilter::default();
                self.status = LoadStatus::Ready;
                self.last_error = None;
            }
            Err(err) => {
                warn!(error = %err, "failed to load user list");
                self.status = LoadStatus::Failed;
                self.last_error = Some(err);
            }
        }
    }

    /// Overlays a role for one user without touching the server. The displayed
    /// subset is reset to the whole working collection.
    pub fn update_local_role(&mut self, user_id: &UserId, role: UserRole) -> Result<(), EditError> {
        self.ensure_mode(ViewMode::Editing, "update_local_role")?;
        if !role.is_assignable() {
            return Err(EditError::RoleNotAssignable);
        }
        let user = self
            .snapshot
            .iter()
            .find(|user| &user.id == user_id)
            .ok_or_else(|| EditError::UnknownUser(user_id.clone()))?;
        if user.role.is_admin() {
            return Err(EditError::AdminNotEditable(user_id.clone()));
        }

        debug!(user_id = %user_id, %role, "local role edit");
        self.overlay.insert(user_id.clone(), role);
        self.filter = UserFilter::default();
        Ok(())
    }

    pub fn apply_filter(&mut self, filter: UserFilter) -> Result<(), ModeError> {
        self.ensure_mode(ViewMode::Editing, "apply_filter")?;
        debug!(?filter, "user filter applied");
        self.filter = filter;
        Ok(())
    }

    /// Computes the diff against the last server snapshot and switches to the
    /// preview, even when nothing changed.
    pub fn stage_changes(&mut self) -> Result<&[UpdateDiffEntry], ModeError> {
        self.ensure_mode(ViewMode::Editing, "stage_changes")?;
        self.staged = compute_diff(&self.snapshot, &self.overlay);
        self.mode = ViewMode::PreviewingChanges;
        debug!(count = self.staged.len(), "role changes staged");
        Ok(&self.staged)
    }

    /// Submits the staged diff, then refetches and returns to editing whether
    /// or not the server accepted it. Accepted edits are dropped even if the
    /// refetch fails. A rejection only raises an alert.
    pub async fn confirm_changes(&mut self) -> Result<CommitOutcome, ModeError> {
        self.ensure_mode(ViewMode::PreviewingChanges, "confirm_changes")?;
        if self.staged.is_empty() {
            self.mode = ViewMode::Editing;
            return Ok(CommitOutcome::NothingToCommit);
        }

        self.committing = true;
        let result = self.mutate.set_roles(&self.staged).await;
        self.committing = false;

        let outcome = match result {
            Ok(()) => {
                info!(count = self.staged.len(), "role changes committed");
                self.overlay.clear();
                CommitOutcome::Committed {
                    count: self.staged.len(),
                }
            }
            Err(err) => {
                warn!(error = %err, "role update rejected; resynchronising anyway");
                self.alert = Some(ROLES_NOT_UPDATED_ALERT);
                CommitOutcome::Rejected(err)
            }
        };

        let keep_edits = matches!(outcome, CommitOutcome::Rejected(_));
        self.start_loading();
        let refetched = self.fetch.get_all_users().await;
        self.apply_snapshot(refetched, keep_edits);

        self.staged.clear();
        self.mode = ViewMode::Editing;
        Ok(outcome)
    }

    /// Leaves the preview. Local role edits are kept.
    pub fn cancel_preview(&mut self) -> Result<(), ModeError> {
        self.ensure_mode(ViewMode::PreviewingChanges, "cancel_preview")?;
        self.staged.clear();
        self.mode = ViewMode::Editing;
        Ok(())
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn snapshot(&self) -> &[UserRecord] {
        &self.snapshot
    }

    pub fn working_collection(&self) -> Vec<UserRecord> {
        working_collection(&self.snapshot, &self.overlay)
    }

    pub fn pending_edits(&self) -> &RoleOverlay {
        &self.overlay
    }

    pub fn filter(&self) -> &UserFilter {
        &self.filter
    }

    pub fn staged(&self) -> &[UpdateDiffEntry] {
        &self.staged
    }

    /// Returns the pending alert once; the host shows it and it is gone.
    pub fn take_alert(&mut self) -> Option<&'static str> {
        self.alert.take()
    }

    pub fn view(&self) -> UserListView {
        derive_user_view(UserViewInput {
            snapshot: &self.snapshot,
            overlay: &self.overlay,
            filter: &self.filter,
            mode: self.mode,
            staged: &self.staged,
            status: self.status,
            committing: self.committing,
        })
    }
}

#[cfg(test)]
#[path = "tests/user_list_tests.rs"]
mod tests;
