use std::{path::PathBuf, str::FromStr, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    view::{RoleFilter, SortKey, UserFilter},
    ArticleListController, CommitOutcome, CredentialStore, FileCredentialStore, HttpAdminClient,
    UserListController,
};
use shared::domain::{UserId, UserRole};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::{load_settings, parse_base_url, DEFAULT_CONFIG_PATH};

#[derive(Parser, Debug)]
#[command(name = "admin_cli", version, about = "Browse articles and manage user roles.")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: PathBuf,
    /// Overrides `api_base_url` from the configuration.
    #[arg(long)]
    api_base_url: Option<String>,
    /// Overrides `credentials_path` from the configuration.
    #[arg(long, value_name = "FILE")]
    credentials: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show one page of the article list.
    Articles {
        #[arg(long, default_value = "date")]
        sort: SortKey,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Show the user table, optionally filtered.
    Users {
        #[arg(long)]
        keyword: Option<String>,
        #[arg(long, default_value = "all")]
        role: RoleFilter,
    },
    /// Stage role changes, print the preview and commit with --yes.
    SetRoles {
        /// `<user-id>=<role>`, repeatable.
        #[arg(long = "assign", required = true)]
        assignments: Vec<RoleAssignment>,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Clone)]
struct RoleAssignment {
    user_id: UserId,
    role: UserRole,
}

impl FromStr for RoleAssignment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let (user_id, role) = value
            .split_once('=')
            .ok_or_else(|| anyhow!("expected <user-id>=<role>, got '{value}'"))?;
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(anyhow!("missing user id in '{value}'"));
        }
        Ok(Self {
            user_id: UserId::new(user_id),
            role: role.parse()?,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = load_settings(&cli.config)?;
    if let Some(url) = cli.api_base_url {
        settings.api_base_url = url;
    }
    if let Some(path) = cli.credentials {
        settings.credentials_path = path;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let base_url = parse_base_url(&settings.api_base_url)?;
    let credentials: Arc<dyn CredentialStore> =
        Arc::new(FileCredentialStore::new(&settings.credentials_path));
    let api = Arc::new(HttpAdminClient::new(base_url, credentials.clone()));
    info!(api = %api.base_url(), "admin client ready");

    match cli.command {
        Command::Articles { sort, page } => {
            let mut articles = ArticleListController::new(api, credentials);
            articles.load().await;
            articles.set_sort(sort);
            articles.set_page(page);
            print!("{}", render::article_list(&articles.view()));
        }
        Command::Users { keyword, role } => {
            let mut users = UserListController::new(api.clone(), api);
            users.load_users().await?;
            users.apply_filter(UserFilter { keyword, role })?;
            print!("{}", render::user_list(&users.view()));
        }
        Command::SetRoles { assignments, yes } => {
            let mut users = UserListController::new(api.clone(), api);
            users.load_users().await?;
            if users.last_error().is_some() {
                print!("{}", render::user_list(&users.view()));
                return Ok(());
            }
            for assignment in &assignments {
                users
                    .update_local_role(&assignment.user_id, assignment.role)
                    .with_context(|| {
                        format!("cannot assign {} to {}", assignment.role, assignment.user_id)
                    })?;
            }

            users.stage_changes()?;
            print!("{}", render::user_list(&users.view()));

            if !yes {
                users.cancel_preview()?;
                println!("Dry run; pass --yes to save these roles.");
                return Ok(());
            }

            match users.confirm_changes().await? {
                CommitOutcome::Committed { count } => println!("Saved {count} role change(s)."),
                CommitOutcome::NothingToCommit => {}
                CommitOutcome::Rejected(err) => warn!(error = %err, "server rejected role update"),
            }
            if let Some(alert) = users.take_alert() {
                eprintln!("{alert}");
            }
            print!("{}", render::user_list(&users.view()));
        }
    }

    Ok(())
}
