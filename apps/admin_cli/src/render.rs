//! Plain-text rendering of the controller display models.

use std::fmt::Write as _;

use client_core::view::{ArticleListBody, ArticleListView, UserListBody, UserListView};

pub fn article_list(view: &ArticleListView) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "Sort by {} | page {} of {}",
        view.sort, view.page, view.page_count
    );
    if view.show_admin_menu {
        out.push_str(" | admin");
    }
    out.push('\n');

    match &view.body {
        ArticleListBody::Loading => out.push_str("Loading...\n"),
        ArticleListBody::Failed { notice } => {
            let _ = writeln!(out, "{notice}");
        }
        ArticleListBody::Articles(articles) if articles.is_empty() => {
            out.push_str("No articles on this page.\n");
        }
        ArticleListBody::Articles(articles) => {
            for article in articles {
                let _ = writeln!(
                    out,
                    "{}  {:<40}  {}",
                    article.created.date_naive(),
                    article.name,
                    article.author
                );
            }
        }
    }
    out
}

pub fn user_list(view: &UserListView) -> String {
    let mut out = String::new();
    if let Some(notice) = view.notice {
        let _ = writeln!(out, "{notice}");
    }

    if let Some(message) = view.body.empty_preview_message() {
        let _ = writeln!(out, "{message}");
        return out;
    }

    match &view.body {
        UserListBody::Editing { loading: true, .. } => out.push_str("Loading...\n"),
        UserListBody::Editing {
            rows, role_options, ..
        } => {
            let _ = writeln!(out, "{:<8} {:<20} {:<32} Role", "Id", "Nickname", "Email");
            for row in rows {
                let _ = writeln!(
                    out,
                    "{:<8} {:<20} {:<32} {}",
                    row.id, row.user_name, row.email, row.role
                );
            }
            let options: Vec<_> = role_options.iter().map(|role| role.as_str()).collect();
            let _ = writeln!(out, "Assignable roles: {}", options.join(", "));
        }
        UserListBody::Previewing {
            entries,
            committing,
        } => {
            let _ = writeln!(out, "{:<20} Role", "Nickname");
            for entry in entries {
                let _ = writeln!(out, "{:<20} {}", entry.user_name, entry.role);
            }
            if *committing {
                out.push_str("Saving...\n");
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
