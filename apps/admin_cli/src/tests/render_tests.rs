use client_core::view::{
    SortKey, UserRow, ARTICLES_FETCH_NOTICE, NOTHING_TO_UPDATE, USERS_FETCH_NOTICE,
};
use shared::{
    domain::{UserId, UserRole},
    protocol::UpdateDiffEntry,
};

use super::*;

fn article_view(body: ArticleListBody, show_admin_menu: bool) -> ArticleListView {
    ArticleListView {
        sort: SortKey::ByName,
        page: 2,
        page_count: 3,
        show_admin_menu,
        body,
    }
}

#[test]
fn article_header_shows_sort_page_and_admin_marker() {
    let text = article_list(&article_view(ArticleListBody::Articles(Vec::new()), true));
    assert!(text.starts_with("Sort by name | page 2 of 3 | admin\n"));
    assert!(text.contains("No articles on this page."));
}

#[test]
fn failed_article_fetch_prints_only_the_notice() {
    let text = article_list(&article_view(
        ArticleListBody::Failed {
            notice: ARTICLES_FETCH_NOTICE,
        },
        false,
    ));
    assert_eq!(
        text,
        format!("Sort by name | page 2 of 3\n{ARTICLES_FETCH_NOTICE}\n")
    );
}

#[test]
fn editing_table_lists_rows_and_role_options() {
    let view = UserListView {
        notice: Some(USERS_FETCH_NOTICE),
        body: UserListBody::Editing {
            loading: false,
            rows: vec![UserRow {
                id: UserId::new("1"),
                user_name: "Quill".into(),
                email: "quill@example.com".into(),
                role: UserRole::Author,
            }],
            role_options: vec![UserRole::Author, UserRole::User],
        },
    };
    let text = user_list(&view);
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines[0], USERS_FETCH_NOTICE);
    assert!(lines[2].starts_with("1 "));
    assert!(lines[2].ends_with("author"));
    assert_eq!(lines[3], "Assignable roles: author, user");
}

#[test]
fn empty_preview_prints_the_nothing_to_update_message() {
    let view = UserListView {
        notice: None,
        body: UserListBody::Previewing {
            entries: Vec::new(),
            committing: false,
        },
    };
    assert_eq!(user_list(&view), format!("{NOTHING_TO_UPDATE}\n"));
}

#[test]
fn preview_lists_pending_changes() {
    let view = UserListView {
        notice: None,
        body: UserListBody::Previewing {
            entries: vec![UpdateDiffEntry {
                user_id: UserId::new("4"),
                role: UserRole::Author,
                user_name: "marginalia".into(),
            }],
            committing: true,
        },
    };
    let text = user_list(&view);
    assert!(text.contains("marginalia"));
    assert!(text.ends_with("Saving...\n"));
}
