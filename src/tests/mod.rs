//! Endpoint tests against an in-memory SQLite database.
mod api;
mod forms;

use chrono::{DateTime, Utc};
use poem::http::header;
use poem::test::TestResponse;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};

use crate::auth::{self, SESSION_COOKIE};
use crate::config::Config;
use crate::entities::{group, post, user};
use crate::migration::{Migrator, MigratorTrait};
use crate::state::AppState;
use crate::store;

pub(crate) async fn setup(post_count: u64) -> AppState {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("connect to sqlite");
    Migrator::up(&db, None).await.expect("apply migrations");
    let config = Config {
        post_count,
        ..Config::default()
    };
    AppState::new(db, config).expect("load templates")
}

pub(crate) async fn make_user(state: &AppState, username: &str) -> user::Model {
    store::create_user(&state.db, username, "", "!")
        .await
        .expect("create user")
}

pub(crate) async fn make_group(state: &AppState, title: &str, slug: &str) -> group::Model {
    store::create_group(&state.db, title, slug, "Group description")
        .await
        .expect("create group")
}

pub(crate) async fn make_post(
    state: &AppState,
    author: &user::Model,
    group: Option<&group::Model>,
    text: &str,
    pub_date: DateTime<Utc>,
) -> post::Model {
    post::ActiveModel {
        text: Set(text.to_string()),
        pub_date: Set(pub_date),
        author_id: Set(author.id),
        group_id: Set(group.map(|g| g.id)),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .expect("create post")
}

/// `Cookie` header value that logs `user` in.
pub(crate) fn session_for(state: &AppState, user: &user::Model) -> String {
    let token = auth::issue_token(&state.config, user).expect("issue token");
    format!("{SESSION_COOKIE}={token}")
}

pub(crate) fn location(resp: &TestResponse) -> String {
    resp.0
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub(crate) async fn body(resp: TestResponse) -> String {
    resp.0.into_body().into_string().await.expect("read body")
}

pub(crate) fn count_cards(html: &str) -> usize {
    html.matches("class=\"post-card\"").count()
}
