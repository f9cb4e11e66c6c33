//! Yatube: a small blogging site. Users write posts, optionally file them
//! under a group, and browse them newest-first by group or by author.
pub mod api;
pub mod auth;
pub mod config;
pub mod entities;
pub mod error;
pub mod forms;
pub mod migration;
pub mod pagination;
pub mod state;
pub mod store;
pub mod templates;
pub mod views;

#[cfg(test)]
mod tests;

use poem::middleware::{CookieJarManager, Tracing};
use poem::{Endpoint, EndpointExt, Route, get};
use poem_openapi::OpenApiService;

pub use crate::config::Config;
pub use crate::state::AppState;

use crate::views::{posts, users};

/// The whole site: HTML pages, account pages and the JSON API.
pub fn app(state: AppState) -> impl Endpoint {
    let api = OpenApiService::new(api::Api::new(state.clone()), "Yatube API", env!("CARGO_PKG_VERSION"))
        .server("/api/v1");
    let docs = api.swagger_ui();

    Route::new()
        .at("/", get(posts::index))
        .at("/group/:slug/", get(posts::group_posts))
        .at("/profile/:username/", get(posts::profile))
        .at("/create/", get(posts::post_create_form).post(posts::post_create))
        .at("/posts/:post_id/", get(posts::post_detail))
        .at("/posts/:post_id/edit/", get(posts::post_edit_form).post(posts::post_edit))
        .at("/auth/signup/", get(users::signup_form).post(users::signup))
        .at("/auth/login/", get(users::login_form).post(users::login))
        .at("/auth/logout/", get(users::logout))
        .nest("/api/v1", api)
        .nest("/api/docs", docs)
        .with(CookieJarManager::new())
        .with(Tracing)
        .data(state)
}
