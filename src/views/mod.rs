pub mod posts;
pub mod users;

use poem::http::Uri;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    /// Raw `?page=` value; resolved by the paginator.
    pub page: Option<String>,
}

/// Path plus query of the current request, used as the login `next`.
pub(crate) fn full_path(uri: &Uri) -> &str {
    uri.path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path())
}

pub(crate) fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

pub(crate) fn post_detail_url(post_id: i32) -> String {
    format!("/posts/{post_id}/")
}
