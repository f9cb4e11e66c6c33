//! Accounts and sessions.
//!
//! Passwords are stored as argon2 PHC strings. A logged-in browser carries
//! a signed JWT in the `yatube_session` cookie; [`Viewer`] turns that cookie
//! back into a user row on every request.
use std::time::Duration;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::SaltString;
use password_hash::rand_core::OsRng;
use poem::web::cookie::{Cookie, SameSite};
use poem::{FromRequest, Request, RequestBody};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::entities::user;
use crate::error::AppError;
use crate::state::AppState;
use crate::store;

pub const SESSION_COOKIE: &str = "yatube_session";
pub const LOGIN_PATH: &str = "/auth/login/";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username at the time the token was issued.
    pub sub: String,
    pub uid: i32,
    pub exp: usize,
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(AppError::PasswordHash)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn issue_token(config: &Config, user: &user::Model) -> Result<String, AppError> {
    let now = Utc::now().timestamp().max(0) as u64;
    let claims = Claims {
        sub: user.username.clone(),
        uid: user.id,
        exp: now.saturating_add(config.session_ttl().as_secs()) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret_key.as_bytes()),
    )?;
    Ok(token)
}

pub fn decode_token(config: &Config, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret_key.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

pub fn session_cookie(config: &Config, token: &str) -> Cookie {
    let mut cookie = Cookie::new_with_str(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(config.session_ttl());
    cookie
}

/// Cookie that makes the browser drop its session.
pub fn cleared_session_cookie() -> Cookie {
    let mut cookie = Cookie::new_with_str(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_max_age(Duration::ZERO);
    cookie
}

/// Login page that sends the user back to `next` afterwards.
pub fn login_url(next: &str) -> String {
    format!("{LOGIN_PATH}?next={}", urlencoding::encode(next).replace("%2F", "/"))
}

/// Where to go after logging in: `next` if it stays on this site, else `/`.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if is_local_path(path) => path,
        _ => "/",
    }
}

/// An absolute path on this host. Browsers read `\` as `/`, so `/\host`
/// would leave the site just like `//host`.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.chars().any(|c| c == '\\' || c.is_control())
}

/// Whoever sent the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User(user::Model),
}

impl Viewer {
    pub fn user(&self) -> Option<&user::Model> {
        match self {
            Viewer::User(user) => Some(user),
            Viewer::Anonymous => None,
        }
    }

    /// The logged-in user, or a redirect to the login page that returns
    /// to `next`.
    pub fn require_login(&self, next: &str) -> Result<&user::Model, AppError> {
        match self {
            Viewer::User(user) => Ok(user),
            Viewer::Anonymous => Err(AppError::LoginRequired {
                next: next.to_string(),
            }),
        }
    }
}

impl<'a> FromRequest<'a> for Viewer {
    async fn from_request(req: &'a Request, _body: &mut RequestBody) -> poem::Result<Self> {
        let Some(state) = req.data::<AppState>() else {
            return Err(poem::Error::from_string(
                "application state is not configured",
                poem::http::StatusCode::INTERNAL_SERVER_ERROR,
            ));
        };
        let Some(cookie) = req.cookie().get(SESSION_COOKIE) else {
            return Ok(Viewer::Anonymous);
        };

        let claims = match decode_token(&state.config, cookie.value_str()) {
            Ok(claims) => claims,
            Err(err) => {
                tracing::debug!(error = %err, "ignoring invalid session cookie");
                return Ok(Viewer::Anonymous);
            }
        };

        let user = store::find_user(&state.db, claims.uid)
            .await
            .map_err(AppError::from)?;
        Ok(match user {
            Some(user) if user.username == claims.sub => Viewer::User(user),
            _ => Viewer::Anonymous,
        })
    }
}
