use poem::web::cookie::CookieJar;
use poem::web::{Data, Form, Html, Query};
use poem::{IntoResponse, Response, handler};
use serde::Deserialize;

use crate::auth::{self, Viewer, safe_next};
use crate::error::{Result, redirect};
use crate::forms::{BAD_CREDENTIALS, Bound, FormErrors, LoginForm, SignupForm, USERNAME_TAKEN};
use crate::state::AppState;
use crate::store;
use crate::templates::page_context;

#[derive(Debug, Default, Deserialize)]
pub struct NextParams {
    pub next: Option<String>,
}

#[handler]
pub async fn signup_form(Data(state): Data<&AppState>, viewer: Viewer) -> Result<Html<String>> {
    render_signup(state, &viewer, &SignupForm::default(), &FormErrors::default())
}

#[handler]
pub async fn signup(
    Data(state): Data<&AppState>,
    viewer: Viewer,
    cookie_jar: &CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    match form.bind(&state.db).await? {
        (form, Bound::Valid(account)) => {
            let hash = auth::hash_password(&account.password)?;
            let created =
                store::create_user(&state.db, &account.username, &account.email, &hash).await;
            let user = match created {
                Ok(user) => user,
                Err(err) if store::is_unique_violation(&err) => {
                    let mut errors = FormErrors::default();
                    errors.add("username", USERNAME_TAKEN);
                    return Ok(render_signup(state, &viewer, &form, &errors)?.into_response());
                }
                Err(err) => return Err(err.into()),
            };
            tracing::info!(user_id = user.id, username = %user.username, "account created");

            let token = auth::issue_token(&state.config, &user)?;
            cookie_jar.add(auth::session_cookie(&state.config, &token));
            Ok(redirect("/"))
        }
        (form, Bound::Invalid(errors)) => {
            Ok(render_signup(state, &viewer, &form, &errors)?.into_response())
        }
    }
}

#[handler]
pub async fn login_form(
    Data(state): Data<&AppState>,
    viewer: Viewer,
    Query(params): Query<NextParams>,
) -> Result<Html<String>> {
    let form = LoginForm {
        next: params.next,
        ..LoginForm::default()
    };
    render_login(state, &viewer, &form, &FormErrors::default())
}

#[handler]
pub async fn login(
    Data(state): Data<&AppState>,
    viewer: Viewer,
    cookie_jar: &CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let mut errors = form.errors();
    if errors.is_empty() {
        let user = store::find_user_by_username(&state.db, form.username.trim()).await?;
        match user {
            Some(user) if auth::verify_password(&form.password, &user.password_hash) => {
                let token = auth::issue_token(&state.config, &user)?;
                cookie_jar.add(auth::session_cookie(&state.config, &token));
                tracing::info!(user_id = user.id, "logged in");
                return Ok(redirect(safe_next(form.next.as_deref())));
            }
            _ => {
                tracing::debug!(username = %form.username, "rejected login");
                errors.add_non_field(BAD_CREDENTIALS);
            }
        }
    }
    Ok(render_login(state, &viewer, &form, &errors)?.into_response())
}

#[handler]
pub async fn logout(cookie_jar: &CookieJar) -> Response {
    cookie_jar.add(auth::cleared_session_cookie());
    redirect("/")
}

fn render_signup(
    state: &AppState,
    viewer: &Viewer,
    form: &SignupForm,
    errors: &FormErrors,
) -> Result<Html<String>> {
    let mut ctx = page_context(viewer);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    state.templates.render("users/signup.html", &ctx)
}

fn render_login(
    state: &AppState,
    viewer: &Viewer,
    form: &LoginForm,
    errors: &FormErrors,
) -> Result<Html<String>> {
    let mut ctx = page_context(viewer);
    ctx.insert("form", form);
    ctx.insert("next", form.next.as_deref().unwrap_or_default());
    ctx.insert("errors", errors);
    state.templates.render("users/login.html", &ctx)
}
