use poem::http::Uri;
use poem::web::{Data, Form, Html, Path, Query};
use poem::{IntoResponse, Response, handler};

use super::{PageParams, full_path, post_detail_url, profile_url};
use crate::auth::Viewer;
use crate::entities::post;
use crate::error::{AppError, Result, redirect};
use crate::forms::{Bound, FormErrors, PostForm, group_choices};
use crate::state::AppState;
use crate::store::{self, PostFilter};
use crate::templates::page_context;

/// Latest posts from everyone.
#[handler]
pub async fn index(
    Data(state): Data<&AppState>,
    Query(params): Query<PageParams>,
    viewer: Viewer,
) -> Result<Html<String>> {
    let page_obj = store::post_page(
        &state.db,
        PostFilter::All,
        state.config.post_count,
        params.page.as_deref(),
    )
    .await?;

    let mut ctx = page_context(&viewer);
    ctx.insert("page_obj", &page_obj);
    state.templates.render("posts/index.html", &ctx)
}

#[handler]
pub async fn group_posts(
    Data(state): Data<&AppState>,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
    viewer: Viewer,
) -> Result<Html<String>> {
    let group = store::find_group_by_slug(&state.db, &slug)
        .await?
        .ok_or(AppError::NotFound("group"))?;
    let page_obj = store::post_page(
        &state.db,
        PostFilter::Group(group.id),
        state.config.post_count,
        params.page.as_deref(),
    )
    .await?;

    let mut ctx = page_context(&viewer);
    ctx.insert("group", &group);
    ctx.insert("page_obj", &page_obj);
    state.templates.render("posts/group_list.html", &ctx)
}

#[handler]
pub async fn profile(
    Data(state): Data<&AppState>,
    Path(username): Path<String>,
    Query(params): Query<PageParams>,
    viewer: Viewer,
) -> Result<Html<String>> {
    let author = store::find_user_by_username(&state.db, &username)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    let page_obj = store::post_page(
        &state.db,
        PostFilter::Author(author.id),
        state.config.post_count,
        params.page.as_deref(),
    )
    .await?;

    let mut ctx = page_context(&viewer);
    ctx.insert("user_profile", &author);
    ctx.insert("post_count", &page_obj.count);
    ctx.insert("page_obj", &page_obj);
    state.templates.render("posts/profile.html", &ctx)
}

#[handler]
pub async fn post_detail(
    Data(state): Data<&AppState>,
    Path(post_id): Path<String>,
    viewer: Viewer,
) -> Result<Html<String>> {
    let id = parse_post_id(&post_id)?;
    let post = store::find_post_card(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("post"))?;
    let post_count = store::count_posts_by_author(&state.db, post.author.id).await?;

    let mut ctx = page_context(&viewer);
    ctx.insert("post", &post);
    ctx.insert("post_count", &post_count);
    state.templates.render("posts/post_detail.html", &ctx)
}

#[handler]
pub async fn post_create_form(
    Data(state): Data<&AppState>,
    viewer: Viewer,
    uri: &Uri,
) -> Result<Html<String>> {
    viewer.require_login(full_path(uri))?;
    render_post_form(state, &viewer, &PostForm::default(), &FormErrors::default(), None).await
}

#[handler]
pub async fn post_create(
    Data(state): Data<&AppState>,
    viewer: Viewer,
    uri: &Uri,
    form: poem::Result<Form<PostForm>>,
) -> poem::Result<Response> {
    let author = viewer.require_login(full_path(uri))?;
    let Form(form) = form?;

    match form.bind(&state.db).await.map_err(AppError::from)? {
        (_, Bound::Valid(input)) => {
            let post = store::create_post(&state.db, author.id, input)
                .await
                .map_err(AppError::from)?;
            tracing::info!(post_id = post.id, author = %author.username, "post created");
            Ok(redirect(profile_url(&author.username)))
        }
        (form, Bound::Invalid(errors)) => {
            let page = render_post_form(state, &viewer, &form, &errors, None).await?;
            Ok(page.into_response())
        }
    }
}

#[handler]
pub async fn post_edit_form(
    Data(state): Data<&AppState>,
    viewer: Viewer,
    uri: &Uri,
    Path(post_id): Path<String>,
) -> Result<Response> {
    let user = viewer.require_login(full_path(uri))?;
    let post = load_post(state, &post_id).await?;
    if post.author_id != user.id {
        tracing::debug!(post_id = post.id, user = %user.username, "edit by non-author");
        return Ok(redirect(post_detail_url(post.id)));
    }

    let form = PostForm::from_post(&post);
    let page = render_post_form(state, &viewer, &form, &FormErrors::default(), Some(post.id)).await?;
    Ok(page.into_response())
}

#[handler]
pub async fn post_edit(
    Data(state): Data<&AppState>,
    viewer: Viewer,
    uri: &Uri,
    Path(post_id): Path<String>,
    form: poem::Result<Form<PostForm>>,
) -> poem::Result<Response> {
    let user = viewer.require_login(full_path(uri))?;
    let post = load_post(state, &post_id).await?;
    if post.author_id != user.id {
        tracing::debug!(post_id = post.id, user = %user.username, "edit by non-author");
        return Ok(redirect(post_detail_url(post.id)));
    }
    let Form(form) = form?;

    match form.bind(&state.db).await.map_err(AppError::from)? {
        (_, Bound::Valid(input)) => {
            let post = store::update_post(&state.db, post, input)
                .await
                .map_err(AppError::from)?;
            tracing::info!(post_id = post.id, "post updated");
            Ok(redirect(post_detail_url(post.id)))
        }
        (form, Bound::Invalid(errors)) => {
            let page = render_post_form(state, &viewer, &form, &errors, Some(post.id)).await?;
            Ok(page.into_response())
        }
    }
}

fn parse_post_id(raw: &str) -> Result<i32> {
    raw.parse().map_err(|_| AppError::NotFound("post"))
}

async fn load_post(state: &AppState, raw_id: &str) -> Result<post::Model> {
    let id = parse_post_id(raw_id)?;
    store::find_post(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("post"))
}

/// The create/edit page; `editing` holds the post id when editing.
async fn render_post_form(
    state: &AppState,
    viewer: &Viewer,
    form: &PostForm,
    errors: &FormErrors,
    editing: Option<i32>,
) -> Result<Html<String>> {
    let groups = store::list_groups(&state.db).await?;

    let mut ctx = page_context(viewer);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    ctx.insert("group_choices", &group_choices(&groups, form.group.as_deref()));
    match editing {
        Some(post_id) => {
            ctx.insert("title", "Edit post");
            ctx.insert("button", "Save changes");
            ctx.insert("is_edit", &true);
            ctx.insert("post_id", &post_id);
        }
        None => {
            ctx.insert("title", "New post");
            ctx.insert("button", "Save");
            ctx.insert("is_edit", &false);
        }
    }
    state.templates.render("posts/create.html", &ctx)
}
