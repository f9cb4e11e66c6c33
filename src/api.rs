// Read-only JSON view of the blog, mounted under /api/v1.
use chrono::{DateTime, Utc};
use poem_openapi::param::{Path, Query};
use poem_openapi::payload::Json;
use poem_openapi::{Object, OpenApi};
use sea_orm::DbErr;

use crate::entities::group;
use crate::error::AppError;
use crate::pagination::Page;
use crate::state::AppState;
use crate::store::{self, PostCard, PostFilter};

#[derive(Debug, Object)]
pub struct PostOut {
    pub id: i32,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    /// Username of the author.
    pub author: String,
    /// Slug of the group, if any.
    pub group: Option<String>,
}

impl From<PostCard> for PostOut {
    fn from(card: PostCard) -> Self {
        Self {
            id: card.id,
            text: card.text,
            pub_date: card.pub_date,
            author: card.author.username,
            group: card.group.map(|g| g.slug),
        }
    }
}

#[derive(Debug, Object)]
pub struct PostPage {
    pub count: u64,
    pub num_pages: u64,
    pub page: u64,
    pub results: Vec<PostOut>,
}

impl From<Page<PostCard>> for PostPage {
    fn from(page: Page<PostCard>) -> Self {
        Self {
            count: page.count,
            num_pages: page.num_pages,
            page: page.number,
            results: page.items.into_iter().map(PostOut::from).collect(),
        }
    }
}

#[derive(Debug, Object)]
pub struct GroupOut {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl From<group::Model> for GroupOut {
    fn from(g: group::Model) -> Self {
        Self {
            id: g.id,
            title: g.title,
            slug: g.slug,
            description: g.description,
        }
    }
}

pub struct Api {
    state: AppState,
}

impl Api {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl Api {
    /// Latest posts, paginated
    #[oai(path = "/posts", method = "get")]
    async fn list_posts(&self, Query(page): Query<Option<String>>) -> poem::Result<Json<PostPage>> {
        let page = store::post_page(
            &self.state.db,
            PostFilter::All,
            self.state.config.post_count,
            page.as_deref(),
        )
        .await
        .map_err(db_error)?;
        Ok(Json(page.into()))
    }

    /// Single post
    #[oai(path = "/posts/:id", method = "get")]
    async fn get_post(&self, Path(id): Path<i32>) -> poem::Result<Json<PostOut>> {
        let post = store::find_post_card(&self.state.db, id)
            .await
            .map_err(db_error)?;
        post.map(|p| Json(p.into()))
            .ok_or_else(|| AppError::NotFound("post").into())
    }

    /// All groups by title
    #[oai(path = "/groups", method = "get")]
    async fn list_groups(&self) -> poem::Result<Json<Vec<GroupOut>>> {
        let groups = store::list_groups(&self.state.db).await.map_err(db_error)?;
        Ok(Json(groups.into_iter().map(GroupOut::from).collect()))
    }

    /// Posts of one group, paginated
    #[oai(path = "/groups/:slug/posts", method = "get")]
    async fn group_posts(
        &self,
        Path(slug): Path<String>,
        Query(page): Query<Option<String>>,
    ) -> poem::Result<Json<PostPage>> {
        let group = store::find_group_by_slug(&self.state.db, &slug)
            .await
            .map_err(db_error)?
            .ok_or(AppError::NotFound("group"))?;
        let page = store::post_page(
            &self.state.db,
            PostFilter::Group(group.id),
            self.state.config.post_count,
            page.as_deref(),
        )
        .await
        .map_err(db_error)?;
        Ok(Json(page.into()))
    }
}

fn db_error(err: DbErr) -> poem::Error {
    AppError::from(err).into()
}
