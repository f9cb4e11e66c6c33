//! Queries over users, groups and posts.
//!
//! Listings come back as [`PostCard`]s: the post row joined with its
//! author's username and its group's title and slug, ready for templates
//! and the JSON API alike.
use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Select, Set, SqlErr,
};
use serde::Serialize;

use crate::entities::{group, post, user};
use crate::pagination::{self, Page};

/// Which posts a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i32),
    Author(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorRef {
    pub id: i32,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRef {
    pub id: i32,
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostCard {
    pub id: i32,
    pub text: String,
    pub pub_date: chrono::DateTime<Utc>,
    pub author: AuthorRef,
    pub group: Option<GroupRef>,
}

/// Validated fields of a post submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostInput {
    pub text: String,
    pub group_id: Option<i32>,
}

fn ordered_posts(filter: PostFilter) -> Select<post::Entity> {
    let select = post::Entity::find();
    let select = match filter {
        PostFilter::All => select,
        PostFilter::Group(id) => select.filter(post::Column::GroupId.eq(id)),
        PostFilter::Author(id) => select.filter(post::Column::AuthorId.eq(id)),
    };
    select
        .order_by_desc(post::Column::PubDate)
        .order_by_desc(post::Column::Id)
}

pub async fn post_page(
    db: &DatabaseConnection,
    filter: PostFilter,
    per_page: u64,
    requested: Option<&str>,
) -> Result<Page<PostCard>, DbErr> {
    let mut page = pagination::paginate(ordered_posts(filter), db, per_page, requested).await?;
    let cards = load_cards(db, std::mem::take(&mut page.items)).await?;
    Ok(page.with_items(cards))
}

async fn load_cards(db: &DatabaseConnection, rows: Vec<post::Model>) -> Result<Vec<PostCard>, DbErr> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let author_ids: Vec<i32> = rows.iter().map(|p| p.author_id).collect();
    let authors: HashMap<i32, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(author_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let group_ids: Vec<i32> = rows.iter().filter_map(|p| p.group_id).collect();
    let groups: HashMap<i32, group::Model> = if group_ids.is_empty() {
        HashMap::new()
    } else {
        group::Entity::find()
            .filter(group::Column::Id.is_in(group_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|g| (g.id, g))
            .collect()
    };

    rows.into_iter()
        .map(|p| -> Result<PostCard, DbErr> {
            let author = authors.get(&p.author_id).ok_or_else(|| {
                DbErr::RecordNotFound(format!("author {} of post {}", p.author_id, p.id))
            })?;
            let group = p.group_id.and_then(|id| groups.get(&id));
            Ok(card(p, author, group))
        })
        .collect()
}

fn card(p: post::Model, author: &user::Model, group: Option<&group::Model>) -> PostCard {
    PostCard {
        id: p.id,
        text: p.text,
        pub_date: p.pub_date,
        author: AuthorRef {
            id: author.id,
            username: author.username.clone(),
        },
        group: group.map(|g| GroupRef {
            id: g.id,
            title: g.title.clone(),
            slug: g.slug.clone(),
        }),
    }
}

pub async fn find_post(db: &DatabaseConnection, id: i32) -> Result<Option<post::Model>, DbErr> {
    post::Entity::find_by_id(id).one(db).await
}

pub async fn find_post_card(db: &DatabaseConnection, id: i32) -> Result<Option<PostCard>, DbErr> {
    let Some(row) = find_post(db, id).await? else {
        return Ok(None);
    };
    Ok(load_cards(db, vec![row]).await?.pop())
}

pub async fn count_posts_by_author(db: &DatabaseConnection, author_id: i32) -> Result<u64, DbErr> {
    post::Entity::find()
        .filter(post::Column::AuthorId.eq(author_id))
        .count(db)
        .await
}

/// Store a new post by `author_id`, stamped with the current time.
pub async fn create_post(
    db: &DatabaseConnection,
    author_id: i32,
    input: PostInput,
) -> Result<post::Model, DbErr> {
    post::ActiveModel {
        text: Set(input.text),
        group_id: Set(input.group_id),
        author_id: Set(author_id),
        pub_date: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Overwrite text and group of an existing post. Author and publication
/// date stay as they were.
pub async fn update_post(
    db: &DatabaseConnection,
    existing: post::Model,
    input: PostInput,
) -> Result<post::Model, DbErr> {
    let mut am: post::ActiveModel = existing.into();
    am.text = Set(input.text);
    am.group_id = Set(input.group_id);
    am.update(db).await
}

pub async fn find_group(db: &DatabaseConnection, id: i32) -> Result<Option<group::Model>, DbErr> {
    group::Entity::find_by_id(id).one(db).await
}

pub async fn find_group_by_slug(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<Option<group::Model>, DbErr> {
    group::Entity::find()
        .filter(group::Column::Slug.eq(slug))
        .one(db)
        .await
}

pub async fn list_groups(db: &DatabaseConnection) -> Result<Vec<group::Model>, DbErr> {
    group::Entity::find()
        .order_by_asc(group::Column::Title)
        .all(db)
        .await
}

pub async fn create_group(
    db: &DatabaseConnection,
    title: &str,
    slug: &str,
    description: &str,
) -> Result<group::Model, DbErr> {
    group::ActiveModel {
        title: Set(title.to_owned()),
        slug: Set(slug.to_owned()),
        description: Set(description.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn find_user(db: &DatabaseConnection, id: i32) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find_by_id(id).one(db).await
}

pub async fn find_user_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
}

/// Whether `err` is a unique-index violation, e.g. a username another
/// request inserted first.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub async fn create_user(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<user::Model, DbErr> {
    user::ActiveModel {
        username: Set(username.to_owned()),
        email: Set(email.to_owned()),
        password_hash: Set(password_hash.to_owned()),
        date_joined: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}
