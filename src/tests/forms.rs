use chrono::Utc;
use poem::http::{StatusCode, header};
use poem::test::TestClient;
use sea_orm::{EntityTrait, PaginatorTrait};

use super::*;
use crate::app;
use crate::forms::{BAD_CREDENTIALS, INVALID_CHOICE, USERNAME_TAKEN};

struct Fixture {
    state: AppState,
    author: user::Model,
    group: group::Model,
    post: post::Model,
}

async fn fixture() -> Fixture {
    let state = setup(10).await;
    let author = make_user(&state, "PostAuthor").await;
    let group = make_group(&state, "Group title", "test_slug").await;
    let post = make_post(&state, &author, Some(&group), "Post text", Utc::now()).await;
    Fixture {
        state,
        author,
        group,
        post,
    }
}

async fn post_count(state: &AppState) -> u64 {
    post::Entity::find().count(&state.db).await.unwrap()
}

#[tokio::test]
async fn valid_form_creates_post() {
    let f = fixture().await;
    let cli = TestClient::new(app(f.state.clone()));
    let before = post_count(&f.state).await;

    let group_id = f.group.id.to_string();
    let resp = cli
        .post("/create/")
        .header(header::COOKIE, session_for(&f.state, &f.author))
        .form(&[("text", "New post text"), ("group", group_id.as_str())])
        .send()
        .await;

    resp.assert_status(StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/PostAuthor/");
    assert_eq!(post_count(&f.state).await, before + 1);

    let page = store::post_page(&f.state.db, store::PostFilter::All, 1, None)
        .await
        .unwrap();
    let created = &page.items[0];
    assert_eq!(created.text, "New post text");
    assert_eq!(created.group.as_ref().map(|g| g.id), Some(f.group.id));
    assert_eq!(created.author.id, f.author.id);
}

#[tokio::test]
async fn create_without_group() {
    let f = fixture().await;
    let cli = TestClient::new(app(f.state.clone()));

    let resp = cli
        .post("/create/")
        .header(header::COOKIE, session_for(&f.state, &f.author))
        .form(&[("text", "  padded  "), ("group", "")])
        .send()
        .await;
    resp.assert_status(StatusCode::FOUND);

    let page = store::post_page(&f.state.db, store::PostFilter::All, 1, None)
        .await
        .unwrap();
    assert_eq!(page.items[0].text, "padded");
    assert_eq!(page.items[0].group, None);
}

#[tokio::test]
async fn invalid_form_is_redisplayed() {
    let f = fixture().await;
    let cli = TestClient::new(app(f.state.clone()));
    let cookie = session_for(&f.state, &f.author);
    let before = post_count(&f.state).await;

    let resp = cli
        .post("/create/")
        .header(header::COOKIE, &cookie)
        .form(&[("text", "   ")])
        .send()
        .await;
    resp.assert_status_is_ok();
    assert!(body(resp).await.contains("This field is required."));

    let resp = cli
        .post("/create/")
        .header(header::COOKIE, &cookie)
        .form(&[("text", "kept text"), ("group", "9999")])
        .send()
        .await;
    resp.assert_status_is_ok();
    let html = body(resp).await;
    assert!(html.contains(INVALID_CHOICE));
    assert!(html.contains(">kept text</textarea>"));

    assert_eq!(post_count(&f.state).await, before);
}

#[tokio::test]
async fn valid_form_edits_post() {
    let f = fixture().await;
    let cli = TestClient::new(app(f.state.clone()));
    let before = post_count(&f.state).await;

    let resp = cli
        .post(format!("/posts/{}/edit/", f.post.id))
        .header(header::COOKIE, session_for(&f.state, &f.author))
        .form(&[("text", "Edited post text")])
        .send()
        .await;

    resp.assert_status(StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", f.post.id));

    let edited = store::find_post(&f.state.db, f.post.id).await.unwrap().unwrap();
    assert_eq!(edited.text, "Edited post text");
    assert_eq!(edited.group_id, None);
    assert_eq!(edited.author_id, f.author.id);
    assert_eq!(edited.pub_date, f.post.pub_date);
    assert_eq!(post_count(&f.state).await, before);
}

#[tokio::test]
async fn non_author_cannot_edit() {
    let f = fixture().await;
    let intruder = make_user(&f.state, "NotAuthor").await;
    let cli = TestClient::new(app(f.state.clone()));

    let resp = cli
        .post(format!("/posts/{}/edit/", f.post.id))
        .header(header::COOKIE, session_for(&f.state, &intruder))
        .form(&[("text", "Hijacked")])
        .send()
        .await;

    resp.assert_status(StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", f.post.id));
    let unchanged = store::find_post(&f.state.db, f.post.id).await.unwrap().unwrap();
    assert_eq!(unchanged, f.post);
}

#[tokio::test]
async fn invalid_edit_keeps_post() {
    let f = fixture().await;
    let cli = TestClient::new(app(f.state.clone()));

    let resp = cli
        .post(format!("/posts/{}/edit/", f.post.id))
        .header(header::COOKIE, session_for(&f.state, &f.author))
        .form(&[("text", "")])
        .send()
        .await;
    resp.assert_status_is_ok();
    assert!(body(resp).await.contains("<h1>Edit post</h1>"));

    let unchanged = store::find_post(&f.state.db, f.post.id).await.unwrap().unwrap();
    assert_eq!(unchanged, f.post);
}

#[tokio::test]
async fn signup_creates_account_and_session() {
    let f = fixture().await;
    let cli = TestClient::new(app(f.state.clone()));

    let resp = cli
        .post("/auth/signup/")
        .form(&[
            ("username", "newcomer"),
            ("email", "newcomer@example.com"),
            ("password", "long-password"),
            ("password_confirm", "long-password"),
        ])
        .send()
        .await;
    resp.assert_status(StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    let set_cookie = resp.0.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("yatube_session="));

    let user = store::find_user_by_username(&f.state.db, "newcomer")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.email, "newcomer@example.com");
    assert!(auth::verify_password("long-password", &user.password_hash));
}

#[tokio::test]
async fn signup_rejects_taken_username() {
    let f = fixture().await;
    let cli = TestClient::new(app(f.state.clone()));

    let resp = cli
        .post("/auth/signup/")
        .form(&[
            ("username", "PostAuthor"),
            ("password", "long-password"),
            ("password_confirm", "long-password"),
        ])
        .send()
        .await;
    resp.assert_status_is_ok();
    assert!(body(resp).await.contains(USERNAME_TAKEN));
}

#[tokio::test]
async fn duplicate_username_is_a_unique_violation() {
    let f = fixture().await;

    let err = store::create_user(&f.state.db, "PostAuthor", "", "hash")
        .await
        .unwrap_err();
    assert!(store::is_unique_violation(&err));

    let user = store::create_user(&f.state.db, "postauthor2", "", "hash").await;
    assert!(user.is_ok());
}

#[tokio::test]
async fn login_sets_session_and_follows_next() {
    let f = fixture().await;
    let hash = auth::hash_password("s3cret-pass").unwrap();
    store::create_user(&f.state.db, "reader", "", &hash).await.unwrap();
    let cli = TestClient::new(app(f.state.clone()));

    let resp = cli
        .post("/auth/login/")
        .form(&[
            ("username", "reader"),
            ("password", "s3cret-pass"),
            ("next", "/create/"),
        ])
        .send()
        .await;
    resp.assert_status(StatusCode::FOUND);
    assert_eq!(location(&resp), "/create/");
    assert!(resp.0.headers().contains_key(header::SET_COOKIE));

    let resp = cli
        .post("/auth/login/")
        .form(&[
            ("username", "reader"),
            ("password", "s3cret-pass"),
            ("next", "https://elsewhere.example/"),
        ])
        .send()
        .await;
    assert_eq!(location(&resp), "/");

    let resp = cli
        .post("/auth/login/")
        .form(&[
            ("username", "reader"),
            ("password", "s3cret-pass"),
            ("next", "/\\elsewhere.example/"),
        ])
        .send()
        .await;
    assert_eq!(location(&resp), "/");
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let f = fixture().await;
    let hash = auth::hash_password("s3cret-pass").unwrap();
    store::create_user(&f.state.db, "reader", "", &hash).await.unwrap();
    let cli = TestClient::new(app(f.state.clone()));

    let resp = cli
        .post("/auth/login/")
        .form(&[("username", "reader"), ("password", "guess")])
        .send()
        .await;
    resp.assert_status_is_ok();
    assert!(!resp.0.headers().contains_key(header::SET_COOKIE));
    assert!(body(resp).await.contains(BAD_CREDENTIALS));
}

#[tokio::test]
async fn login_page_carries_next() {
    let f = fixture().await;
    let cli = TestClient::new(app(f.state.clone()));

    let html = body(cli.get("/auth/login/?next=/create/").send().await).await;
    assert!(html.contains("name=\"next\" value=\"&#x2F;create&#x2F;\""));
}

#[tokio::test]
async fn logout_clears_session() {
    let f = fixture().await;
    let cli = TestClient::new(app(f.state.clone()));

    let resp = cli
        .get("/auth/logout/")
        .header(header::COOKIE, session_for(&f.state, &f.author))
        .send()
        .await;
    resp.assert_status(StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    let set_cookie = resp.0.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("yatube_session=;"));
}
