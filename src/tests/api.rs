use chrono::{Duration, Utc};
use poem::http::StatusCode;
use poem::test::TestClient;
use serde_json::Value;

use super::*;
use crate::app;

async fn json(resp: poem::test::TestResponse) -> Value {
    serde_json::from_str(&body(resp).await).expect("json body")
}

#[tokio::test]
async fn posts_are_paginated() {
    let state = setup(2).await;
    let author = make_user(&state, "writer").await;
    let cats = make_group(&state, "Cats", "cats").await;
    let now = Utc::now();
    for i in 0..5 {
        let group = (i % 2 == 0).then_some(&cats);
        make_post(&state, &author, group, &format!("post {i}"), now + Duration::seconds(i)).await;
    }
    let cli = TestClient::new(app(state.clone()));

    let resp = cli.get("/api/v1/posts").send().await;
    resp.assert_status_is_ok();
    let page = json(resp).await;
    assert_eq!(page["count"], 5);
    assert_eq!(page["num_pages"], 3);
    assert_eq!(page["page"], 1);
    assert_eq!(page["results"][0]["text"], "post 4");
    assert_eq!(page["results"][0]["author"], "writer");
    assert_eq!(page["results"][0]["group"], "cats");
    assert_eq!(page["results"][1]["group"], Value::Null);

    let page = json(cli.get("/api/v1/posts?page=3").send().await).await;
    assert_eq!(page["results"].as_array().map(Vec::len), Some(1));
    assert_eq!(page["results"][0]["text"], "post 0");

    let page = json(cli.get("/api/v1/groups/cats/posts").send().await).await;
    assert_eq!(page["count"], 3);
}

#[tokio::test]
async fn unknown_objects_are_not_found() {
    let state = setup(10).await;
    let cli = TestClient::new(app(state.clone()));

    cli.get("/api/v1/posts/42")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND);
    cli.get("/api/v1/groups/nope/posts")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn groups_are_listed_by_title() {
    let state = setup(10).await;
    make_group(&state, "Zebras", "zebras").await;
    make_group(&state, "Ants", "ants").await;
    let cli = TestClient::new(app(state.clone()));

    let groups = json(cli.get("/api/v1/groups").send().await).await;
    let slugs: Vec<&str> = groups
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|g| g["slug"].as_str())
        .collect();
    assert_eq!(slugs, ["ants", "zebras"]);
}

#[tokio::test]
async fn single_post_by_id() {
    let state = setup(10).await;
    let author = make_user(&state, "writer").await;
    let post = make_post(&state, &author, None, "hello", Utc::now()).await;
    let cli = TestClient::new(app(state.clone()));

    let value = json(cli.get(format!("/api/v1/posts/{}", post.id)).send().await).await;
    assert_eq!(value["id"], post.id);
    assert_eq!(value["text"], "hello");
    assert_eq!(value["group"], Value::Null);
}
