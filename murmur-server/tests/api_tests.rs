// Integration tests for the HTTP API
// Each test drives the full router against its own in-memory database

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use murmur_server::{
    config::Settings,
    db::{repositories::UserRepository, Database},
    router, AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    app: Router,
    state: AppState,
}

impl TestApp {
    fn new() -> Self {
        Self::with_settings("")
    }

    fn with_settings(toml: &str) -> Self {
        let settings = Settings::from_toml(toml).expect("Failed to load test settings");
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize database");
        let state = AppState::new(db, &settings).expect("Failed to build app state");
        let app = router(state.clone(), &settings);
        Self { app, state }
    }

    /// Create a user directly and return (user_id, session_token)
    fn user(&self, username: &str) -> (i64, String) {
        let user_id = UserRepository::new(self.state.db.pool.clone())
            .create(username, "not-a-real-hash")
            .expect("Failed to create test user");
        let token = self
            .state
            .session_manager
            .create_session(user_id)
            .expect("Failed to create session");
        (user_id, token)
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("X-Session-Token", token);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    async fn add_post(&self, token: &str, text: &str) -> i64 {
        let (status, body) = self.post("/addpost", Some(token), json!({ "text": text })).await;
        assert_eq!(status, StatusCode::CREATED, "addpost failed: {body}");
        body["insertedId"].as_i64().expect("insertedId")
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = TestApp::new();
    let (status, body) = app.get("/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn test_signup_signin_me_logout() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/signup", None, json!({ "username": "alice", "password": "s3cret" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = body["insertedId"].as_i64().unwrap();

    let (status, _) = app
        .post("/signin", None, json!({ "username": "alice", "password": "wrong" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post("/signin", None, json!({ "username": "nobody", "password": "s3cret" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Sign in through the raw router to inspect the cookie
    let response = app
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/signin")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "username": "ALICE", "password": "s3cret" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("signin sets a cookie")
        .to_string();
    assert!(cookie.starts_with("access="));
    assert!(cookie.contains("HttpOnly"));
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["user_id"], user_id);
    assert_eq!(body["username"], "alice");
    let token = body["session_token"].as_str().unwrap().to_string();

    // The cookie alone authenticates
    let cookie_pair = cookie.split(';').next().unwrap().to_string();
    let response = app
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/me")
                .header(header::COOKIE, cookie_pair)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = app.get("/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "user_id": user_id, "username": "alice" }));

    let (status, body) = app.request(Method::POST, "/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, _) = app.get("/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_validation() {
    let app = TestApp::new();

    let (status, _) = app
        .post("/signup", None, json!({ "username": "bob", "password": "pw" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post("/signup", None, json!({ "username": "BOB", "password": "pw" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, _) = app.post("/signup", None, json!({ "username": "carol" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post("/signup", None, json!({ "username": "wh0re", "password": "pw" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Inappropriate username. Please choose another.");

    let (status, _) = app
        .post("/signup", None, json!({ "username": "whöre", "password": "pw" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/signup", None, json!({ "username": "Émile", "password": "pw" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .post("/signup", None, json!({ "username": "émile", "password": "pw" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();
    let (_, token) = app.user("alice");

    let response = app
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/addpost")
                .header("X-Session-Token", &token)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_follow_feed_like_scenario() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice");
    let (_, bob) = app.user("bob");

    let post_id = app.add_post(&alice, "hello world").await;

    let (status, hits) = app.get("/search?q=hello", Some(&bob)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits[0]["id"], post_id);
    assert_eq!(hits[0]["tier"], "prefix");
    assert_eq!(hits[0]["score"], 90);

    let (status, _) = app.post("/follow/alice", Some(&bob), json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.post("/follow/alice", Some(&bob), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (_, feed) = app.get("/followingposts", Some(&bob)).await;
    assert_eq!(feed[0]["id"], post_id);
    assert_eq!(feed[0]["author"], "alice");

    let like_uri = format!("/posts/{post_id}/like");
    let (status, like) = app.post(&like_uri, Some(&bob), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(like, json!({ "liked": true, "likes": 1 }));

    let (_, feed) = app.get("/followingposts", Some(&bob)).await;
    assert_eq!(feed[0]["likes"], 1);
    assert_eq!(feed[0]["likedByMe"], true);

    let (_, unlike) = app.request(Method::DELETE, &like_uri, Some(&bob), None).await;
    assert_eq!(unlike, json!({ "liked": false, "likes": 0 }));

    let (_, feed) = app.get("/followingposts", Some(&bob)).await;
    assert_eq!(feed[0]["likes"], 0);
    assert_eq!(feed[0]["likedByMe"], false);
}

#[tokio::test]
async fn test_anonymous_reads() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice");
    let post_id = app.add_post(&alice, "public thoughts").await;

    let (status, feed) = app.get("/posts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed[0]["id"], post_id);
    assert!(feed[0]["likedByMe"].is_null());

    let (status, like) = app.get(&format!("/posts/{post_id}/like"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(like, json!({ "authed": false, "liked": false, "likes": 0 }));

    let (status, _) = app.get("/followingposts", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.post("/addpost", None, json!({ "text": "hi" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_edit_and_delete_authorization() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice");
    let (_, bob) = app.user("bob");
    let post_id = app.add_post(&alice, "first draft").await;
    let uri = format!("/posts/{post_id}");

    let (status, _) = app
        .request(Method::PATCH, &uri, Some(&bob), Some(json!({ "text": "hijack" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(Method::PATCH, "/posts/9999", Some(&alice), Some(json!({ "text": "x" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(Method::PATCH, "/posts/abc", Some(&alice), Some(json!({ "text": "x" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(Method::PATCH, &uri, Some(&alice), Some(json!({ "text": "   " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, edited) = app
        .request(Method::PATCH, &uri, Some(&alice), Some(json!({ "text": " edited " })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["text"], "edited");
    assert!(edited["updatedAt"].is_string());

    let (status, _) = app.request(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, deleted) = app.request(Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, json!({ "ok": true, "deletedId": post_id }));

    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comments_on_post_detail() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice");
    let (_, bob) = app.user("bob");
    let post_id = app.add_post(&alice, "discuss").await;

    let (status, _) = app.post("/addcomment", Some(&bob), json!({ "text": "no post id" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/addcomment", Some(&bob), json!({ "text": "lost", "post_id": 9999 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .post("/addcomment", Some(&bob), json!({ "text": "first!", "post_id": post_id }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["insertedId"].is_i64());

    let (status, detail) = app.get(&format!("/posts/{post_id}"), Some(&bob)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["post"]["text"], "discuss");
    assert_eq!(detail["post"]["likedByMe"], false);
    assert_eq!(detail["comments"][0]["text"], "first!");
    assert_eq!(detail["comments"][0]["author"], "bob");
}

#[tokio::test]
async fn test_post_text_is_masked() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice");

    let post_id = app.add_post(&alice, "what a whore of a day").await;
    let (_, detail) = app.get(&format!("/posts/{post_id}"), None).await;
    assert_eq!(detail["post"]["text"], "what a ***** of a day");
}

#[tokio::test]
async fn test_social_graph_routes() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice");
    let (_, bob) = app.user("bob");
    app.user("carol");

    let (status, _) = app.post("/follow/alice", Some(&alice), json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.post("/follow/ghost", Some(&alice), json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.request(Method::DELETE, "/follow/ghost", Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, status_body) = app.get("/follow/ghost/status", Some(&alice)).await;
    assert_eq!(status_body, json!({ "following": false }));

    app.post("/follow/alice", Some(&bob), json!({})).await;
    app.post("/follow/carol", Some(&bob), json!({})).await;

    let (_, status_body) = app.get("/follow/alice/status", Some(&bob)).await;
    assert_eq!(status_body, json!({ "following": true }));

    let (_, following) = app.get("/users/bob/following", None).await;
    let names: Vec<&str> = following
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["alice", "carol"]);

    let (status, _) = app.get("/users/ghost/followers", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, removed) = app.request(Method::DELETE, "/followers/bob", Some(&alice), None).await;
    assert_eq!(removed, json!({ "ok": true, "removed": true }));
    let (_, removed) = app.request(Method::DELETE, "/followers/bob", Some(&alice), None).await;
    assert_eq!(removed, json!({ "ok": true, "removed": false }));

    let (_, followers) = app.get("/users/alice/followers", None).await;
    assert_eq!(followers, json!([]));
}

#[tokio::test]
async fn test_profile_and_user_search() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice");
    let (_, bob) = app.user("bob");
    app.add_post(&alice, "one").await;
    app.add_post(&alice, "two").await;
    app.post("/follow/alice", Some(&bob), json!({})).await;

    let (status, profile) = app.get("/users/alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], "alice");
    assert_eq!(profile["followerCount"], 1);
    assert_eq!(profile["followingCount"], 0);
    assert_eq!(profile["postCount"], 2);

    let (_, posts) = app.get("/users/alice/posts", None).await;
    assert_eq!(posts.as_array().unwrap().len(), 2);
    assert_eq!(posts[0]["text"], "two");

    let (_, mine) = app.get("/me/posts", Some(&alice)).await;
    assert_eq!(mine.as_array().unwrap().len(), 2);

    let (status, _) = app.get("/users/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, users) = app.get("/users/search?q=AL", None).await;
    assert_eq!(users, json!([{ "id": profile["id"], "username": "alice" }]));

    let (_, users) = app.get("/users/search?q=", None).await;
    assert_eq!(users, json!([]));
}

#[tokio::test]
async fn test_empty_post_search_returns_empty_list() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice");
    app.add_post(&alice, "something").await;

    let (status, hits) = app.get("/search?q=%20%20", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits, json!([]));

    let (_, hits) = app.get("/search", None).await;
    assert_eq!(hits, json!([]));
}

#[tokio::test]
async fn test_expired_session_is_rejected() {
    let app = TestApp::new();
    let (_, token) = app.user("alice");

    {
        let conn = app.state.db.connection().unwrap();
        let past = (Utc::now() - Duration::hours(1))
            .to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
        conn.execute(
            "UPDATE sessions SET expires_at = ?1 WHERE token = ?2",
            (past, &token),
        )
        .unwrap();
    }

    let (status, _) = app.get("/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rate_limit_rejects_requests_over_budget() {
    let app = TestApp::with_settings(
        r#"
        [rate_limit]
        max_requests = 2
        window_seconds = 60
        "#,
    );
    let (user_id, token) = app.user("alice");

    for _ in 0..2 {
        let (status, _) = app.get("/posts", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = app.get("/posts", Some(&token)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Too Many Requests");

    // A second session for the same user shares the budget
    let second = app.state.session_manager.create_session(user_id).unwrap();
    let (status, _) = app.get("/posts", Some(&second)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    // Anonymous traffic and unknown tokens are not counted
    for _ in 0..3 {
        let (status, _) = app.get("/posts", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app.get("/posts", Some("not-a-session")).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, bob) = app.user("bob");
    let (status, _) = app.get("/posts", Some(&bob)).await;
    assert_eq!(status, StatusCode::OK);
}
