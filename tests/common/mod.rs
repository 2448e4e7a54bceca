#![allow(dead_code)]

use axum::body::Body;
use http_body_util::BodyExt;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use learnlog::credentials::hash_password;
use learnlog::models::User;
use learnlog::store::Store;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    pub store: Store,
}

impl TestApp {
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to create in-memory SQLite pool");

        learnlog::db::create_schema(&pool)
            .await
            .expect("Failed to create schema");

        let router = learnlog::build_app(pool.clone(), false)
            .await
            .expect("Failed to build app");

        Self {
            router,
            store: Store::new(pool.clone()),
            db: pool,
        }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Create a user directly in the store.
    pub async fn create_user(&self, email: &str, password: &str) -> User {
        let hash = hash_password(password).expect("Failed to hash password");
        self.store
            .create_user(email, &hash)
            .await
            .expect("Failed to create test user")
    }

    /// Log in and return the session cookie string.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let resp = self
            .post_form("/login", &credentials_body(email, password), None)
            .await;
        assert_eq!(resp.status(), StatusCode::FOUND);

        session_cookie(&resp).expect("Login should set a session cookie")
    }

    /// Create a user and log in as them.
    pub async fn logged_in_user(&self, email: &str) -> (User, String) {
        let user = self.create_user(email, "password").await;
        let cookie = self.login(email, "password").await;
        (user, cookie)
    }

    /// Send a GET request with an optional session cookie.
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::empty()).unwrap();
        self.request(req).await
    }

    /// Send a POST form request with an optional session cookie.
    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .uri(uri)
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        self.request(req).await
    }

    /// Timestamps of every stored entry, oldest first.
    pub async fn entry_timestamps(&self) -> Vec<String> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT timestamp_of_entry FROM learning_entries ORDER BY id")
                .fetch_all(&self.db)
                .await
                .unwrap();
        rows.into_iter().map(|(ts,)| ts).collect()
    }

    pub async fn entry_count(&self) -> i64 {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM learning_entries")
            .fetch_one(&self.db)
            .await
            .unwrap();
        count.0
    }
}

/// Urlencoded login body. Only `@` needs escaping in test emails.
pub fn credentials_body(email: &str, password: &str) -> String {
    format!("email={}&password={}", email.replace('@', "%40"), password)
}

/// Urlencoded learning form body with the given title, date and tags.
pub fn entry_body(title: &str, date: &str, tags: &str) -> String {
    format!(
        "title={title}&date={date}&time_spent=2&learnt=something&resources_to_remember=a+book&tags={tags}"
    )
}

/// Path segment for an entry timestamp.
pub fn entry_key(timestamp: &str) -> String {
    timestamp.replacen(' ', "T", 1)
}

pub fn session_cookie(resp: &Response) -> Option<String> {
    resp.headers()
        .get("set-cookie")?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(str::to_string)
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Assert that a response is a 302 to the given location.
pub fn assert_redirect(resp: &Response, expected_location: &str) {
    assert_eq!(
        resp.status(),
        StatusCode::FOUND,
        "Expected redirect, got {}",
        resp.status()
    );
    let location = resp
        .headers()
        .get("location")
        .expect("Redirect should have location header")
        .to_str()
        .unwrap();
    assert_eq!(location, expected_location);
}
