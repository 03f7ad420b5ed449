#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use videotube_backend::{
    config::Config,
    create_router,
    database::{memory::MemoryDatabase, PlatformDatabase},
    media::local::LocalMediaHost,
    AppState,
};

pub const PASSWORD: &str = "password123";
const BOUNDARY: &str = "videotube-test-boundary";

/// Router over an in-memory database and a media directory that lives as long as the app
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub media_dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }

    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// Every `Set-Cookie` header value
    pub fn cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }
}

pub fn test_config(media_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.database.r#type = "memory".to_string();
    config.auth.bcrypt_rounds = 4;
    config.auth.secure_cookies = false;
    config.media.provider = "local".to_string();
    config.media.local.directory = media_dir.path().to_string_lossy().into_owned();
    config.media.local.url_prefix = "/uploads".to_string();
    config.media.max_upload_bytes = 1024 * 1024;
    config.server.public_dir = media_dir.path().to_string_lossy().into_owned();
    config
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_database(Arc::new(MemoryDatabase::new()))
    }

    pub fn with_database(database: Arc<dyn PlatformDatabase>) -> Self {
        let media_dir = tempfile::tempdir().unwrap();
        let config = test_config(&media_dir);

        let media = Arc::new(LocalMediaHost::new(media_dir.path(), "/uploads"));
        let state = AppState::new(config, database, media).unwrap();

        Self {
            router: create_router(state.clone()),
            state,
            media_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(json_request(Method::GET, uri, token, None)).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(json_request(Method::POST, uri, token, Some(body))).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(json_request(Method::PATCH, uri, token, Some(body))).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(json_request(Method::DELETE, uri, token, None)).await
    }

    /// Register through the multipart endpoint with an avatar
    pub async fn register(&self, user_name: &str) -> TestResponse {
        let request = MultipartBody::new()
            .text("userName", user_name)
            .text("fullName", &format!("{user_name} Full"))
            .text("email", &format!("{user_name}@example.com"))
            .text("password", PASSWORD)
            .file("avatar", "avatar.png", "image/png", b"avatar-bytes")
            .into_request(Method::POST, "/api/v1/users/register", None);
        self.send(request).await
    }

    pub async fn login(&self, user_name: &str) -> TestResponse {
        self.post(
            "/api/v1/users/login",
            None,
            serde_json::json!({ "email": format!("{user_name}@example.com"), "password": PASSWORD }),
        )
        .await
    }

    /// Register and log in; returns the user id and access token
    pub async fn signup(&self, user_name: &str) -> (String, String) {
        let registered = self.register(user_name).await;
        assert_eq!(registered.status, StatusCode::CREATED, "{:?}", registered.body);

        let login = self.login(user_name).await;
        assert_eq!(login.status, StatusCode::OK, "{:?}", login.body);

        let id = registered.data()["_id"].as_str().unwrap().to_string();
        let token = login.data()["accessToken"].as_str().unwrap().to_string();
        (id, token)
    }

    /// Publish a video; returns its id
    pub async fn publish_video(&self, token: &str, title: &str) -> String {
        let request = MultipartBody::new()
            .text("title", title)
            .text("description", &format!("About {title}"))
            .file("videoFile", "clip.mp4", "video/mp4", b"video-bytes")
            .file("thumbnail", "thumb.png", "image/png", b"thumb-bytes")
            .into_request(Method::POST, "/api/v1/videos", Some(token));
        let response = self.send(request).await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.data()["_id"].as_str().unwrap().to_string()
    }

    /// Whether a `/uploads/...` URL still has a file behind it
    pub fn media_exists(&self, url: &str) -> bool {
        let name = url.trim_start_matches("/uploads/");
        self.media_dir.path().join(name).exists()
    }
}

pub fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Hand-assembled `multipart/form-data` body
#[derive(Default)]
pub struct MultipartBody {
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(data);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
        self.bytes
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(self.bytes)).unwrap()
    }
}
