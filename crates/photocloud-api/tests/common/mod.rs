#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use photocloud_api::{AppStateInner, DEFAULT_MAX_UPLOAD_BYTES, router};
use photocloud_db::Database;
use photocloud_media::{MediaError, MediaStore, UploadedAsset};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
const BOUNDARY: &str = "photocloud-test-boundary";

/// In-process stand-in for the media service that records what it was asked
/// to do.
#[derive(Default)]
pub struct FakeMedia {
    pub fail_uploads: AtomicBool,
    pub fail_destroys: AtomicBool,
    next_id: AtomicUsize,
    pub uploaded: Mutex<Vec<(String, usize)>>,
    pub destroyed: Mutex<Vec<String>>,
}

impl FakeMedia {
    pub fn upload_count(&self) -> usize {
        self.uploaded.lock().unwrap().len()
    }

    pub fn destroyed(&self) -> Vec<String> {
        self.destroyed.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaStore for FakeMedia {
    async fn upload(&self, data: Bytes, _file_name: Option<String>) -> Result<UploadedAsset, MediaError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(MediaError::Upstream {
                status: 500,
                message: "simulated outage".into(),
            });
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let public_id = format!("photo_app/fake{n}");
        self.uploaded.lock().unwrap().push((public_id.clone(), data.len()));

        Ok(UploadedAsset {
            url: format!("https://res.cloudinary.test/{public_id}.jpg"),
            public_id,
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), MediaError> {
        if self.fail_destroys.load(Ordering::SeqCst) {
            return Err(MediaError::Upstream {
                status: 500,
                message: "simulated outage".into(),
            });
        }

        self.destroyed.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub media: Arc<FakeMedia>,
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with_limit(DEFAULT_MAX_UPLOAD_BYTES)
}

pub fn setup_test_app_with_limit(max_upload_bytes: usize) -> TestApp {
    let media = Arc::new(FakeMedia::default());
    let state = Arc::new(AppStateInner {
        db: Database::open_in_memory().expect("in-memory database"),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        media: media.clone(),
        max_upload_bytes,
    });

    TestApp {
        router: router(state),
        media,
    }
}

impl TestApp {
    /// Send a request and return the status plus the body as JSON, or as a
    /// JSON string when the body is plain text.
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()));
        (status, value)
    }

    pub async fn register(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.send(json_request("/api/auth/register", json!({ "username": username, "password": password })))
            .await
    }

    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.send(json_request("/api/auth/login", json!({ "username": username, "password": password })))
            .await
    }

    /// Register and return `(user_id, token)`.
    pub async fn user(&self, username: &str) -> (String, String) {
        let (status, body) = self.register(username, "pw123").await;
        assert_eq!(status, StatusCode::CREATED, "register {username}: {body}");
        (
            body["user_id"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn upload(&self, token: &str, title: &str) -> (StatusCode, Value) {
        self.send(upload_request(Some(token), Some(title), Some(b"\xff\xd8\xff fake jpeg".as_slice())))
            .await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::get(path);
        if let Some(token) = token {
            builder = builder.header("x-auth-token", token);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.send(
            Request::delete(path)
                .header("x-auth-token", token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

pub fn json_request(path: &str, body: Value) -> Request<Body> {
    Request::post(path)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub fn upload_request(token: Option<&str>, title: Option<&str>, image: Option<&[u8]>) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    if let Some(title) = title {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\n{title}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(image) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"photo.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(image);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::post("/api/photos/upload")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"));
    if let Some(token) = token {
        builder = builder.header("x-auth-token", token);
    }
    builder.body(Body::from(body)).unwrap()
}

/// Photo ids in the order a listing returned them.
pub fn ids(list: &Value) -> Vec<String> {
    list.as_array()
        .expect("photo list")
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect()
}
