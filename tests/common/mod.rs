#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use sitefy_reviews::config::{AdminAuthMode, DEFAULT_VIDEO_TYPES};
use sitefy_reviews::domain::review::{
    NewReview, Review, ReviewEdit, ReviewStatus, StatusChange,
};
use sitefy_reviews::infra::db::ReviewStore;
use sitefy_reviews::infra::storage::VideoStore;
use sitefy_reviews::AppState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const TEST_ADMIN_TOKEN: &str = "test-admin-token-12345";
pub const PUBLIC_BASE: &str = "https://cdn.test/review-media";
const BOUNDARY: &str = "----sitefy-test-boundary";

// ---------------------------------------------------------------------------
// In-memory collaborators
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryReviewStore {
    reviews: Mutex<Vec<Review>>,
}

impl MemoryReviewStore {
    pub fn all(&self) -> Vec<Review> {
        self.reviews.lock().unwrap().clone()
    }

    pub fn get(&self, id: Uuid) -> Option<Review> {
        self.all().into_iter().find(|review| review.id == id)
    }

    fn update<F>(&self, id: Uuid, apply: F) -> Option<Review>
    where
        F: FnOnce(&mut Review),
    {
        let mut reviews = self.reviews.lock().unwrap();
        let review = reviews.iter_mut().find(|review| review.id == id)?;
        apply(review);
        Some(review.clone())
    }
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn insert(&self, review: NewReview) -> Result<Review> {
        let record = Review {
            id: Uuid::new_v4(),
            user_name: review.user_name,
            user_email: review.user_email,
            user_title: review.user_title,
            project_name: review.project_name,
            project_description: review.project_description,
            tags: review.tags,
            rating: review.rating,
            review_type: review.review_type,
            review_text: review.review_text,
            video_url: review.video_url,
            status: ReviewStatus::Pending,
            admin_notes: None,
            hide_rating: None,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
        };
        self.reviews.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn list(&self, status: Option<ReviewStatus>) -> Result<Vec<Review>> {
        let mut reviews: Vec<Review> = self
            .all()
            .into_iter()
            .filter(|review| status.map_or(true, |status| review.status == status))
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn set_status(
        &self,
        id: Uuid,
        change: StatusChange,
        updated_at: OffsetDateTime,
    ) -> Result<Option<Review>> {
        Ok(self.update(id, |review| {
            review.status = change.status;
            review.admin_notes = change.admin_notes;
            review.updated_at = Some(updated_at);
        }))
    }

    async fn edit(
        &self,
        id: Uuid,
        edit: ReviewEdit,
        updated_at: OffsetDateTime,
    ) -> Result<Option<Review>> {
        Ok(self.update(id, |review| {
            if let Some(project_name) = edit.project_name {
                review.project_name = project_name;
            }
            if let Some(tags) = edit.tags {
                review.tags = tags;
            }
            if let Some(created_at) = edit.created_at {
                review.created_at = created_at;
            }
            review.updated_at = Some(updated_at);
        }))
    }

    async fn set_hide_rating(
        &self,
        id: Uuid,
        hide_rating: bool,
        updated_at: OffsetDateTime,
    ) -> Result<Option<Review>> {
        Ok(self.update(id, |review| {
            review.hide_rating = Some(hide_rating);
            review.updated_at = Some(updated_at);
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut reviews = self.reviews.lock().unwrap();
        let before = reviews.len();
        reviews.retain(|review| review.id != id);
        Ok(reviews.len() != before)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryVideoStore {
    objects: Mutex<HashMap<String, (Bytes, String)>>,
    fail_uploads: AtomicBool,
}

impl MemoryVideoStore {
    pub fn fail_uploads(&self) {
        self.fail_uploads.store(true, Ordering::SeqCst);
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn object(&self, key: &str) -> Option<(Bytes, String)> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn put_new(&self, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(anyhow!("storage quota exceeded"));
        }
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(key) {
            return Err(anyhow!("object {} already exists", key));
        }
        objects.insert(key.to_string(), (body, content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, key: &str) -> Result<String> {
        Ok(format!("{}/{}", PUBLIC_BASE, key))
    }
}

// ---------------------------------------------------------------------------
// TestApp
// ---------------------------------------------------------------------------

pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub reviews: Arc<MemoryReviewStore>,
    pub videos: Arc<MemoryVideoStore>,
}

pub struct TestResponse {
    pub status: StatusCode,
    body_bytes: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body_bytes).unwrap_or(Value::Null)
    }

    pub fn message(&self) -> String {
        self.json()["message"].as_str().unwrap_or("").to_string()
    }
}

pub struct TestOptions {
    pub admin_auth: AdminAuthMode,
    pub admin_token: Option<String>,
    pub upload_max_bytes: u64,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            admin_auth: AdminAuthMode::Required,
            admin_token: Some(TEST_ADMIN_TOKEN.to_string()),
            upload_max_bytes: 50 * 1024 * 1024,
        }
    }
}

/// A fresh app with empty in-memory stores and the admin gate enabled.
pub fn app() -> TestApp {
    TestApp::with_options(TestOptions::default())
}

impl TestApp {
    pub fn with_options(options: TestOptions) -> Self {
        let reviews = Arc::new(MemoryReviewStore::default());
        let videos = Arc::new(MemoryVideoStore::default());

        let state = AppState {
            reviews: reviews.clone(),
            videos: videos.clone(),
            video_key_prefix: "review-videos".to_string(),
            upload_max_bytes: options.upload_max_bytes,
            allowed_video_types: Arc::new(
                DEFAULT_VIDEO_TYPES.iter().map(|t| t.to_string()).collect(),
            ),
            admin_auth: options.admin_auth,
            admin_token: options.admin_token,
        };

        let router = sitefy_reviews::http::router(state.clone());

        TestApp {
            router,
            state,
            reviews,
            videos,
        }
    }

    // ------------------------------------------------------------------
    // Low-level request helper
    // ------------------------------------------------------------------
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Body,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost");

        for &(key, value) in headers {
            builder = builder.header(key, value);
        }

        let request = builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot failed");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to collect body")
            .to_bytes();

        TestResponse { status, body_bytes }
    }

    // ------------------------------------------------------------------
    // Convenience HTTP helpers
    // ------------------------------------------------------------------
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Method::GET, path, Body::empty(), &[]).await
    }

    pub async fn submit(&self, form: MultipartForm) -> TestResponse {
        let content_type = form.content_type();
        self.request(
            Method::POST,
            "/api/reviews",
            Body::from(form.finish()),
            &[("content-type", content_type.as_str())],
        )
        .await
    }

    /// GET with an admin token in the x-admin-token header.
    pub async fn get_admin(&self, path: &str, admin_token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        if let Some(t) = admin_token {
            headers.push(("x-admin-token", t));
        }
        self.request(Method::GET, path, Body::empty(), &headers).await
    }

    /// PATCH a JSON body with an admin token in the x-admin-token header.
    pub async fn patch_admin(
        &self,
        path: &str,
        body: Value,
        admin_token: Option<&str>,
    ) -> TestResponse {
        let mut headers = vec![("content-type", "application/json")];
        if let Some(t) = admin_token {
            headers.push(("x-admin-token", t));
        }
        let body = Body::from(serde_json::to_string(&body).unwrap());
        self.request(Method::PATCH, path, body, &headers).await
    }

    pub async fn delete_admin(&self, path: &str, admin_token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        if let Some(t) = admin_token {
            headers.push(("x-admin-token", t));
        }
        self.request(Method::DELETE, path, Body::empty(), &headers)
            .await
    }

    // ------------------------------------------------------------------
    // Test data helpers
    // ------------------------------------------------------------------

    /// Submit a valid text review through the API and return its id.
    pub async fn submit_text_review(&self, project: &str) -> Uuid {
        let resp = self.submit(text_review_form(project)).await;
        assert_eq!(resp.status, StatusCode::OK, "submit failed: {}", resp.message());
        Uuid::parse_str(resp.json()["data"]["id"].as_str().unwrap()).unwrap()
    }

    pub async fn approve(&self, id: Uuid) {
        let resp = self
            .patch_admin(
                &format!("/api/admin/reviews/{}", id),
                serde_json::json!({ "status": "approved" }),
                Some(TEST_ADMIN_TOKEN),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "approve failed: {}", resp.message());
    }
}

// ---------------------------------------------------------------------------
// Multipart bodies
// ---------------------------------------------------------------------------

pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self { body: Vec::new() }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", BOUNDARY)
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}

/// Every required field of a review except the type-dependent content.
pub fn base_form(project: &str) -> MultipartForm {
    MultipartForm::new()
        .text("userName", "A")
        .text("userEmail", "a@b.com")
        .text("projectName", project)
        .text("rating", "5")
        .text("tags", "x")
}

pub fn text_review_form(project: &str) -> MultipartForm {
    base_form(project)
        .text("reviewType", "text")
        .text("reviewText", "a valid review body")
}

pub fn fake_video(len: usize) -> Vec<u8> {
    vec![0x1a; len]
}
