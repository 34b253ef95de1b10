use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app::intake::{self, IntakeError, ReviewDraft, VideoFacts, VideoPolicy};
use crate::app::moderation::{parse_created_at, ModerationService};
use crate::app::reviews::{ReviewService, SubmitError};
use crate::app::upload::{UploadRelay, VideoUpload};
use crate::domain::review::{Review, ReviewEdit, ReviewStatus};
use crate::http::envelope::Envelope;
use crate::http::{AdminToken, AppError};
use crate::AppState;

type JsonEnvelope<T> = Json<Envelope<T>>;

fn review_service(state: &AppState) -> ReviewService {
    ReviewService::new(
        state.reviews.clone(),
        UploadRelay::new(state.videos.clone(), state.video_key_prefix.clone()),
    )
}

fn upload_policy(state: &AppState) -> VideoPolicy {
    VideoPolicy::server(
        state.upload_max_bytes,
        state.allowed_video_types.as_ref().clone(),
    )
}

fn review_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::not_found("Review not found"))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

#[derive(Serialize)]
pub(crate) struct HealthData {
    timestamp: String,
    database: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> JsonEnvelope<HealthData> {
    let database = match state.reviews.ping().await {
        Ok(()) => "ok",
        Err(err) => {
            tracing::warn!(error = ?err, "database ping failed");
            "degraded"
        }
    };
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();

    Json(Envelope::with_message(
        "Server is running",
        HealthData {
            timestamp,
            database,
        },
    ))
}

pub(crate) async fn not_found() -> AppError {
    AppError::not_found("Endpoint not found")
}

// ---------------------------------------------------------------------------
// Public review endpoints
// ---------------------------------------------------------------------------

pub async fn submit_review(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<JsonEnvelope<Review>, AppError> {
    let multipart =
        multipart.map_err(|_| AppError::bad_request("Expected multipart/form-data body"))?;
    let policy = upload_policy(&state);
    let (draft, video) = read_submission(multipart, &policy).await?;

    let facts = video.as_ref().map(|upload| VideoFacts {
        size: upload.bytes.len() as u64,
        content_type: upload.content_type.clone(),
        duration_secs: None,
    });
    let validated = intake::validate(&draft, facts.as_ref(), &policy)
        .map_err(|err| AppError::bad_request(err.to_string()))?;

    let review = review_service(&state)
        .submit(validated, video)
        .await
        .map_err(|err| match err {
            SubmitError::Upload(source) => {
                tracing::error!(error = ?source, "failed to upload review video");
                AppError::internal("Failed to upload video")
            }
            SubmitError::Persist(source) => {
                tracing::error!(error = ?source, "failed to save review");
                AppError::internal("Failed to save review")
            }
        })?;

    tracing::info!(review_id = %review.id, review_type = review.review_type.as_db(), "review submitted");

    Ok(Json(Envelope::with_message(
        "Review submitted successfully! It will be published after moderation.",
        review,
    )))
}

/// Reads the submit form. The video part is filtered by type and size as
/// soon as it is read; an empty file part counts as no file.
async fn read_submission(
    mut multipart: Multipart,
    policy: &VideoPolicy,
) -> Result<(ReviewDraft, Option<VideoUpload>), AppError> {
    let mut draft = ReviewDraft::default();
    let mut tag_values = Vec::new();
    let mut video = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(err, policy))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "videoUpload" {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field
                .content_type()
                .map(str::to_string)
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|err| multipart_error(err, policy))?;
            if bytes.is_empty() {
                continue;
            }

            let facts = VideoFacts {
                size: bytes.len() as u64,
                content_type: content_type.clone(),
                duration_secs: None,
            };
            intake::check_video(&facts, policy)
                .map_err(|err| AppError::bad_request(err.to_string()))?;

            video = Some(VideoUpload {
                bytes,
                content_type,
                file_name,
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|err| multipart_error(err, policy))?;
        match name.as_str() {
            "userName" => draft.user_name = value,
            "userEmail" => draft.user_email = value,
            "userTitle" => draft.user_title = Some(value),
            "projectName" => draft.project_name = value,
            "projectDescription" => draft.project_description = Some(value),
            "tags" | "tags[]" => tag_values.push(value),
            "rating" => draft.rating = value,
            "reviewType" => draft.review_type = Some(value),
            "reviewText" => draft.review_text = Some(value),
            _ => {}
        }
    }

    draft.tags = intake::parse_tags(&tag_values);
    Ok((draft, video))
}

fn multipart_error(err: MultipartError, policy: &VideoPolicy) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::bad_request(
            IntakeError::VideoTooLarge {
                max_bytes: policy.max_bytes,
            }
            .to_string(),
        );
    }
    tracing::warn!(error = %err, "malformed multipart body");
    AppError::bad_request("Invalid multipart form data")
}

pub async fn list_approved_reviews(
    State(state): State<AppState>,
) -> Result<JsonEnvelope<Vec<Review>>, AppError> {
    let reviews = review_service(&state)
        .list_approved()
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to fetch approved reviews");
            AppError::internal("Failed to fetch reviews")
        })?;

    Ok(Json(Envelope::data(reviews)))
}

// ---------------------------------------------------------------------------
// Moderation endpoints
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct AdminListQuery {
    pub status: Option<String>,
}

pub async fn list_all_reviews(
    _admin: AdminToken,
    State(state): State<AppState>,
    query: Result<Query<AdminListQuery>, QueryRejection>,
) -> Result<JsonEnvelope<Vec<Review>>, AppError> {
    let Query(query) = query.map_err(|_| AppError::bad_request("Invalid query"))?;
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(value) => Some(
            ReviewStatus::from_db(value).ok_or_else(|| AppError::bad_request("Invalid status"))?,
        ),
    };

    let reviews = ModerationService::new(state.reviews.clone())
        .list(status)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to fetch reviews for moderation");
            AppError::internal("Failed to fetch reviews")
        })?;

    Ok(Json(Envelope::data(reviews)))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

pub async fn update_review_status(
    _admin: AdminToken,
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<JsonEnvelope<Review>, AppError> {
    let id = review_id(path)?;
    let payload = json_body(body)?;
    let status = payload
        .status
        .as_deref()
        .and_then(ReviewStatus::from_db)
        .ok_or_else(|| AppError::bad_request("Invalid status"))?;

    let updated = ModerationService::new(state.reviews.clone())
        .update_status(id, status, payload.admin_notes)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, review_id = %id, "failed to update review status");
            AppError::internal("Failed to update review")
        })?;

    match updated {
        Some(review) => Ok(Json(Envelope::with_message(
            "Review status updated successfully",
            review,
        ))),
        None => Err(AppError::not_found("Review not found")),
    }
}

#[derive(Deserialize)]
pub struct EditReviewRequest {
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub created_at: Option<String>,
}

pub async fn edit_review(
    _admin: AdminToken,
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<EditReviewRequest>, JsonRejection>,
) -> Result<JsonEnvelope<Review>, AppError> {
    let id = review_id(path)?;
    let payload = json_body(body)?;

    let project_name = match payload.project_name {
        Some(name) if name.trim().is_empty() => {
            return Err(AppError::bad_request("Project name cannot be empty"));
        }
        Some(name) => Some(name.trim().to_string()),
        None => None,
    };

    let tags = match payload.tags {
        Some(tags) => {
            let tags: Vec<String> = tags
                .iter()
                .map(|tag| tag.trim())
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect();
            if tags.is_empty() {
                return Err(AppError::bad_request(IntakeError::NoTags.to_string()));
            }
            Some(tags)
        }
        None => None,
    };

    let created_at = match payload.created_at.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(value) => Some(
            parse_created_at(value)
                .ok_or_else(|| AppError::bad_request("Invalid created_at value"))?,
        ),
    };

    let edit = ReviewEdit {
        project_name,
        tags,
        created_at,
    };

    let updated = ModerationService::new(state.reviews.clone())
        .edit(id, edit)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, review_id = %id, "failed to edit review");
            AppError::internal("Failed to update review")
        })?;

    match updated {
        Some(review) => Ok(Json(Envelope::data(review))),
        None => Err(AppError::not_found("Review not found")),
    }
}

#[derive(Deserialize)]
pub struct ToggleRatingRequest {
    pub hide_rating: bool,
}

pub async fn toggle_rating(
    _admin: AdminToken,
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ToggleRatingRequest>, JsonRejection>,
) -> Result<JsonEnvelope<Review>, AppError> {
    let id = review_id(path)?;
    let payload = json_body(body)?;

    let updated = ModerationService::new(state.reviews.clone())
        .set_rating_visibility(id, payload.hide_rating)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, review_id = %id, "failed to toggle rating visibility");
            AppError::internal("Failed to update review")
        })?;

    match updated {
        Some(review) => Ok(Json(Envelope::data(review))),
        None => Err(AppError::not_found("Review not found")),
    }
}

pub async fn delete_review(
    _admin: AdminToken,
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<JsonEnvelope<()>, AppError> {
    let id = review_id(path)?;

    let removed = ModerationService::new(state.reviews.clone())
        .delete(id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, review_id = %id, "failed to delete review");
            AppError::internal("Failed to delete review")
        })?;

    if removed {
        Ok(Json(Envelope::<()>::message("Review deleted successfully")))
    } else {
        Err(AppError::not_found("Review not found"))
    }
}
