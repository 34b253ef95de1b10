use anyhow::Result;
use std::sync::Arc;
use thiserror::Error;

use crate::app::intake::ValidatedReview;
use crate::app::upload::{UploadRelay, VideoUpload};
use crate::domain::review::{NewReview, Review, ReviewStatus};
use crate::infra::db::ReviewStore;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("failed to upload video")]
    Upload(#[source] anyhow::Error),
    #[error("failed to save review")]
    Persist(#[source] anyhow::Error),
}

#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn ReviewStore>,
    relay: UploadRelay,
}

impl ReviewService {
    pub fn new(store: Arc<dyn ReviewStore>, relay: UploadRelay) -> Self {
        Self { store, relay }
    }

    /// Stores the video (when the review type carries one) and then the
    /// record. An upload failure leaves nothing persisted.
    pub async fn submit(
        &self,
        review: ValidatedReview,
        video: Option<VideoUpload>,
    ) -> Result<Review, SubmitError> {
        let video_url = match video {
            Some(upload) if review.review_type.needs_video() => {
                let public_url = self.relay.relay(upload).await.map_err(SubmitError::Upload)?;
                Some(public_url)
            }
            _ => None,
        };

        let new_review = NewReview {
            user_name: review.user_name,
            user_email: review.user_email,
            user_title: review.user_title,
            project_name: review.project_name,
            project_description: review.project_description,
            tags: review.tags,
            rating: review.rating,
            review_type: review.review_type,
            review_text: review.review_text,
            video_url,
        };

        self.store
            .insert(new_review)
            .await
            .map_err(SubmitError::Persist)
    }

    pub async fn list_approved(&self) -> Result<Vec<Review>> {
        let reviews = self.store.list(Some(ReviewStatus::Approved)).await?;
        Ok(reviews
            .into_iter()
            .filter(|review| review.status.is_public())
            .collect())
    }
}
