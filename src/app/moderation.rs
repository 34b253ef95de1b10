use anyhow::Result;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::domain::review::{Review, ReviewEdit, ReviewStatus, StatusChange};
use crate::infra::db::ReviewStore;

#[derive(Clone)]
pub struct ModerationService {
    store: Arc<dyn ReviewStore>,
}

impl ModerationService {
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, status: Option<ReviewStatus>) -> Result<Vec<Review>> {
        self.store.list(status).await
    }

    pub async fn update_status(
        &self,
        review_id: Uuid,
        status: ReviewStatus,
        admin_notes: Option<String>,
    ) -> Result<Option<Review>> {
        let change = StatusChange {
            status,
            admin_notes: admin_notes.filter(|notes| !notes.trim().is_empty()),
        };
        let updated = self
            .store
            .set_status(review_id, change, OffsetDateTime::now_utc())
            .await?;

        if updated.is_some() {
            tracing::info!(review_id = %review_id, status = status.as_db(), "review status changed");
        }
        Ok(updated)
    }

    pub async fn edit(&self, review_id: Uuid, edit: ReviewEdit) -> Result<Option<Review>> {
        self.store
            .edit(review_id, edit, OffsetDateTime::now_utc())
            .await
    }

    pub async fn set_rating_visibility(
        &self,
        review_id: Uuid,
        hide_rating: bool,
    ) -> Result<Option<Review>> {
        self.store
            .set_hide_rating(review_id, hide_rating, OffsetDateTime::now_utc())
            .await
    }

    pub async fn delete(&self, review_id: Uuid) -> Result<bool> {
        let removed = self.store.delete(review_id).await?;
        if removed {
            tracing::info!(review_id = %review_id, "review deleted");
        }
        Ok(removed)
    }
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_created_at(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    if let Ok(timestamp) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(timestamp);
    }

    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}
