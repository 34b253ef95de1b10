use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::domain::review::{NewReview, Review, ReviewEdit, ReviewStatus, ReviewType, StatusChange};

/// Persistence for review records. Mutations return `None` (or `false`)
/// when no record has the given id.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert(&self, review: NewReview) -> Result<Review>;

    /// Newest first. `None` lists every status.
    async fn list(&self, status: Option<ReviewStatus>) -> Result<Vec<Review>>;

    async fn set_status(
        &self,
        id: Uuid,
        change: StatusChange,
        updated_at: OffsetDateTime,
    ) -> Result<Option<Review>>;

    async fn edit(
        &self,
        id: Uuid,
        edit: ReviewEdit,
        updated_at: OffsetDateTime,
    ) -> Result<Option<Review>>;

    async fn set_hide_rating(
        &self,
        id: Uuid,
        hide_rating: bool,
        updated_at: OffsetDateTime,
    ) -> Result<Option<Review>>;

    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn ping(&self) -> Result<()>;
}

const REVIEW_COLUMNS: &str = "id, user_name, user_email, user_title, project_name, \
     project_description, tags, rating, review_type, review_text, video_url, status, \
     admin_notes, hide_rating, created_at, updated_at";

#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.db_idle_timeout_seconds))
            .max_lifetime(Duration::from_secs(config.db_max_lifetime_seconds))
            .connect(&config.database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ReviewStore for Db {
    async fn insert(&self, review: NewReview) -> Result<Review> {
        let row = sqlx::query(&format!(
            "INSERT INTO reviews (user_name, user_email, user_title, project_name, \
             project_description, tags, rating, review_type, review_text, video_url, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending') \
             RETURNING {}",
            REVIEW_COLUMNS
        ))
        .bind(&review.user_name)
        .bind(&review.user_email)
        .bind(&review.user_title)
        .bind(&review.project_name)
        .bind(&review.project_description)
        .bind(&review.tags)
        .bind(review.rating)
        .bind(review.review_type.as_db())
        .bind(&review.review_text)
        .bind(&review.video_url)
        .fetch_one(&self.pool)
        .await?;

        review_from_row(&row)
    }

    async fn list(&self, status: Option<ReviewStatus>) -> Result<Vec<Review>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(&format!(
                    "SELECT {} FROM reviews WHERE status = $1 ORDER BY created_at DESC, id DESC",
                    REVIEW_COLUMNS
                ))
                .bind(status.as_db())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM reviews ORDER BY created_at DESC, id DESC",
                    REVIEW_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(review_from_row).collect()
    }

    async fn set_status(
        &self,
        id: Uuid,
        change: StatusChange,
        updated_at: OffsetDateTime,
    ) -> Result<Option<Review>> {
        let row = sqlx::query(&format!(
            "UPDATE reviews SET status = $2, admin_notes = $3, updated_at = $4 \
             WHERE id = $1 RETURNING {}",
            REVIEW_COLUMNS
        ))
        .bind(id)
        .bind(change.status.as_db())
        .bind(change.admin_notes)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(review_from_row).transpose()
    }

    async fn edit(
        &self,
        id: Uuid,
        edit: ReviewEdit,
        updated_at: OffsetDateTime,
    ) -> Result<Option<Review>> {
        let row = sqlx::query(&format!(
            "UPDATE reviews SET \
                project_name = COALESCE($2, project_name), \
                tags = COALESCE($3, tags), \
                created_at = COALESCE($4, created_at), \
                updated_at = $5 \
             WHERE id = $1 RETURNING {}",
            REVIEW_COLUMNS
        ))
        .bind(id)
        .bind(edit.project_name)
        .bind(edit.tags)
        .bind(edit.created_at)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(review_from_row).transpose()
    }

    async fn set_hide_rating(
        &self,
        id: Uuid,
        hide_rating: bool,
        updated_at: OffsetDateTime,
    ) -> Result<Option<Review>> {
        let row = sqlx::query(&format!(
            "UPDATE reviews SET hide_rating = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            REVIEW_COLUMNS
        ))
        .bind(id)
        .bind(hide_rating)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(review_from_row).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn review_from_row(row: &PgRow) -> Result<Review> {
    let review_type: String = row.get("review_type");
    let status: String = row.get("status");

    Ok(Review {
        id: row.get("id"),
        user_name: row.get("user_name"),
        user_email: row.get("user_email"),
        user_title: row.get("user_title"),
        project_name: row.get("project_name"),
        project_description: row.get("project_description"),
        tags: row.get("tags"),
        rating: row.get("rating"),
        review_type: ReviewType::from_db(&review_type)
            .ok_or_else(|| anyhow!("unknown review_type in database: {}", review_type))?,
        review_text: row.get("review_text"),
        video_url: row.get("video_url"),
        status: ReviewStatus::from_db(&status)
            .ok_or_else(|| anyhow!("unknown status in database: {}", status))?,
        admin_notes: row.get("admin_notes"),
        hide_rating: row.get("hide_rating"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
