//! Submission rules shared by the review form and the submit handler.
//!
//! The browser runs these for quick feedback; the server runs them again
//! because anything the client checks can be bypassed.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::domain::review::ReviewType;

pub const MIN_REVIEW_TEXT_CHARS: usize = 10;
pub const MAX_VIDEO_SECONDS: f64 = 60.0;
pub const DEFAULT_MAX_VIDEO_BYTES: u64 = 50 * 1024 * 1024;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// Raw form fields as submitted.
#[derive(Debug, Clone, Default)]
pub struct ReviewDraft {
    pub user_name: String,
    pub user_email: String,
    pub user_title: Option<String>,
    pub project_name: String,
    pub project_description: Option<String>,
    pub tags: Vec<String>,
    pub rating: String,
    pub review_type: Option<String>,
    pub review_text: Option<String>,
}

/// What is known about an attached video at validation time.
#[derive(Debug, Clone)]
pub struct VideoFacts {
    pub size: u64,
    pub content_type: String,
    /// Only known in the browser once metadata has loaded.
    pub duration_secs: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct VideoPolicy {
    pub max_bytes: u64,
    /// `None` accepts any `video/*` type.
    pub allowed_types: Option<Vec<String>>,
    pub max_duration_secs: Option<f64>,
    /// The form reports an oversized file before looking at its type; the
    /// server filters by type as soon as the part header arrives.
    pub size_before_type: bool,
}

impl VideoPolicy {
    /// Rules the browser form applies before anything is sent.
    pub fn client() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_VIDEO_BYTES,
            allowed_types: None,
            max_duration_secs: Some(MAX_VIDEO_SECONDS),
            size_before_type: true,
        }
    }

    /// Server rules. Duration cannot be verified without decoding the file.
    pub fn server(max_bytes: u64, allowed_types: Vec<String>) -> Self {
        Self {
            max_bytes,
            allowed_types: Some(allowed_types),
            max_duration_secs: None,
            size_before_type: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedReview {
    pub user_name: String,
    pub user_email: String,
    pub user_title: Option<String>,
    pub project_name: String,
    pub project_description: Option<String>,
    pub tags: Vec<String>,
    pub rating: i16,
    pub review_type: ReviewType,
    pub review_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntakeError {
    #[error("Missing required fields")]
    MissingRequiredFields,
    #[error("At least one tag is required")]
    NoTags,
    #[error("Invalid review type: {0}")]
    InvalidReviewType(String),
    #[error("{}", text_required_message(.0))]
    ReviewTextTooShort(ReviewType),
    #[error("{}", video_required_message(.0))]
    VideoRequired(ReviewType),
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Rating must be an integer between 1 and 5")]
    InvalidRating,
    #[error("Invalid file type: {0}. Only video files are allowed.")]
    UnsupportedVideoType(String),
    #[error("File size too large. Maximum size is {}.", size_label(.max_bytes))]
    VideoTooLarge { max_bytes: u64 },
    #[error("Video duration exceeds {} seconds", whole_seconds(.max_secs))]
    VideoTooLong { max_secs: f64 },
}

fn text_required_message(review_type: &ReviewType) -> &'static str {
    match review_type {
        ReviewType::Both => {
            "Review text (min 10 chars) is required when submitting text + video review"
        }
        _ => "Review text must be at least 10 characters long",
    }
}

fn video_required_message(review_type: &ReviewType) -> &'static str {
    match review_type {
        ReviewType::Both => "Video file is required when submitting text + video review",
        _ => "Video file is required for video reviews",
    }
}

/// Human size for limit messages. Never overstates the limit: partial units
/// are shown to one decimal, rounded down.
pub fn size_label(bytes: &u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;

    let (unit, name) = match *bytes {
        b if b >= MB => (MB, "MB"),
        b if b >= KB => (KB, "KB"),
        b => return format!("{} bytes", b),
    };
    if bytes % unit == 0 {
        format!("{}{}", bytes / unit, name)
    } else {
        let tenths = bytes * 10 / unit;
        format!("{}.{}{}", tenths / 10, tenths % 10, name)
    }
}

fn whole_seconds(secs: &f64) -> u64 {
    *secs as u64
}

impl IntakeError {
    /// Copy shown in the browser alert for this failure.
    pub fn alert_message(&self) -> String {
        match self {
            Self::MissingRequiredFields => "Please fill in all required fields.".to_string(),
            Self::NoTags => "Please select at least one project category/tag.".to_string(),
            Self::InvalidReviewType(_) => "Please choose a review type.".to_string(),
            Self::ReviewTextTooShort(_) => {
                "Please write a meaningful review (at least 10 characters).".to_string()
            }
            Self::VideoRequired(_) => "Please upload a video review.".to_string(),
            Self::InvalidEmail => "Please enter a valid email address.".to_string(),
            Self::InvalidRating => "Please select a rating between 1 and 5.".to_string(),
            Self::UnsupportedVideoType(_) => "Please select a valid video file.".to_string(),
            Self::VideoTooLarge { max_bytes } => format!(
                "File size too large. Please select a video under {}.",
                size_label(max_bytes)
            ),
            Self::VideoTooLong { .. } => {
                "Video duration exceeds 1 minute. Please select a shorter video.".to_string()
            }
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Trimmed length in characters, not bytes.
pub fn meaningful_text_len(text: &str) -> usize {
    text.trim().chars().count()
}

/// Normalises the `tags` form values.
///
/// Several values are taken as-is. A single value may be a JSON array or a
/// comma separated list.
pub fn parse_tags(values: &[String]) -> Vec<String> {
    let raw: Vec<String> = match values {
        [single] => match serde_json::from_str::<Vec<String>>(single) {
            Ok(parsed) => parsed,
            Err(_) => single.split(',').map(str::to_string).collect(),
        },
        many => many.to_vec(),
    };

    raw.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Checks an attached file against the policy. Used when the file is picked
/// in the browser and again when the server reads the multipart part.
pub fn check_video(video: &VideoFacts, policy: &VideoPolicy) -> Result<(), IntakeError> {
    if policy.size_before_type {
        check_size(video, policy)?;
        check_type(video, policy)?;
    } else {
        check_type(video, policy)?;
        check_size(video, policy)?;
    }

    if let (Some(duration), Some(max_secs)) = (video.duration_secs, policy.max_duration_secs) {
        if duration > max_secs {
            return Err(IntakeError::VideoTooLong { max_secs });
        }
    }

    Ok(())
}

fn check_type(video: &VideoFacts, policy: &VideoPolicy) -> Result<(), IntakeError> {
    let essence = mime_essence(&video.content_type);
    let type_ok = match &policy.allowed_types {
        Some(allowed) => allowed.iter().any(|t| t.eq_ignore_ascii_case(&essence)),
        None => essence.starts_with("video/"),
    };
    if !type_ok {
        return Err(IntakeError::UnsupportedVideoType(video.content_type.clone()));
    }
    Ok(())
}

fn check_size(video: &VideoFacts, policy: &VideoPolicy) -> Result<(), IntakeError> {
    if video.size > policy.max_bytes {
        return Err(IntakeError::VideoTooLarge {
            max_bytes: policy.max_bytes,
        });
    }
    Ok(())
}

/// Applies every submission rule. Nothing is returned unless all rules pass.
pub fn validate(
    draft: &ReviewDraft,
    video: Option<&VideoFacts>,
    policy: &VideoPolicy,
) -> Result<ValidatedReview, IntakeError> {
    let user_name = draft.user_name.trim();
    let user_email = draft.user_email.trim();
    let project_name = draft.project_name.trim();
    let rating = draft.rating.trim();

    if user_name.is_empty() || user_email.is_empty() || project_name.is_empty() || rating.is_empty()
    {
        return Err(IntakeError::MissingRequiredFields);
    }

    let tags: Vec<String> = draft
        .tags
        .iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect();
    if tags.is_empty() {
        return Err(IntakeError::NoTags);
    }

    let review_type = match draft.review_type.as_deref().map(str::trim) {
        None | Some("") => ReviewType::Text,
        Some(value) => ReviewType::from_db(value)
            .ok_or_else(|| IntakeError::InvalidReviewType(value.to_string()))?,
    };

    let review_text = non_empty(draft.review_text.as_deref());
    if review_type.needs_text() {
        let long_enough = review_text
            .as_deref()
            .map(|text| meaningful_text_len(text) >= MIN_REVIEW_TEXT_CHARS)
            .unwrap_or(false);
        if !long_enough {
            return Err(IntakeError::ReviewTextTooShort(review_type));
        }
    }

    if review_type.needs_video() {
        match video {
            Some(facts) if facts.size > 0 => check_video(facts, policy)?,
            _ => return Err(IntakeError::VideoRequired(review_type)),
        }
    }

    if !is_valid_email(user_email) {
        return Err(IntakeError::InvalidEmail);
    }

    let rating = rating
        .parse::<i16>()
        .ok()
        .filter(|value| (1..=5).contains(value))
        .ok_or(IntakeError::InvalidRating)?;

    Ok(ValidatedReview {
        user_name: user_name.to_string(),
        user_email: user_email.to_string(),
        user_title: non_empty(draft.user_title.as_deref()),
        project_name: project_name.to_string(),
        project_description: non_empty(draft.project_description.as_deref()),
        tags,
        rating,
        review_type,
        review_text,
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}
