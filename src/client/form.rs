//! State of one review form instance.

use crate::app::intake::{
    self, IntakeError, ReviewDraft, ValidatedReview, VideoFacts, VideoPolicy,
    MIN_REVIEW_TEXT_CHARS,
};
use crate::client::recorder::RecordedVideo;
use crate::domain::review::ReviewType;

pub const SUBMITTED_ALERT: &str = "Thank you for your review! It will be published after moderation.";
pub const REVIEW_TEXT_MAX_CHARS: usize = 1000;
pub const NETWORK_ALERT: &str = "Failed to submit review. Please try again.";

/// A file the user picked or recorded.
#[derive(Debug, Clone)]
pub struct SelectedVideo {
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    pub duration_secs: Option<f64>,
}

impl SelectedVideo {
    fn facts(&self) -> VideoFacts {
        VideoFacts {
            size: self.size,
            content_type: self.content_type.clone(),
            duration_secs: self.duration_secs,
        }
    }
}

/// Which content sections are shown and required for a review type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sections {
    pub text: bool,
    pub video: bool,
}

impl Sections {
    pub fn for_type(review_type: ReviewType) -> Self {
        Self {
            text: review_type.needs_text(),
            video: review_type.needs_video(),
        }
    }
}

/// How a submit request ended, as seen by the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    /// The server answered with `success: false` and this message.
    Rejected(String),
    NetworkFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Plain,
    Email,
    ReviewText,
}

pub struct ReviewForm {
    pub draft: ReviewDraft,
    video: Option<SelectedVideo>,
    policy: VideoPolicy,
}

impl Default for ReviewForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewForm {
    pub fn new() -> Self {
        Self::with_policy(VideoPolicy::client())
    }

    pub fn with_policy(policy: VideoPolicy) -> Self {
        Self {
            draft: ReviewDraft {
                review_type: Some(ReviewType::Text.as_db().to_string()),
                ..ReviewDraft::default()
            },
            video: None,
            policy,
        }
    }

    pub fn review_type(&self) -> ReviewType {
        self.draft
            .review_type
            .as_deref()
            .and_then(ReviewType::from_db)
            .unwrap_or(ReviewType::Text)
    }

    pub fn set_review_type(&mut self, review_type: ReviewType) -> Sections {
        self.draft.review_type = Some(review_type.as_db().to_string());
        Sections::for_type(review_type)
    }

    pub fn video(&self) -> Option<&SelectedVideo> {
        self.video.as_ref()
    }

    /// Type and size are checked on selection; a rejected file is dropped.
    pub fn select_video(&mut self, video: SelectedVideo) -> Result<(), IntakeError> {
        if let Err(err) = intake::check_video(&video.facts(), &self.policy) {
            self.video = None;
            return Err(err);
        }
        self.video = Some(video);
        Ok(())
    }

    /// Duration is only known once the preview has loaded metadata.
    pub fn video_metadata_loaded(&mut self, duration_secs: f64) -> Result<(), IntakeError> {
        let Some(video) = self.video.as_mut() else {
            return Ok(());
        };
        video.duration_secs = Some(duration_secs);
        if let Err(err) = intake::check_video(&video.facts(), &self.policy) {
            self.video = None;
            return Err(err);
        }
        Ok(())
    }

    pub fn attach_recording(&mut self, recording: &RecordedVideo) -> Result<(), IntakeError> {
        self.select_video(SelectedVideo {
            file_name: recording.file_name.clone(),
            content_type: recording.content_type.to_string(),
            size: recording.bytes.len() as u64,
            duration_secs: Some(recording.duration_secs as f64),
        })
    }

    pub fn remove_video(&mut self) {
        self.video = None;
    }

    /// Runs the submit-time rules. The error's `alert_message()` is what the
    /// user sees.
    pub fn validate(&self) -> Result<ValidatedReview, IntakeError> {
        let facts = self.video.as_ref().map(SelectedVideo::facts);
        intake::validate(&self.draft, facts.as_ref(), &self.policy)
    }

    /// Alert text for a finished submit. Only an accepted review clears the
    /// form; otherwise the user's input stays for another attempt.
    pub fn finish_submit(&mut self, outcome: SubmitOutcome) -> String {
        match outcome {
            SubmitOutcome::Accepted => {
                self.reset();
                SUBMITTED_ALERT.to_string()
            }
            SubmitOutcome::Rejected(message) => format!("Error: {}", message),
            SubmitOutcome::NetworkFailure => NETWORK_ALERT.to_string(),
        }
    }

    /// Back to a blank text review after a successful submit.
    pub fn reset(&mut self) -> Sections {
        self.draft = ReviewDraft::default();
        self.video = None;
        self.set_review_type(ReviewType::Text)
    }
}

/// Inline message for a single field as the user types or leaves it.
pub fn field_error(kind: FieldKind, value: &str, required: bool) -> Option<&'static str> {
    let value = value.trim();
    if value.is_empty() {
        return required.then_some("This field is required.");
    }

    match kind {
        FieldKind::Email if !intake::is_valid_email(value) => {
            Some("Please enter a valid email address.")
        }
        FieldKind::ReviewText if intake::meaningful_text_len(value) < MIN_REVIEW_TEXT_CHARS => {
            Some("Please write at least 10 characters.")
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterLevel {
    Normal,
    Warning,
    Danger,
}

/// Counter under the review text area: `"<n>/1000 characters"`, turning to
/// a warning past 70% of the limit and to danger past 90%.
pub fn character_counter(value: &str) -> (String, CounterLevel) {
    let count = value.chars().count();
    let level = if count * 10 > REVIEW_TEXT_MAX_CHARS * 9 {
        CounterLevel::Danger
    } else if count * 10 > REVIEW_TEXT_MAX_CHARS * 7 {
        CounterLevel::Warning
    } else {
        CounterLevel::Normal
    };
    (format!("{}/{} characters", count, REVIEW_TEXT_MAX_CHARS), level)
}
