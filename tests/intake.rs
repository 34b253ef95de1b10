//! Intake Rule Tests
//!
//! Submission rules, tag parsing, video checks and the small helpers the
//! handlers lean on.

use sitefy_reviews::app::intake::{
    check_video, is_valid_email, meaningful_text_len, parse_tags, size_label, validate,
    IntakeError, ReviewDraft, VideoFacts, VideoPolicy,
};
use sitefy_reviews::app::moderation::parse_created_at;
use sitefy_reviews::app::upload::extension_for;
use sitefy_reviews::domain::review::ReviewType;
use sitefy_reviews::infra::storage::public_object_url;
use url::Url;

fn draft() -> ReviewDraft {
    ReviewDraft {
        user_name: "Ada".into(),
        user_email: "ada@example.com".into(),
        user_title: Some("".into()),
        project_name: "Landing page".into(),
        project_description: None,
        tags: vec!["web".into()],
        rating: "5".into(),
        review_type: Some("text".into()),
        review_text: Some("Great work on the site".into()),
    }
}

fn mp4(size: u64) -> VideoFacts {
    VideoFacts {
        size,
        content_type: "video/mp4".into(),
        duration_secs: None,
    }
}

fn server_policy() -> VideoPolicy {
    VideoPolicy::server(
        10 * 1024 * 1024,
        vec!["video/mp4".into(), "video/webm".into()],
    )
}

// ===========================================================================
// validate
// ===========================================================================

#[test]
fn valid_text_review_passes() {
    let review = validate(&draft(), None, &server_policy()).unwrap();

    assert_eq!(review.rating, 5);
    assert_eq!(review.review_type, ReviewType::Text);
    assert_eq!(review.user_title, None);
    assert_eq!(review.tags, vec!["web".to_string()]);
}

#[test]
fn whitespace_only_required_field_is_missing() {
    let mut d = draft();
    d.user_name = "   ".into();

    assert_eq!(
        validate(&d, None, &server_policy()).unwrap_err(),
        IntakeError::MissingRequiredFields
    );
}

#[test]
fn required_fields_checked_before_email() {
    let mut d = draft();
    d.user_email = "nope".into();
    d.rating = "".into();

    assert_eq!(
        validate(&d, None, &server_policy()).unwrap_err(),
        IntakeError::MissingRequiredFields
    );
}

#[test]
fn text_length_counts_trimmed_characters() {
    let mut d = draft();
    d.review_text = Some("   short     ".into());
    assert_eq!(
        validate(&d, None, &server_policy()).unwrap_err(),
        IntakeError::ReviewTextTooShort(ReviewType::Text)
    );

    // Ten multi-byte characters are enough.
    d.review_text = Some("éééééééééé".into());
    assert!(validate(&d, None, &server_policy()).is_ok());
    assert_eq!(meaningful_text_len("  éééééééééé  "), 10);
}

#[test]
fn video_review_needs_non_empty_file() {
    let mut d = draft();
    d.review_type = Some("video".into());
    d.review_text = None;

    let err = validate(&d, Some(&mp4(0)), &server_policy()).unwrap_err();
    assert_eq!(err, IntakeError::VideoRequired(ReviewType::Video));
    assert_eq!(err.to_string(), "Video file is required for video reviews");

    let review = validate(&d, Some(&mp4(1024)), &server_policy()).unwrap();
    assert_eq!(review.review_type, ReviewType::Video);
    assert_eq!(review.review_text, None);
}

#[test]
fn both_review_messages() {
    let mut d = draft();
    d.review_type = Some("both".into());

    let err = validate(&d, None, &server_policy()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Video file is required when submitting text + video review"
    );

    d.review_text = Some("meh".into());
    let err = validate(&d, Some(&mp4(10)), &server_policy()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Review text (min 10 chars) is required when submitting text + video review"
    );
}

#[test]
fn rating_must_be_integer_in_range() {
    for bad in ["0", "6", "3.5", "x", "-2"] {
        let mut d = draft();
        d.rating = bad.into();
        assert_eq!(
            validate(&d, None, &server_policy()).unwrap_err(),
            IntakeError::InvalidRating,
            "rating {:?}",
            bad
        );
    }
    for good in ["1", " 3 ", "5"] {
        let mut d = draft();
        d.rating = good.into();
        assert!(validate(&d, None, &server_policy()).is_ok(), "rating {:?}", good);
    }
}

#[test]
fn alert_messages_match_form_copy() {
    assert_eq!(
        IntakeError::NoTags.alert_message(),
        "Please select at least one project category/tag."
    );
    assert_eq!(
        IntakeError::VideoTooLarge {
            max_bytes: 50 * 1024 * 1024
        }
        .alert_message(),
        "File size too large. Please select a video under 50MB."
    );
    assert_eq!(
        IntakeError::VideoTooLong { max_secs: 60.0 }.alert_message(),
        "Video duration exceeds 1 minute. Please select a shorter video."
    );
}

#[test]
fn email_pattern() {
    assert!(is_valid_email("ada@example.com"));
    assert!(is_valid_email("a.b+c@sub.domain.io"));
    assert!(!is_valid_email("ada@example"));
    assert!(!is_valid_email("ada example@x.com"));
    assert!(!is_valid_email("@example.com"));
    assert!(!is_valid_email(""));
}

// ===========================================================================
// Tags
// ===========================================================================

#[test]
fn tags_from_json_array() {
    let tags = parse_tags(&[r#"["web", " seo ", ""]"#.to_string()]);
    assert_eq!(tags, vec!["web".to_string(), "seo".to_string()]);
}

#[test]
fn tags_from_comma_list() {
    let tags = parse_tags(&["web, ads,,branding ".to_string()]);
    assert_eq!(
        tags,
        vec!["web".to_string(), "ads".to_string(), "branding".to_string()]
    );
}

#[test]
fn tags_from_repeated_fields() {
    let tags = parse_tags(&["web".to_string(), " ".to_string(), "ads".to_string()]);
    assert_eq!(tags, vec!["web".to_string(), "ads".to_string()]);
    assert!(parse_tags(&[]).is_empty());
}

// ===========================================================================
// Video checks
// ===========================================================================

#[test]
fn server_allow_list_is_exact() {
    let policy = server_policy();

    assert!(check_video(&mp4(10), &policy).is_ok());

    let with_params = VideoFacts {
        content_type: "video/webm; codecs=vp9".into(),
        ..mp4(10)
    };
    assert!(check_video(&with_params, &policy).is_ok());

    let quicktime = VideoFacts {
        content_type: "video/quicktime".into(),
        ..mp4(10)
    };
    assert_eq!(
        check_video(&quicktime, &policy).unwrap_err().to_string(),
        "Invalid file type: video/quicktime. Only video files are allowed."
    );
}

#[test]
fn client_accepts_any_video_type() {
    let policy = VideoPolicy::client();
    let quicktime = VideoFacts {
        content_type: "video/quicktime".into(),
        ..mp4(10)
    };
    assert!(check_video(&quicktime, &policy).is_ok());

    let image = VideoFacts {
        content_type: "image/png".into(),
        ..mp4(10)
    };
    assert!(matches!(
        check_video(&image, &policy),
        Err(IntakeError::UnsupportedVideoType(_))
    ));
}

#[test]
fn size_limit_is_inclusive() {
    let policy = server_policy();
    assert!(check_video(&mp4(policy.max_bytes), &policy).is_ok());

    let err = check_video(&mp4(policy.max_bytes + 1), &policy).unwrap_err();
    assert_eq!(err.to_string(), "File size too large. Maximum size is 10MB.");
}

#[test]
fn client_reports_size_before_type() {
    let big_image = VideoFacts {
        size: 60 * 1024 * 1024,
        content_type: "image/png".into(),
        duration_secs: None,
    };

    let err = check_video(&big_image, &VideoPolicy::client()).unwrap_err();
    assert_eq!(
        err.alert_message(),
        "File size too large. Please select a video under 50MB."
    );

    let server = VideoPolicy::server(1024, vec!["video/mp4".into()]);
    assert!(matches!(
        check_video(&big_image, &server),
        Err(IntakeError::UnsupportedVideoType(_))
    ));
}

#[test]
fn limit_labels_never_overstate() {
    assert_eq!(size_label(&(50 * 1024 * 1024)), "50MB");
    assert_eq!(size_label(&(1536 * 1024)), "1.5MB");
    assert_eq!(size_label(&(2 * 1024 * 1024 - 1)), "1.9MB");
    assert_eq!(size_label(&1024), "1KB");
    assert_eq!(size_label(&1500), "1.4KB");
    assert_eq!(size_label(&500), "500 bytes");
    assert_eq!(
        IntakeError::VideoTooLarge { max_bytes: 512 }.to_string(),
        "File size too large. Maximum size is 512 bytes."
    );
}

#[test]
fn client_duration_limit() {
    let policy = VideoPolicy::client();
    let at_limit = VideoFacts {
        duration_secs: Some(60.0),
        ..mp4(10)
    };
    assert!(check_video(&at_limit, &policy).is_ok());

    let too_long = VideoFacts {
        duration_secs: Some(60.5),
        ..mp4(10)
    };
    assert_eq!(
        check_video(&too_long, &policy).unwrap_err(),
        IntakeError::VideoTooLong { max_secs: 60.0 }
    );

    // The server has no duration rule.
    assert!(check_video(&too_long, &server_policy()).is_ok());
}

// ===========================================================================
// Helpers
// ===========================================================================

#[test]
fn extension_prefers_file_name() {
    assert_eq!(extension_for(Some("Clip.MOV"), "video/mp4"), "mov");
    assert_eq!(extension_for(Some("review-1700000000000.webm"), "video/webm"), "webm");
    assert_eq!(extension_for(Some("weird.m p4"), "application/x-nothing-known"), "bin");
    assert_eq!(extension_for(None, "application/x-nothing-known"), "bin");
}

#[test]
fn created_at_accepts_timestamp_or_date() {
    let ts = parse_created_at("2024-02-03T04:05:06Z").unwrap();
    assert_eq!(ts.unix_timestamp(), 1_706_933_106);

    let date = parse_created_at(" 2024-02-03 ").unwrap();
    assert_eq!(date.unix_timestamp(), 1_706_918_400);

    assert!(parse_created_at("03/02/2024").is_none());
    assert!(parse_created_at("").is_none());
}

#[test]
fn public_url_joins_base_and_key() {
    let base = Url::parse("https://cdn.example.com/review-media").unwrap();
    assert_eq!(
        public_object_url(&base, "review-videos/abc.mp4").unwrap(),
        "https://cdn.example.com/review-media/review-videos/abc.mp4"
    );

    let trailing = Url::parse("https://cdn.example.com/media/").unwrap();
    assert_eq!(
        public_object_url(&trailing, "review-videos/a b.webm").unwrap(),
        "https://cdn.example.com/media/review-videos/a%20b.webm"
    );
}
