//! Course content: modules and the video chapters they group.
//!
//! Rows decode through private DTOs so every value reaching a screen has
//! passed the same validation as user input.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Validation errors raised while building course values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseValidationError {
    EmptyId { field: &'static str },
    PaddedId { field: &'static str },
    EmptyTitle,
    TitleTooLong { max: usize },
    InvalidVideoLink { reason: String },
    UnknownStatus { value: String },
}

impl fmt::Display for CourseValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId { field } => write!(f, "{field} must not be empty"),
            Self::PaddedId { field } => {
                write!(f, "{field} must not contain surrounding whitespace")
            }
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::TitleTooLong { max } => write!(f, "title must be at most {max} characters"),
            Self::InvalidVideoLink { reason } => write!(f, "invalid video link: {reason}"),
            Self::UnknownStatus { value } => {
                write!(f, "status must be \"draft\" or \"live\", got \"{value}\"")
            }
        }
    }
}

impl std::error::Error for CourseValidationError {}

/// Maximum length of module and chapter titles.
pub const TITLE_MAX: usize = 120;

fn validate_id(raw: String, field: &'static str) -> Result<String, CourseValidationError> {
    if raw.is_empty() {
        return Err(CourseValidationError::EmptyId { field });
    }
    if raw.trim() != raw {
        return Err(CourseValidationError::PaddedId { field });
    }
    Ok(raw)
}

fn validate_title(raw: &str) -> Result<String, CourseValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CourseValidationError::EmptyTitle);
    }
    if trimmed.chars().count() > TITLE_MAX {
        return Err(CourseValidationError::TitleTooLong { max: TITLE_MAX });
    }
    Ok(trimmed.to_owned())
}

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident, $validate:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Validate and construct a [`", stringify!($name), "`].")]
            pub fn new(value: impl Into<String>) -> Result<Self, CourseValidationError> {
                let validate: fn(String) -> Result<String, CourseValidationError> = $validate;
                validate(value.into()).map(Self)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = CourseValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

string_newtype!(
    /// Opaque module identifier assigned by the data gateway.
    ModuleId,
    |raw| validate_id(raw, "module id")
);
string_newtype!(
    /// Opaque chapter identifier assigned by the data gateway.
    ChapterId,
    |raw| validate_id(raw, "chapter id")
);
string_newtype!(
    /// Module heading shown in the sidebar list and breadcrumb.
    ModuleTitle,
    |raw| validate_title(&raw)
);
string_newtype!(
    /// Chapter heading shown above the player.
    ChapterTitle,
    |raw| validate_title(&raw)
);

/// Publication state of a chapter. Only live chapters reach learners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterStatus {
    /// Work in progress, visible to admins only.
    #[default]
    Draft,
    /// Published.
    Live,
}

impl ChapterStatus {
    /// Wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Live => "live",
        }
    }
}

impl fmt::Display for ChapterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChapterStatus {
    type Err = CourseValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "live" => Ok(Self::Live),
            other => Err(CourseValidationError::UnknownStatus {
                value: other.to_owned(),
            }),
        }
    }
}

static VIDEO_ID_RE: OnceLock<Regex> = OnceLock::new();

fn video_id_regex() -> &'static Regex {
    VIDEO_ID_RE.get_or_init(|| {
        let pattern = r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("video id regex failed to compile: {error}"))
    })
}

/// Length of a YouTube video id.
pub const VIDEO_ID_LEN: usize = 11;

/// Absolute `http`/`https` link to a chapter video.
///
/// # Examples
/// ```
/// use academy_client::domain::VideoLink;
///
/// let link = VideoLink::new("https://youtu.be/dQw4w9WgXcQ").unwrap();
/// assert_eq!(link.video_id(), Some("dQw4w9WgXcQ"));
/// assert_eq!(
///     link.embed_url().as_deref(),
///     Some("https://www.youtube.com/embed/dQw4w9WgXcQ"),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoLink(String);

impl VideoLink {
    /// Validate and construct a [`VideoLink`].
    pub fn new(raw: impl Into<String>) -> Result<Self, CourseValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        let parsed = Url::parse(trimmed).map_err(|err| CourseValidationError::InvalidVideoLink {
            reason: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CourseValidationError::InvalidVideoLink {
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The eleven character video id, when the link has a recognisable shape.
    pub fn video_id(&self) -> Option<&str> {
        let captures = video_id_regex().captures(&self.0)?;
        let id = captures.get(2)?.as_str();
        (id.len() == VIDEO_ID_LEN).then_some(id)
    }

    /// Player URL for the embedded video.
    pub fn embed_url(&self) -> Option<String> {
        self.video_id()
            .map(|id| format!("https://www.youtube.com/embed/{id}"))
    }
}

impl AsRef<str> for VideoLink {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for VideoLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<VideoLink> for String {
    fn from(value: VideoLink) -> Self {
        value.0
    }
}

impl TryFrom<String> for VideoLink {
    type Error = CourseValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A named grouping of chapters (`modules` row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    id: ModuleId,
    title: ModuleTitle,
}

impl Module {
    /// Build a module from validated parts.
    pub fn new(id: ModuleId, title: ModuleTitle) -> Self {
        Self { id, title }
    }

    /// Identifier.
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    /// Title.
    pub fn title(&self) -> &ModuleTitle {
        &self.title
    }

    /// Same module under a new title.
    #[must_use]
    pub fn renamed(&self, title: ModuleTitle) -> Self {
        Self::new(self.id.clone(), title)
    }
}

/// A single video lesson (`chapters` row).
///
/// ## Invariants
/// - `module_id` references an existing module; the gateway enforces this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    id: ChapterId,
    #[serde(flatten)]
    draft: ChapterDraft,
}

impl Chapter {
    /// Attach an id to a draft.
    pub fn new(id: ChapterId, draft: ChapterDraft) -> Self {
        Self { id, draft }
    }

    /// Identifier.
    pub fn id(&self) -> &ChapterId {
        &self.id
    }

    /// Title.
    pub fn title(&self) -> &ChapterTitle {
        &self.draft.title
    }

    /// Owning module.
    pub fn module_id(&self) -> &ModuleId {
        &self.draft.module_id
    }

    /// Video link.
    pub fn youtube_link(&self) -> &VideoLink {
        &self.draft.youtube_link
    }

    /// Publication state.
    pub fn status(&self) -> ChapterStatus {
        self.draft.status
    }

    /// True when learners may see the chapter.
    pub fn is_live(&self) -> bool {
        self.draft.status == ChapterStatus::Live
    }

    /// Editable fields.
    pub fn draft(&self) -> &ChapterDraft {
        &self.draft
    }

    /// Same chapter with all editable fields replaced.
    #[must_use]
    pub fn with_draft(&self, draft: ChapterDraft) -> Self {
        Self::new(self.id.clone(), draft)
    }
}

/// Editable chapter fields, used for both create and update requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterDraft {
    /// Chapter heading.
    pub title: ChapterTitle,
    /// Owning module.
    pub module_id: ModuleId,
    /// Video link.
    pub youtube_link: VideoLink,
    /// Publication state; new chapters start as drafts.
    #[serde(default)]
    pub status: ChapterStatus,
}

#[cfg(test)]
mod tests {
    //! Validation and decoding of course rows.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("", CourseValidationError::EmptyId { field: "module id" })]
    #[case(" m1", CourseValidationError::PaddedId { field: "module id" })]
    fn module_id_rejects_invalid(#[case] raw: &str, #[case] expected: CourseValidationError) {
        assert_eq!(ModuleId::new(raw).expect_err("must fail"), expected);
    }

    #[rstest]
    fn titles_are_trimmed_and_bounded() {
        assert_eq!(ModuleTitle::new("  Intro ").expect("valid").as_ref(), "Intro");
        assert_eq!(
            ChapterTitle::new("x".repeat(TITLE_MAX + 1)).expect_err("too long"),
            CourseValidationError::TitleTooLong { max: TITLE_MAX }
        );
        assert_eq!(
            ModuleTitle::new("   ").expect_err("blank"),
            CourseValidationError::EmptyTitle
        );
    }

    #[rstest]
    #[case("https://www.youtube.com/watch?v=dQw4w9WgXcQ", Some("dQw4w9WgXcQ"))]
    #[case("https://youtu.be/dQw4w9WgXcQ", Some("dQw4w9WgXcQ"))]
    #[case("https://www.youtube.com/embed/dQw4w9WgXcQ", Some("dQw4w9WgXcQ"))]
    #[case("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ", Some("dQw4w9WgXcQ"))]
    #[case("https://www.youtube.com/watch?v=short", None)]
    #[case("https://vimeo.com/12345", None)]
    fn extracts_video_id(#[case] raw: &str, #[case] expected: Option<&str>) {
        let link = VideoLink::new(raw).expect("valid url");
        assert_eq!(link.video_id(), expected);
    }

    #[rstest]
    #[case("not a url")]
    #[case("ftp://example.com/video")]
    fn video_link_rejects_non_http(#[case] raw: &str) {
        assert!(matches!(
            VideoLink::new(raw),
            Err(CourseValidationError::InvalidVideoLink { .. })
        ));
    }

    #[rstest]
    fn embed_url_uses_video_id() {
        let link = VideoLink::new("https://youtu.be/abcdefghijk").expect("valid url");
        assert_eq!(
            link.embed_url().as_deref(),
            Some("https://www.youtube.com/embed/abcdefghijk")
        );
    }

    #[rstest]
    fn decodes_chapter_row() {
        let chapter: Chapter = serde_json::from_value(json!({
            "id": "c1",
            "title": "Welcome",
            "module_id": "m1",
            "youtube_link": "https://youtu.be/abcdefghijk",
            "status": "live"
        }))
        .expect("row decodes");
        assert!(chapter.is_live());
        assert_eq!(chapter.module_id().as_ref(), "m1");
    }

    #[rstest]
    fn rejects_unknown_status() {
        let result: Result<Chapter, _> = serde_json::from_value(json!({
            "id": "c1",
            "title": "Welcome",
            "module_id": "m1",
            "youtube_link": "https://youtu.be/abcdefghijk",
            "status": "archived"
        }));
        assert!(result.is_err());
        assert!(matches!(
            "archived".parse::<ChapterStatus>(),
            Err(CourseValidationError::UnknownStatus { .. })
        ));
    }

    #[rstest]
    fn draft_defaults_to_draft_status() {
        let draft: ChapterDraft = serde_json::from_value(json!({
            "title": "Welcome",
            "module_id": "m1",
            "youtube_link": "https://youtu.be/abcdefghijk"
        }))
        .expect("draft decodes");
        assert_eq!(draft.status, ChapterStatus::Draft);
    }

    #[rstest]
    fn chapter_serialises_flat() {
        let chapter = Chapter::new(
            ChapterId::new("c1").expect("id"),
            ChapterDraft {
                title: ChapterTitle::new("Welcome").expect("title"),
                module_id: ModuleId::new("m1").expect("module"),
                youtube_link: VideoLink::new("https://youtu.be/abcdefghijk").expect("link"),
                status: ChapterStatus::Live,
            },
        );
        assert_eq!(
            serde_json::to_value(&chapter).expect("serialises"),
            json!({
                "id": "c1",
                "title": "Welcome",
                "module_id": "m1",
                "youtube_link": "https://youtu.be/abcdefghijk",
                "status": "live"
            })
        );
    }
}
