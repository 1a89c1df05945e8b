//! Course catalog records.
//!
//! These mirror what the course API returns. Field names follow the API's
//! camelCase, and lesson sections carry their videos under `Video`.

use serde::{Deserialize, Serialize};

/// A course as shown on the course detail and "my courses" screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Opaque course identifier.
    pub id: String,
    /// Short course name.
    pub name: String,
    /// Course headline.
    #[serde(default)]
    pub title: String,
    /// Mean review score.
    #[serde(default)]
    pub average_rating: f64,
    /// Number of reviews.
    #[serde(default)]
    pub total_rating: u32,
    /// Number of lessons across all sections.
    #[serde(default)]
    pub total_lessons: u32,
    /// Current price, if the course is for sale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Display name of the instructor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
}

/// An instructor profile, as shown on the teacher overview screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    /// Opaque teacher identifier.
    pub id: String,
    /// Display name.
    pub user_name: String,
    /// Avatar URL. Clients fall back to a bundled image when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Free-text biography.
    #[serde(default)]
    pub description: String,
    /// Contact email.
    #[serde(default)]
    pub email: String,
    /// Contact phone number.
    #[serde(default)]
    pub phone: String,
    /// Postal address.
    #[serde(default)]
    pub address: String,
}

/// A course section: a titled, ordered group of videos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    /// Section title.
    pub title: String,
    /// Videos in playback order.
    #[serde(rename = "Video", alias = "videos", default)]
    pub videos: Vec<Video>,
}

/// A playable unit inside a lesson section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    /// Video title.
    pub name: String,
    /// Playback URL handed to the player.
    pub url_video: String,
    /// Progress state as recorded by the backend.
    pub state: VideoState,
}

/// Per-video progress: `Locked -> Unlocked -> Completed`.
///
/// The backend encodes this inconsistently: `"locked"` as a string, and
/// unlocked / completed as the numbers `1` / `2`. Both encodings, plus `0`
/// and the lowercase names in any case, are accepted. Serialization always
/// uses the names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VideoState {
    /// Not playable yet.
    #[default]
    Locked,
    /// Playable, not finished.
    Unlocked,
    /// Finished.
    Completed,
}

impl VideoState {
    /// Parses a state name, case-insensitively.
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "locked" | "0" => Some(Self::Locked),
            "unlocked" | "1" => Some(Self::Unlocked),
            "completed" | "2" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Maps the backend's numeric code.
    const fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Locked),
            1 => Some(Self::Unlocked),
            2 => Some(Self::Completed),
            _ => None,
        }
    }

    /// Returns the lowercase state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
            Self::Completed => "completed",
        }
    }

    /// Returns `true` for states a user may start playing.
    #[must_use]
    pub const fn is_playable(&self) -> bool {
        matches!(self, Self::Unlocked | Self::Completed)
    }
}

impl std::fmt::Display for VideoState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VideoState {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Code(u64),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Code(code) => Self::from_code(code).ok_or_else(|| {
                serde::de::Error::custom(format!(
                    "invalid video state {code}: expected 0, 1 or 2"
                ))
            }),
            Raw::Name(name) => Self::from_str_case_insensitive(&name).ok_or_else(|| {
                serde::de::Error::custom(format!(
                    "invalid video state '{name}': expected one of 'locked', 'unlocked', 'completed'"
                ))
            }),
        }
    }
}

impl Serialize for VideoState {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// A user's progress through an enrolled course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseProgress {
    /// Started, not finished.
    OnGoing,
    /// Finished.
    Completed,
}

/// Tab filter on the "my courses" screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CourseFilter {
    /// Every enrolled course.
    #[default]
    All,
    /// Courses in progress.
    OnGoing,
    /// Finished courses.
    Completed,
}

impl CourseFilter {
    /// Parses a filter name, case-insensitively.
    ///
    /// Accepts the tab labels as well (`"ON GOING"`).
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().replace([' ', '_', '-'], "").as_str() {
            "all" => Some(Self::All),
            "ongoing" => Some(Self::OnGoing),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Returns the query-string form of the filter.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::OnGoing => "ongoing",
            Self::Completed => "completed",
        }
    }

    /// Returns `true` if a course with the given progress passes the filter.
    #[must_use]
    pub const fn matches(&self, progress: CourseProgress) -> bool {
        match self {
            Self::All => true,
            Self::OnGoing => matches!(progress, CourseProgress::OnGoing),
            Self::Completed => matches!(progress, CourseProgress::Completed),
        }
    }
}

impl std::fmt::Display for CourseFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for CourseFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_str_case_insensitive(s).ok_or_else(|| {
            format!("invalid course filter '{s}': expected one of 'all', 'ongoing', 'completed'")
        })
    }
}

impl<'de> Deserialize<'de> for CourseFilter {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for CourseFilter {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}
