//! Course data providers.
//!
//! The lesson viewer and the "my courses" screen read course data through
//! [`CourseProvider`]. Two implementations exist: [`StaticCourseProvider`]
//! serves an in-memory [`Catalog`], and [`HttpCourseProvider`] talks to the
//! catalog API served by `classroom serve`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ClassroomError, Result};
use crate::lesson::{Course, CourseFilter, CourseProgress, Lesson, Teacher};

/// Read-only source of course data.
#[async_trait]
pub trait CourseProvider: Send + Sync {
    /// Fetches a course by id. Returns `None` if the course does not exist.
    async fn fetch_course(&self, course_id: &str) -> Result<Option<Course>>;

    /// Fetches a course's lesson sections, in display order.
    ///
    /// An unknown course has no lessons.
    async fn fetch_lessons(&self, course_id: &str) -> Result<Vec<Lesson>>;

    /// Fetches the courses a user is enrolled in that pass `filter`.
    async fn fetch_user_courses(&self, user_id: &str, filter: CourseFilter) -> Result<Vec<Course>>;

    /// Fetches an instructor profile. Returns `None` if the teacher does not
    /// exist.
    async fn fetch_teacher(&self, teacher_id: &str) -> Result<Option<Teacher>>;
}

// ============================================================================
// Catalog
// ============================================================================

/// A user's enrolment in a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    /// Enrolled user.
    pub user_id: String,
    /// Course the user is enrolled in.
    pub course_id: String,
    /// How far the user got.
    pub progress: CourseProgress,
}

/// In-memory course catalog.
///
/// Lessons are keyed by course id. The JSON form is what `classroom serve
/// --catalog` reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// All courses.
    #[serde(default)]
    pub courses: Vec<Course>,
    /// Lesson sections by course id.
    #[serde(default)]
    pub lessons: HashMap<String, Vec<Lesson>>,
    /// User enrolments.
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
    /// Instructor profiles.
    #[serde(default)]
    pub teachers: Vec<Teacher>,
}

impl Catalog {
    /// Loads a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParseError` if the file is not a valid catalog, or an
    /// I/O error if it cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog: Self = serde_json::from_str(&content)
            .map_err(|e| ClassroomError::config_parse(path, e.to_string()))?;
        info!(
            path = %path.display(),
            courses = catalog.courses.len(),
            enrollments = catalog.enrollments.len(),
            "Loaded course catalog"
        );
        Ok(catalog)
    }

    /// Looks up a course by id.
    #[must_use]
    pub fn course(&self, course_id: &str) -> Option<&Course> {
        self.courses.iter().find(|course| course.id == course_id)
    }

    /// A course's lesson sections. Empty for unknown courses.
    #[must_use]
    pub fn lessons(&self, course_id: &str) -> &[Lesson] {
        self.lessons.get(course_id).map_or(&[], Vec::as_slice)
    }

    /// Looks up a teacher by id.
    #[must_use]
    pub fn teacher(&self, teacher_id: &str) -> Option<&Teacher> {
        self.teachers.iter().find(|teacher| teacher.id == teacher_id)
    }

    /// Courses a user is enrolled in that pass `filter`, in enrolment order.
    #[must_use]
    pub fn user_courses(&self, user_id: &str, filter: CourseFilter) -> Vec<Course> {
        self.enrollments
            .iter()
            .filter(|e| e.user_id == user_id && filter.matches(e.progress))
            .filter_map(|e| self.course(&e.course_id).cloned())
            .collect()
    }
}

// ============================================================================
// Static Provider
// ============================================================================

/// Serves an in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCourseProvider {
    catalog: Arc<Catalog>,
}

impl StaticCourseProvider {
    /// Wraps a catalog.
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    /// Shares an existing catalog.
    #[must_use]
    pub const fn shared(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// The underlying catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

#[async_trait]
impl CourseProvider for StaticCourseProvider {
    async fn fetch_course(&self, course_id: &str) -> Result<Option<Course>> {
        Ok(self.catalog.course(course_id).cloned())
    }

    async fn fetch_lessons(&self, course_id: &str) -> Result<Vec<Lesson>> {
        Ok(self.catalog.lessons(course_id).to_vec())
    }

    async fn fetch_user_courses(&self, user_id: &str, filter: CourseFilter) -> Result<Vec<Course>> {
        Ok(self.catalog.user_courses(user_id, filter))
    }

    async fn fetch_teacher(&self, teacher_id: &str) -> Result<Option<Teacher>> {
        Ok(self.catalog.teacher(teacher_id).cloned())
    }
}

// ============================================================================
// HTTP Provider
// ============================================================================

/// Reads course data from the catalog API.
#[derive(Debug, Clone)]
pub struct HttpCourseProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCourseProvider {
    /// Creates a provider for the API rooted at `base_url`
    /// (e.g. `http://localhost:8080/api`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// The API base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds `<base>/<segments...>`, percent-encoding each segment so ids
    /// containing `/`, `?` or `#` stay inside their own path segment.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ClassroomError::provider(format!("invalid API base URL '{}': {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                ClassroomError::provider(format!(
                    "API base URL '{}' cannot have a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GETs `url` and decodes the body. A 404 yields `None`.
    async fn get_json<T>(&self, url: Url) -> Result<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        debug!(%url, "Fetching course data");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ClassroomError::provider(format!("GET {url}: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ClassroomError::provider(format!(
                "GET {url}: unexpected status {}",
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| ClassroomError::provider(format!("GET {url}: invalid body: {e}")))
    }
}

#[async_trait]
impl CourseProvider for HttpCourseProvider {
    async fn fetch_course(&self, course_id: &str) -> Result<Option<Course>> {
        self.get_json(self.url(&["courses", course_id])?).await
    }

    async fn fetch_lessons(&self, course_id: &str) -> Result<Vec<Lesson>> {
        Ok(self
            .get_json(self.url(&["courses", course_id, "lessons"])?)
            .await?
            .unwrap_or_default())
    }

    async fn fetch_user_courses(&self, user_id: &str, filter: CourseFilter) -> Result<Vec<Course>> {
        let mut url = self.url(&["users", user_id, "courses"])?;
        url.query_pairs_mut().append_pair("state", filter.as_str());
        Ok(self.get_json(url).await?.unwrap_or_default())
    }

    async fn fetch_teacher(&self, teacher_id: &str) -> Result<Option<Teacher>> {
        self.get_json(self.url(&["teachers", teacher_id])?).await
    }
}
