//! Lesson viewer: a course, its gated lesson list and the player slot.

use tracing::{info, warn};

use super::course::{Course, Video, VideoState};
use super::gate::{LessonGate, Selection};
use crate::error::Result;
use crate::notify::{NotificationSink, TracingNotifier};
use crate::playback::PlaybackSlot;
use crate::provider::CourseProvider;

/// State behind the lesson detail screen.
pub struct LessonViewer {
    course: Option<Course>,
    gate: LessonGate,
    playback: PlaybackSlot,
    notifier: Box<dyn NotificationSink>,
}

impl std::fmt::Debug for LessonViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LessonViewer")
            .field("course", &self.course)
            .field("gate", &self.gate)
            .field("playback", &self.playback.current())
            .finish_non_exhaustive()
    }
}

impl LessonViewer {
    /// Fetches a course and its lessons and builds the viewer.
    ///
    /// If the course does not exist the viewer is an empty placeholder: no
    /// course, no sections.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the provider fails.
    pub async fn load(
        provider: &dyn CourseProvider,
        course_id: &str,
        threshold: usize,
    ) -> Result<Self> {
        let Some(course) = provider.fetch_course(course_id).await? else {
            warn!(course_id, "Course not found, showing placeholder");
            return Ok(Self::placeholder(threshold));
        };

        let lessons = provider.fetch_lessons(course_id).await?;
        info!(
            course_id,
            sections = lessons.len(),
            threshold,
            "Loaded lesson viewer"
        );
        Ok(Self::new(Some(course), LessonGate::new(lessons, threshold)))
    }

    /// Creates a viewer over an existing gate.
    #[must_use]
    pub fn new(course: Option<Course>, gate: LessonGate) -> Self {
        Self {
            course,
            gate,
            playback: PlaybackSlot::new(),
            notifier: Box::new(TracingNotifier),
        }
    }

    /// An empty viewer shown for unknown courses.
    #[must_use]
    pub fn placeholder(threshold: usize) -> Self {
        Self::new(None, LessonGate::new(Vec::new(), threshold))
    }

    /// Replaces the notification sink.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Box<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    /// The course, or `None` for a placeholder.
    #[must_use]
    pub const fn course(&self) -> Option<&Course> {
        self.course.as_ref()
    }

    /// Returns `true` if the course was not found.
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        self.course.is_none()
    }

    /// The lesson gate.
    #[must_use]
    pub const fn gate(&self) -> &LessonGate {
        &self.gate
    }

    /// The playback slot. Clone it to hand it to a player.
    #[must_use]
    pub const fn playback(&self) -> &PlaybackSlot {
        &self.playback
    }

    /// Expands or collapses a section.
    pub fn toggle_section(&mut self, section: usize) -> bool {
        self.gate.toggle_section(section)
    }

    /// Selects a video for playback, notifying the user if it is locked.
    ///
    /// # Errors
    ///
    /// Returns `LockedSelection` or `SelectionOutOfRange`.
    pub fn select_video(&mut self, section: usize, video: usize) -> Result<Selection> {
        self.gate
            .select_video(section, video, &self.playback, self.notifier.as_ref())
    }

    /// Every video with its displayed state, section by section.
    pub fn rows(&self) -> impl Iterator<Item = (Selection, &Video, VideoState)> + '_ {
        self.gate
            .lessons()
            .iter()
            .enumerate()
            .flat_map(move |(s, lesson)| {
                lesson.videos.iter().enumerate().map(move |(v, video)| {
                    let state = self.gate.effective_state(s, v).unwrap_or_default();
                    (Selection::new(s, v), video, state)
                })
            })
    }
}
