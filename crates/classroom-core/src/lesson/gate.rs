//! Lesson progression gate.
//!
//! Governs which videos of a course can be played and which sections are
//! expanded. One threshold `K` applies to both the display and the selection
//! rule: any video in a section with index `>= K` is shown as locked and
//! cannot be selected, whatever progress the backend recorded for it. Below
//! `K` the backend's per-video state is shown as is, and only unlocked or
//! completed videos can be selected.
//!
//! The gate never advances progress; it only reads it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::course::{Lesson, Video, VideoState};
use crate::error::{ClassroomError, Result};
use crate::notify::{NotificationSink, Severity};
use crate::playback::PlaybackSink;

/// Toast shown when a locked video is tapped.
pub const LOCKED_LESSON_MESSAGE: &str = "You need to complete the previous lesson";

/// A `(section, video)` pair identifying the video loaded for playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    /// Section index.
    pub section: usize,
    /// Video index within the section.
    pub video: usize,
}

impl Selection {
    /// Creates a selection.
    #[must_use]
    pub const fn new(section: usize, video: usize) -> Self {
        Self { section, video }
    }
}

/// Expansion, selection and unlock state for one course's lesson list.
#[derive(Debug, Clone)]
pub struct LessonGate {
    lessons: Vec<Lesson>,
    threshold: usize,
    expanded: BTreeSet<usize>,
    active: Option<Selection>,
}

impl LessonGate {
    /// Creates a gate with every section collapsed and nothing selected.
    #[must_use]
    pub fn new(lessons: Vec<Lesson>, threshold: usize) -> Self {
        Self {
            lessons,
            threshold,
            expanded: BTreeSet::new(),
            active: None,
        }
    }

    /// Sections in display order.
    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    /// The unlock threshold `K`.
    #[must_use]
    pub const fn threshold(&self) -> usize {
        self.threshold
    }

    /// Looks up a video.
    #[must_use]
    pub fn video(&self, section: usize, video: usize) -> Option<&Video> {
        self.lessons.get(section)?.videos.get(video)
    }

    /// Expands a collapsed section or collapses an expanded one.
    ///
    /// Returns `true` if the section is expanded afterwards.
    pub fn toggle_section(&mut self, section: usize) -> bool {
        let expanded = if self.expanded.remove(&section) {
            false
        } else {
            self.expanded.insert(section);
            true
        };
        debug!(section, expanded, "Toggled lesson section");
        expanded
    }

    /// Returns `true` if the section is expanded.
    #[must_use]
    pub fn is_expanded(&self, section: usize) -> bool {
        self.expanded.contains(&section)
    }

    /// Expanded section indices in ascending order.
    pub fn expanded(&self) -> impl Iterator<Item = usize> + '_ {
        self.expanded.iter().copied()
    }

    /// The state to display for a video, after applying the threshold.
    ///
    /// Returns `None` if the video does not exist.
    #[must_use]
    pub fn effective_state(&self, section: usize, video: usize) -> Option<VideoState> {
        let nominal = self.video(section, video)?.state;
        if section >= self.threshold {
            Some(VideoState::Locked)
        } else {
            Some(nominal)
        }
    }

    /// Loads a video for playback.
    ///
    /// On success the selection becomes active and the video URL is written
    /// to `playback`. Any section at or above the threshold is locked by
    /// index alone, whether or not the video exists; such a pick, like a
    /// pick of a locked video below the threshold, sends exactly one error
    /// toast to `notifier` and changes nothing else. An unknown video below
    /// the threshold is rejected without a toast.
    pub fn select_video(
        &mut self,
        section: usize,
        video: usize,
        playback: &dyn PlaybackSink,
        notifier: &dyn NotificationSink,
    ) -> Result<Selection> {
        let playable = if section < self.threshold {
            let Some(target) = self.video(section, video) else {
                return Err(ClassroomError::SelectionOutOfRange { section, video });
            };
            Some(target).filter(|target| target.state.is_playable())
        } else {
            None
        };

        let Some(target) = playable else {
            info!(section, video, "Rejected selection of locked lesson");
            notifier.notify(LOCKED_LESSON_MESSAGE, Severity::Error);
            return Err(ClassroomError::LockedSelection { section, video });
        };

        info!(section, video, name = %target.name, "Selected lesson for playback");
        playback.set_playback_url(&target.url_video);
        let selection = Selection::new(section, video);
        self.active = Some(selection);
        Ok(selection)
    }

    /// The active selection, if any.
    #[must_use]
    pub const fn active(&self) -> Option<Selection> {
        self.active
    }

    /// Returns `true` if the given video is the active selection.
    #[must_use]
    pub fn is_active(&self, section: usize, video: usize) -> bool {
        self.active == Some(Selection::new(section, video))
    }

    /// The active video, if any.
    #[must_use]
    pub fn active_video(&self) -> Option<&Video> {
        let selection = self.active?;
        self.video(selection.section, selection.video)
    }
}
