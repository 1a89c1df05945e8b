//! Classroom core
//!
//! Realtime chat over a WebSocket relay, and gated lesson playback for an
//! online course catalog.

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod lesson;
pub mod notify;
pub mod playback;
pub mod provider;
pub mod relay;

pub use api::{create_router, AppState, ErrorResponse, StatusResponse, UserCoursesQuery};
pub use chat::{
    ChannelEvent, ChatChannel, ChatMessage, ChatSession, ConnectionState, Delivery, Participant,
    Participants, Sender, Transcript,
};
pub use config::Config;
pub use error::{ClassroomError, Result};
pub use lesson::{
    Course, CourseFilter, CourseProgress, Lesson, LessonGate, LessonViewer, Selection, Teacher,
    Video, VideoState, LOCKED_LESSON_MESSAGE,
};
pub use notify::{NotificationSink, RecordingNotifier, Severity, TracingNotifier};
pub use playback::{PlaybackSink, PlaybackSlot};
pub use provider::{Catalog, CourseProvider, Enrollment, HttpCourseProvider, StaticCourseProvider};
pub use relay::{MessagePayload, RelayChannel, RelayEvent, RelayHub};
