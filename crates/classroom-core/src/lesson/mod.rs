//! Course records, the lesson progression gate and the lesson viewer.

pub mod course;
pub mod gate;
pub mod viewer;

pub use course::{Course, CourseFilter, CourseProgress, Lesson, Teacher, Video, VideoState};
pub use gate::{LessonGate, Selection, LOCKED_LESSON_MESSAGE};
pub use viewer::LessonViewer;
