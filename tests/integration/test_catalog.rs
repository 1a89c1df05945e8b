//! Integration tests for the catalog API and the HTTP course provider.
//!
//! These tests serve a catalog over HTTP and read it back through
//! `HttpCourseProvider` and `LessonViewer`, the way the CLI does.

use std::collections::HashMap;
use std::net::TcpListener;
use std::time::Duration;

use classroom_core::{
    create_router, AppState, Catalog, Config, Course, CourseFilter, CourseProgress,
    CourseProvider, Enrollment, HttpCourseProvider, Lesson, LessonViewer, PlaybackSink,
    RecordingNotifier, Selection, Teacher, Video, VideoState, LOCKED_LESSON_MESSAGE,
};

/// Helper to find an available port for testing.
fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

fn video(name: &str, state: VideoState) -> Video {
    Video {
        name: name.to_string(),
        url_video: format!("https://video.example/{name}"),
        state,
    }
}

fn course(id: &str, name: &str) -> Course {
    Course {
        id: id.to_string(),
        name: name.to_string(),
        title: format!("{name} from scratch"),
        average_rating: 4.8,
        total_rating: 1233,
        total_lessons: 5,
        price: Some(19.99),
        instructor: Some("Jane Doe".to_string()),
    }
}

fn test_catalog() -> Catalog {
    let ux_lessons = vec![
        Lesson {
            title: "Getting started".to_string(),
            videos: vec![
                video("welcome", VideoState::Completed),
                video("tools", VideoState::Unlocked),
                video("research", VideoState::Locked),
            ],
        },
        Lesson {
            title: "Wireframes".to_string(),
            videos: vec![video("sketching", VideoState::Unlocked)],
        },
        Lesson {
            title: "Prototyping".to_string(),
            videos: vec![video("figma", VideoState::Completed)],
        },
    ];

    Catalog {
        courses: vec![
            course("ux", "UX Design"),
            course("rust", "Rust"),
            course("ux/advanced", "Advanced UX"),
        ],
        lessons: HashMap::from([
            ("ux".to_string(), ux_lessons),
            (
                "ux/advanced".to_string(),
                vec![Lesson {
                    title: "Research ops".to_string(),
                    videos: vec![video("interviews", VideoState::Unlocked)],
                }],
            ),
        ]),
        enrollments: vec![
            Enrollment {
                user_id: "1".to_string(),
                course_id: "ux".to_string(),
                progress: CourseProgress::OnGoing,
            },
            Enrollment {
                user_id: "1".to_string(),
                course_id: "rust".to_string(),
                progress: CourseProgress::Completed,
            },
        ],
        teachers: vec![Teacher {
            id: "1".to_string(),
            user_name: "Jane Doe".to_string(),
            image: None,
            description: "Designs things for a living".to_string(),
            email: "jane@example.com".to_string(),
            phone: "555-0199".to_string(),
            address: "1 Loop Rd".to_string(),
        }],
    }
}

/// Spawns the catalog server and returns a provider for it.
async fn spawn_test_server() -> HttpCourseProvider {
    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");

    let router = create_router(AppState::with_catalog(Config::default(), test_catalog()));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    HttpCourseProvider::new(format!("http://{addr}/api"))
}

// ============================================================================
// Provider Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_course_over_http() {
    let provider = spawn_test_server().await;

    let course = provider
        .fetch_course("ux")
        .await
        .expect("fetch failed")
        .expect("course missing");

    assert_eq!(course, test_catalog().courses[0]);
}

#[tokio::test]
async fn test_fetch_unknown_course_is_none() {
    let provider = spawn_test_server().await;

    assert!(provider.fetch_course("nope").await.expect("fetch failed").is_none());
    assert!(provider.fetch_lessons("nope").await.expect("fetch failed").is_empty());
}

#[tokio::test]
async fn test_fetch_lessons_preserves_states() {
    let provider = spawn_test_server().await;

    let lessons = provider.fetch_lessons("ux").await.expect("fetch failed");

    assert_eq!(lessons, test_catalog().lessons["ux"]);
}

#[tokio::test]
async fn test_fetch_user_courses_by_tab() {
    let provider = spawn_test_server().await;

    let ids = |courses: Vec<Course>| courses.into_iter().map(|c| c.id).collect::<Vec<_>>();

    let all = provider
        .fetch_user_courses("1", CourseFilter::All)
        .await
        .expect("fetch failed");
    assert_eq!(ids(all), vec!["ux", "rust"]);

    let ongoing = provider
        .fetch_user_courses("1", CourseFilter::OnGoing)
        .await
        .expect("fetch failed");
    assert_eq!(ids(ongoing), vec!["ux"]);

    let completed = provider
        .fetch_user_courses("1", CourseFilter::Completed)
        .await
        .expect("fetch failed");
    assert_eq!(ids(completed), vec!["rust"]);
}

#[tokio::test]
async fn test_fetch_course_with_reserved_characters_in_id() {
    let provider = spawn_test_server().await;

    let course = provider
        .fetch_course("ux/advanced")
        .await
        .expect("fetch failed")
        .expect("course missing");
    assert_eq!(course.name, "Advanced UX");

    let lessons = provider
        .fetch_lessons("ux/advanced")
        .await
        .expect("fetch failed");
    assert_eq!(lessons[0].title, "Research ops");

    // Would address /courses/ux otherwise
    assert!(provider
        .fetch_course("ux?x=1")
        .await
        .expect("fetch failed")
        .is_none());
}

#[tokio::test]
async fn test_fetch_teacher_over_http() {
    let provider = spawn_test_server().await;

    let teacher = provider
        .fetch_teacher("1")
        .await
        .expect("fetch failed")
        .expect("teacher missing");
    assert_eq!(teacher, test_catalog().teachers[0]);

    assert!(provider
        .fetch_teacher("2")
        .await
        .expect("fetch failed")
        .is_none());
}

// ============================================================================
// Lesson Viewer Tests
// ============================================================================

#[tokio::test]
async fn test_viewer_over_http_applies_threshold() {
    let provider = spawn_test_server().await;

    let viewer = LessonViewer::load(&provider, "ux", 2)
        .await
        .expect("load failed");

    let states: Vec<(Selection, VideoState)> =
        viewer.rows().map(|(sel, _, state)| (sel, state)).collect();
    assert_eq!(
        states,
        vec![
            (Selection::new(0, 0), VideoState::Completed),
            (Selection::new(0, 1), VideoState::Unlocked),
            (Selection::new(0, 2), VideoState::Locked),
            (Selection::new(1, 0), VideoState::Unlocked),
            (Selection::new(2, 0), VideoState::Locked),
        ]
    );
}

#[tokio::test]
async fn test_viewer_selection_flow() {
    let provider = spawn_test_server().await;
    let mut viewer = LessonViewer::load(&provider, "ux", 2)
        .await
        .expect("load failed");
    let notifier = RecordingNotifier::new();
    let playback = viewer.playback().clone();

    let selected = viewer.select_video(1, 0).expect("select failed");
    assert_eq!(selected, Selection::new(1, 0));
    assert!(viewer.select_video(2, 0).is_err());
    assert_eq!(viewer.gate().active(), Some(Selection::new(1, 0)));
    assert_eq!(playback.current().as_deref(), Some("https://video.example/sketching"));

    // A locked pick reaches an explicit sink exactly once
    let mut gate = viewer.gate().clone();
    let err = gate.select_video(2, 0, &playback, &notifier).unwrap_err();
    assert!(err.to_string().contains("locked"));
    assert_eq!(notifier.entries()[0].0, LOCKED_LESSON_MESSAGE);
    assert_eq!(notifier.len(), 1);

    playback.set_playback_url("https://video.example/manual");
    assert_eq!(
        viewer.playback().current().as_deref(),
        Some("https://video.example/manual")
    );
}

#[tokio::test]
async fn test_viewer_for_unknown_course_is_placeholder() {
    let provider = spawn_test_server().await;

    let viewer = LessonViewer::load(&provider, "missing", 2)
        .await
        .expect("load failed");

    assert!(viewer.is_placeholder());
    assert!(viewer.course().is_none());
    assert_eq!(viewer.rows().count(), 0);
}

#[tokio::test]
async fn test_unreachable_api_is_provider_error() {
    let port = find_available_port();
    let provider = HttpCourseProvider::new(format!("http://127.0.0.1:{port}/api"));

    let err = LessonViewer::load(&provider, "ux", 2).await.unwrap_err();
    assert!(err.is_transient());
}

#[test]
fn test_demo_catalog_parses() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/catalog.json");
    let catalog = Catalog::load_from_file(&path).expect("demo catalog invalid");

    assert_eq!(catalog.courses.len(), 2);
    assert_eq!(catalog.lessons["ux-design"][0].videos[2].state, VideoState::Locked);
    assert_eq!(catalog.user_courses("1", CourseFilter::OnGoing).len(), 1);
    assert!(catalog.teacher("1").is_some());
}
