//! HTTP API and relay endpoint for the Classroom dev server.
//!
//! Serves the course catalog to [`HttpCourseProvider`](crate::provider::HttpCourseProvider)
//! and hosts the chat relay.
//!
//! # Endpoints
//!
//! - `GET /ws` - Chat relay WebSocket
//! - `GET /api/status` - Server status and connected relay clients
//! - `GET /api/courses/{id}` - Course detail
//! - `GET /api/courses/{id}/lessons` - Lesson sections of a course
//! - `GET /api/users/{id}/courses?state=all|ongoing|completed` - A user's courses
//! - `GET /api/teachers/{id}` - Instructor profile
//!
//! # Example
//!
//! ```no_run
//! use classroom_core::{create_router, AppState, Config};
//!
//! # async fn example() {
//! let router = create_router(AppState::new(Config::default()));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//! axum::serve(listener, router).await.unwrap();
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, warn};

use crate::lesson::{Course, CourseFilter, Lesson, Teacher};
use crate::provider::Catalog;
use crate::relay::{ws_handler, RelayHub};
use crate::Config;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query string for the user courses endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct UserCoursesQuery {
    /// Tab filter. Defaults to all courses.
    #[serde(default)]
    pub state: CourseFilter,
}

/// Response body for the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Number of open relay connections.
    pub connected_clients: usize,
    /// Number of courses in the catalog.
    pub courses: usize,
    /// When the server started.
    pub started_at: DateTime<Utc>,
}

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Course catalog served by the API.
    pub catalog: Arc<Catalog>,
    /// Chat relay hub.
    pub hub: RelayHub,
    /// Server start time.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates a new `AppState` with an empty catalog.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_catalog(config, Catalog::default())
    }

    /// Creates a new `AppState` serving the given catalog.
    #[must_use]
    pub fn with_catalog(config: Config, catalog: Catalog) -> Self {
        let hub = RelayHub::new(config.relay_capacity);
        Self {
            config,
            catalog: Arc::new(catalog),
            hub,
            started_at: Utc::now(),
        }
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Internal error type for API handlers.
#[derive(Debug)]
enum ApiError {
    /// The requested course does not exist.
    CourseNotFound(String),
    /// The requested teacher does not exist.
    TeacherNotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::CourseNotFound(id) => (StatusCode::NOT_FOUND, format!("Course '{id}' not found")),
            Self::TeacherNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Teacher '{id}' not found"))
            }
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with the relay endpoint and all API routes.
///
/// CORS is open for development, and every request is traced.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/status", get(handle_status))
        .route("/courses/:course_id", get(handle_course))
        .route("/courses/:course_id/lessons", get(handle_lessons))
        .route("/users/:user_id/courses", get(handle_user_courses))
        .route("/teachers/:teacher_id", get(handle_teacher));

    Router::new()
        .route("/ws", get(ws_handler))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// Handler for `GET /api/status`.
async fn handle_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        connected_clients: state.hub.connected_clients(),
        courses: state.catalog.courses.len(),
        started_at: state.started_at,
    })
}

/// Handler for `GET /api/courses/{id}`.
async fn handle_course(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Result<Json<Course>, ApiError> {
    state.catalog.course(&course_id).cloned().map(Json).ok_or_else(|| {
        warn!(%course_id, "Course not found");
        ApiError::CourseNotFound(course_id)
    })
}

/// Handler for `GET /api/courses/{id}/lessons`.
async fn handle_lessons(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<Lesson>>, ApiError> {
    if state.catalog.course(&course_id).is_none() {
        return Err(ApiError::CourseNotFound(course_id));
    }
    let lessons = state.catalog.lessons(&course_id).to_vec();
    debug!(%course_id, sections = lessons.len(), "Serving lessons");
    Ok(Json(lessons))
}

/// Handler for `GET /api/users/{id}/courses`.
async fn handle_user_courses(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<UserCoursesQuery>,
) -> Json<Vec<Course>> {
    let courses = state.catalog.user_courses(&user_id, query.state);
    debug!(%user_id, filter = %query.state, count = courses.len(), "Serving user courses");
    Json(courses)
}

/// Handler for `GET /api/teachers/{id}`.
async fn handle_teacher(
    State(state): State<Arc<AppState>>,
    Path(teacher_id): Path<String>,
) -> Result<Json<Teacher>, ApiError> {
    state.catalog.teacher(&teacher_id).cloned().map(Json).ok_or_else(|| {
        warn!(%teacher_id, "Teacher not found");
        ApiError::TeacherNotFound(teacher_id)
    })
}

// ============================================================================
// Tests
// ============================================================================
