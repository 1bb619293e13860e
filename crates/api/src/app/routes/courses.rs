use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::put,
};

use grantgate_auth::{PolicyRegistry, PrincipalContext, RegistryError};

use crate::app::{
    dto::{CourseResponse, UpdateCourseRequest},
    errors,
};
use crate::authz::{self, CAN_EDIT_COURSES};

pub fn router(registry: &PolicyRegistry) -> Result<Router, RegistryError> {
    authz::protect(
        Router::new().route("/:course_id", put(update_course)),
        registry,
        CAN_EDIT_COURSES,
    )
}

async fn update_course(
    Path(course_id): Path<i64>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<UpdateCourseRequest>,
) -> Response {
    let title = body.title.trim();
    if title.is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_request", "title is required");
    }

    // The gate only admits authenticated principals.
    let Some(updated_by) = principal.user_id() else {
        return errors::json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "authentication required",
        );
    };

    tracing::info!(course_id, user_id = %updated_by, "course updated");

    Json(CourseResponse {
        course_id,
        title: title.to_string(),
        updated_by: updated_by.get(),
    })
    .into_response()
}
