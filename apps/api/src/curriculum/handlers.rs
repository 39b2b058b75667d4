//! Read-only handlers over the curriculum catalog.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::curriculum::models::{Course, CourseSummary, CurricularUnit};
use crate::errors::AppError;
use crate::models::response::DataResponse;
use crate::state::AppState;

/// GET /courses
pub async fn handle_list_courses(
    State(state): State<AppState>,
) -> Json<DataResponse<Vec<CourseSummary>>> {
    Json(DataResponse::new(state.catalog.summaries()))
}

/// GET /courses/:course_id
pub async fn handle_get_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<DataResponse<Course>>, AppError> {
    let course = state
        .catalog
        .course(&course_id)
        .ok_or_else(|| AppError::NotFound(format!("Course {course_id} not found")))?;

    Ok(Json(DataResponse::new(course.clone())))
}

/// GET /courses/:course_id/units/:unit_id
pub async fn handle_get_unit(
    State(state): State<AppState>,
    Path((course_id, unit_id)): Path<(String, String)>,
) -> Result<Json<DataResponse<CurricularUnit>>, AppError> {
    let unit = state
        .catalog
        .course(&course_id)
        .ok_or_else(|| AppError::NotFound(format!("Course {course_id} not found")))?
        .unit(&unit_id)
        .ok_or_else(|| {
            AppError::NotFound(format!("Unit {unit_id} not found in course {course_id}"))
        })?;

    Ok(Json(DataResponse::new(unit.clone())))
}
