//! Catalog Routes

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use storage::{NewRobot, Robot};
use tracing::info;
use uuid::Uuid;

use crate::{ApiError, SharedState};

pub async fn list(State(state): State<SharedState>) -> Result<Json<Vec<Robot>>, ApiError> {
    let state = state.read().await;
    Ok(Json(state.repository.list_robots()?))
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Robot>, ApiError> {
    let state = state.read().await;
    Ok(Json(state.repository.find_robot(id)?))
}

/// Add a catalog entry; every field is required
pub async fn create(
    State(state): State<SharedState>,
    payload: Result<Json<NewRobot>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(new) = payload?;
    let state = state.read().await;
    let robot = state.repository.create_robot(new)?;
    info!("Catalog entry {} added", robot.id);
    Ok((StatusCode::CREATED, Json(robot)))
}
