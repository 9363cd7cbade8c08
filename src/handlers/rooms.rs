use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Room;
use crate::services::bookings::{self, NewRoom};
use crate::state::AppState;

use super::lock_db;

#[derive(Serialize)]
pub struct RoomResponse {
    id: String,
    room_number: String,
    status: String,
    current_session_start: Option<String>,
    assigned_staff: Option<String>,
    updated_at: String,
}

impl From<Room> for RoomResponse {
    fn from(r: Room) -> Self {
        Self {
            id: r.id,
            room_number: r.room_number,
            status: r.status.as_str().to_string(),
            current_session_start: r
                .current_session_start
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            assigned_staff: r.assigned_staff,
            updated_at: r.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// GET /api/rooms
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RoomResponse>>, AppError> {
    let rooms = {
        let db = lock_db(&state)?;
        queries::list_rooms(&db)?
    };
    Ok(Json(rooms.into_iter().map(RoomResponse::from).collect()))
}

// GET /api/rooms/:id
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RoomResponse>, AppError> {
    let db = lock_db(&state)?;
    let room = queries::get_room(&db, &id)?.ok_or_else(|| AppError::NotFound(format!("room {id}")))?;
    Ok(Json(room.into()))
}

// POST /api/rooms
#[derive(Deserialize)]
pub struct CreateRoomRequest {
    pub room_number: String,
    pub assigned_staff: Option<String>,
}

pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomResponse>), AppError> {
    let now = state.clock.now_local();
    let db = lock_db(&state)?;
    let room = bookings::create_room(
        &db,
        NewRoom {
            room_number: body.room_number,
            assigned_staff: body.assigned_staff,
        },
        now,
    )?;
    Ok((StatusCode::CREATED, Json(room.into())))
}
