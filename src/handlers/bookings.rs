use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::booking::{parse_date, parse_time};
use crate::models::{Booking, BookingStatus};
use crate::services::bookings::{self, NewBooking};
use crate::state::AppState;

use super::lock_db;
use super::rooms::RoomResponse;

#[derive(Serialize)]
pub struct BookingResponse {
    id: String,
    room_id: String,
    customer_name: Option<String>,
    booking_date: String,
    start_time: String,
    end_time: String,
    status: String,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            room_id: b.room_id,
            customer_name: b.customer_name,
            booking_date: b.booking_date.format("%Y-%m-%d").to_string(),
            start_time: b.start_time.format("%H:%M").to_string(),
            end_time: b.end_time.format("%H:%M").to_string(),
            status: b.status.as_str().to_string(),
            notes: b.notes,
            created_at: b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            updated_at: b.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// GET /api/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub date: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let status = match query.status.as_deref() {
        None => None,
        Some(s @ ("pending" | "confirmed" | "cancelled" | "completed")) => Some(BookingStatus::parse(s)),
        Some(other) => return Err(AppError::Validation(format!("unknown status: {other}"))),
    };
    let date = query
        .date
        .as_deref()
        .map(|d| parse_date(d).ok_or_else(|| AppError::Validation(format!("invalid date: {d}"))))
        .transpose()?;
    let limit = query.limit.unwrap_or(50);

    let bookings = {
        let db = lock_db(&state)?;
        queries::list_bookings(&db, status, date, limit)?
    };

    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let db = lock_db(&state)?;
    let booking = queries::get_booking_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    Ok(Json(booking.into()))
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub room_id: String,
    pub booking_date: String,
    pub start_time: String,
    pub end_time: String,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let new = NewBooking {
        booking_date: parse_date(&body.booking_date).ok_or_else(|| {
            AppError::Validation(format!("invalid booking_date: {}", body.booking_date))
        })?,
        start_time: parse_time(&body.start_time)
            .ok_or_else(|| AppError::Validation(format!("invalid start_time: {}", body.start_time)))?,
        end_time: parse_time(&body.end_time)
            .ok_or_else(|| AppError::Validation(format!("invalid end_time: {}", body.end_time)))?,
        room_id: body.room_id,
        customer_name: body.customer_name,
        notes: body.notes,
    };

    let now = state.clock.now_local();
    let db = lock_db(&state)?;
    let booking = bookings::create_booking(&db, new, now)?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

// POST /api/bookings/:id/confirm
pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let now = state.clock.now_local();
    let db = lock_db(&state)?;
    Ok(Json(bookings::confirm_booking(&db, &id, now)?.into()))
}

// POST /api/bookings/:id/check-in
#[derive(Serialize)]
pub struct CheckInResponse {
    booking: BookingResponse,
    room: RoomResponse,
}

pub async fn check_in(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CheckInResponse>, AppError> {
    let now = state.clock.now_local();
    let db = lock_db(&state)?;
    let (booking, room) = bookings::check_in(&db, &id, now)?;
    Ok(Json(CheckInResponse {
        booking: booking.into(),
        room: room.into(),
    }))
}

// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let now = state.clock.now_local();
    let db = lock_db(&state)?;
    Ok(Json(bookings::cancel_booking(&db, &id, now)?.into()))
}
