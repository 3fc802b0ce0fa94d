//! Booking API endpoints.

use api_types::ApiResponse;
use api_types::booking::{
    BookingCancel, BookingListQuery, BookingNew, BookingReschedule, BookingStatus as ApiStatus,
    BookingView, CancelledBy as ApiCancelledBy,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use engine::users;

fn map_status(status: engine::BookingStatus) -> ApiStatus {
    match status {
        engine::BookingStatus::Pending => ApiStatus::Pending,
        engine::BookingStatus::Confirmed => ApiStatus::Confirmed,
        engine::BookingStatus::InProgress => ApiStatus::InProgress,
        engine::BookingStatus::Completed => ApiStatus::Completed,
        engine::BookingStatus::Cancelled => ApiStatus::Cancelled,
    }
}

fn map_cancelled_by(cancelled_by: engine::CancelledBy) -> ApiCancelledBy {
    match cancelled_by {
        engine::CancelledBy::Customer => ApiCancelledBy::Customer,
        engine::CancelledBy::Provider => ApiCancelledBy::Provider,
    }
}

fn booking_view(booking: engine::Booking) -> BookingView {
    BookingView {
        id: booking.id,
        customer_id: booking.customer_id,
        service_id: booking.service_id,
        provider_id: booking.provider_id,
        scheduled_date: booking.scheduled_date,
        scheduled_time: booking.scheduled_time,
        duration_minutes: booking.duration_minutes,
        status: map_status(booking.status),
        total_amount_minor: booking.total_amount_minor,
        notes: booking.notes,
        cancelled_by: booking.cancelled_by.map(map_cancelled_by),
        cancellation_reason: booking.cancellation_reason,
        created_at: booking.created_at,
    }
}

pub async fn booking_new(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BookingNew>,
) -> Result<(StatusCode, Json<ApiResponse<BookingView>>), ServerError> {
    let mut cmd = engine::CreateBookingCmd::new(
        user.id.clone(),
        payload.service_id,
        payload.scheduled_date,
        payload.scheduled_time,
    )
    .instant(payload.instant);
    if let Some(duration) = payload.duration_minutes {
        cmd = cmd.duration_minutes(duration);
    }
    if let Some(notes) = payload.notes {
        cmd = cmd.notes(notes);
    }

    let booking = state.engine.create_booking(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(booking_view(booking))),
    ))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<ApiResponse<Vec<BookingView>>>, ServerError> {
    let view = match query.view.as_deref() {
        None | Some("customer") => engine::BookingView::Customer,
        Some("provider") => engine::BookingView::Provider,
        Some(other) => {
            return Err(ServerError::Generic(format!(
                "invalid view: {other} (expected customer or provider)"
            )));
        }
    };

    let bookings = state.engine.list_bookings(&user.id, view).await?;
    Ok(Json(ApiResponse::ok(
        bookings.into_iter().map(booking_view).collect(),
    )))
}

pub async fn confirm(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingView>>, ServerError> {
    let booking = state.engine.confirm_booking(id, &user.id).await?;
    Ok(Json(ApiResponse::ok(booking_view(booking))))
}

pub async fn start(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingView>>, ServerError> {
    let booking = state.engine.start_booking(id, &user.id).await?;
    Ok(Json(ApiResponse::ok(booking_view(booking))))
}

pub async fn cancel(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BookingCancel>,
) -> Result<Json<ApiResponse<BookingView>>, ServerError> {
    let booking = state
        .engine
        .cancel_booking(id, &user.id, payload.reason.as_deref())
        .await?;
    Ok(Json(ApiResponse::ok(booking_view(booking))))
}

pub async fn complete(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingView>>, ServerError> {
    let booking = state.engine.complete_booking(id, &user.id).await?;
    Ok(Json(ApiResponse::ok(booking_view(booking))))
}

pub async fn reschedule(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BookingReschedule>,
) -> Result<Json<ApiResponse<BookingView>>, ServerError> {
    let cmd = engine::RescheduleBookingCmd::new(
        id,
        user.id.clone(),
        payload.scheduled_date,
        payload.scheduled_time,
    );
    let booking = state.engine.reschedule_booking(cmd).await?;
    Ok(Json(ApiResponse::ok(booking_view(booking))))
}
