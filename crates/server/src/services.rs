//! Service catalog API endpoints.

use api_types::ApiResponse;
use api_types::service::{ServiceNew, ServiceUpdate, ServiceView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use engine::users;

fn service_view(service: engine::Service) -> ServiceView {
    ServiceView {
        id: service.id,
        provider_id: service.provider_id,
        name: service.name,
        description: service.description,
        price_minor: service.price_minor,
        currency: match service.currency {
            engine::Currency::Kes => api_types::Currency::Kes,
        },
        instant_booking: service.instant_booking,
        active: service.active,
    }
}

pub async fn service_new(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ServiceNew>,
) -> Result<(StatusCode, Json<ApiResponse<ServiceView>>), ServerError> {
    let service = state
        .engine
        .new_service(
            &user.id,
            &payload.name,
            payload.description.as_deref(),
            payload.price_minor,
            payload.instant_booking,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(service_view(service))),
    ))
}

pub async fn list(
    State(state): State<ServerState>,
) -> Result<Json<ApiResponse<Vec<ServiceView>>>, ServerError> {
    let services = state.engine.list_services().await?;
    Ok(Json(ApiResponse::ok(
        services.into_iter().map(service_view).collect(),
    )))
}

pub async fn service_update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ServiceUpdate>,
) -> Result<Json<ApiResponse<()>>, ServerError> {
    state
        .engine
        .set_service_active(id, &user.id, payload.active)
        .await?;
    Ok(Json(ApiResponse::ok(())))
}
