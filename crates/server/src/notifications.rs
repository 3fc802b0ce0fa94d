//! Notification API endpoints.

use api_types::ApiResponse;
use api_types::notification::{NotificationListQuery, NotificationView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use engine::users;

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<ApiResponse<Vec<NotificationView>>>, ServerError> {
    let notifications = state
        .engine
        .list_notifications(&user.id, query.limit.unwrap_or(50))
        .await?;
    Ok(Json(ApiResponse::ok(
        notifications
            .into_iter()
            .map(|n| NotificationView {
                id: n.id,
                kind: n.kind,
                title: n.title,
                message: n.message,
                data: n.data,
                read: n.read,
                created_at: n.created_at,
            })
            .collect(),
    )))
}

pub async fn mark_read(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ServerError> {
    state.engine.mark_notification_read(id, &user.id).await?;
    Ok(Json(ApiResponse::ok(())))
}
