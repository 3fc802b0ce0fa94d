//! Provider analytics API endpoint.

use api_types::ApiResponse;
use api_types::provider::{DailyStatsView, StatsQuery};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use chrono::Utc;

use crate::{ServerError, server::ServerState};
use engine::users;

pub async fn get_stats(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ApiResponse<DailyStatsView>>, ServerError> {
    let day = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let stats = state.engine.provider_stats(&user.id, day).await?;
    Ok(Json(ApiResponse::ok(DailyStatsView {
        day: stats.day,
        completed_bookings: stats.completed_bookings,
        earnings_minor: stats.earnings_minor,
    })))
}
