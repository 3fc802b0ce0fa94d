//! Loyalty API endpoint.

use api_types::ApiResponse;
use api_types::loyalty::{LoyaltyView, Tier as ApiTier};
use axum::{Extension, Json, extract::State};

use crate::{ServerError, server::ServerState};
use engine::users;

fn map_tier(tier: engine::Tier) -> ApiTier {
    match tier {
        engine::Tier::Bronze => ApiTier::Bronze,
        engine::Tier::Silver => ApiTier::Silver,
        engine::Tier::Gold => ApiTier::Gold,
        engine::Tier::Platinum => ApiTier::Platinum,
    }
}

pub async fn get_account(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<ApiResponse<LoyaltyView>>, ServerError> {
    let account = state.engine.loyalty_account(&user.id).await?;
    let tier = account.tier();
    Ok(Json(ApiResponse::ok(LoyaltyView {
        points: account.points,
        lifetime_points: account.lifetime_points,
        tier: map_tier(tier),
        multiplier: tier.multiplier(),
    })))
}
