//! Gateway callback endpoint.
//!
//! Mounted outside the auth layer: M-Pesa posts here without credentials.
//! A zero result code completes the pending top-up; anything else fails it.

use api_types::ApiResponse;
use api_types::payments::MpesaCallback;
use axum::{Json, extract::State};

use crate::{ServerError, server::ServerState, wallet::transaction_view};

pub async fn mpesa_callback(
    State(state): State<ServerState>,
    Json(payload): Json<MpesaCallback>,
) -> Result<Json<ApiResponse<api_types::wallet::TransactionView>>, ServerError> {
    let success = payload.result_code == 0;
    if !success {
        tracing::info!(
            "mpesa push {} failed: {}",
            payload.reference,
            payload.result_desc.as_deref().unwrap_or("no description")
        );
    }

    let tx = state
        .engine
        .confirm_top_up(&payload.reference, success)
        .await?;
    Ok(Json(ApiResponse::ok(transaction_view(tx))))
}
