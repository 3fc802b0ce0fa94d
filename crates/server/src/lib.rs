use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

pub use server::{run, run_with_listener, spawn_with_listener};

mod bookings;
mod loyalty;
mod notifications;
mod payments;
mod provider;
mod server;
mod services;
mod wallet;

pub mod types {
    pub use api_types::{ApiError, ApiResponse, Currency};

    pub mod wallet {
        pub use api_types::wallet::{
            PayBillNew, SendNew, TopUpMethod, TopUpNew, TransactionKind, TransactionListQuery,
            TransactionListResponse, TransactionStatus, TransactionView, WalletView, WithdrawNew,
        };
    }

    pub mod booking {
        pub use api_types::booking::{
            BookingCancel, BookingListQuery, BookingNew, BookingReschedule, BookingStatus,
            BookingView, CancelledBy,
        };
    }

    pub mod service {
        pub use api_types::service::{ServiceNew, ServiceUpdate, ServiceView};
    }

    pub mod loyalty {
        pub use api_types::loyalty::{LoyaltyView, Tier};
    }

    pub mod provider {
        pub use api_types::provider::{DailyStatsView, StatsQuery};
    }

    pub mod notification {
        pub use api_types::notification::{NotificationListQuery, NotificationView};
    }

    pub mod payments {
        pub use api_types::payments::MpesaCallback;
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) | EngineError::SlotConflict(_) => StatusCode::CONFLICT,
        EngineError::Gateway(_) => StatusCode::BAD_GATEWAY,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InsufficientBalance(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidRecipient(_)
        | EngineError::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (
            status,
            Json(api_types::ApiError {
                success: false,
                error,
            }),
        )
            .into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_forbidden_maps_to_403() {
        let res = ServerError::from(EngineError::Forbidden("forbidden".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_slot_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::SlotConflict("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_gateway_maps_to_502() {
        let res = ServerError::from(EngineError::Gateway("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::InvalidAmount("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let res =
            ServerError::from(EngineError::InsufficientBalance("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
