use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{bookings, loyalty, notifications, payments, provider, services, wallet};
use engine::{Engine, users};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(auth_header) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<users::Model> = users::Entity::find()
        .filter(users::Column::Username.eq(auth_header.username()))
        .filter(users::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let user = if let Some(user) = user {
        user
    } else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    let authed = Router::new()
        .route("/wallet", get(wallet::get_wallet))
        .route("/wallet/topup", post(wallet::topup_new))
        .route("/wallet/send", post(wallet::send_new))
        .route("/wallet/paybill", post(wallet::paybill_new))
        .route("/wallet/withdraw", post(wallet::withdraw_new))
        .route("/wallet/transactions", get(wallet::transactions_list))
        .route("/services", post(services::service_new).get(services::list))
        .route("/services/{id}", patch(services::service_update))
        .route("/bookings", post(bookings::booking_new).get(bookings::list))
        .route("/bookings/{id}/confirm", post(bookings::confirm))
        .route("/bookings/{id}/start", post(bookings::start))
        .route("/bookings/{id}/cancel", post(bookings::cancel))
        .route("/bookings/{id}/complete", post(bookings::complete))
        .route("/bookings/{id}/reschedule", post(bookings::reschedule))
        .route("/loyalty", get(loyalty::get_account))
        .route("/provider/stats", get(provider::get_stats))
        .route("/notifications", get(notifications::list))
        .route(
            "/notifications/{id}/read",
            post(notifications::mark_read),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    // The gateway calls back without credentials.
    Router::new()
        .merge(authed)
        .route("/payments/mpesa/callback", post(payments::mpesa_callback))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request as HttpRequest, header};
    use base64::Engine as _;
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::{ConnectionTrait, Database, Statement};
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let backend = db.get_database_backend();
        for (id, username, phone, role) in [
            ("u-alice", "alice", "+254700000001", "customer"),
            ("u-bob", "bob", "+254700000002", "customer"),
            ("u-paul", "paul", "+254700000003", "provider"),
        ] {
            db.execute(Statement::from_sql_and_values(
                backend,
                "INSERT INTO users (id, username, password, phone, role) VALUES (?, ?, ?, ?, ?)",
                vec![
                    id.into(),
                    username.into(),
                    "password".into(),
                    phone.into(),
                    role.into(),
                ],
            ))
            .await
            .unwrap();
        }

        let engine = Engine::builder().database(db.clone()).build().await.unwrap();
        router(ServerState {
            engine: Arc::new(engine),
            db,
        })
    }

    fn basic_auth(username: &str) -> String {
        let token = base64::engine::general_purpose::STANDARD
            .encode(format!("{username}:password"));
        format!("Basic {token}")
    }

    fn authed_request(method: &str, uri: &str, username: &str, body: Option<serde_json::Value>) -> HttpRequest<Body> {
        let builder = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, basic_auth(username))
            .header(header::CONTENT_TYPE, "application/json");
        match body {
            Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn requests_without_credentials_are_rejected() {
        let app = test_router().await;
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/wallet")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wallet_is_created_on_first_access() {
        let app = test_router().await;
        let response = app
            .oneshot(authed_request("GET", "/wallet", "alice", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], serde_json::json!(true));
        assert_eq!(json["data"]["balance_minor"], serde_json::json!(0));
        assert_eq!(json["data"]["currency"], serde_json::json!("KES"));
    }

    #[tokio::test]
    async fn send_over_balance_maps_to_422_envelope() {
        let app = test_router().await;
        let response = app
            .oneshot(authed_request(
                "POST",
                "/wallet/send",
                "alice",
                Some(serde_json::json!({
                    "recipient_phone": "+254700000002",
                    "amount_minor": 10_000,
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json = body_json(response).await;
        assert_eq!(json["success"], serde_json::json!(false));
    }

    #[tokio::test]
    async fn topup_then_send_moves_money_between_wallets() {
        let app = test_router().await;

        let response = app
            .clone()
            .oneshot(authed_request(
                "POST",
                "/wallet/topup",
                "alice",
                Some(serde_json::json!({
                    "amount_minor": 100_000,
                    "method": "card",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(authed_request(
                "POST",
                "/wallet/send",
                "alice",
                Some(serde_json::json!({
                    "recipient_phone": "+254700000002",
                    "amount_minor": 30_000,
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["data"]["amount_minor"], serde_json::json!(-30_000));
        assert!(
            json["data"]["reference"]
                .as_str()
                .unwrap()
                .starts_with("TRF_")
        );

        let response = app
            .clone()
            .oneshot(authed_request("GET", "/wallet", "alice", None))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["data"]["balance_minor"], serde_json::json!(70_000));

        let response = app
            .oneshot(authed_request("GET", "/wallet", "bob", None))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["data"]["balance_minor"], serde_json::json!(30_000));
    }

    #[tokio::test]
    async fn mpesa_callback_with_unknown_reference_is_404() {
        let app = test_router().await;
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/payments/mpesa/callback")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "reference": "TOP_0",
                            "result_code": 0,
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn double_booking_a_slot_is_409() {
        let app = test_router().await;

        let response = app
            .clone()
            .oneshot(authed_request(
                "POST",
                "/services",
                "paul",
                Some(serde_json::json!({
                    "name": "House cleaning",
                    "price_minor": 150_000,
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        let service_id = json["data"]["id"].as_str().unwrap().to_string();

        let booking = serde_json::json!({
            "service_id": service_id,
            "scheduled_date": "2024-01-20",
            "scheduled_time": "10:00",
        });
        let response = app
            .clone()
            .oneshot(authed_request(
                "POST",
                "/bookings",
                "alice",
                Some(booking.clone()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(authed_request("POST", "/bookings", "bob", Some(booking)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
