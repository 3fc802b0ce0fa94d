//! Wallet API endpoints.

use api_types::ApiResponse;
use api_types::wallet::{
    PayBillNew, SendNew, TopUpMethod as ApiTopUpMethod, TopUpNew, TransactionKind as ApiKind,
    TransactionListQuery, TransactionListResponse, TransactionStatus as ApiStatus,
    TransactionView, WalletView, WithdrawNew,
};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};

use crate::{ServerError, server::ServerState};
use engine::users;

fn map_currency(currency: engine::Currency) -> api_types::Currency {
    match currency {
        engine::Currency::Kes => api_types::Currency::Kes,
    }
}

fn map_kind(kind: engine::TransactionKind) -> ApiKind {
    match kind {
        engine::TransactionKind::TopUp => ApiKind::Topup,
        engine::TransactionKind::Send => ApiKind::Send,
        engine::TransactionKind::Receive => ApiKind::Receive,
        engine::TransactionKind::BillPayment => ApiKind::BillPayment,
        engine::TransactionKind::Withdraw => ApiKind::Withdraw,
    }
}

fn map_status(status: engine::TransactionStatus) -> ApiStatus {
    match status {
        engine::TransactionStatus::Pending => ApiStatus::Pending,
        engine::TransactionStatus::Completed => ApiStatus::Completed,
        engine::TransactionStatus::Failed => ApiStatus::Failed,
    }
}

pub(crate) fn transaction_view(tx: engine::WalletTransaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        kind: map_kind(tx.kind),
        amount_minor: tx.amount_minor,
        currency: map_currency(tx.currency),
        status: map_status(tx.status),
        reference: tx.reference,
        counterparty_user_id: tx.counterparty_user_id,
        note: tx.note,
        created_at: tx.created_at,
    }
}

pub async fn get_wallet(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<ApiResponse<WalletView>>, ServerError> {
    let wallet = state.engine.wallet(&user.id).await?;
    Ok(Json(ApiResponse::ok(WalletView {
        id: wallet.id,
        balance_minor: wallet.balance_minor,
        currency: map_currency(wallet.currency),
    })))
}

pub async fn topup_new(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TopUpNew>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionView>>), ServerError> {
    let method = match payload.method {
        ApiTopUpMethod::Mpesa => engine::TopUpMethod::Mpesa,
        ApiTopUpMethod::Card => engine::TopUpMethod::Card,
        ApiTopUpMethod::Cash => engine::TopUpMethod::Cash,
    };
    let mut cmd = engine::TopUpCmd::new(user.id.clone(), payload.amount_minor, method);
    if let Some(phone) = payload.phone {
        cmd = cmd.phone(phone);
    }

    let tx = state.engine.top_up(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(transaction_view(tx))),
    ))
}

pub async fn send_new(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<SendNew>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionView>>), ServerError> {
    let mut cmd = engine::SendCmd::new(
        user.id.clone(),
        payload.recipient_phone,
        payload.amount_minor,
    );
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }

    let tx = state.engine.send(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(transaction_view(tx))),
    ))
}

pub async fn paybill_new(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<PayBillNew>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionView>>), ServerError> {
    let mut cmd = engine::PayBillCmd::new(
        user.id.clone(),
        payload.bill_type,
        payload.account_number,
        payload.amount_minor,
    );
    if let Some(provider) = payload.provider {
        cmd = cmd.provider(provider);
    }

    let tx = state.engine.pay_bill(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(transaction_view(tx))),
    ))
}

pub async fn withdraw_new(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<WithdrawNew>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionView>>), ServerError> {
    let cmd = engine::WithdrawCmd::new(user.id.clone(), payload.amount_minor, payload.phone);
    let tx = state.engine.withdraw(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(transaction_view(tx))),
    ))
}

pub async fn transactions_list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<ApiResponse<TransactionListResponse>>, ServerError> {
    let kind = query.kind.map(|kind| match kind {
        ApiKind::Topup => engine::TransactionKind::TopUp,
        ApiKind::Send => engine::TransactionKind::Send,
        ApiKind::Receive => engine::TransactionKind::Receive,
        ApiKind::BillPayment => engine::TransactionKind::BillPayment,
        ApiKind::Withdraw => engine::TransactionKind::Withdraw,
    });
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20);

    let transactions = state
        .engine
        .list_transactions(&user.id, kind, page, limit)
        .await?;

    Ok(Json(ApiResponse::ok(TransactionListResponse {
        transactions: transactions.into_iter().map(transaction_view).collect(),
        page,
    })))
}
