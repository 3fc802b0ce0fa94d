//! Ledger primitives.
//!
//! A `WalletTransaction` is an immutable, append-only log entry. Amounts are
//! signed: outflows (send, bill payment, withdraw) are negative, inflows
//! (top-up, receive) positive. Rows are never deleted; the only mutation a
//! row can see is the `pending -> completed` / `pending -> failed` status
//! move of the top-up flow.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    TopUp,
    Send,
    Receive,
    BillPayment,
    Withdraw,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopUp => "topup",
            Self::Send => "send",
            Self::Receive => "receive",
            Self::BillPayment => "bill_payment",
            Self::Withdraw => "withdraw",
        }
    }

    /// Correlation-id prefix for this kind. Send and receive share `TRF`
    /// because the two rows of a transfer share one reference.
    pub fn reference_prefix(self) -> &'static str {
        match self {
            Self::TopUp => "TOP",
            Self::Send | Self::Receive => "TRF",
            Self::BillPayment => "BILL",
            Self::Withdraw => "WDR",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "topup" => Ok(Self::TopUp),
            "send" => Ok(Self::Send),
            "receive" => Ok(Self::Receive),
            "bill_payment" => Ok(Self::BillPayment),
            "withdraw" => Ok(Self::Withdraw),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(EngineError::InvalidState(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

/// Builds a `<PREFIX>_<epoch millis>` correlation id for a ledger entry.
pub fn reference_for(kind: TransactionKind, at: DateTime<Utc>) -> String {
    format!("{}_{}", kind.reference_prefix(), at.timestamp_millis())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub user_id: String,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub currency: Currency,
    pub status: TransactionStatus,
    pub reference: String,
    pub counterparty_user_id: Option<String>,
    pub gateway_ref: Option<String>,
    pub bill_type: Option<String>,
    pub account_number: Option<String>,
    pub bill_provider: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WalletTransaction {
    pub fn new(
        user_id: String,
        kind: TransactionKind,
        amount_minor: i64,
        status: TransactionStatus,
        reference: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            amount_minor,
            currency: Currency::default(),
            status,
            reference,
            counterparty_user_id: None,
            gateway_ref: None,
            bill_type: None,
            account_number: None,
            bill_provider: None,
            note: None,
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallet_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
    pub reference: String,
    pub counterparty_user_id: Option<String>,
    pub gateway_ref: Option<String>,
    pub bill_type: Option<String>,
    pub account_number: Option<String>,
    pub bill_provider: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::UserId",
        to = "super::wallets::Column::UserId",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Wallets,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&WalletTransaction> for ActiveModel {
    fn from(tx: &WalletTransaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            user_id: ActiveValue::Set(tx.user_id.clone()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            currency: ActiveValue::Set(tx.currency.code().to_string()),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            reference: ActiveValue::Set(tx.reference.clone()),
            counterparty_user_id: ActiveValue::Set(tx.counterparty_user_id.clone()),
            gateway_ref: ActiveValue::Set(tx.gateway_ref.clone()),
            bill_type: ActiveValue::Set(tx.bill_type.clone()),
            account_number: ActiveValue::Set(tx.account_number.clone()),
            bill_provider: ActiveValue::Set(tx.bill_provider.clone()),
            note: ActiveValue::Set(tx.note.clone()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for WalletTransaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            user_id: model.user_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            currency: Currency::try_from(model.currency.as_str()).unwrap_or_default(),
            status: TransactionStatus::try_from(model.status.as_str())?,
            reference: model.reference,
            counterparty_user_id: model.counterparty_user_id,
            gateway_ref: model.gateway_ref,
            bill_type: model.bill_type,
            account_number: model.account_number,
            bill_provider: model.bill_provider,
            note: model.note,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn reference_prefix_matches_kind() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        assert_eq!(
            reference_for(TransactionKind::Send, at),
            "TRF_1700000000000"
        );
        assert_eq!(
            reference_for(TransactionKind::TopUp, at),
            "TOP_1700000000000"
        );
        assert_eq!(
            reference_for(TransactionKind::BillPayment, at),
            "BILL_1700000000000"
        );
        assert_eq!(
            reference_for(TransactionKind::Withdraw, at),
            "WDR_1700000000000"
        );
    }

    #[test]
    fn kind_round_trips_through_strings() {
        for kind in [
            TransactionKind::TopUp,
            TransactionKind::Send,
            TransactionKind::Receive,
            TransactionKind::BillPayment,
            TransactionKind::Withdraw,
        ] {
            assert_eq!(TransactionKind::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(TransactionKind::try_from("refund").is_err());
    }
}
