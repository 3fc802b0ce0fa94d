//! The module contains the `Wallet` struct and its persistence model.

use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{Currency, EngineError};

/// A mobile wallet.
///
/// There is exactly one wallet per user. The balance is denormalized; every
/// mutation of it is paired with a `wallet_transactions` row inside the same
/// database transaction, and it never goes below zero.
#[derive(Clone, Debug)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: String,
    pub balance_minor: i64,
    pub currency: Currency,
}

impl Wallet {
    pub fn new(user_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            balance_minor: 0,
            currency: Currency::default(),
        }
    }

    /// Whether a debit of `amount_minor` keeps the balance non-negative.
    pub fn can_debit(&self, amount_minor: i64) -> bool {
        amount_minor > 0 && self.balance_minor >= amount_minor
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub balance_minor: i64,
    pub currency: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::wallet_transactions::Entity")]
    Transactions,
}

impl Related<super::wallet_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wallet> for ActiveModel {
    fn from(value: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            balance_minor: ActiveValue::Set(value.balance_minor),
            currency: ActiveValue::Set(value.currency.code().to_string()),
        }
    }
}

impl TryFrom<Model> for Wallet {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("wallet not exists".to_string()))?,
            user_id: model.user_id,
            balance_minor: model.balance_minor,
            currency: Currency::try_from(model.currency.as_str()).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_wallet_starts_empty() {
        let wallet = Wallet::new("u1".to_string());
        assert_eq!(wallet.balance_minor, 0);
        assert_eq!(wallet.currency, Currency::Kes);
    }

    #[test]
    fn can_debit_respects_balance_and_sign() {
        let mut wallet = Wallet::new("u1".to_string());
        wallet.balance_minor = 500;
        assert!(wallet.can_debit(500));
        assert!(!wallet.can_debit(501));
        assert!(!wallet.can_debit(0));
        assert!(!wallet.can_debit(-10));
    }
}
