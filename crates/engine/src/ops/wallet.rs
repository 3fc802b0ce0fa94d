//! Wallet ledger operations.
//!
//! Every balance mutation happens inside a database transaction together
//! with its ledger row; the peer-to-peer send commits all four writes
//! (two balances, two rows) or none of them.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::{
    EngineError, NotificationEvent, ResultEngine, SendCmd, TopUpCmd, TopUpMethod, TransactionKind,
    TransactionStatus, Wallet, WalletTransaction, WithdrawCmd,
    commands::PayBillCmd,
    wallet_transactions::{self, reference_for},
    wallets,
};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

/// Largest page size `list_transactions` will serve.
const MAX_PAGE_SIZE: u64 = 100;

fn format_kes(amount_minor: i64) -> String {
    let abs = amount_minor.abs();
    format!("KES {}.{:02}", abs / 100, abs % 100)
}

fn ensure_positive(amount_minor: i64) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "amount_minor must be > 0".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    /// Returns the user's wallet, creating an empty one on first access.
    pub async fn wallet(&self, user_id: &str) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let model = self.wallet_model(&db_tx, user_id).await?;
            Wallet::try_from(model)
        })
    }

    /// Funds a wallet.
    ///
    /// The mobile-money path leaves the ledger row pending until the gateway
    /// confirmation arrives (`confirm_top_up`); a gateway error marks the
    /// row failed and surfaces as [`EngineError::Gateway`] with the balance
    /// untouched. Card and cash top-ups capture synchronously.
    pub async fn top_up(&self, cmd: TopUpCmd) -> ResultEngine<WalletTransaction> {
        ensure_positive(cmd.amount_minor)?;
        let now = Utc::now();
        let reference = reference_for(TransactionKind::TopUp, now);

        match cmd.method {
            TopUpMethod::Mpesa => {
                let phone = normalize_required_name(
                    cmd.phone.as_deref().unwrap_or_default(),
                    "phone",
                )
                .map_err(|_| {
                    EngineError::InvalidAmount("phone is required for mpesa top-ups".to_string())
                })?;

                let tx = with_tx!(self, |db_tx| {
                    self.require_user(&db_tx, &cmd.user_id).await?;
                    self.wallet_model(&db_tx, &cmd.user_id).await?;

                    let tx = WalletTransaction::new(
                        cmd.user_id.clone(),
                        TransactionKind::TopUp,
                        cmd.amount_minor,
                        TransactionStatus::Pending,
                        reference.clone(),
                        now,
                    );
                    wallet_transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
                    Ok(tx)
                })?;

                match self
                    .gateway
                    .stk_push(&phone, cmd.amount_minor, &reference)
                    .await
                {
                    Ok(gateway_ref) => {
                        let active = wallet_transactions::ActiveModel {
                            id: ActiveValue::Set(tx.id.to_string()),
                            gateway_ref: ActiveValue::Set(Some(gateway_ref.clone())),
                            ..Default::default()
                        };
                        active.update(&self.database).await?;

                        let mut tx = tx;
                        tx.gateway_ref = Some(gateway_ref);
                        Ok(tx)
                    }
                    Err(err) => {
                        let active = wallet_transactions::ActiveModel {
                            id: ActiveValue::Set(tx.id.to_string()),
                            status: ActiveValue::Set(
                                TransactionStatus::Failed.as_str().to_string(),
                            ),
                            ..Default::default()
                        };
                        active.update(&self.database).await?;
                        Err(EngineError::Gateway(err.to_string()))
                    }
                }
            }
            TopUpMethod::Card | TopUpMethod::Cash => {
                with_tx!(self, |db_tx| {
                    self.require_user(&db_tx, &cmd.user_id).await?;
                    let wallet = self.wallet_model(&db_tx, &cmd.user_id).await?;

                    let tx = WalletTransaction::new(
                        cmd.user_id.clone(),
                        TransactionKind::TopUp,
                        cmd.amount_minor,
                        TransactionStatus::Completed,
                        reference.clone(),
                        now,
                    );
                    wallet_transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
                    self.set_balance(&db_tx, &wallet, wallet.balance_minor + cmd.amount_minor)
                        .await?;
                    Ok(tx)
                })
            }
        }
    }

    /// Applies the gateway's confirmation to a pending top-up.
    ///
    /// On success the status flip and the balance credit commit together;
    /// on failure only the status changes.
    pub async fn confirm_top_up(
        &self,
        reference: &str,
        success: bool,
    ) -> ResultEngine<WalletTransaction> {
        let tx = with_tx!(self, |db_tx| {
            let model = wallet_transactions::Entity::find()
                .filter(
                    wallet_transactions::Column::Kind.eq(TransactionKind::TopUp.as_str()),
                )
                .filter(wallet_transactions::Column::Reference.eq(reference.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("top-up not exists".to_string()))?;
            let mut tx = WalletTransaction::try_from(model)?;

            if tx.status != TransactionStatus::Pending {
                return Err(EngineError::InvalidState(
                    "top-up is not pending".to_string(),
                ));
            }

            let status = if success {
                TransactionStatus::Completed
            } else {
                TransactionStatus::Failed
            };
            let active = wallet_transactions::ActiveModel {
                id: ActiveValue::Set(tx.id.to_string()),
                status: ActiveValue::Set(status.as_str().to_string()),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            if success {
                let wallet = self.wallet_model(&db_tx, &tx.user_id).await?;
                self.set_balance(&db_tx, &wallet, wallet.balance_minor + tx.amount_minor)
                    .await?;
            }

            tx.status = status;
            Ok(tx)
        })?;

        if tx.status == TransactionStatus::Completed {
            self.notifier
                .publish(
                    &self.database,
                    NotificationEvent {
                        user_id: tx.user_id.clone(),
                        kind: "wallet_topup".to_string(),
                        title: "Top-up received".to_string(),
                        message: format!("{} added to your wallet", format_kes(tx.amount_minor)),
                        data: Some(serde_json::json!({ "reference": tx.reference })),
                    },
                )
                .await;
        }
        Ok(tx)
    }

    /// Peer-to-peer transfer.
    ///
    /// Sender debit, recipient credit and the two ledger rows (send
    /// negative, receive positive, shared reference) commit atomically.
    pub async fn send(&self, cmd: SendCmd) -> ResultEngine<WalletTransaction> {
        ensure_positive(cmd.amount_minor)?;
        let note = normalize_optional_text(cmd.note.as_deref());
        let now = Utc::now();
        let reference = reference_for(TransactionKind::Send, now);

        let (sent, recipient_id) = with_tx!(self, |db_tx| {
            let sender = self.require_user(&db_tx, &cmd.sender_id).await?;
            let sender_wallet = self.wallet_model(&db_tx, &cmd.sender_id).await?;

            let recipient = self
                .find_user_by_phone(&db_tx, cmd.recipient_phone.trim())
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("recipient not exists".to_string()))?;
            if recipient.id == sender.id {
                return Err(EngineError::InvalidRecipient(
                    "cannot send to your own wallet".to_string(),
                ));
            }

            if sender_wallet.balance_minor < cmd.amount_minor {
                return Err(EngineError::InsufficientBalance(format!(
                    "balance is {}",
                    format_kes(sender_wallet.balance_minor)
                )));
            }

            let recipient_wallet = self.wallet_model(&db_tx, &recipient.id).await?;

            self.set_balance(
                &db_tx,
                &sender_wallet,
                sender_wallet.balance_minor - cmd.amount_minor,
            )
            .await?;
            self.set_balance(
                &db_tx,
                &recipient_wallet,
                recipient_wallet.balance_minor + cmd.amount_minor,
            )
            .await?;

            let mut sent = WalletTransaction::new(
                sender.id.clone(),
                TransactionKind::Send,
                -cmd.amount_minor,
                TransactionStatus::Completed,
                reference.clone(),
                now,
            );
            sent.counterparty_user_id = Some(recipient.id.clone());
            sent.note = note.clone();
            wallet_transactions::ActiveModel::from(&sent).insert(&db_tx).await?;

            let mut received = WalletTransaction::new(
                recipient.id.clone(),
                TransactionKind::Receive,
                cmd.amount_minor,
                TransactionStatus::Completed,
                reference.clone(),
                now,
            );
            received.counterparty_user_id = Some(sender.id.clone());
            received.note = note.clone();
            wallet_transactions::ActiveModel::from(&received).insert(&db_tx).await?;

            Ok((sent, recipient.id))
        })?;

        self.notifier
            .publish(
                &self.database,
                NotificationEvent {
                    user_id: recipient_id,
                    kind: "wallet_received".to_string(),
                    title: "Money received".to_string(),
                    message: format!("You received {}", format_kes(cmd.amount_minor)),
                    data: Some(serde_json::json!({ "reference": reference })),
                },
            )
            .await;

        Ok(sent)
    }

    /// Pays a bill from the wallet balance and awards tier-scaled loyalty
    /// points for the spend.
    pub async fn pay_bill(&self, cmd: PayBillCmd) -> ResultEngine<WalletTransaction> {
        ensure_positive(cmd.amount_minor)?;
        let bill_type = normalize_required_name(&cmd.bill_type, "bill_type")?;
        let account_number = normalize_required_name(&cmd.account_number, "account_number")?;
        let now = Utc::now();
        let reference = reference_for(TransactionKind::BillPayment, now);

        let tx = with_tx!(self, |db_tx| {
            self.require_user(&db_tx, &cmd.user_id).await?;
            let wallet = self.wallet_model(&db_tx, &cmd.user_id).await?;
            if wallet.balance_minor < cmd.amount_minor {
                return Err(EngineError::InsufficientBalance(format!(
                    "balance is {}",
                    format_kes(wallet.balance_minor)
                )));
            }

            self.set_balance(&db_tx, &wallet, wallet.balance_minor - cmd.amount_minor)
                .await?;

            let mut tx = WalletTransaction::new(
                cmd.user_id.clone(),
                TransactionKind::BillPayment,
                -cmd.amount_minor,
                TransactionStatus::Completed,
                reference.clone(),
                now,
            );
            tx.bill_type = Some(bill_type.clone());
            tx.account_number = Some(account_number.clone());
            tx.bill_provider = normalize_optional_text(cmd.provider.as_deref());
            wallet_transactions::ActiveModel::from(&tx).insert(&db_tx).await?;

            let base_points = cmd.amount_minor / crate::MINOR_UNITS_PER_POINT;
            if base_points > 0 {
                let multiplier = self.tier_multiplier(&db_tx, &cmd.user_id).await?;
                self.award_points(&db_tx, &cmd.user_id, base_points * multiplier)
                    .await?;
            }

            Ok(tx)
        })?;

        self.notifier
            .publish(
                &self.database,
                NotificationEvent {
                    user_id: tx.user_id.clone(),
                    kind: "bill_paid".to_string(),
                    title: "Bill payment".to_string(),
                    message: format!(
                        "{} paid to {}",
                        format_kes(cmd.amount_minor),
                        tx.bill_provider.as_deref().unwrap_or(&bill_type)
                    ),
                    data: Some(serde_json::json!({ "reference": tx.reference })),
                },
            )
            .await;

        Ok(tx)
    }

    /// Withdraws from the wallet to mobile money.
    pub async fn withdraw(&self, cmd: WithdrawCmd) -> ResultEngine<WalletTransaction> {
        ensure_positive(cmd.amount_minor)?;
        let phone = normalize_required_name(&cmd.phone, "phone")?;
        let now = Utc::now();
        let reference = reference_for(TransactionKind::Withdraw, now);

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, &cmd.user_id).await?;
            let wallet = self.wallet_model(&db_tx, &cmd.user_id).await?;
            if wallet.balance_minor < cmd.amount_minor {
                return Err(EngineError::InsufficientBalance(format!(
                    "balance is {}",
                    format_kes(wallet.balance_minor)
                )));
            }

            self.set_balance(&db_tx, &wallet, wallet.balance_minor - cmd.amount_minor)
                .await?;

            let mut tx = WalletTransaction::new(
                cmd.user_id.clone(),
                TransactionKind::Withdraw,
                -cmd.amount_minor,
                TransactionStatus::Completed,
                reference,
                now,
            );
            tx.note = Some(format!("withdraw to {phone}"));
            wallet_transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            Ok(tx)
        })
    }

    /// Reverse-chronological page of the user's ledger.
    ///
    /// `page` is 1-based; `limit` is clamped to 100.
    pub async fn list_transactions(
        &self,
        user_id: &str,
        kind: Option<TransactionKind>,
        page: u64,
        limit: u64,
    ) -> ResultEngine<Vec<WalletTransaction>> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let page = page.max(1);

        let mut query = wallet_transactions::Entity::find()
            .filter(wallet_transactions::Column::UserId.eq(user_id.to_string()))
            .order_by_desc(wallet_transactions::Column::CreatedAt)
            .offset((page - 1) * limit)
            .limit(limit);
        if let Some(kind) = kind {
            query = query.filter(wallet_transactions::Column::Kind.eq(kind.as_str()));
        }

        let models = query.all(&self.database).await?;
        models.into_iter().map(WalletTransaction::try_from).collect()
    }

    async fn set_balance<C: ConnectionTrait>(
        &self,
        db: &C,
        wallet: &wallets::Model,
        new_balance_minor: i64,
    ) -> ResultEngine<()> {
        // The non-negative invariant is enforced here, not at call sites.
        if new_balance_minor < 0 {
            return Err(EngineError::InsufficientBalance(format!(
                "balance is {}",
                format_kes(wallet.balance_minor)
            )));
        }
        let active = wallets::ActiveModel {
            id: ActiveValue::Set(wallet.id.clone()),
            balance_minor: ActiveValue::Set(new_balance_minor),
            ..Default::default()
        };
        active.update(db).await?;
        Ok(())
    }
}
