//! Command structs for engine operations.
//!
//! These types group parameters for write operations, keeping call sites
//! readable and avoiding long argument lists.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

/// How a top-up is funded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopUpMethod {
    Mpesa,
    Card,
    Cash,
}

impl TopUpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mpesa => "mpesa",
            Self::Card => "card",
            Self::Cash => "cash",
        }
    }
}

impl TryFrom<&str> for TopUpMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "mpesa" => Ok(Self::Mpesa),
            "card" => Ok(Self::Card),
            "cash" => Ok(Self::Cash),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid top-up method: {other}"
            ))),
        }
    }
}

/// Fund a wallet.
#[derive(Clone, Debug)]
pub struct TopUpCmd {
    pub user_id: String,
    pub amount_minor: i64,
    pub method: TopUpMethod,
    pub phone: Option<String>,
}

impl TopUpCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, amount_minor: i64, method: TopUpMethod) -> Self {
        Self {
            user_id: user_id.into(),
            amount_minor,
            method,
            phone: None,
        }
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

/// Peer-to-peer transfer to the user owning `recipient_phone`.
#[derive(Clone, Debug)]
pub struct SendCmd {
    pub sender_id: String,
    pub recipient_phone: String,
    pub amount_minor: i64,
    pub note: Option<String>,
}

impl SendCmd {
    #[must_use]
    pub fn new(
        sender_id: impl Into<String>,
        recipient_phone: impl Into<String>,
        amount_minor: i64,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            recipient_phone: recipient_phone.into(),
            amount_minor,
            note: None,
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Pay a bill from the wallet balance.
#[derive(Clone, Debug)]
pub struct PayBillCmd {
    pub user_id: String,
    pub bill_type: String,
    pub account_number: String,
    pub amount_minor: i64,
    pub provider: Option<String>,
}

impl PayBillCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        bill_type: impl Into<String>,
        account_number: impl Into<String>,
        amount_minor: i64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            bill_type: bill_type.into(),
            account_number: account_number.into(),
            amount_minor,
            provider: None,
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

/// Withdraw from the wallet to mobile money.
#[derive(Clone, Debug)]
pub struct WithdrawCmd {
    pub user_id: String,
    pub amount_minor: i64,
    pub phone: String,
}

impl WithdrawCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, amount_minor: i64, phone: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            amount_minor,
            phone: phone.into(),
        }
    }
}

/// Create a booking for a catalog service.
#[derive(Clone, Debug)]
pub struct CreateBookingCmd {
    pub customer_id: String,
    pub service_id: Uuid,
    pub scheduled_date: NaiveDate,
    /// Slot label, `HH:MM`.
    pub scheduled_time: String,
    pub duration_minutes: i32,
    /// Request the instant-booking path; only honored when the service
    /// allows it.
    pub instant: bool,
    pub notes: Option<String>,
}

impl CreateBookingCmd {
    #[must_use]
    pub fn new(
        customer_id: impl Into<String>,
        service_id: Uuid,
        scheduled_date: NaiveDate,
        scheduled_time: impl Into<String>,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            service_id,
            scheduled_date,
            scheduled_time: scheduled_time.into(),
            duration_minutes: 60,
            instant: false,
            notes: None,
        }
    }

    #[must_use]
    pub fn duration_minutes(mut self, duration_minutes: i32) -> Self {
        self.duration_minutes = duration_minutes;
        self
    }

    #[must_use]
    pub fn instant(mut self, instant: bool) -> Self {
        self.instant = instant;
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Move a booking to a new slot, re-entering the pending gate.
#[derive(Clone, Debug)]
pub struct RescheduleBookingCmd {
    pub booking_id: Uuid,
    pub acting_user_id: String,
    pub new_date: NaiveDate,
    pub new_time: String,
}

impl RescheduleBookingCmd {
    #[must_use]
    pub fn new(
        booking_id: Uuid,
        acting_user_id: impl Into<String>,
        new_date: NaiveDate,
        new_time: impl Into<String>,
    ) -> Self {
        Self {
            booking_id,
            acting_user_id: acting_user_id.into(),
            new_date,
            new_time: new_time.into(),
        }
    }
}
