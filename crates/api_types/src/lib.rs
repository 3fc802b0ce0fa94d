use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Kes,
}

/// Response envelope carried by every endpoint: `{success, data}` on the
/// happy path, `{success: false, error}` otherwise.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
}

pub mod wallet {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletView {
        pub id: Uuid,
        pub balance_minor: i64,
        pub currency: Currency,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TopUpMethod {
        Mpesa,
        Card,
        Cash,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopUpNew {
        pub amount_minor: i64,
        pub method: TopUpMethod,
        /// Required for the mpesa method; ignored otherwise.
        pub phone: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SendNew {
        pub recipient_phone: String,
        pub amount_minor: i64,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PayBillNew {
        pub bill_type: String,
        pub account_number: String,
        pub amount_minor: i64,
        pub provider: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawNew {
        pub amount_minor: i64,
        pub phone: String,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Topup,
        Send,
        Receive,
        BillPayment,
        Withdraw,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionStatus {
        Pending,
        Completed,
        Failed,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub kind: TransactionKind,
        /// Signed: negative for outflows.
        pub amount_minor: i64,
        pub currency: Currency,
        pub status: TransactionStatus,
        pub reference: String,
        pub counterparty_user_id: Option<String>,
        pub note: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        pub kind: Option<TransactionKind>,
        /// 1-based.
        pub page: Option<u64>,
        /// Capped server-side at 100.
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        pub page: u64,
    }
}

pub mod payments {
    use super::*;

    /// Gateway confirmation callback body.
    ///
    /// `result_code` follows the Daraja convention: zero means the push was
    /// completed, anything else is a failure.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MpesaCallback {
        pub reference: String,
        pub result_code: i64,
        pub result_desc: Option<String>,
    }
}

pub mod service {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ServiceNew {
        pub name: String,
        pub description: Option<String>,
        pub price_minor: i64,
        #[serde(default)]
        pub instant_booking: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ServiceUpdate {
        pub active: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ServiceView {
        pub id: Uuid,
        pub provider_id: String,
        pub name: String,
        pub description: Option<String>,
        pub price_minor: i64,
        pub currency: Currency,
        pub instant_booking: bool,
        pub active: bool,
    }
}

pub mod booking {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BookingStatus {
        Pending,
        Confirmed,
        InProgress,
        Completed,
        Cancelled,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CancelledBy {
        Customer,
        Provider,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookingNew {
        pub service_id: Uuid,
        pub scheduled_date: NaiveDate,
        /// Slot label, `HH:MM`.
        pub scheduled_time: String,
        pub duration_minutes: Option<i32>,
        /// Ask for the instant-booking path; honored only when the service
        /// allows it.
        #[serde(default)]
        pub instant: bool,
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookingCancel {
        pub reason: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookingReschedule {
        pub scheduled_date: NaiveDate,
        pub scheduled_time: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookingListQuery {
        /// `customer` (default) or `provider`.
        pub view: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookingView {
        pub id: Uuid,
        pub customer_id: String,
        pub service_id: Uuid,
        pub provider_id: String,
        pub scheduled_date: NaiveDate,
        pub scheduled_time: String,
        pub duration_minutes: i32,
        pub status: BookingStatus,
        pub total_amount_minor: i64,
        pub notes: Option<String>,
        pub cancelled_by: Option<CancelledBy>,
        pub cancellation_reason: Option<String>,
        pub created_at: DateTime<Utc>,
    }
}

pub mod loyalty {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Tier {
        Bronze,
        Silver,
        Gold,
        Platinum,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoyaltyView {
        pub points: i64,
        pub lifetime_points: i64,
        pub tier: Tier,
        /// Scalar applied to points from monetary activity.
        pub multiplier: i64,
    }
}

pub mod provider {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StatsQuery {
        /// Defaults to today (UTC).
        pub date: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DailyStatsView {
        pub day: NaiveDate,
        pub completed_bookings: i64,
        pub earnings_minor: i64,
    }
}

pub mod notification {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NotificationView {
        pub id: Uuid,
        pub kind: String,
        pub title: String,
        pub message: String,
        pub data: Option<serde_json::Value>,
        pub read: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NotificationListQuery {
        pub limit: Option<u64>,
    }
}
