//! Booking primitives.
//!
//! A `Booking` moves through a fixed state machine:
//! `pending -> confirmed -> in_progress -> completed`, with cancellation
//! allowed from `pending` and `confirmed`, and rescheduling resetting the
//! status to `pending`.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Active statuses hold their slot against other bookings.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::InProgress)
    }
}

impl TryFrom<&str> for BookingStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::InvalidState(format!(
                "invalid booking status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelledBy {
    Customer,
    Provider,
}

impl CancelledBy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Provider => "provider",
        }
    }
}

impl TryFrom<&str> for CancelledBy {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "customer" => Ok(Self::Customer),
            "provider" => Ok(Self::Provider),
            other => Err(EngineError::InvalidState(format!(
                "invalid cancelled_by: {other}"
            ))),
        }
    }
}

/// Key under the UNIQUE index that keeps one active booking per slot.
pub fn slot_key(provider_id: &str, date: NaiveDate, time: &str) -> String {
    format!("{provider_id}|{date}|{time}")
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub customer_id: String,
    pub service_id: Uuid,
    pub provider_id: String,
    pub scheduled_date: NaiveDate,
    /// Slot label, `HH:MM`.
    pub scheduled_time: String,
    pub duration_minutes: i32,
    pub status: BookingStatus,
    pub total_amount_minor: i64,
    pub notes: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<CancelledBy>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn slot_key(&self) -> String {
        slot_key(&self.provider_id, self.scheduled_date, &self.scheduled_time)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub customer_id: String,
    pub service_id: String,
    pub provider_id: String,
    pub scheduled_date: Date,
    pub scheduled_time: String,
    pub duration_minutes: i32,
    pub status: String,
    pub total_amount_minor: i64,
    pub notes: Option<String>,
    /// Set while the booking holds an active status, NULL otherwise. A
    /// UNIQUE index on this column closes the create/reschedule slot race.
    pub slot_key: Option<String>,
    pub confirmed_at: Option<DateTimeUtc>,
    pub started_at: Option<DateTimeUtc>,
    pub completed_at: Option<DateTimeUtc>,
    pub cancelled_at: Option<DateTimeUtc>,
    pub cancelled_by: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::services::Entity",
        from = "Column::ServiceId",
        to = "super::services::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Services,
}

impl Related<super::services::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Services.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Booking> for ActiveModel {
    fn from(value: &Booking) -> Self {
        let slot = value.status.is_active().then(|| value.slot_key());
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            customer_id: ActiveValue::Set(value.customer_id.clone()),
            service_id: ActiveValue::Set(value.service_id.to_string()),
            provider_id: ActiveValue::Set(value.provider_id.clone()),
            scheduled_date: ActiveValue::Set(value.scheduled_date),
            scheduled_time: ActiveValue::Set(value.scheduled_time.clone()),
            duration_minutes: ActiveValue::Set(value.duration_minutes),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            total_amount_minor: ActiveValue::Set(value.total_amount_minor),
            notes: ActiveValue::Set(value.notes.clone()),
            slot_key: ActiveValue::Set(slot),
            confirmed_at: ActiveValue::Set(value.confirmed_at),
            started_at: ActiveValue::Set(value.started_at),
            completed_at: ActiveValue::Set(value.completed_at),
            cancelled_at: ActiveValue::Set(value.cancelled_at),
            cancelled_by: ActiveValue::Set(value.cancelled_by.map(|c| c.as_str().to_string())),
            cancellation_reason: ActiveValue::Set(value.cancellation_reason.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Booking {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("booking not exists".to_string()))?,
            customer_id: model.customer_id,
            service_id: Uuid::parse_str(&model.service_id)
                .map_err(|_| EngineError::KeyNotFound("service not exists".to_string()))?,
            provider_id: model.provider_id,
            scheduled_date: model.scheduled_date,
            scheduled_time: model.scheduled_time,
            duration_minutes: model.duration_minutes,
            status: BookingStatus::try_from(model.status.as_str())?,
            total_amount_minor: model.total_amount_minor,
            notes: model.notes,
            confirmed_at: model.confirmed_at,
            started_at: model.started_at,
            completed_at: model.completed_at,
            cancelled_at: model.cancelled_at,
            cancelled_by: model
                .cancelled_by
                .as_deref()
                .map(CancelledBy::try_from)
                .transpose()?,
            cancellation_reason: model.cancellation_reason,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_statuses_hold_the_slot() {
        assert!(BookingStatus::Pending.is_active());
        assert!(BookingStatus::Confirmed.is_active());
        assert!(BookingStatus::InProgress.is_active());
        assert!(!BookingStatus::Completed.is_active());
        assert!(!BookingStatus::Cancelled.is_active());
    }

    #[test]
    fn slot_key_is_provider_date_time() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
        assert_eq!(slot_key("prov-1", date, "10:00"), "prov-1|2024-01-20|10:00");
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::InProgress,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::try_from(status.as_str()).unwrap(), status);
        }
        assert!(BookingStatus::try_from("paused").is_err());
    }
}
