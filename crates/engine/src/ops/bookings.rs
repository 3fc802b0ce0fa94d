//! Booking lifecycle operations.
//!
//! The slot invariant (one active booking per provider/date/time) is
//! checked inside the writing transaction and backstopped by the UNIQUE
//! index on `slot_key`, so two concurrent creates for the same slot cannot
//! both land.

use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, SqlErr,
};
use uuid::Uuid;

use crate::{
    Booking, BookingStatus, CancelledBy, CreateBookingCmd, EngineError, NotificationEvent,
    RescheduleBookingCmd, ResultEngine, Service, analytics::provider_earnings, bookings,
    bookings::slot_key, loyalty::COMPLETION_POINTS, services, users::UserRole,
};

use super::{Engine, normalize_optional_text, with_tx};

/// Which side of a booking a listing should show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookingView {
    Customer,
    Provider,
}

fn validate_slot_time(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if NaiveTime::parse_from_str(trimmed, "%H:%M").is_err() {
        return Err(EngineError::InvalidAmount(
            "scheduled_time must be HH:MM".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn slot_conflict_from_insert(err: sea_orm::DbErr, key: String) -> EngineError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        EngineError::SlotConflict(key)
    } else {
        err.into()
    }
}

impl Engine {
    /// Books a service for a slot.
    ///
    /// The booking starts confirmed only when the service allows instant
    /// booking and the command asked for it; otherwise it enters the
    /// pending confirmation gate.
    pub async fn create_booking(&self, cmd: CreateBookingCmd) -> ResultEngine<Booking> {
        let time = validate_slot_time(&cmd.scheduled_time)?;
        if cmd.duration_minutes <= 0 {
            return Err(EngineError::InvalidAmount(
                "duration_minutes must be > 0".to_string(),
            ));
        }
        let notes = normalize_optional_text(cmd.notes.as_deref());
        let now = Utc::now();

        let booking = with_tx!(self, |db_tx| {
            self.require_user(&db_tx, &cmd.customer_id).await?;

            let service_model = services::Entity::find_by_id(cmd.service_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("service not exists".to_string()))?;
            let service = Service::try_from(service_model)?;
            if !service.active {
                return Err(EngineError::InvalidState(
                    "service is not active".to_string(),
                ));
            }

            if self
                .slot_taken(&db_tx, &service.provider_id, cmd.scheduled_date, &time, None)
                .await?
            {
                return Err(EngineError::SlotConflict(slot_key(
                    &service.provider_id,
                    cmd.scheduled_date,
                    &time,
                )));
            }

            let status = if service.instant_booking && cmd.instant {
                BookingStatus::Confirmed
            } else {
                BookingStatus::Pending
            };
            let booking = Booking {
                id: Uuid::new_v4(),
                customer_id: cmd.customer_id.clone(),
                service_id: service.id,
                provider_id: service.provider_id.clone(),
                scheduled_date: cmd.scheduled_date,
                scheduled_time: time.clone(),
                duration_minutes: cmd.duration_minutes,
                status,
                total_amount_minor: service.price_minor,
                notes,
                confirmed_at: (status == BookingStatus::Confirmed).then_some(now),
                started_at: None,
                completed_at: None,
                cancelled_at: None,
                cancelled_by: None,
                cancellation_reason: None,
                created_at: now,
            };

            if let Err(err) = bookings::ActiveModel::from(&booking).insert(&db_tx).await {
                return Err(slot_conflict_from_insert(err, booking.slot_key()));
            }
            Ok(booking)
        })?;

        self.notifier
            .publish(
                &self.database,
                NotificationEvent {
                    user_id: booking.provider_id.clone(),
                    kind: "booking_created".to_string(),
                    title: "New booking".to_string(),
                    message: format!(
                        "Booking requested for {} at {}",
                        booking.scheduled_date, booking.scheduled_time
                    ),
                    data: Some(serde_json::json!({ "booking_id": booking.id })),
                },
            )
            .await;

        Ok(booking)
    }

    /// Provider accepts a pending booking.
    pub async fn confirm_booking(
        &self,
        booking_id: Uuid,
        acting_user_id: &str,
    ) -> ResultEngine<Booking> {
        let now = Utc::now();
        let booking = with_tx!(self, |db_tx| {
            let mut booking = self.require_booking(&db_tx, booking_id).await?;
            if booking.provider_id != acting_user_id {
                return Err(EngineError::Forbidden(
                    "only the provider can confirm a booking".to_string(),
                ));
            }
            if booking.status != BookingStatus::Pending {
                return Err(EngineError::InvalidState(format!(
                    "cannot confirm a {} booking",
                    booking.status.as_str()
                )));
            }

            let active = bookings::ActiveModel {
                id: ActiveValue::Set(booking.id.to_string()),
                status: ActiveValue::Set(BookingStatus::Confirmed.as_str().to_string()),
                confirmed_at: ActiveValue::Set(Some(now)),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            booking.status = BookingStatus::Confirmed;
            booking.confirmed_at = Some(now);
            Ok(booking)
        })?;

        self.notifier
            .publish(
                &self.database,
                NotificationEvent {
                    user_id: booking.customer_id.clone(),
                    kind: "booking_confirmed".to_string(),
                    title: "Booking confirmed".to_string(),
                    message: format!(
                        "Your booking for {} at {} was confirmed",
                        booking.scheduled_date, booking.scheduled_time
                    ),
                    data: Some(serde_json::json!({ "booking_id": booking.id })),
                },
            )
            .await;

        Ok(booking)
    }

    /// Provider marks a confirmed booking as underway.
    pub async fn start_booking(
        &self,
        booking_id: Uuid,
        acting_user_id: &str,
    ) -> ResultEngine<Booking> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let mut booking = self.require_booking(&db_tx, booking_id).await?;
            if booking.provider_id != acting_user_id {
                return Err(EngineError::Forbidden(
                    "only the provider can start a booking".to_string(),
                ));
            }
            if booking.status != BookingStatus::Confirmed {
                return Err(EngineError::InvalidState(format!(
                    "cannot start a {} booking",
                    booking.status.as_str()
                )));
            }

            let active = bookings::ActiveModel {
                id: ActiveValue::Set(booking.id.to_string()),
                status: ActiveValue::Set(BookingStatus::InProgress.as_str().to_string()),
                started_at: ActiveValue::Set(Some(now)),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            booking.status = BookingStatus::InProgress;
            booking.started_at = Some(now);
            Ok(booking)
        })
    }

    /// Cancels a pending or confirmed booking and frees its slot.
    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        acting_user_id: &str,
        reason: Option<&str>,
    ) -> ResultEngine<Booking> {
        let reason = normalize_optional_text(reason);
        let now = Utc::now();

        let booking = with_tx!(self, |db_tx| {
            let mut booking = self.require_booking(&db_tx, booking_id).await?;
            let acting = self.require_user(&db_tx, acting_user_id).await?;

            let is_customer = acting.id == booking.customer_id;
            let is_provider = acting.id == booking.provider_id;
            let is_admin = acting.role() == UserRole::Admin;
            if !(is_customer || is_provider || is_admin) {
                return Err(EngineError::Forbidden(
                    "not a party to this booking".to_string(),
                ));
            }
            if !matches!(
                booking.status,
                BookingStatus::Pending | BookingStatus::Confirmed
            ) {
                return Err(EngineError::InvalidState(format!(
                    "cannot cancel a {} booking",
                    booking.status.as_str()
                )));
            }

            // Admin cancellations act on the platform/provider side.
            let cancelled_by = if is_customer {
                CancelledBy::Customer
            } else {
                CancelledBy::Provider
            };

            let active = bookings::ActiveModel {
                id: ActiveValue::Set(booking.id.to_string()),
                status: ActiveValue::Set(BookingStatus::Cancelled.as_str().to_string()),
                slot_key: ActiveValue::Set(None),
                cancelled_at: ActiveValue::Set(Some(now)),
                cancelled_by: ActiveValue::Set(Some(cancelled_by.as_str().to_string())),
                cancellation_reason: ActiveValue::Set(reason.clone()),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            booking.status = BookingStatus::Cancelled;
            booking.cancelled_at = Some(now);
            booking.cancelled_by = Some(cancelled_by);
            booking.cancellation_reason = reason.clone();
            Ok(booking)
        })?;

        // Notify the party that did not cancel.
        let recipient = match booking.cancelled_by {
            Some(CancelledBy::Customer) => booking.provider_id.clone(),
            _ => booking.customer_id.clone(),
        };
        self.notifier
            .publish(
                &self.database,
                NotificationEvent {
                    user_id: recipient,
                    kind: "booking_cancelled".to_string(),
                    title: "Booking cancelled".to_string(),
                    message: format!(
                        "Booking for {} at {} was cancelled",
                        booking.scheduled_date, booking.scheduled_time
                    ),
                    data: Some(serde_json::json!({ "booking_id": booking.id })),
                },
            )
            .await;

        Ok(booking)
    }

    /// Completes a booking, credits the provider's daily counters (net of
    /// commission) and awards the customer loyalty points — all in one
    /// transaction, so a second completion can never double-award.
    pub async fn complete_booking(
        &self,
        booking_id: Uuid,
        acting_user_id: &str,
    ) -> ResultEngine<Booking> {
        let now = Utc::now();
        let booking = with_tx!(self, |db_tx| {
            let mut booking = self.require_booking(&db_tx, booking_id).await?;
            let acting = self.require_user(&db_tx, acting_user_id).await?;

            let is_provider = acting.id == booking.provider_id;
            let is_admin = acting.role() == UserRole::Admin;
            if !(is_provider || is_admin) {
                return Err(EngineError::Forbidden(
                    "only the provider can complete a booking".to_string(),
                ));
            }
            if !matches!(
                booking.status,
                BookingStatus::Confirmed | BookingStatus::InProgress
            ) {
                return Err(EngineError::InvalidState(format!(
                    "cannot complete a {} booking",
                    booking.status.as_str()
                )));
            }

            let active = bookings::ActiveModel {
                id: ActiveValue::Set(booking.id.to_string()),
                status: ActiveValue::Set(BookingStatus::Completed.as_str().to_string()),
                slot_key: ActiveValue::Set(None),
                completed_at: ActiveValue::Set(Some(now)),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            self.record_completion(
                &db_tx,
                &booking.provider_id,
                now.date_naive(),
                provider_earnings(booking.total_amount_minor),
            )
            .await?;
            self.award_points(&db_tx, &booking.customer_id, COMPLETION_POINTS)
                .await?;

            booking.status = BookingStatus::Completed;
            booking.completed_at = Some(now);
            Ok(booking)
        })?;

        self.notifier
            .publish(
                &self.database,
                NotificationEvent {
                    user_id: booking.customer_id.clone(),
                    kind: "booking_completed".to_string(),
                    title: "Booking completed".to_string(),
                    message: "Thanks for booking with us! Loyalty points were added.".to_string(),
                    data: Some(serde_json::json!({ "booking_id": booking.id })),
                },
            )
            .await;

        Ok(booking)
    }

    /// Moves a booking to a new slot, resetting it to pending.
    pub async fn reschedule_booking(&self, cmd: RescheduleBookingCmd) -> ResultEngine<Booking> {
        let time = validate_slot_time(&cmd.new_time)?;
        let booking = with_tx!(self, |db_tx| {
            let mut booking = self.require_booking(&db_tx, cmd.booking_id).await?;
            let acting = self.require_user(&db_tx, &cmd.acting_user_id).await?;

            let is_customer = acting.id == booking.customer_id;
            let is_admin = acting.role() == UserRole::Admin;
            if !(is_customer || is_admin) {
                return Err(EngineError::Forbidden(
                    "only the customer can reschedule a booking".to_string(),
                ));
            }
            if !matches!(
                booking.status,
                BookingStatus::Pending | BookingStatus::Confirmed
            ) {
                return Err(EngineError::InvalidState(format!(
                    "cannot reschedule a {} booking",
                    booking.status.as_str()
                )));
            }

            if self
                .slot_taken(
                    &db_tx,
                    &booking.provider_id,
                    cmd.new_date,
                    &time,
                    Some(booking.id),
                )
                .await?
            {
                return Err(EngineError::SlotConflict(slot_key(
                    &booking.provider_id,
                    cmd.new_date,
                    &time,
                )));
            }

            let new_key = slot_key(&booking.provider_id, cmd.new_date, &time);
            let active = bookings::ActiveModel {
                id: ActiveValue::Set(booking.id.to_string()),
                scheduled_date: ActiveValue::Set(cmd.new_date),
                scheduled_time: ActiveValue::Set(time.clone()),
                status: ActiveValue::Set(BookingStatus::Pending.as_str().to_string()),
                slot_key: ActiveValue::Set(Some(new_key.clone())),
                confirmed_at: ActiveValue::Set(None),
                ..Default::default()
            };
            if let Err(err) = active.update(&db_tx).await {
                return Err(slot_conflict_from_insert(err, new_key));
            }

            booking.scheduled_date = cmd.new_date;
            booking.scheduled_time = time.clone();
            booking.status = BookingStatus::Pending;
            booking.confirmed_at = None;
            Ok(booking)
        })?;

        self.notifier
            .publish(
                &self.database,
                NotificationEvent {
                    user_id: booking.provider_id.clone(),
                    kind: "booking_rescheduled".to_string(),
                    title: "Booking rescheduled".to_string(),
                    message: format!(
                        "Booking moved to {} at {}",
                        booking.scheduled_date, booking.scheduled_time
                    ),
                    data: Some(serde_json::json!({ "booking_id": booking.id })),
                },
            )
            .await;

        Ok(booking)
    }

    /// Bookings where the user is the customer or the provider, newest
    /// first.
    pub async fn list_bookings(
        &self,
        user_id: &str,
        view: BookingView,
    ) -> ResultEngine<Vec<Booking>> {
        let column = match view {
            BookingView::Customer => bookings::Column::CustomerId,
            BookingView::Provider => bookings::Column::ProviderId,
        };
        let models = bookings::Entity::find()
            .filter(column.eq(user_id.to_string()))
            .order_by_desc(bookings::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Booking::try_from).collect()
    }

    async fn require_booking<C: ConnectionTrait>(
        &self,
        db: &C,
        booking_id: Uuid,
    ) -> ResultEngine<Booking> {
        let model = bookings::Entity::find_by_id(booking_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("booking not exists".to_string()))?;
        Booking::try_from(model)
    }

    async fn slot_taken<C: ConnectionTrait>(
        &self,
        db: &C,
        provider_id: &str,
        date: NaiveDate,
        time: &str,
        exclude: Option<Uuid>,
    ) -> ResultEngine<bool> {
        let mut query = bookings::Entity::find()
            .filter(bookings::Column::SlotKey.eq(slot_key(provider_id, date, time)));
        if let Some(id) = exclude {
            query = query.filter(bookings::Column::Id.ne(id.to_string()));
        }
        Ok(query.one(db).await?.is_some())
    }
}
