use chrono::{NaiveDate, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    BookingStatus, BookingView, CancelledBy, CreateBookingCmd, Engine, EngineError,
    RescheduleBookingCmd, provider_earnings,
};
use migration::MigratorTrait;

const ALICE: &str = "u-alice";
const BOB: &str = "u-bob";
const PAUL: &str = "u-paul";
const ADA: &str = "u-ada";

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (id, username, phone, role) in [
        (ALICE, "alice", "+254700000001", "customer"),
        (BOB, "bob", "+254700000002", "customer"),
        (PAUL, "paul", "+254700000003", "provider"),
        (ADA, "ada", "+254700000004", "admin"),
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
    (engine, db)
}

async fn cleaning_service(engine: &Engine, instant_booking: bool) -> Uuid {
    engine
        .new_service(
            PAUL,
            "House cleaning",
            Some("Deep clean"),
            150_000,
            instant_booking,
        )
        .await
        .unwrap()
        .id
}

fn slot_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 20).unwrap()
}

#[tokio::test]
async fn booking_starts_pending_and_notifies_the_provider() {
    let (engine, _db) = engine_with_db().await;
    let service_id = cleaning_service(&engine, false).await;

    let booking = engine
        .create_booking(CreateBookingCmd::new(ALICE, service_id, slot_date(), "10:00"))
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.provider_id, PAUL);
    assert_eq!(booking.total_amount_minor, 150_000);
    assert!(booking.confirmed_at.is_none());

    let notifications = engine.list_notifications(PAUL, 10).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, "booking_created");
}

#[tokio::test]
async fn instant_booking_skips_the_pending_gate_only_when_the_service_allows_it() {
    let (engine, _db) = engine_with_db().await;
    let instant_service = cleaning_service(&engine, true).await;

    let booking = engine
        .create_booking(
            CreateBookingCmd::new(ALICE, instant_service, slot_date(), "10:00").instant(true),
        )
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert!(booking.confirmed_at.is_some());

    // Asking for instant on a service that forbids it stays pending.
    let gated_service = engine
        .new_service(PAUL, "Gardening", None, 80_000, false)
        .await
        .unwrap()
        .id;
    let booking = engine
        .create_booking(
            CreateBookingCmd::new(ALICE, gated_service, slot_date(), "14:00").instant(true),
        )
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
}

#[tokio::test]
async fn a_second_booking_for_an_occupied_slot_conflicts() {
    let (engine, _db) = engine_with_db().await;
    let service_id = cleaning_service(&engine, false).await;

    let first = engine
        .create_booking(CreateBookingCmd::new(ALICE, service_id, slot_date(), "10:00"))
        .await
        .unwrap();

    let err = engine
        .create_booking(CreateBookingCmd::new(BOB, service_id, slot_date(), "10:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::SlotConflict(_)));

    // The first booking is unaffected and remains the only one.
    let bookings = engine.list_bookings(PAUL, BookingView::Provider).await.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].id, first.id);
    assert_eq!(bookings[0].status, BookingStatus::Pending);

    // A different slot on the same day is fine.
    engine
        .create_booking(CreateBookingCmd::new(BOB, service_id, slot_date(), "11:00"))
        .await
        .unwrap();
}

#[tokio::test]
async fn inactive_or_unknown_services_cannot_be_booked() {
    let (engine, _db) = engine_with_db().await;
    let service_id = cleaning_service(&engine, false).await;
    engine
        .set_service_active(service_id, PAUL, false)
        .await
        .unwrap();

    let err = engine
        .create_booking(CreateBookingCmd::new(ALICE, service_id, slot_date(), "10:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));

    let err = engine
        .create_booking(CreateBookingCmd::new(
            ALICE,
            Uuid::new_v4(),
            slot_date(),
            "10:00",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn booking_rejects_malformed_slot_times() {
    let (engine, _db) = engine_with_db().await;
    let service_id = cleaning_service(&engine, false).await;

    for time in ["25:00", "10am", ""] {
        let err = engine
            .create_booking(CreateBookingCmd::new(ALICE, service_id, slot_date(), time))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }
}

#[tokio::test]
async fn only_the_provider_confirms_and_only_from_pending() {
    let (engine, _db) = engine_with_db().await;
    let service_id = cleaning_service(&engine, false).await;
    let booking = engine
        .create_booking(CreateBookingCmd::new(ALICE, service_id, slot_date(), "10:00"))
        .await
        .unwrap();

    let err = engine.confirm_booking(booking.id, ALICE).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let confirmed = engine.confirm_booking(booking.id, PAUL).await.unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert!(confirmed.confirmed_at.is_some());

    let err = engine.confirm_booking(booking.id, PAUL).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));

    // The customer got the confirmation notice.
    let notifications = engine.list_notifications(ALICE, 10).await.unwrap();
    assert!(notifications.iter().any(|n| n.kind == "booking_confirmed"));
}

#[tokio::test]
async fn completion_pays_the_provider_and_awards_loyalty_once() {
    let (engine, _db) = engine_with_db().await;
    let service_id = cleaning_service(&engine, false).await;
    let booking = engine
        .create_booking(CreateBookingCmd::new(ALICE, service_id, slot_date(), "10:00"))
        .await
        .unwrap();
    engine.confirm_booking(booking.id, PAUL).await.unwrap();

    let started = engine.start_booking(booking.id, PAUL).await.unwrap();
    assert_eq!(started.status, BookingStatus::InProgress);
    assert!(started.started_at.is_some());

    let completed = engine.complete_booking(booking.id, PAUL).await.unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);

    let stats = engine
        .provider_stats(PAUL, Utc::now().date_naive())
        .await
        .unwrap();
    assert_eq!(stats.completed_bookings, 1);
    assert_eq!(stats.earnings_minor, provider_earnings(150_000));

    let account = engine.loyalty_account(ALICE).await.unwrap();
    assert_eq!(account.points, 10);

    // A second completion must not double-award.
    let err = engine.complete_booking(booking.id, PAUL).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
    let account = engine.loyalty_account(ALICE).await.unwrap();
    assert_eq!(account.points, 10);
    let stats = engine
        .provider_stats(PAUL, Utc::now().date_naive())
        .await
        .unwrap();
    assert_eq!(stats.completed_bookings, 1);
}

#[tokio::test]
async fn completion_is_allowed_straight_from_confirmed() {
    let (engine, _db) = engine_with_db().await;
    let service_id = cleaning_service(&engine, false).await;
    let booking = engine
        .create_booking(CreateBookingCmd::new(ALICE, service_id, slot_date(), "10:00"))
        .await
        .unwrap();
    engine.confirm_booking(booking.id, PAUL).await.unwrap();

    let completed = engine.complete_booking(booking.id, ADA).await.unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);
}

#[tokio::test]
async fn completion_requires_the_provider_or_an_admin() {
    let (engine, _db) = engine_with_db().await;
    let service_id = cleaning_service(&engine, false).await;
    let booking = engine
        .create_booking(CreateBookingCmd::new(ALICE, service_id, slot_date(), "10:00"))
        .await
        .unwrap();
    engine.confirm_booking(booking.id, PAUL).await.unwrap();

    let err = engine.complete_booking(booking.id, ALICE).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    // Pending bookings cannot be completed either.
    let other = engine
        .create_booking(CreateBookingCmd::new(ALICE, service_id, slot_date(), "12:00"))
        .await
        .unwrap();
    let err = engine.complete_booking(other.id, PAUL).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn cancellation_records_the_party_and_frees_the_slot() {
    let (engine, _db) = engine_with_db().await;
    let service_id = cleaning_service(&engine, false).await;
    let booking = engine
        .create_booking(CreateBookingCmd::new(ALICE, service_id, slot_date(), "10:00"))
        .await
        .unwrap();

    let cancelled = engine
        .cancel_booking(booking.id, ALICE, Some("change of plans"))
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.cancelled_by, Some(CancelledBy::Customer));
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("change of plans"));
    assert!(cancelled.cancelled_at.is_some());

    // The slot is free again.
    engine
        .create_booking(CreateBookingCmd::new(BOB, service_id, slot_date(), "10:00"))
        .await
        .unwrap();
}

#[tokio::test]
async fn cancellation_authorization_and_state_rules() {
    let (engine, _db) = engine_with_db().await;
    let service_id = cleaning_service(&engine, false).await;
    let booking = engine
        .create_booking(CreateBookingCmd::new(ALICE, service_id, slot_date(), "10:00"))
        .await
        .unwrap();

    // A stranger cannot cancel.
    let err = engine.cancel_booking(booking.id, BOB, None).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    // An admin can; the cancellation is recorded on the provider side.
    let cancelled = engine.cancel_booking(booking.id, ADA, None).await.unwrap();
    assert_eq!(cancelled.cancelled_by, Some(CancelledBy::Provider));

    // Terminal states cannot be cancelled again.
    let err = engine.cancel_booking(booking.id, ALICE, None).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn reschedule_resets_to_pending_and_rechecks_the_slot() {
    let (engine, _db) = engine_with_db().await;
    let service_id = cleaning_service(&engine, false).await;
    let booking = engine
        .create_booking(CreateBookingCmd::new(ALICE, service_id, slot_date(), "10:00"))
        .await
        .unwrap();
    engine.confirm_booking(booking.id, PAUL).await.unwrap();

    let new_date = NaiveDate::from_ymd_opt(2024, 1, 21).unwrap();
    let moved = engine
        .reschedule_booking(RescheduleBookingCmd::new(booking.id, ALICE, new_date, "09:00"))
        .await
        .unwrap();
    assert_eq!(moved.status, BookingStatus::Pending);
    assert!(moved.confirmed_at.is_none());
    assert_eq!(moved.scheduled_date, new_date);
    assert_eq!(moved.scheduled_time, "09:00");

    // The old slot is free for someone else now.
    engine
        .create_booking(CreateBookingCmd::new(BOB, service_id, slot_date(), "10:00"))
        .await
        .unwrap();

    // Moving onto the occupied old slot conflicts.
    let err = engine
        .reschedule_booking(RescheduleBookingCmd::new(booking.id, ALICE, slot_date(), "10:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::SlotConflict(_)));

    // Re-asserting its own current slot is not a conflict.
    engine
        .reschedule_booking(RescheduleBookingCmd::new(booking.id, ALICE, new_date, "09:00"))
        .await
        .unwrap();
}

#[tokio::test]
async fn reschedule_is_for_the_customer_or_an_admin() {
    let (engine, _db) = engine_with_db().await;
    let service_id = cleaning_service(&engine, false).await;
    let booking = engine
        .create_booking(CreateBookingCmd::new(ALICE, service_id, slot_date(), "10:00"))
        .await
        .unwrap();

    let err = engine
        .reschedule_booking(RescheduleBookingCmd::new(
            booking.id,
            PAUL,
            slot_date(),
            "11:00",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    engine
        .reschedule_booking(RescheduleBookingCmd::new(
            booking.id,
            ADA,
            slot_date(),
            "11:00",
        ))
        .await
        .unwrap();
}

#[tokio::test]
async fn listing_shows_each_side_its_own_bookings() {
    let (engine, _db) = engine_with_db().await;
    let service_id = cleaning_service(&engine, false).await;
    engine
        .create_booking(CreateBookingCmd::new(ALICE, service_id, slot_date(), "10:00"))
        .await
        .unwrap();
    engine
        .create_booking(CreateBookingCmd::new(BOB, service_id, slot_date(), "11:00"))
        .await
        .unwrap();

    let alice_view = engine.list_bookings(ALICE, BookingView::Customer).await.unwrap();
    assert_eq!(alice_view.len(), 1);

    let provider_view = engine.list_bookings(PAUL, BookingView::Provider).await.unwrap();
    assert_eq!(provider_view.len(), 2);
}

#[tokio::test]
async fn catalog_is_provider_only_and_rejects_duplicates() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .new_service(ALICE, "Nails", None, 10_000, false)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    cleaning_service(&engine, false).await;
    let err = engine
        .new_service(PAUL, "house cleaning", None, 10_000, false)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    // Deactivated services drop out of the listing.
    let listed = engine.list_services().await.unwrap();
    assert_eq!(listed.len(), 1);
    engine
        .set_service_active(listed[0].id, PAUL, false)
        .await
        .unwrap();
    assert!(engine.list_services().await.unwrap().is_empty());
}
