use crate::engine::{EngineSettings, ReservationEngine};
use chrono::{DateTime, Duration, Utc};
use fleetsim_core::{ManualClock, RecordingSink, SequentialEntropy};
use fleetsim_shared::{
    AccessDevice, CallCenterResponse, DriverSwipe, EventKind, Payload, Reservation, TechStatus,
    TripStatus, VehicleDevice,
};
use std::sync::Arc;
use tokio::time::sleep;
use uuid::Uuid;

struct Harness {
    engine: ReservationEngine,
    sink: Arc<RecordingSink>,
    clock: Arc<ManualClock>,
}

fn harness(now: DateTime<Utc>) -> Harness {
    let sink = Arc::new(RecordingSink::new());
    let clock = Arc::new(ManualClock::new(now));
    let engine = ReservationEngine::with_capabilities(
        sink.clone(),
        EngineSettings::default(),
        Arc::new(SequentialEntropy::new(10_000)),
        clock.clone(),
    );
    Harness { engine, sink, clock }
}

async fn wait(secs: u64) {
    sleep(std::time::Duration::from_secs(secs)).await;
}

fn vehicle() -> VehicleDevice {
    VehicleDevice::new("21", "4917")
}

fn card() -> AccessDevice {
    AccessDevice {
        serial_no: String::new(),
        card_no: "1234".to_string(),
        card_orga: "7".to_string(),
        card_type: "Hitag_32".to_string(),
    }
}

fn reservation(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Reservation {
    Reservation::new(id, vehicle(), card(), start, end)
}

fn swipe() -> DriverSwipe {
    DriverSwipe::new(vehicle(), card())
}

fn response(correlation_id: Uuid, reservation_id: &str, now: DateTime<Utc>) -> CallCenterResponse {
    CallCenterResponse {
        correlation_id,
        request_id: String::new(),
        tech_status: TechStatus::New,
        reservation_id: reservation_id.to_string(),
        vehicle: vehicle(),
        access: card(),
        start_time: now - Duration::minutes(5),
        end_time: now + Duration::hours(1),
        timezone: 85,
        late_alarm: false,
        late_buffer_minutes: 0,
    }
}

fn escalated_correlation(sink: &RecordingSink) -> Uuid {
    let requests = sink.of_kind(EventKind::CallCenterRequest);
    match &requests[0].payload {
        Payload::CallCenterRequest(request) => request.correlation_id,
        other => panic!("unexpected payload {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_resubmission_replaces_and_keeps_trip() {
    let now = Utc::now();
    let h = harness(now);

    h.engine
        .handle_new_reservation(reservation("R-1", now - Duration::minutes(10), now + Duration::hours(1)))
        .await;
    h.engine.handle_new_driver_swipe(swipe()).await;

    let new_end = now + Duration::hours(3);
    h.engine
        .handle_new_reservation(reservation("R-1", now - Duration::minutes(10), new_end))
        .await;

    let stored = h.engine.reservations().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].end_time, new_end);
    assert_eq!(stored[0].generation, 1);
    let trip = stored[0].trip.as_ref().unwrap();
    assert_eq!(trip.status, TripStatus::InProgress);
    assert_eq!(trip.odo_start, Some(10_000));
}

#[tokio::test(start_paused = true)]
async fn test_ack_is_new_with_fresh_request_id() {
    let now = Utc::now();
    let h = harness(now);

    let first = h
        .engine
        .handle_new_reservation(reservation("R-1", now, now + Duration::hours(1)))
        .await;
    let second = h
        .engine
        .handle_new_reservation(reservation("R-2", now, now + Duration::hours(1)))
        .await;

    assert_eq!(first.status, TechStatus::New);
    assert_eq!(first.orga_no, "21");
    assert_eq!(first.timestamp, now);
    assert_ne!(first.request_id, second.request_id);
}

#[tokio::test(start_paused = true)]
async fn test_status_sequence_reaches_received() {
    let now = Utc::now();
    let h = harness(now);

    h.engine
        .handle_new_reservation(reservation("R-1", now, now + Duration::hours(1)))
        .await;

    wait(6).await;
    assert_eq!(h.sink.count(EventKind::StatusChanged), 1);
    assert_eq!(
        h.engine.reservation("R-1").await.unwrap().tech_status,
        TechStatus::SentToCenter
    );

    wait(10).await;
    assert_eq!(h.sink.count(EventKind::StatusChanged), 3);
    assert_eq!(
        h.engine.reservation("R-1").await.unwrap().tech_status,
        TechStatus::Received
    );
}

#[tokio::test(start_paused = true)]
async fn test_replaced_reservation_silences_old_sequence() {
    let now = Utc::now();
    let h = harness(now);
    let window = (now, now + Duration::hours(1));

    h.engine
        .handle_new_reservation(reservation("R-1", window.0, window.1))
        .await;
    wait(6).await;
    h.engine
        .handle_new_reservation(reservation("R-1", window.0, window.1))
        .await;

    wait(30).await;
    // One step from the first submission, three from the second
    assert_eq!(h.sink.count(EventKind::StatusChanged), 4);
    assert_eq!(
        h.engine.reservation("R-1").await.unwrap().tech_status,
        TechStatus::Received
    );
}

#[tokio::test(start_paused = true)]
async fn test_call_center_round_trip() {
    let now = Utc::now();
    let h = harness(now);

    let ack = h.engine.handle_new_driver_swipe(swipe()).await;
    assert_eq!(ack.status, TechStatus::New);
    assert_eq!(h.engine.pending_call_center_requests().await, 1);

    wait(6).await;
    assert_eq!(h.sink.count(EventKind::CallCenterRequest), 1);
    let correlation_id = escalated_correlation(&h.sink);

    h.engine
        .handle_call_center_response(response(correlation_id, "R-CC", now))
        .await;

    assert_eq!(h.engine.pending_call_center_requests().await, 0);
    let stored = h.engine.reservation("R-CC").await.unwrap();
    assert_eq!(stored.timezone, 85);
    assert_eq!(stored.trip.unwrap().status, TripStatus::InProgress);

    wait(31).await;
    assert_eq!(h.sink.count(EventKind::TripStart), 1);
    assert_eq!(h.sink.count(EventKind::CallCenterRequest), 1);
}

#[tokio::test(start_paused = true)]
async fn test_call_center_refusal_rejects_access() {
    let now = Utc::now();
    let h = harness(now);

    h.engine.handle_new_driver_swipe(swipe()).await;
    wait(6).await;
    let correlation_id = escalated_correlation(&h.sink);

    h.engine
        .handle_call_center_response(response(correlation_id, "  ", now))
        .await;

    assert!(h.engine.reservations().await.is_empty());
    wait(31).await;
    assert_eq!(h.sink.count(EventKind::RejectedAccess), 1);
    assert_eq!(h.sink.count(EventKind::TripStart), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_correlation_is_ignored() {
    let now = Utc::now();
    let h = harness(now);

    let ack = h
        .engine
        .handle_call_center_response(response(Uuid::new_v4(), "R-CC", now))
        .await;

    assert_eq!(ack.status, TechStatus::New);
    assert!(h.engine.reservations().await.is_empty());
    wait(40).await;
    assert_eq!(h.sink.count(EventKind::RejectedAccess), 0);
    assert_eq!(h.sink.count(EventKind::TripStart), 0);
}

#[tokio::test(start_paused = true)]
async fn test_full_trip_with_idle_segment() {
    let now = Utc::now();
    let h = harness(now);

    h.engine
        .handle_new_reservation(reservation("R-1", now - Duration::minutes(1), now + Duration::hours(1)))
        .await;
    h.engine.handle_new_driver_swipe(swipe()).await;

    // Parked long enough for the watcher to close a segment
    h.clock.advance(Duration::minutes(10));
    wait(2).await;
    let trip = h.engine.reservation("R-1").await.unwrap().trip.unwrap();
    assert!(!trip.ignition_on);
    assert_eq!(trip.odo_end, 10_005);

    // Second swipe ends the trip
    h.engine.handle_new_driver_swipe(swipe()).await;
    assert_eq!(
        h.engine.reservation("R-1").await.unwrap().trip.unwrap().status,
        TripStatus::Ended
    );

    // Window over: the watcher completes the trip
    h.clock.advance(Duration::hours(1));
    wait(2).await;
    assert_eq!(
        h.engine.reservation("R-1").await.unwrap().trip.unwrap().status,
        TripStatus::Completed
    );

    wait(60).await;
    assert_eq!(h.sink.count(EventKind::TripStart), 1);
    assert_eq!(h.sink.count(EventKind::TripSegment), 1);
    assert_eq!(h.sink.count(EventKind::TripEnd), 1);
    assert_eq!(h.sink.count(EventKind::TripData), 1);
    assert_eq!(h.sink.count(EventKind::TripComplete), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unused_window_completes_without_swipe() {
    let now = Utc::now();
    let h = harness(now);

    h.engine
        .handle_new_reservation(reservation("R-1", now, now + Duration::hours(1)))
        .await;

    h.clock.advance(Duration::hours(1) + Duration::seconds(1));
    wait(3).await;

    let trip = h.engine.reservation("R-1").await.unwrap().trip.unwrap();
    assert_eq!(trip.status, TripStatus::Completed);
    assert!(trip.is_unused());

    wait(20).await;
    assert_eq!(h.sink.count(EventKind::TripData), 1);
    assert_eq!(h.sink.count(EventKind::TripComplete), 1);
    assert_eq!(h.sink.count(EventKind::TripStart), 0);
}

#[tokio::test(start_paused = true)]
async fn test_overrun_reports_late_and_still_ends() {
    let now = Utc::now();
    let h = harness(now);

    let mut late = reservation("R-1", now - Duration::hours(1), now + Duration::minutes(1));
    late.late_alarm = true;
    h.engine.handle_new_reservation(late).await;
    h.engine.handle_new_driver_swipe(swipe()).await;

    h.clock.advance(Duration::minutes(2));
    wait(2).await;
    assert_eq!(
        h.engine.reservation("R-1").await.unwrap().trip.unwrap().status,
        TripStatus::Late
    );

    // Past the window but still driving, so the swipe matches
    h.engine.handle_new_driver_swipe(swipe()).await;
    assert_eq!(h.engine.pending_call_center_requests().await, 0);
    assert_eq!(
        h.engine.reservation("R-1").await.unwrap().trip.unwrap().status,
        TripStatus::Ended
    );

    wait(10).await;
    assert_eq!(h.sink.count(EventKind::DriverLate), 1);
}

#[tokio::test(start_paused = true)]
async fn test_oversized_late_buffer_still_completes() {
    let now = Utc::now();
    let h = harness(now);

    let mut late = reservation("R-1", now - Duration::hours(1), now + Duration::minutes(1));
    late.late_alarm = true;
    late.late_buffer_minutes = i64::MAX / 1000;
    h.engine.handle_new_reservation(late).await;
    h.engine.handle_new_driver_swipe(swipe()).await;

    h.clock.advance(Duration::minutes(2));
    wait(2).await;
    assert_eq!(
        h.engine.reservation("R-1").await.unwrap().trip.unwrap().status,
        TripStatus::InProgress
    );

    h.engine.handle_new_driver_swipe(swipe()).await;
    h.clock.advance(Duration::minutes(1));
    wait(2).await;
    assert_eq!(
        h.engine.reservation("R-1").await.unwrap().trip.unwrap().status,
        TripStatus::Completed
    );

    wait(15).await;
    assert_eq!(h.sink.count(EventKind::DriverLate), 0);
    assert_eq!(h.sink.count(EventKind::TripComplete), 1);
}
