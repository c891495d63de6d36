//! Integration tests for the client session.
//!
//! These tests drive the public API only, against the shipped drivers:
//!
//! - `MockDriver` for the state machine, counters, notifications and failure
//!   paths;
//! - `LoopbackDriver` for the end-to-end echo path, where transmitted events
//!   come back through the ingestion sink and the active filter.
//!
//! Timeout tests run on tokio's paused clock so they finish instantly.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_test::{assert_pending, assert_ready};
use vscp_client::infrastructure::driver::{LoopbackDriver, MockDriver};
use vscp_client::{Session, SessionConfig, SessionNotification, SessionState};
use vscp_core::{Event, EventFilter, Guid, VscpError};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn mock_session(max_queue_size: usize) -> (Arc<Session>, Arc<MockDriver>) {
    let driver = Arc::new(MockDriver::with_interfaces(vec!["mock0".to_string()]));
    let cfg = SessionConfig {
        interface: "mock0".to_string(),
        max_queue_size,
        ..SessionConfig::default()
    };
    let session = Session::new(cfg, driver.clone()).expect("valid config");
    (Arc::new(session), driver)
}

fn loopback_session() -> (Arc<Session>, Arc<LoopbackDriver>) {
    let driver = Arc::new(LoopbackDriver::new("loopback"));
    let session = Session::new(SessionConfig::for_interface("loopback"), driver.clone())
        .expect("valid config");
    (Arc::new(session), driver)
}

// ── Queue bound ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_queue_holds_last_max_events_in_order_after_overflow() {
    // Arrange
    let max = 8usize;
    let extra = 5usize;
    let (session, _) = mock_session(max);
    session.connect().await.unwrap();

    // Act
    for i in 0..(max + extra) {
        session.inject_event(&Event::new(0, i as u16));
    }

    // Assert
    assert_eq!(session.count(), Ok(max));
    let mut drained = Vec::new();
    for _ in 0..max {
        drained.push(session.receive(Some(Duration::ZERO)).await.unwrap().vscp_type);
    }
    let expected: Vec<u16> = (extra..max + extra).map(|i| i as u16).collect();
    assert_eq!(drained, expected);
}

// ── Timeouts ──────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_receive_on_empty_connected_queue_times_out() {
    let (session, _) = mock_session(10);
    session.connect().await.unwrap();

    let result = session.receive(Some(Duration::from_millis(500))).await;

    assert_eq!(result, Err(VscpError::Timeout));
    assert_eq!(session.statistics().received, 0);
    assert_eq!(session.statistics().errors, 0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_transmit_times_out_and_counts_an_error() {
    // Arrange
    let (session, driver) = mock_session(10);
    session.connect().await.unwrap();
    driver.set_transmit_delay(Some(Duration::from_secs(5)));
    let mut notes = session.subscribe();

    // Act
    let result = session
        .send(&Event::new(10, 6), Some(Duration::from_millis(100)))
        .await;

    // Assert
    assert_eq!(result, Err(VscpError::Timeout));
    assert_eq!(session.statistics().sent, 0);
    assert_eq!(session.statistics().errors, 1);
    assert!(matches!(notes.recv().await.unwrap(), SessionNotification::Error(_)));
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_scenario_inject_then_receive_counts_one() {
    // Arrange
    let (session, _) = mock_session(10);
    session.connect().await.unwrap();
    let mut event = Event::new(10, 6).with_payload(vec![0x89, 0x02, 0x00, 0x19]);
    event.set_priority(0);
    assert_eq!(session.statistics().received, 0);

    // Act
    session.inject_event(&event);
    let got = session.receive(Some(Duration::from_secs(1))).await.unwrap();

    // Assert
    assert_eq!(got.vscp_class, 10);
    assert_eq!(got.vscp_type, 6);
    assert_eq!(got.payload(), &[0x89, 0x02, 0x00, 0x19]);
    assert_eq!(session.statistics().received, 1);
}

#[tokio::test]
async fn test_send_while_disconnected_is_not_connected_and_sent_stays_zero() {
    let (session, driver) = mock_session(10);

    let result = session.send(&Event::new(10, 6), None).await;

    assert_eq!(result, Err(VscpError::NotConnected));
    assert_eq!(session.statistics().sent, 0);
    assert!(driver.transmitted.lock().is_empty());
}

#[tokio::test]
async fn test_send_delivers_stamped_event_to_driver_and_notifies() {
    // Arrange
    let (session, driver) = mock_session(10);
    session.connect().await.unwrap();
    let mut notes = session.subscribe();

    // Act
    session.send(&Event::new(20, 3), None).await.unwrap();

    // Assert
    let sent = driver.transmitted_events();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].has_timestamp());
    assert_eq!(session.statistics().sent, 1);
    match notes.recv().await.unwrap() {
        SessionNotification::EventSent(e) => assert_eq!(e, sent[0]),
        other => panic!("unexpected notification {other:?}"),
    }
}

// ── Failure paths ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_failed_connect_stays_disconnected_and_counts_error() {
    let (session, driver) = mock_session(10);
    driver.set_should_fail(true);

    let result = session.connect().await;

    assert_eq!(result, Err(VscpError::OperationFailed));
    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(session.statistics().errors, 1);
}

#[tokio::test]
async fn test_driver_transmit_failure_maps_to_write_error() {
    let (session, driver) = mock_session(10);
    session.connect().await.unwrap();
    driver.set_should_fail(true);

    let result = session.send(&Event::new(10, 6), None).await;

    assert_eq!(result, Err(VscpError::WriteError));
    assert_eq!(session.statistics().errors, 1);
    assert_eq!(session.statistics().sent, 0);
}

#[tokio::test]
async fn test_failed_driver_disconnect_still_disconnects_locally() {
    let (session, driver) = mock_session(10);
    session.connect().await.unwrap();
    session.inject_event(&Event::new(1, 1));
    driver.set_should_fail(true);

    let result = session.disconnect().await;

    assert_eq!(result, Err(VscpError::OperationFailed));
    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(session.statistics().errors, 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_connect_times_out_and_stays_disconnected() {
    // Arrange
    let (session, driver) = mock_session(10);
    session.set_connection_timeout(Duration::from_millis(200));
    driver.set_connect_delay(Some(Duration::from_secs(5)));
    let mut notes = session.subscribe();

    // Act
    let result = session.connect().await;

    // Assert
    assert_eq!(result, Err(VscpError::Timeout));
    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(session.handle(), None);
    assert_eq!(session.statistics().errors, 1);
    assert!(driver.connects.lock().is_empty());
    assert!(matches!(notes.recv().await.unwrap(), SessionNotification::Error(_)));
}

#[tokio::test(start_paused = true)]
async fn test_connect_within_timeout_succeeds() {
    let (session, driver) = mock_session(10);
    session.set_connection_timeout(Duration::from_secs(5));
    driver.set_connect_delay(Some(Duration::from_millis(200)));

    session.connect().await.unwrap();

    assert_eq!(session.state(), SessionState::Connected);
    assert_eq!(session.statistics().errors, 0);
}

#[tokio::test]
async fn test_failed_start_incoming_closes_the_half_open_connection() {
    // Arrange
    let (session, driver) = mock_session(10);
    driver.set_fail_start_incoming(true);

    // Act
    let result = session.connect().await;

    // Assert
    assert_eq!(result, Err(VscpError::OperationFailed));
    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(session.handle(), None);
    assert_eq!(session.statistics().errors, 1);
    assert_eq!(session.statistics().connected_at, None);
    let opened = driver.connects.lock().clone();
    assert_eq!(opened.len(), 1);
    assert_eq!(*driver.disconnects.lock(), opened);
    assert!(!driver.deliver(Event::new(1, 1)));

    // A later attempt with a healthy driver connects normally.
    driver.set_fail_start_incoming(false);
    session.connect().await.unwrap();
    assert_eq!(session.state(), SessionState::Connected);
}

// ── Concurrency ───────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_producers_never_lose_or_duplicate_events() {
    // Arrange: capacity large enough that nothing is evicted.
    let producers = 4u16;
    let per_producer = 250u16;
    let total = usize::from(producers) * usize::from(per_producer);
    let (session, driver) = mock_session(total);
    session.connect().await.unwrap();

    // Act: half the producers inject, half deliver through the driver sink.
    let mut tasks = Vec::new();
    for p in 0..producers {
        let session = Arc::clone(&session);
        let driver = Arc::clone(&driver);
        tasks.push(tokio::spawn(async move {
            for i in 0..per_producer {
                let event = Event::new(p, i);
                if p % 2 == 0 {
                    session.inject_event(&event);
                } else {
                    assert!(driver.deliver(event));
                }
                tokio::task::yield_now().await;
            }
        }));
    }
    let consumer = {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            let mut seen = Vec::with_capacity(total);
            while seen.len() < total {
                let e = session.receive(Some(Duration::from_secs(5))).await.unwrap();
                seen.push((e.vscp_class, e.vscp_type));
            }
            seen
        })
    };
    for t in tasks {
        t.await.unwrap();
    }
    let seen = consumer.await.unwrap();

    // Assert
    let unique: HashSet<_> = seen.iter().copied().collect();
    assert_eq!(seen.len(), total);
    assert_eq!(unique.len(), total, "an event was delivered twice");
    assert_eq!(session.count(), Ok(0));
    assert_eq!(session.statistics().received, total as u64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_delivery_racing_disconnect_never_leaks_into_next_connection() {
    for _ in 0..200 {
        // Arrange: a driver thread keeps delivering on the open connection.
        let (session, driver) = mock_session(64);
        session.connect().await.unwrap();
        let stop = Arc::new(AtomicBool::new(false));
        let producer = {
            let driver = Arc::clone(&driver);
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    driver.deliver(Event::new(1, 1));
                }
            })
        };
        tokio::task::yield_now().await;

        // Act: close while deliveries are in flight, then open a fresh link.
        session.disconnect().await.unwrap();
        stop.store(true, Ordering::Relaxed);
        producer.join().unwrap();
        session.connect().await.unwrap();

        // Assert
        assert_eq!(session.count(), Ok(0));
    }
}

#[tokio::test]
async fn test_waiting_receive_is_woken_by_injection() {
    // Arrange
    let (session, _) = mock_session(10);
    session.connect().await.unwrap();
    let mut pending = tokio_test::task::spawn(session.receive(Some(Duration::from_secs(10))));
    assert_pending!(pending.poll());

    // Act
    session.inject_event(&Event::new(30, 5));

    // Assert
    assert!(pending.is_woken());
    let event = assert_ready!(pending.poll()).unwrap();
    assert_eq!((event.vscp_class, event.vscp_type), (30, 5));
}

#[tokio::test]
async fn test_each_injected_event_goes_to_exactly_one_waiter() {
    let (session, _) = mock_session(10);
    session.connect().await.unwrap();

    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let s = Arc::clone(&session);
            tokio::spawn(async move { s.receive(Some(Duration::from_secs(5))).await })
        })
        .collect();
    tokio::task::yield_now().await;

    for t in 0..3u16 {
        session.inject_event(&Event::new(1, t));
    }

    let mut types = Vec::new();
    for w in waiters {
        types.push(w.await.unwrap().unwrap().vscp_type);
    }
    types.sort_unstable();
    assert_eq!(types, vec![0, 1, 2]);
}

// ── Loopback end to end ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_loopback_echo_applies_active_filter() {
    // Arrange
    let (session, _) = loopback_session();
    session.connect().await.unwrap();
    session.set_filter(EventFilter::class_and_type(10, 6)).unwrap();

    // Act
    session.send(&Event::new(10, 7), None).await.unwrap();
    session.send(&Event::new(10, 6), None).await.unwrap();
    let first = session.receive(Some(Duration::from_secs(1))).await.unwrap();
    let second = session.receive(Some(Duration::from_millis(100))).await;

    // Assert
    assert_eq!((first.vscp_class, first.vscp_type), (10, 6));
    assert_eq!(second, Err(VscpError::Timeout));
    assert_eq!(session.statistics().sent, 2);
    assert_eq!(session.statistics().received, 1);
}

#[tokio::test]
async fn test_loopback_guid_prefix_filter_on_simulated_traffic() {
    // Arrange
    let (session, driver) = loopback_session();
    session.connect().await.unwrap();
    let mut filter = EventFilter::default();
    filter.guid_value[..4].copy_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);
    filter.guid_mask[..4].copy_from_slice(&[0xFF; 4]);
    session.set_filter(filter).unwrap();

    // Act
    let ours = Event::new(10, 6).with_guid(&[0xAA, 0xBB, 0xCC, 0xDD, 0x01]);
    let theirs = Event::new(10, 6).with_guid(Guid::new_random().as_bytes());
    assert_eq!(driver.simulate_incoming(&theirs).await, 1);
    assert_eq!(driver.simulate_incoming(&ours).await, 1);

    // Assert
    let got = session.receive(Some(Duration::from_secs(1))).await.unwrap();
    assert_eq!(got.guid, ours.guid);
}

#[tokio::test]
async fn test_loopback_reports_interface_and_version_while_connected() {
    let (session, driver) = loopback_session();
    session.connect().await.unwrap();

    assert_eq!(session.interfaces().await, Ok(vec!["loopback".to_string()]));
    assert_eq!(session.version().await.unwrap().to_string(), "15.0.3.0");
    assert_eq!(driver.open_connections(), 1);

    session.disconnect().await.unwrap();
    assert_eq!(driver.open_connections(), 0);
    assert_eq!(session.interfaces().await, Err(VscpError::NotConnected));
}
