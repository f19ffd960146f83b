//! Integration tests for scans through a `ScanSlot` against the
//! simulated reader.

use std::time::Duration;

use tagkey_transport::{
    ScanConfig, ScanError, ScanKind, ScanSlot, SimulatedTap, SimulatedTransport,
};

fn slot_without_timeout() -> ScanSlot {
    ScanSlot::new(ScanConfig { timeout: None })
}

#[tokio::test]
async fn test_read_returns_presented_payload() {
    let transport = SimulatedTransport::default();
    transport.present(b"\x02enprofile-1".to_vec());

    let slot = slot_without_timeout();
    let payload = slot.read(&transport).await.unwrap();

    assert_eq!(payload, b"\x02enprofile-1");
    assert!(!slot.is_busy());
}

#[tokio::test]
async fn test_write_records_payload_on_ack() {
    let transport = SimulatedTransport::default();
    transport.push(SimulatedTap::BlankTag);

    let slot = slot_without_timeout();
    slot.write(&transport, b"\x02enabc").await.unwrap();

    assert_eq!(transport.written(), vec![b"\x02enabc".to_vec()]);
}

#[tokio::test]
async fn test_failed_write_records_nothing() {
    let transport = SimulatedTransport::default();
    transport.push(SimulatedTap::Fail("Tag is read-only".into()));

    let slot = slot_without_timeout();
    let err = slot.write(&transport, b"\x02enabc").await.unwrap_err();

    assert_eq!(err, ScanError::Hardware("Tag is read-only".into()));
    assert!(transport.written().is_empty());
}

#[tokio::test]
async fn test_blank_tag_read_is_empty_tag() {
    let transport = SimulatedTransport::default();
    transport.push(SimulatedTap::BlankTag);

    let err = slot_without_timeout().read(&transport).await.unwrap_err();
    assert_eq!(err, ScanError::EmptyTag);
}

#[tokio::test]
async fn test_user_cancel_is_cancellation() {
    let transport = SimulatedTransport::default();
    transport.push(SimulatedTap::UserCancel);

    let err = slot_without_timeout().read(&transport).await.unwrap_err();
    assert!(err.is_cancellation());
}

#[tokio::test]
async fn test_unavailable_reader_leaves_slot_free() {
    let transport = SimulatedTransport::default();
    transport.set_available(false);
    transport.present(b"\x00x".to_vec());

    let slot = slot_without_timeout();
    let err = slot.read(&transport).await.unwrap_err();

    assert_eq!(err, ScanError::Unavailable);
    assert!(!slot.is_busy());
    assert_eq!(transport.remaining(), 1, "scripted tap must not be consumed");
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_scan_is_rejected_busy() {
    let transport = SimulatedTransport::default();
    let slot = slot_without_timeout();

    let first = {
        let slot = slot.clone();
        let transport = transport.clone();
        tokio::spawn(async move { slot.read(&transport).await })
    };
    // Let the first scan claim the slot and start waiting for a tag.
    tokio::task::yield_now().await;
    assert_eq!(slot.pending(), Some(ScanKind::Read));

    let second = slot.write(&transport, b"\x00x").await;
    assert_eq!(second, Err(ScanError::Busy));

    transport.present(b"\x00first".to_vec());
    let first = first.await.unwrap();
    assert_eq!(first.unwrap(), b"\x00first");
    assert!(!slot.is_busy());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_pending_scan_releases_slot() {
    let transport = SimulatedTransport::default();
    let slot = slot_without_timeout();

    let scan = {
        let slot = slot.clone();
        let transport = transport.clone();
        tokio::spawn(async move { slot.read(&transport).await })
    };
    tokio::task::yield_now().await;

    assert!(slot.cancel());
    let result = scan.await.unwrap();

    assert_eq!(result, Err(ScanError::Cancelled));
    assert!(!slot.is_busy());
    // A new scan can start straight away.
    transport.present(b"\x00next".to_vec());
    assert_eq!(slot.read(&transport).await.unwrap(), b"\x00next");
}

#[tokio::test(start_paused = true)]
async fn test_scan_times_out_when_no_tag_arrives() {
    let transport = SimulatedTransport::default();
    let slot = ScanSlot::new(ScanConfig {
        timeout: Some(Duration::from_secs(30)),
    });

    let err = slot.read(&transport).await.unwrap_err();

    assert_eq!(err, ScanError::Timeout(Duration::from_secs(30)));
    assert!(!slot.is_busy());
}

#[tokio::test]
async fn test_dropped_scan_future_releases_slot() {
    let transport = SimulatedTransport::default();
    let slot = slot_without_timeout();

    // Poll once via a zero timeout, then drop the future.
    let _ = tokio::time::timeout(Duration::ZERO, slot.read(&transport)).await;

    assert!(!slot.is_busy());
}
