//! End-to-end tests: simulated reader → codec → controller actor.
//!
//! Each test scripts the reader with `SimulatedTransport`, then drives
//! the service the way the app would. Time is paused, so the 1 Hz
//! session ticker advances only when the test sleeps.

use std::time::Duration;

use tagkey::prelude::*;
use tokio::time::sleep;

// =========================================================================
// Helpers
// =========================================================================

struct Fixture {
    key: TagKey<SimulatedTransport>,
    reader: SimulatedTransport,
    registry: ProfileRegistry,
    history: MemoryHistory,
}

fn fixture() -> Fixture {
    fixture_with(TagkeyConfig::default(), SimulatedTransport::default())
}

fn fixture_with(config: TagkeyConfig, reader: SimulatedTransport) -> Fixture {
    let registry = ProfileRegistry::new();
    registry.insert(Profile::with_id("p-1", "Deep Work").bound_to("tag-p"));
    registry.insert(
        Profile::with_id("q-1", "Lockdown")
            .with_lock_mode(true)
            .bound_to("abc"),
    );

    let history = MemoryHistory::new();
    let key = TagKey::new(config, reader.clone(), history.clone(), registry.clone());
    Fixture {
        key,
        reader,
        registry,
        history,
    }
}

fn payload(identifier: &str) -> Vec<u8> {
    TagCodec::default().encode(identifier).unwrap()
}

// =========================================================================
// Tap: start and end
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_tap_starts_then_same_tag_ends() {
    let f = fixture();

    f.reader.present(payload("tag-p"));
    match f.key.tap().await.unwrap() {
        ScanOutcome::Started(p) => assert_eq!(p.name, "Deep Work"),
        other => panic!("expected Started, got {other:?}"),
    }

    sleep(Duration::from_millis(3_500)).await;
    assert_eq!(f.key.snapshot().formatted_elapsed(), "00:03");

    f.reader.present(payload("tag-p"));
    assert_eq!(f.key.tap().await.unwrap(), ScanOutcome::Ended);
    assert!(!f.key.snapshot().is_active());

    let records = f.history.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].profile_name, "Deep Work");
    assert_eq!(records[0].elapsed_seconds, 3);
}

#[tokio::test(start_paused = true)]
async fn test_locked_session_needs_its_own_tag() {
    let f = fixture();

    f.reader.present(payload("abc"));
    f.key.tap().await.unwrap();
    assert!(f.key.snapshot().is_locked());

    assert!(!f.key.end_session_manually().await.unwrap());

    f.reader.present(payload("tag-p"));
    let outcome = f.key.tap().await.unwrap();
    assert_eq!(
        outcome.user_message().as_deref(),
        Some("Wrong tag. Scan the \"Lockdown\" tag to end this session.")
    );
    assert!(f.key.snapshot().is_active());

    f.reader.present(payload("abc"));
    assert_eq!(f.key.tap().await.unwrap(), ScanOutcome::Ended);
    assert_eq!(f.history.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_tag_is_unrecognized() {
    let f = fixture();

    f.reader.present(payload("unknown-id"));
    let outcome = f.key.tap().await.unwrap();

    assert_eq!(outcome, ScanOutcome::Unrecognized);
    assert!(!f.key.snapshot().is_active());
}

// =========================================================================
// Tap: failures leave the session alone
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_blank_tag_asks_to_link_first() {
    let f = fixture();

    f.reader.push(SimulatedTap::BlankTag);
    let err = f.key.tap().await.unwrap_err();

    assert_eq!(
        err.user_message().as_deref(),
        Some("This tag has no Tagkey data. Link it to a profile first.")
    );
    assert!(!f.key.snapshot().is_active());
}

#[tokio::test(start_paused = true)]
async fn test_foreign_payload_is_unreadable_and_keeps_session() {
    let f = fixture();
    f.reader.present(payload("tag-p"));
    f.key.tap().await.unwrap();

    // Status byte claims a 5-byte language code that is not there.
    f.reader.present(vec![0x05, b'e']);
    let err = f.key.tap().await.unwrap_err();
    assert!(matches!(err, TagkeyError::Decode(_)));
    assert_eq!(err.user_message().as_deref(), Some("Unreadable tag."));

    f.reader.present(vec![0x02, b'e', b'n', 0xFF, 0xFE]);
    let err = f.key.tap().await.unwrap_err();
    assert_eq!(err.user_message().as_deref(), Some("Could not decode tag."));

    assert!(f.key.snapshot().is_active());
    assert!(f.history.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_reader_failure_is_reported_verbatim() {
    let f = fixture();

    f.reader.push(SimulatedTap::Fail("Tag connection lost".into()));
    let err = f.key.tap().await.unwrap_err();

    assert_eq!(err.user_message().as_deref(), Some("Tag connection lost"));
    assert!(!f.key.is_scanning());
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_reader_fails_without_claiming_slot() {
    let f = fixture();
    f.reader.set_available(false);

    assert!(!f.key.can_scan());
    let err = f.key.tap().await.unwrap_err();
    assert!(matches!(err, TagkeyError::Scan(ScanError::Unavailable)));
    assert!(!f.key.is_scanning());
}

#[tokio::test(start_paused = true)]
async fn test_tap_times_out() {
    let mut config = TagkeyConfig::default();
    config.scan.timeout = Some(Duration::from_secs(5));
    let f = fixture_with(config, SimulatedTransport::default());

    let err = f.key.tap().await.unwrap_err();
    assert!(matches!(
        err,
        TagkeyError::Scan(ScanError::Timeout(d)) if d == Duration::from_secs(5)
    ));
    assert!(!f.key.is_scanning());
}

// =========================================================================
// Cancellation and the one-scan rule
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_scan_is_silent_and_changes_nothing() {
    let f = fixture();
    f.reader.present(payload("tag-p"));
    f.key.tap().await.unwrap();

    let (result, cancelled) = tokio::join!(f.key.tap(), async {
        tokio::task::yield_now().await;
        f.key.cancel_scan()
    });

    assert!(cancelled);
    let err = result.unwrap_err();
    assert!(err.is_cancellation());
    assert_eq!(err.user_message(), None);
    assert!(!f.key.is_scanning());
    assert!(f.key.snapshot().is_active(), "session untouched");
}

#[tokio::test(start_paused = true)]
async fn test_second_scan_while_pending_is_busy() {
    let f = fixture();

    let (first, second) = tokio::join!(f.key.tap(), async {
        let second = f.key.link(None).await;
        f.reader.present(payload("tag-p"));
        second
    });

    assert!(matches!(
        second.unwrap_err(),
        TagkeyError::Scan(ScanError::Busy)
    ));
    assert!(matches!(first.unwrap(), ScanOutcome::Started(_)));
    assert!(f.reader.written().is_empty());
}

// =========================================================================
// Link
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_link_existing_profile_writes_its_id() {
    let f = fixture();
    let reading = Profile::with_id("r-1", "Reading");
    f.registry.insert(reading.clone());

    f.reader.push(SimulatedTap::BlankTag);
    let linked = f.key.link(Some(&reading)).await.unwrap();

    assert_eq!(linked.profile_id, reading.id);
    assert_eq!(linked.tag_id, "r-1");
    assert_eq!(f.reader.written(), vec![payload("r-1")]);

    assert!(f.registry.bind_tag(&linked.profile_id, linked.tag_id.clone()));
    f.reader.present(payload(&linked.tag_id));
    match f.key.tap().await.unwrap() {
        ScanOutcome::Started(p) => assert_eq!(p.name, "Reading"),
        other => panic!("expected Started, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_link_new_profile_mints_id() {
    let f = fixture();

    f.reader.push(SimulatedTap::BlankTag);
    let linked = f.key.link(None).await.unwrap();

    assert_eq!(linked.tag_id, linked.profile_id.as_str());
    let written = f.reader.written();
    assert_eq!(TagCodec::default().decode(&written[0]).unwrap(), linked.tag_id);
}

#[tokio::test(start_paused = true)]
async fn test_failed_link_writes_nothing() {
    let f = fixture();

    f.reader.push(SimulatedTap::UserCancel);
    let err = f.key.link(None).await.unwrap_err();

    assert!(err.is_cancellation());
    assert!(f.reader.written().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_link_rejects_identifier_too_large_for_reader() {
    let f = fixture_with(TagkeyConfig::default(), SimulatedTransport::new(16));
    let long = Profile::with_id("a-very-long-profile-identifier", "Long");

    f.reader.push(SimulatedTap::BlankTag);
    let err = f.key.link(Some(&long)).await.unwrap_err();

    assert!(matches!(err, TagkeyError::Encode(_)));
    assert!(!f.key.is_scanning());
    assert_eq!(f.reader.remaining(), 1, "no tag consumed");
}
