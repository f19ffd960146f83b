use std::time::Duration;

use tagkey::prelude::*;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Scripted desk
// ---------------------------------------------------------------------------

/// Simulates the user holding the tag that was written last.
fn hold_last_written(reader: &SimulatedTransport) -> Result<Vec<u8>, TagkeyError> {
    reader
        .written()
        .last()
        .cloned()
        .ok_or_else(|| ScanError::Hardware("no tag has been written yet".into()).into())
}

fn report(outcome: &Result<ScanOutcome, TagkeyError>) {
    let message = match outcome {
        Ok(outcome) => outcome.user_message(),
        Err(e) => e.user_message(),
    };
    if let Some(message) = message {
        eprintln!("  > {message}");
    }
}

/// Links a blank tag to `profile` and records the binding.
async fn link(
    key: &TagKey<SimulatedTransport>,
    reader: &SimulatedTransport,
    registry: &ProfileRegistry,
    profile: Option<&Profile>,
) -> Result<Vec<u8>, TagkeyError> {
    reader.push(SimulatedTap::BlankTag);
    let linked = key.link(profile).await?;
    if profile.is_none() {
        registry.insert(Profile::with_id(linked.profile_id.as_str(), "Reading"));
    }
    registry.bind_tag(&linked.profile_id, linked.tag_id.clone());
    eprintln!("linked tag {} to profile {}", linked.tag_id, linked.profile_id);
    hold_last_written(reader)
}

async fn tap(key: &TagKey<SimulatedTransport>, reader: &SimulatedTransport, tag: &[u8]) {
    reader.present(tag.to_vec());
    let outcome = key.tap().await;
    report(&outcome);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => TagkeyConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => TagkeyConfig::default(),
    };

    let reader = SimulatedTransport::default();
    let registry = ProfileRegistry::new();
    // Completed sessions go to stdout, one JSON object per line.
    let history = JsonLinesHistory::new(std::io::stdout());
    let key = TagKey::new(config, reader.clone(), history, registry.clone());

    let deep_work = Profile::new("Deep Work")
        .blocking("com.example.social")
        .blocking("com.example.video");
    let lockdown = Profile::new("Lockdown")
        .blocking("com.example.games")
        .with_lock_mode(true);
    registry.insert(deep_work.clone());
    registry.insert(lockdown.clone());

    eprintln!("-- linking tags");
    let deep_tag = link(&key, &reader, &registry, Some(&deep_work)).await?;
    let lock_tag = link(&key, &reader, &registry, Some(&lockdown)).await?;
    let reading_tag = link(&key, &reader, &registry, None).await?;

    eprintln!("-- unlocked session");
    tap(&key, &reader, &deep_tag).await;
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    eprintln!("  elapsed {}", key.snapshot().formatted_elapsed());
    let ended = key.end_session_manually().await?;
    eprintln!("  manual end: {ended}");

    eprintln!("-- locked session");
    tap(&key, &reader, &lock_tag).await;
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    let ended = key.end_session_manually().await?;
    eprintln!("  manual end: {ended} (locked: {})", key.snapshot().is_locked());
    tap(&key, &reader, &reading_tag).await;
    tap(&key, &reader, &lock_tag).await;

    eprintln!("-- unusable tags");
    reader.push(SimulatedTap::BlankTag);
    report(&key.tap().await);
    tap(&key, &reader, &[0x05, b'e']).await;
    reader.push(SimulatedTap::Fail("Tag connection lost".into()));
    report(&key.tap().await);

    key.controller().shutdown().await?;
    key.controller().closed().await;
    Ok(())
}
