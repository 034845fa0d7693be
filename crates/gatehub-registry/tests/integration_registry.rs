//! Integration tests exercising the registry and evaluator together
//! through the crate's public API.
//!
//! Run with: cargo test --package gatehub-registry --test integration_registry

use gatehub_core::RawUid;
use gatehub_registry::{AccessEvaluator, CardRegistry, Database, SqliteCardRegistry};
use tempfile::TempDir;

async fn setup() -> (Database, AccessEvaluator, TempDir) {
    let db = Database::in_memory().await.unwrap();
    let media = TempDir::new().unwrap();
    let registry = SqliteCardRegistry::new(db.pool().clone(), media.path());
    let evaluator = AccessEvaluator::new(registry, "http://localhost:8080/media");
    (db, evaluator, media)
}

#[tokio::test]
async fn scan_grants_card_added_under_different_spelling() {
    let (db, evaluator, _media) = setup().await;

    assert!(
        evaluator
            .registry()
            .add("KEY", &"AABBCCDD".into())
            .await
            .unwrap()
    );

    // The reader reports the UID colon-separated; same identity.
    let decision = evaluator.evaluate(&"AA:BB:CC:DD".into()).await.unwrap();
    assert!(decision.granted);
    assert_eq!(decision.card_type, "KEY");

    db.close().await;
}

#[tokio::test]
async fn byte_sequence_scan_matches_hex_string_registration() {
    let (db, evaluator, _media) = setup().await;

    evaluator
        .registry()
        .add("SECURITY", &"09 25 0c 05".into())
        .await
        .unwrap();

    let decision = evaluator
        .evaluate(&RawUid::Bytes(vec![0x09, 0x25, 0x0C, 0x05]))
        .await
        .unwrap();
    assert!(decision.granted);
    assert_eq!(decision.card_type, "SECURITY");

    db.close().await;
}

#[tokio::test]
async fn full_card_lifecycle_with_image() {
    let (db, evaluator, media) = setup().await;
    let registry = evaluator.registry();

    registry.add("KEY", &"AABB".into()).await.unwrap();
    let filename = registry
        .save_image("KEY", &"AABB".into(), b"fake-png", "badge.png")
        .await
        .unwrap();
    assert!(media.path().join(&filename).exists());

    let decision = evaluator.evaluate(&"AABB".into()).await.unwrap();
    assert!(decision.granted && decision.has_image);

    // Removal cascades: no card, no media row, scan denied again.
    assert!(registry.remove("KEY", &"AABB".into()).await.unwrap());
    assert!(registry.list().await.unwrap().is_empty());
    assert!(
        registry
            .get_with_image("KEY", &"AABB".into())
            .await
            .unwrap()
            .is_none()
    );

    let decision = evaluator.evaluate(&"AABB".into()).await.unwrap();
    assert!(!decision.granted);
    assert_eq!(decision.card_type, "UNKNOWN");

    db.close().await;
}
