//! Merge-policy behaviour of the in-memory storage network

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use swan_core::effects::{PhysicalTimeEffects, StorageEffects, TimeError};
use swan_core::{
    FieldKey, MergeDirective, MergePolicy, Preferences, Signed, StorageOperation, StoragePair,
    StorageResults,
};
use swan_effects::MemoryStorageHandler;

#[derive(Clone, Copy)]
struct FixedClock(DateTime<Utc>);

#[async_trait]
impl PhysicalTimeEffects for FixedClock {
    async fn physical_time(&self) -> Result<DateTime<Utc>, TimeError> {
        Ok(self.0)
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn purge() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 30).unwrap()
}

fn operation(writes: Vec<MergeDirective>, reads: Vec<FieldKey>) -> StorageOperation {
    StorageOperation {
        return_url: "https://pub.example/landing".to_string(),
        use_home_node: false,
        state: vec!["s1".to_string()],
        writes,
        reads,
    }
}

async fn results_of(storage: &MemoryStorageHandler<FixedClock>, url: &str) -> StorageResults {
    let encoded = url.split("encrypted=").nth(1).unwrap();
    let bytes = swan_core::decode_base64(encoded).unwrap();
    storage.decrypt("op.example.com", &bytes).await.unwrap()
}

#[tokio::test]
async fn use_if_absent_keeps_existing_value() {
    let storage = MemoryStorageHandler::new(FixedClock(now()));
    let first = MergeDirective::new(FieldKey::Rid, MergePolicy::UseIfAbsent, purge(), "first");
    let second = MergeDirective::new(FieldKey::Rid, MergePolicy::UseIfAbsent, purge(), "second");

    storage
        .submit("op.example.com", operation(vec![first], vec![]))
        .await
        .unwrap();
    let url = storage
        .submit("op.example.com", operation(vec![second], vec![FieldKey::Rid]))
        .await
        .unwrap();

    let results = results_of(&storage, &url).await;
    assert_eq!(results.pairs.len(), 1);
    assert_eq!(results.pairs[0].values, vec![b"first".to_vec()]);
    assert_eq!(results.state, vec!["s1".to_string()]);
}

#[tokio::test]
async fn use_if_newer_replaces_value() {
    let storage = MemoryStorageHandler::new(FixedClock(now()));
    for value in ["old", "new"] {
        let d = MergeDirective::new(FieldKey::Pref, MergePolicy::UseIfNewer, purge(), value);
        storage
            .submit("op.example.com", operation(vec![d], vec![]))
            .await
            .unwrap();
    }
    assert_eq!(storage.values("pref").await, vec![b"new".to_vec()]);
}

fn signed_pref(at: DateTime<Utc>) -> String {
    let pref = Preferences {
        use_browsing_for_personalization: true,
    };
    Signed::from_parts(pref, "op.example.com", at, vec![0; 64])
        .to_base64()
        .unwrap()
}

#[tokio::test]
async fn use_if_newer_keeps_later_signed_value() {
    let storage = MemoryStorageHandler::new(FixedClock(now()));
    let stored = signed_pref(now() - Duration::days(1));
    storage
        .insert_raw(StoragePair::new(
            "pref",
            now(),
            now() + Duration::days(90),
            vec![stored.as_bytes().to_vec()],
        ))
        .await;

    let older = signed_pref(now() - Duration::days(2));
    let d = MergeDirective::new(FieldKey::Pref, MergePolicy::UseIfNewer, purge(), &older);
    storage
        .submit("op.example.com", operation(vec![d], vec![]))
        .await
        .unwrap();
    assert_eq!(storage.values("pref").await, vec![stored.as_bytes().to_vec()]);

    let newer = signed_pref(now());
    let d = MergeDirective::new(FieldKey::Pref, MergePolicy::UseIfNewer, purge(), &newer);
    storage
        .submit("op.example.com", operation(vec![d], vec![]))
        .await
        .unwrap();
    assert_eq!(storage.values("pref").await, vec![newer.as_bytes().to_vec()]);
}

#[tokio::test]
async fn append_unions_entries() {
    let storage = MemoryStorageHandler::new(FixedClock(now()));
    let a = MergeDirective::new(
        FieldKey::Stop,
        MergePolicy::Append,
        purge(),
        "a.example b.example",
    );
    let b = MergeDirective::new(
        FieldKey::Stop,
        MergePolicy::Append,
        purge(),
        "b.example c.example",
    );
    storage
        .submit("op.example.com", operation(vec![a, b], vec![]))
        .await
        .unwrap();
    assert_eq!(
        storage.values("stop").await,
        vec![
            b"a.example".to_vec(),
            b"b.example".to_vec(),
            b"c.example".to_vec()
        ]
    );
}

#[tokio::test]
async fn absent_keys_read_back_empty() {
    let storage =
        MemoryStorageHandler::new(FixedClock(now())).with_results_ttl(Duration::minutes(1));
    let url = storage
        .submit("op.example.com", operation(vec![], FieldKey::READABLE.to_vec()))
        .await
        .unwrap();
    assert!(url.starts_with("https://pub.example/landing?encrypted="));

    let results = results_of(&storage, &url).await;
    assert_eq!(results.pairs.len(), FieldKey::READABLE.len());
    assert!(results.pairs.iter().all(|p| p.values.is_empty()));
    assert_eq!(results.expires, now() + Duration::minutes(1));
}

#[tokio::test]
async fn unreachable_network_fails() {
    let storage = MemoryStorageHandler::new(FixedClock(now()));
    storage.set_alive(false);
    assert!(!storage.is_alive().await);
    assert!(storage
        .submit("op.example.com", operation(vec![], vec![]))
        .await
        .is_err());
    assert!(storage.home_node("op.example.com").await.is_err());
    assert!(storage.decrypt("op.example.com", b"not json").await.is_err());
}
