//! End-to-end engine scenarios: assembling stored pairs and building
//! directives from submitted fields.

use assert_matches::assert_matches;
use chrono::Duration;
use swan_core::{FieldKey, MergePolicy, OperatorConfig, Preferences, SwanError};
use swan_operator::{assemble, build_directives, EngineContext, UpdateRequest};
use swan_testkit::fixtures::{self, TEST_DOMAIN, TEST_EMAIL, TEST_SALT};
use swan_testkit::TestEffects;

fn context(revalidate_seconds: u64) -> EngineContext {
    let config = OperatorConfig {
        revalidate_seconds,
        delete_days: 90,
        ..OperatorConfig::default()
    };
    EngineContext::from_config(&config, TEST_DOMAIN)
}

#[tokio::test]
async fn identifier_email_and_salt_yield_secondary_identifier() {
    let effects = TestEffects::default();
    let now = effects.now();
    // A long revalidation interval so field expiries bound the record.
    let ctx = context(200 * 24 * 3600);

    let rid = fixtures::signed_identifier(&effects, now - Duration::days(5))
        .await
        .unwrap();
    let email = fixtures::signed_email(&effects, TEST_EMAIL, now - Duration::days(20))
        .await
        .unwrap();
    let salt = fixtures::signed_salt(&effects, TEST_SALT, now - Duration::days(40))
        .await
        .unwrap();
    let pairs = vec![
        fixtures::pair_for(&rid),
        fixtures::pair_for(&email),
        fixtures::pair_for(&salt),
    ];

    let assembled = assemble(&effects, &ctx, &pairs, vec![], now).await.unwrap();
    assert!(assembled.directives.is_empty());

    let raw = &assembled.record;
    let sid = raw.sid.as_ref().expect("secondary identifier derived");
    let combined = now + Duration::days(50);
    assert_eq!(sid.validity.expires, combined);

    let rid_expires = now + Duration::days(85);
    assert_eq!(raw.rid.validity.expires, rid_expires);
    let deadline = now + Duration::days(200);
    assert_eq!(raw.val.expires, rid_expires.min(combined).min(deadline));
    assert_eq!(raw.val.created, now);

    let public = assembled.into_public();
    let json = serde_json::to_value(&public.record).unwrap();
    let object = json.as_object().unwrap();
    assert!(object.contains_key("sid"));
    assert!(!object.contains_key("email"));
    assert!(!object.contains_key("salt"));
}

#[tokio::test]
async fn empty_store_mints_identifier_only_if_absent() {
    let effects = TestEffects::default();
    let now = effects.now();
    let ctx = context(3600);

    let assembled = assemble(&effects, &ctx, &[], vec![], now).await.unwrap();
    assert_eq!(assembled.directives.len(), 1);
    let directive = &assembled.directives[0];
    assert_eq!(directive.key, FieldKey::Rid);
    assert_eq!(directive.policy, MergePolicy::UseIfAbsent);
    assert!(directive.storage_key().starts_with("rid<"));
    assert_eq!(
        directive.value,
        assembled.record.rid.field.to_base64().unwrap()
    );

    assert!(assembled.record.sid.is_none());
    assert_eq!(assembled.record.val.expires, now + Duration::hours(1));
}

#[tokio::test]
async fn email_without_salt_has_no_secondary_identifier() {
    let effects = TestEffects::default();
    let now = effects.now();
    let email = fixtures::signed_email(&effects, TEST_EMAIL, now).await.unwrap();

    let pairs = [fixtures::pair_for(&email)];
    let assembled = assemble(&effects, &context(3600), &pairs, vec![], now)
        .await
        .unwrap();
    assert!(assembled.record.sid.is_none());
    assert!(assembled.record.email.is_some());
}

#[tokio::test]
async fn unregistered_signer_rejects_whole_update() {
    let effects = TestEffects::default();
    let now = effects.now();
    let outsider = TestEffects::new(7);
    outsider.add_signer("unregistered.example.com");
    let pref = fixtures::sign(
        &outsider,
        Preferences {
            use_browsing_for_personalization: true,
        },
        "unregistered.example.com",
        now,
    )
    .await
    .unwrap();
    let email = fixtures::signed_email(&effects, TEST_EMAIL, now).await.unwrap();

    let request = UpdateRequest {
        pref: Some(pref.to_base64().unwrap()),
        email: Some(email.to_base64().unwrap()),
        stop: Some("ads.example".to_string()),
        ..UpdateRequest::default()
    };
    let err = build_directives(&effects, &context(3600), &request, now)
        .await
        .unwrap_err();
    assert_matches!(err, SwanError::UnverifiedField { ref key } if key == "pref");
}

#[tokio::test]
async fn repeated_stop_domain_is_a_single_append() {
    let effects = TestEffects::default();
    let now = effects.now();
    let rid = fixtures::signed_identifier(&effects, now).await.unwrap();
    let request = UpdateRequest {
        rid: Some(rid.to_base64().unwrap()),
        stop: Some("ads.example".to_string()),
        ..UpdateRequest::default()
    };

    let directives = build_directives(&effects, &context(3600), &request, now)
        .await
        .unwrap();
    let stops: Vec<_> = directives
        .iter()
        .filter(|d| d.key == FieldKey::Stop)
        .collect();
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0].policy, MergePolicy::Append);
    assert_eq!(stops[0].value, "ads.example");
}

#[tokio::test]
async fn stored_stop_list_is_joined() {
    let effects = TestEffects::default();
    let now = effects.now();
    let pairs = vec![fixtures::stop_pair(&["a.example", "", "b.example"], now)];

    let assembled = assemble(&effects, &context(3600), &pairs, vec![], now)
        .await
        .unwrap();
    let json = serde_json::to_value(&assembled.into_public().record).unwrap();
    assert_eq!(json["stop"]["value"], "a.example b.example");
}

#[tokio::test]
async fn secondary_identifier_needs_host_signer() {
    let effects = TestEffects::default();
    let now = effects.now();
    let rid = fixtures::signed_identifier(&effects, now).await.unwrap();
    let email = fixtures::signed_email(&effects, TEST_EMAIL, now).await.unwrap();
    let salt = fixtures::signed_salt(&effects, TEST_SALT, now).await.unwrap();
    let pairs = vec![
        fixtures::pair_for(&rid),
        fixtures::pair_for(&email),
        fixtures::pair_for(&salt),
    ];

    let config = OperatorConfig::default();
    let ctx = EngineContext::from_config(&config, "unsigned.example.com");
    assert_matches!(
        assemble(&effects, &ctx, &pairs, vec![], now).await,
        Err(SwanError::SignerUnavailable { .. })
    );
}

#[tokio::test]
async fn unrepresentable_retention_is_an_error() {
    let effects = TestEffects::default();
    let now = effects.now();
    let config = OperatorConfig {
        delete_days: u32::MAX,
        ..OperatorConfig::default()
    };
    let ctx = EngineContext::from_config(&config, TEST_DOMAIN);

    assert_matches!(
        assemble(&effects, &ctx, &[], vec![], now).await,
        Err(SwanError::Internal { .. })
    );
    let request = UpdateRequest {
        stop: Some("ads.example".to_string()),
        ..UpdateRequest::default()
    };
    assert_matches!(
        build_directives(&effects, &ctx, &request, now).await,
        Err(SwanError::Internal { .. })
    );
}
