//! Operator service: access checks, storage round trips and decryption.

use assert_matches::assert_matches;
use chrono::Duration;
use serde_json::Value;
use swan_core::{OperatorConfig, SwanError};
use swan_operator::{Operator, RequestContext, UpdateRequest};
use swan_testkit::fixtures::{
    self, TEST_ACCESS_KEY, TEST_DOMAIN, TEST_EMAIL, TEST_RETURN_URL, TEST_SALT,
};
use swan_testkit::TestEffects;

fn operator() -> Operator<TestEffects> {
    let config = OperatorConfig {
        title: "Test Title".to_string(),
        background_color: "#f5f5f5".to_string(),
        message: "Updating".to_string(),
        ..OperatorConfig::default()
    };
    Operator::new(config, TestEffects::default()).unwrap()
}

fn request() -> RequestContext {
    RequestContext::new(TEST_DOMAIN, Some(TEST_ACCESS_KEY))
}

fn encrypted(url: &str) -> &str {
    url.split("encrypted=").nth(1).unwrap_or_default()
}

async fn store_profile(operator: &Operator<TestEffects>) -> String {
    let effects = operator.effects();
    let now = effects.now();
    let pref = fixtures::signed_preferences(effects, true, now).await.unwrap();
    let email = fixtures::signed_email(effects, TEST_EMAIL, now).await.unwrap();
    let salt = fixtures::signed_salt(effects, TEST_SALT, now).await.unwrap();
    let update = UpdateRequest {
        pref: Some(pref.to_base64().unwrap()),
        email: Some(email.to_base64().unwrap()),
        salt: Some(salt.to_base64().unwrap()),
        stop: Some("ads.example".to_string()),
        ..UpdateRequest::default()
    };
    operator
        .update(&request(), TEST_RETURN_URL, vec!["page-1".to_string()], &update)
        .await
        .unwrap()
}

#[tokio::test]
async fn access_key_is_checked_first() {
    let operator = operator();
    let missing = RequestContext::new(TEST_DOMAIN, None);
    let wrong = RequestContext::new(TEST_DOMAIN, Some("B"));

    let err = operator.fetch(&missing, TEST_RETURN_URL, vec![]).await.unwrap_err();
    assert_matches!(err, SwanError::AuthorizationDenied { .. });
    assert_eq!(err.status_code(), 401);

    // Denied before the missing parameter is noticed.
    assert_matches!(
        operator.decrypt(&wrong, None).await,
        Err(SwanError::AuthorizationDenied { .. })
    );
    assert_matches!(
        operator.create_rid(&wrong).await,
        Err(SwanError::AuthorizationDenied { .. })
    );
}

#[tokio::test]
async fn update_then_decrypt_public_and_raw() {
    let operator = operator();
    let url = store_profile(&operator).await;
    assert!(url.starts_with(TEST_RETURN_URL));

    let public = operator
        .decrypt(&request(), Some(encrypted(&url)))
        .await
        .unwrap();
    // The update already stored an identifier, so none is minted.
    assert!(public.directives.is_empty());
    let json = serde_json::to_value(&public.record).unwrap();
    for key in ["rid", "pref", "sid", "stop", "val"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert!(json.get("email").is_none());
    assert!(json.get("salt").is_none());
    assert_eq!(json["stop"]["value"], "ads.example");
    assert_eq!(json["state"], serde_json::json!(["page-1"]));

    let raw = operator
        .decrypt_raw(&request(), Some(encrypted(&url)))
        .await
        .unwrap();
    assert_eq!(raw["email"], Value::String(TEST_EMAIL.to_string()));
    assert_eq!(raw["salt"], Value::String(TEST_SALT.to_string()));
    assert_eq!(raw["pref"], Value::Bool(true));
    assert_eq!(raw["title"], "Test Title");
    assert_eq!(raw["backgroundColor"], "#f5f5f5");
    assert_eq!(raw["message"], "Updating");
    assert!(raw.get("stop").is_none());
    assert_eq!(
        raw["rid"],
        json["rid"]["value"],
        "raw rid is the same signed value"
    );
}

#[tokio::test]
async fn minted_identifier_survives_later_update() {
    let operator = operator();
    let first = operator
        .update(&request(), TEST_RETURN_URL, vec![], &UpdateRequest::default())
        .await
        .unwrap();
    let second = operator
        .update(&request(), TEST_RETURN_URL, vec![], &UpdateRequest::default())
        .await
        .unwrap();

    let a = operator.decrypt(&request(), Some(encrypted(&first))).await.unwrap();
    let b = operator.decrypt(&request(), Some(encrypted(&second))).await.unwrap();
    assert_eq!(a.record.rid.field, b.record.rid.field);
}

#[tokio::test]
async fn fetch_on_empty_store_mints_identifier() {
    let operator = operator();
    let url = operator
        .fetch(&request(), TEST_RETURN_URL, vec![])
        .await
        .unwrap();
    let assembled = operator
        .decrypt(&request(), Some(encrypted(&url)))
        .await
        .unwrap();
    assert_eq!(assembled.directives.len(), 1);
    assert!(assembled.record.sid.is_none());
    let now = operator.effects().now();
    assert_eq!(assembled.record.val.expires, now + Duration::hours(1));
}

#[tokio::test]
async fn decrypt_parameter_errors() {
    let operator = operator();
    let err = operator.decrypt(&request(), None).await.unwrap_err();
    assert_eq!(err.to_string(), "missing 'encrypted' parameter");
    assert_eq!(err.status_code(), 400);

    assert_matches!(
        operator.decrypt(&request(), Some("not base64!")).await,
        Err(SwanError::Invalid { .. })
    );

    let garbage = swan_core::encode_base64(b"{\"not\":\"results\"}");
    let err = operator
        .decrypt(&request(), Some(&garbage))
        .await
        .unwrap_err();
    assert_matches!(err, SwanError::Storage { .. });
    assert_eq!(err.public_message(), "internal server error");
}

#[tokio::test]
async fn stale_results_are_rejected() {
    let operator = operator();
    let url = operator
        .fetch(&request(), TEST_RETURN_URL, vec![])
        .await
        .unwrap();
    operator.effects().advance(Duration::minutes(6));

    let err = operator
        .decrypt_raw(&request(), Some(encrypted(&url)))
        .await
        .unwrap_err();
    assert_matches!(err, SwanError::Expired { .. });
    assert!(err.to_string().contains("data expired and can no longer be used"));
}

#[tokio::test]
async fn stop_adds_one_domain() {
    let operator = operator();
    operator
        .stop(&request(), TEST_RETURN_URL, vec![], "ads.example")
        .await
        .unwrap();
    operator
        .stop(&request(), TEST_RETURN_URL, vec![], "ads.example")
        .await
        .unwrap();
    assert_eq!(
        operator.effects().storage.values("stop").await,
        vec![b"ads.example".to_vec()]
    );

    assert_matches!(
        operator
            .stop(&request(), TEST_RETURN_URL, vec![], "two.example three.example")
            .await,
        Err(SwanError::InvalidStopEntry { .. })
    );
    assert_matches!(
        operator
            .stop(&request(), TEST_RETURN_URL, vec![], "bad/domain")
            .await,
        Err(SwanError::InvalidStopEntry { .. })
    );
}

#[tokio::test]
async fn return_url_must_be_absolute() {
    let operator = operator();
    assert_matches!(
        operator.fetch(&request(), "/relative", vec![]).await,
        Err(SwanError::Invalid { .. })
    );
    assert_matches!(
        operator
            .fetch(&request(), "https://pub.example:99999/landing", vec![])
            .await,
        Err(SwanError::Invalid { .. })
    );
}

#[tokio::test]
async fn create_rid_is_valid_for_retention() {
    let operator = operator();
    let rid = operator.create_rid(&request()).await.unwrap();
    let now = operator.effects().now();
    assert_eq!(rid.field.record.domain, TEST_DOMAIN);
    assert_eq!(rid.validity.created, now);
    assert_eq!(rid.validity.expires, now + Duration::days(90));
}

#[tokio::test]
async fn unknown_host_cannot_sign() {
    let operator = operator();
    let other = RequestContext::new("other.example.com", Some(TEST_ACCESS_KEY));
    let err = operator.create_rid(&other).await.unwrap_err();
    assert_matches!(err, SwanError::SignerUnavailable { .. });
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn home_node_and_health() {
    let operator = operator();
    assert_eq!(
        operator.home_node(&request()).await.unwrap(),
        format!("node.{TEST_DOMAIN}")
    );
    assert!(operator.health().await.is_ok());

    operator.effects().storage.set_alive(false);
    assert_matches!(operator.health().await, Err(SwanError::Storage { .. }));
}

#[tokio::test]
async fn invalid_configuration_is_refused() {
    let config = OperatorConfig {
        scheme: "gopher".to_string(),
        ..OperatorConfig::default()
    };
    assert!(Operator::new(config, TestEffects::default()).is_err());

    let forever = OperatorConfig {
        delete_days: 200_000_000,
        ..OperatorConfig::default()
    };
    assert_matches!(
        Operator::new(forever, TestEffects::default()),
        Err(SwanError::Invalid { .. })
    );
}
