//! Contract tests for issuer key-set fetching.

use credguard_client::{build_key_set_fetcher, ClientError, KeySetConfig, KeySetFetcher};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn jwks_body() -> serde_json::Value {
    json!({
        "keys": [{
            "kty": "RSA",
            "kid": "credguard-key-1",
            "use": "sig",
            "alg": "RS256",
            "n": "sXchDaQebHnPiGvyDOAT4saGEUetSyo9MKLOoWFsueri23bOdgWp4Dy1WlUzewbgBHod5pcM9H95GQRV3JDXboIRROSBigeC5yjU1hGzHHyXss8UDprecbAYxknTcQkhslANGRUZmdTOQ5qTRsLAt6BTYuyvVRdhS8exSZEy_c4gs_7svlJJQ4H9_NxsiIoLwAEk7-Q3UXERGYw_75IDrGA84-lA_-Ct4eTlXHBIY2EaV7t7LjJaynVJCpkv4LKjTTAumiGUIuQhrNhZLuF_RJLqHpM2kgWFLU7-VTdL1VbC2tejvcI2BlMkEpk1BzBZI0KQB0GaDWFLN-aEAw3vRw",
            "e": "AQAB"
        }]
    })
}

#[tokio::test]
async fn fetch_parses_key_set() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.well-known/jwks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = build_key_set_fetcher(&KeySetConfig::default()).unwrap();
    let set = fetcher
        .fetch(&format!("{}/.well-known/jwks.json", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(set.keys.len(), 1);
    assert!(set.find("credguard-key-1").is_some());
}

#[tokio::test]
async fn fetch_surfaces_http_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let fetcher = build_key_set_fetcher(&KeySetConfig::default()).unwrap();
    let err = fetcher
        .fetch(&format!("{}/jwks", mock_server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::ApiError { status: 404, .. }));
}

#[tokio::test]
async fn fetch_rejects_body_that_is_not_a_key_set() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hello": "world" })))
        .mount(&mock_server)
        .await;

    let fetcher = build_key_set_fetcher(&KeySetConfig::default()).unwrap();
    let err = fetcher
        .fetch(&format!("{}/jwks", mock_server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Deserialization { .. }));
}

#[tokio::test]
async fn cached_fetcher_hits_network_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = KeySetConfig {
        timeout_secs: 5,
        cache_ttl_secs: 300,
        max_retries: 0,
    };
    let fetcher = build_key_set_fetcher(&config).unwrap();
    let url = format!("{}/jwks", mock_server.uri());
    fetcher.fetch(&url).await.unwrap();
    fetcher.fetch(&url).await.unwrap();
}
