//! Pipeline integration tests against a fake backend.
//!
//! These pin the session-core guarantees: single-flight refresh, the
//! one-retry budget per request, and clean session teardown on terminal
//! failures.

use std::time::Duration;

use certdesk_client::{ConsoleClient, Error};
use certdesk_client::types::{BundleFormat, CertificateType};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn auth_body(access: &str, refresh: &str) -> serde_json::Value {
    json!({
        "accessToken": access,
        "refreshToken": refresh,
        "tokenType": "Bearer",
        "username": "admin"
    })
}

fn certificate_body(serial: &str) -> serde_json::Value {
    json!({
        "id": 1,
        "commonName": "Example Root CA",
        "organization": "Example",
        "organizationalUnit": "PKI",
        "country": "US",
        "state": "CA",
        "locality": "SF",
        "serialNumber": serial,
        "type": "SELF_SIGNED_ROOT",
        "issuedAt": "2024-01-01T00:00:00",
        "expiresAt": "2034-01-01T00:00:00",
        "revoked": false,
        "certificateData": "-----BEGIN CERTIFICATE-----"
    })
}

fn client_for(server: &MockServer) -> ConsoleClient {
    ConsoleClient::builder()
        .base_url(server.uri())
        .build()
        .unwrap()
}

async fn mount_login(server: &MockServer, access: &str, refresh: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body(access, refresh)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fresh_login_never_triggers_a_refresh() {
    let server = MockServer::start().await;
    mount_login(&server, "access-1", "refresh-1").await;

    Mock::given(method("GET"))
        .and(path("/certificates"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let credential = client.auth().login("admin", "secret").await.unwrap();
    assert_eq!(credential.access_token, "access-1");
    assert_eq!(credential.username, "admin");
    assert!(client.auth().is_authenticated().await);

    let certificates = client.certificates().list().await.unwrap();
    assert!(certificates.is_empty());
}

#[tokio::test]
async fn test_expired_access_token_is_refreshed_and_retried_once() {
    let server = MockServer::start().await;
    mount_login(&server, "access-stale", "refresh-1").await;

    // The stale token is rejected; the refreshed one is accepted.
    Mock::given(method("GET"))
        .and(path("/certificates"))
        .and(header("authorization", "Bearer access-stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/certificates"))
        .and(header("authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([certificate_body("1a2b")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({"refreshToken": "refresh-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("access-2", "refresh-2")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.auth().login("admin", "secret").await.unwrap();

    // The caller sees only the final 200, never the intermediate 401.
    let certificates = client.certificates().list().await.unwrap();
    assert_eq!(certificates.len(), 1);
    assert_eq!(certificates[0].serial_number, "1a2b");
    assert_eq!(certificates[0].kind, CertificateType::SelfSignedRoot);

    // The refresh replaced the credential wholesale.
    let credential = client.auth().credential().await.unwrap();
    assert_eq!(credential.access_token, "access-2");
    assert_eq!(credential.refresh_token, "refresh-2");
}

#[tokio::test]
async fn test_rejected_refresh_token_ends_the_session() {
    let server = MockServer::start().await;
    mount_login(&server, "access-stale", "refresh-bad").await;

    Mock::given(method("GET"))
        .and(path("/certificates"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid refresh token"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.auth().login("admin", "secret").await.unwrap();

    let err = client.certificates().list().await.unwrap_err();
    assert!(matches!(err, Error::Reauthenticate));
    assert!(err.requires_login());

    // The store is empty before the error ever surfaces.
    assert!(!client.auth().is_authenticated().await);
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh_exchange() {
    let server = MockServer::start().await;
    mount_login(&server, "access-stale", "refresh-1").await;

    for resource in ["/certificates", "/certificates/123"] {
        Mock::given(method("GET"))
            .and(path(resource))
            .and(header("authorization", "Bearer access-stale"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/certificates"))
        .and(header("authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/certificates/123"))
        .and(header("authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(certificate_body("123")))
        .expect(1)
        .mount(&server)
        .await;

    // The delay keeps the exchange in flight long enough for both requests
    // to observe their 401 and pile onto the same refresh.
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({"refreshToken": "refresh-1"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(auth_body("access-2", "refresh-2"))
                .set_delay(Duration::from_millis(150)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.auth().login("admin", "secret").await.unwrap();

    // The API handle must outlive the joined futures that borrow it.
    let api = client.certificates();
    let (list, single) = tokio::join!(api.list(), api.get("123"));

    assert!(list.unwrap().is_empty());
    assert_eq!(single.unwrap().serial_number, "123");
    // The .expect(1) on the refresh mock verifies the single-flight property
    // when the server shuts down.
}

#[tokio::test]
async fn test_every_waiter_on_a_failed_refresh_reauthenticates() {
    let server = MockServer::start().await;
    mount_login(&server, "access-stale", "refresh-bad").await;

    for resource in ["/certificates", "/certificates/a1", "/certificates/b2"] {
        Mock::given(method("GET"))
            .and(path(resource))
            .and(header("authorization", "Bearer access-stale"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
    }
    // The delay keeps the doomed exchange in flight until every request has
    // observed its 401 and joined the wait.
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({"refreshToken": "refresh-bad"})))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string("Invalid refresh token")
                .set_delay(Duration::from_millis(150)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.auth().login("admin", "secret").await.unwrap();

    let api = client.certificates();
    let (list, first, second) = tokio::join!(api.list(), api.get("a1"), api.get("b2"));

    // One shared exchange, and its failure reaches every caller.
    assert!(matches!(list, Err(Error::Reauthenticate)));
    assert!(matches!(first, Err(Error::Reauthenticate)));
    assert!(matches!(second, Err(Error::Reauthenticate)));
    assert!(!client.auth().is_authenticated().await);
}

#[tokio::test]
async fn test_a_request_is_submitted_at_most_twice() {
    let server = MockServer::start().await;
    mount_login(&server, "access-1", "refresh-1").await;

    // The backend rejects even the refreshed token. The expectation of two
    // calls pins the retry budget: original + one retry, never a third.
    Mock::given(method("GET"))
        .and(path("/certificates"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("access-2", "refresh-2")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.auth().login("admin", "secret").await.unwrap();

    let err = client.certificates().list().await.unwrap_err();
    assert!(matches!(err, Error::Reauthenticate));
    assert!(!client.auth().is_authenticated().await);
}

#[tokio::test]
async fn test_logout_during_inflight_refresh_discards_the_result() {
    let server = MockServer::start().await;
    mount_login(&server, "access-stale", "refresh-1").await;

    Mock::given(method("GET"))
        .and(path("/certificates"))
        .and(header("authorization", "Bearer access-stale"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User logged out successfully"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(auth_body("access-2", "refresh-2"))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.auth().login("admin", "secret").await.unwrap();

    let in_flight = {
        let client = client.clone();
        tokio::spawn(async move { client.certificates().list().await })
    };

    // Let the request hit its 401 and claim the refresh, then log out while
    // the exchange is still in flight.
    tokio::time::sleep(Duration::from_millis(100)).await;
    client.auth().logout().await.unwrap();

    let err = in_flight.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Reauthenticate));

    // The refresh settles after logout; its credential must not reappear.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!client.auth().is_authenticated().await);
}

#[tokio::test]
async fn test_a_login_racing_a_failed_refresh_rescues_the_waiter() {
    let server = MockServer::start().await;

    // Two distinct logins: the session whose refresh is doomed, and the one
    // that lands while that exchange is still in flight.
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"username": "admin", "password": "first-pw"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(auth_body("access-stale", "refresh-1")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"username": "admin", "password": "second-pw"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(auth_body("access-fresh", "refresh-9")),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/certificates"))
        .and(header("authorization", "Bearer access-stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/certificates"))
        .and(header("authorization", "Bearer access-fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({"refreshToken": "refresh-1"})))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string("Invalid refresh token")
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.auth().login("admin", "first-pw").await.unwrap();

    let in_flight = {
        let client = client.clone();
        tokio::spawn(async move { client.certificates().list().await })
    };

    // Let the request hit its 401 and claim the refresh, then log in again
    // while the doomed exchange is still in flight.
    tokio::time::sleep(Duration::from_millis(100)).await;
    client.auth().login("admin", "second-pw").await.unwrap();

    // The stale session's failure must not tear down the new session: the
    // waiter retries with the login-installed credential and succeeds.
    let certificates = in_flight.await.unwrap().unwrap();
    assert!(certificates.is_empty());

    let credential = client.auth().credential().await.unwrap();
    assert_eq!(credential.access_token, "access-fresh");
}

#[tokio::test]
async fn test_resource_calls_without_a_session_fail_fast() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/certificates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.certificates().list().await.unwrap_err();
    assert!(matches!(err, Error::Unauthenticated));
    assert!(err.requires_login());
}

#[tokio::test]
async fn test_network_failure_surfaces_as_transport() {
    // Nothing listens on port 1.
    let client = ConsoleClient::builder()
        .base_url("http://127.0.0.1:1")
        .timeout(Duration::from_millis(500))
        .build()
        .unwrap();

    let err = client.auth().login("admin", "secret").await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_failed_login_leaves_the_store_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.auth().login("admin", "wrong").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(!client.auth().is_authenticated().await);
}

#[tokio::test]
async fn test_logout_clears_the_store_even_when_the_backend_rejects_it() {
    let server = MockServer::start().await;
    mount_login(&server, "access-1", "refresh-1").await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.auth().login("admin", "secret").await.unwrap();

    client.auth().logout().await.unwrap();
    assert!(!client.auth().is_authenticated().await);
    assert!(client.auth().username().await.is_none());
}

#[tokio::test]
async fn test_backend_errors_pass_through_with_status_and_body() {
    let server = MockServer::start().await;
    mount_login(&server, "access-1", "refresh-1").await;
    Mock::given(method("GET"))
        .and(path("/certificates/deadbeef"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.auth().login("admin", "secret").await.unwrap();

    let err = client.certificates().get("deadbeef").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_revoke_decodes_wrapped_and_plain_receipts() {
    let server = MockServer::start().await;
    mount_login(&server, "access-1", "refresh-1").await;

    // Straight from the backend: plain text.
    Mock::given(method("POST"))
        .and(path("/certificates/abc/revoke"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Certificate revoked successfully"))
        .mount(&server)
        .await;
    // Through the gateway: wrapped as JSON.
    Mock::given(method("POST"))
        .and(path("/certificates/def/revoke"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": "Certificate revoked successfully"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.auth().login("admin", "secret").await.unwrap();

    let plain = client.certificates().revoke("abc").await.unwrap();
    assert_eq!(plain.message, "Certificate revoked successfully");

    let wrapped = client.certificates().revoke("def").await.unwrap();
    assert_eq!(wrapped.message, "Certificate revoked successfully");
}

#[tokio::test]
async fn test_download_takes_the_backend_filename_or_derives_one() {
    let server = MockServer::start().await;
    mount_login(&server, "access-1", "refresh-1").await;

    Mock::given(method("GET"))
        .and(path("/certificates/abc/download/PKCS12"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0x30, 0x82, 0x01, 0x00])
                .insert_header("Content-Type", "application/octet-stream")
                .insert_header(
                    "Content-Disposition",
                    r#"form-data; name="attachment"; filename="certificate_abc.p12""#,
                ),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/certificates/xyz/download/JKS"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0xfe, 0xed, 0xfe, 0xed])
                .insert_header("Content-Type", "application/octet-stream"),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.auth().login("admin", "secret").await.unwrap();

    let named = client
        .certificates()
        .download("abc", BundleFormat::Pkcs12)
        .await
        .unwrap();
    assert_eq!(named.filename, "certificate_abc.p12");
    assert_eq!(named.content_type, "application/octet-stream");
    assert_eq!(named.bytes.as_ref(), &[0x30, 0x82, 0x01, 0x00]);

    let derived = client
        .certificates()
        .download("xyz", BundleFormat::Jks)
        .await
        .unwrap();
    assert_eq!(derived.filename, "certificate_xyz.jks");
    assert_eq!(derived.bytes.as_ref(), &[0xfe, 0xed, 0xfe, 0xed]);
}

#[tokio::test]
async fn test_create_validates_before_any_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/certificates"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = certdesk_client::types::CertificateRequest {
        common_name: "server.example.org".into(),
        organization: "Example".into(),
        organizational_unit: "Ops".into(),
        country: "US".into(),
        state: "CA".into(),
        locality: "SF".into(),
        kind: CertificateType::EndEntity,
        validity_years: 1,
        issuer_serial_number: None,
    };

    let err = client.certificates().create(&request).await.unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
    assert!(err.to_string().contains("issuerSerialNumber"));
}
