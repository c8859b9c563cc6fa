#![allow(clippy::unwrap_used)]
// Integration tests for `BcfClient` and the hash protocol, using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bcfsync_api::model::{Attachment, Network, Topology};
use bcfsync_api::{BcfClient, EndpointConfig, Error, HASH_MATCH_HEADER, HashToken, Scheme, SessionState};

// ── Helpers ─────────────────────────────────────────────────────────

fn endpoint(server: &MockServer) -> EndpointConfig {
    let addr = server.address();
    let mut cfg = EndpointConfig::new(
        addr.ip().to_string(),
        "admin",
        SecretString::from("secret".to_owned()),
    );
    cfg.port = addr.port();
    cfg.scheme = Scheme::Http;
    cfg.zone_id = "1".into();
    cfg
}

async fn setup() -> (MockServer, BcfClient) {
    let server = MockServer::start().await;
    let client = BcfClient::new(endpoint(&server)).unwrap();
    (server, client)
}

fn api_path(suffix: &str) -> String {
    format!("/networkService/v1.1/{suffix}")
}

fn network() -> Network {
    Network::new("net-1", "web", "tenant-1", "acme", Some(100))
}

fn attachment() -> Attachment {
    Attachment::new("port-1", "acme", Some(100), "02:00:00:00:00:01", "kvm-1")
}

// ── Request construction ────────────────────────────────────────────

#[tokio::test]
async fn test_request_carries_protocol_headers() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(api_path("tenants/tenant-1/networks")))
        .and(header("Instance-ID", "CLOUDSTACK-1"))
        .and(header("Authorization", "Basic YWRtaW46c2VjcmV0"))
        .and(header("Content-Type", "application/json"))
        .and(header("Accept", "application/json"))
        .and(body_partial_json(json!({ "network": { "id": "net-1", "vlan": 100 } })))
        .respond_with(ResponseTemplate::new(200).insert_header(HASH_MATCH_HEADER, "h1"))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = SessionState::default();
    let hash = client.create_network(&mut session, &network()).await.unwrap();

    assert_eq!(hash, HashToken::Value("h1".into()));
    assert_eq!(session.hash, HashToken::Value("h1".into()));
}

#[tokio::test]
async fn test_held_token_is_sent_and_replaced() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path(api_path(
            "tenants/tenant-1/networks/net-1/ports/port-1/attachment",
        )))
        .and(header(HASH_MATCH_HEADER, "h0"))
        .respond_with(ResponseTemplate::new(200).insert_header(HASH_MATCH_HEADER, "h1"))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = SessionState::with_hash("h0");
    let hash = client
        .modify_attachment(&mut session, "tenant-1", "net-1", &attachment())
        .await
        .unwrap();

    assert_eq!(hash, HashToken::Value("h1".into()));
}

#[tokio::test]
async fn test_no_hash_header_without_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut session = SessionState::default();
    client.create_network(&mut session, &network()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get(HASH_MATCH_HEADER).is_none());
}

#[tokio::test]
async fn test_missing_credentials_fail_without_request() {
    let server = MockServer::start().await;
    let mut cfg = endpoint(&server);
    cfg.password = SecretString::from(String::new());
    let client = BcfClient::new(cfg).unwrap();

    let mut session = SessionState::default();
    let result = client.create_network(&mut session, &network()).await;

    assert!(
        matches!(result, Err(Error::ControllerApi { status: None, .. })),
        "expected ControllerApi error, got: {result:?}"
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── 200 ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_success_without_hash_header_clears_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(api_path("tenants/tenant-1/routers")))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut session = SessionState::with_hash("old");
    let router = bcfsync_api::model::Router::new("tenant-1");
    let hash = client
        .create_router(&mut session, "tenant-1", &router)
        .await
        .unwrap();

    assert_eq!(hash, HashToken::Empty);
    assert_eq!(session.hash.as_str(), "");
}

// ── 303 ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_see_other_demotes_on_every_verb() {
    let (server, client) = setup().await;

    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(303).insert_header("Location", "/elsewhere"))
        .mount(&server)
        .await;

    let mut session = SessionState {
        hash: HashToken::Value("h1".into()),
        is_master: true,
    };
    let hash = client.create_network(&mut session, &network()).await.unwrap();
    assert_eq!(hash, HashToken::Ignore);
    assert!(!session.is_master);

    session.is_master = true;
    let hash = client
        .modify_attachment(&mut session, "tenant-1", "net-1", &attachment())
        .await
        .unwrap();
    assert_eq!(hash, HashToken::Ignore);
    assert!(!session.is_master);

    session.is_master = true;
    let hash = client
        .delete_network(&mut session, "tenant-1", "net-1")
        .await
        .unwrap();
    assert_eq!(hash, HashToken::Ignore);
    assert!(!session.is_master);

    session.is_master = true;
    let status = client.get_control_cluster_status(&mut session).await.unwrap();
    assert!(!status.topology_sync_requested);
    assert!(!session.is_master);
    assert_eq!(session.hash, HashToken::Ignore);
}

#[tokio::test]
async fn test_ignore_sentinel_is_sent_after_demotion() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(header(HASH_MATCH_HEADER, "HASH_IGNORE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = SessionState {
        hash: HashToken::Ignore,
        is_master: false,
    };
    client.create_network(&mut session, &network()).await.unwrap();
}

// ── 409 ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_conflict_on_get_is_not_an_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("health")))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let mut session = SessionState {
        hash: HashToken::Value("h1".into()),
        is_master: true,
    };
    let status = client.get_control_cluster_status(&mut session).await.unwrap();

    assert!(status.topology_sync_requested);
    assert!(session.is_master);
    // A stale read leaves the held token alone.
    assert_eq!(session.hash, HashToken::Value("h1".into()));
}

#[tokio::test]
async fn test_conflict_on_write_requires_sync() {
    let (server, client) = setup().await;

    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let mut session = SessionState::default();

    let post = client.create_network(&mut session, &network()).await;
    let put = client
        .modify_attachment(&mut session, "tenant-1", "net-1", &attachment())
        .await;
    let delete = client
        .delete_attachment(&mut session, "tenant-1", "net-1", "port-1")
        .await;

    for result in [post, put, delete] {
        let err = result.unwrap_err();
        assert!(err.is_topology_sync_required(), "expected sync flag, got: {err:?}");
        assert_eq!(err.status(), Some(409));
    }
}

// ── 404 ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_not_found_on_delete_is_success() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(api_path("tenants/tenant-1/floatingips/10-0-0-5")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut session = SessionState::default();
    let hash = client
        .delete_floating_ip(&mut session, "tenant-1", "10-0-0-5")
        .await
        .unwrap();

    assert_eq!(hash, HashToken::Empty);
}

#[tokio::test]
async fn test_not_found_on_create_is_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such tenant"))
        .mount(&server)
        .await;

    let mut session = SessionState::default();
    let result = client.create_network(&mut session, &network()).await;

    match result {
        Err(Error::ControllerApi {
            ref message,
            status: Some(404),
            topology_sync_required: false,
        }) => assert_eq!(message, "no such tenant"),
        other => panic!("expected ControllerApi 404, got: {other:?}"),
    }
}

// ── 400 / other ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_bad_request_is_malformed() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad vlan"))
        .mount(&server)
        .await;

    let mut session = SessionState::default();
    let err = client
        .create_network(&mut session, &network())
        .await
        .unwrap_err();

    assert!(err.is_malformed_request());
    assert!(!err.is_topology_sync_required());
}

#[tokio::test]
async fn test_server_error_carries_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(api_path("topology")))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal failure"))
        .mount(&server)
        .await;

    let mut session = SessionState::default();
    let err = client
        .sync_topology(&mut session, &Topology::default())
        .await
        .unwrap_err();

    match err {
        Error::ControllerApi {
            message, status, ..
        } => {
            assert_eq!(message, "internal failure");
            assert_eq!(status, Some(500));
        }
        other => panic!("expected ControllerApi error, got: {other:?}"),
    }
}

// ── Cluster ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_first_healthy_read_promotes_to_master() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("health")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(HASH_MATCH_HEADER, "h7")
                .set_body_json(json!({ "status": true })),
        )
        .mount(&server)
        .await;

    let mut session = SessionState::default();
    let status = client.get_control_cluster_status(&mut session).await.unwrap();
    assert!(status.status);
    assert!(status.topology_sync_requested);
    assert!(session.is_master);
    assert_eq!(session.hash, HashToken::Value("h7".into()));

    // Already master: a second read requests nothing.
    let status = client.get_control_cluster_status(&mut session).await.unwrap();
    assert!(!status.topology_sync_requested);
    assert!(session.is_master);
}

#[tokio::test]
async fn test_healthy_read_without_hash_does_not_promote() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("health")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": true })))
        .mount(&server)
        .await;

    let mut session = SessionState::default();
    let status = client.get_control_cluster_status(&mut session).await.unwrap();
    assert!(status.status);
    assert!(!status.topology_sync_requested);
    assert!(!session.is_master);
    assert_eq!(session.hash, HashToken::Empty);
}

#[tokio::test]
async fn test_truncated_success_body_is_a_transport_error() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Promises more body than it sends, then hangs up.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        let _ = socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 64\r\n\r\n[\"floating")
            .await;
        let _ = socket.shutdown().await;
    });

    let mut cfg = EndpointConfig::new(
        addr.ip().to_string(),
        "admin",
        SecretString::from("secret".to_owned()),
    );
    cfg.port = addr.port();
    cfg.scheme = Scheme::Http;
    let client = BcfClient::new(cfg).unwrap();

    let mut session = SessionState::default();
    let err = client.get_capabilities(&mut session).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "expected transport error, got: {err:?}");
}

#[tokio::test]
async fn test_capabilities_and_topology_push() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("capabilities")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["floatingip", "l3"])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(api_path("topology")))
        .and(body_partial_json(json!({
            "networks": [{ "id": "net-1", "tenant_id": "tenant-1" }],
            "routers": []
        })))
        .respond_with(ResponseTemplate::new(200).insert_header(HASH_MATCH_HEADER, "h9"))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = SessionState::default();
    let caps = client.get_capabilities(&mut session).await.unwrap();
    assert!(caps.supports_nat());

    let topology = Topology {
        networks: vec![network()],
        routers: Vec::new(),
    };
    let hash = client.sync_topology(&mut session, &topology).await.unwrap();
    assert_eq!(hash.value(), Some("h9"));
}
