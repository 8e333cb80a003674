#![allow(clippy::unwrap_used)]
// Integration tests for `KnobClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use knob_api::{
    ClientConfig, Error, IdentityContext, KnobClient, ResourceId, ServiceQuery, UpdateMode,
    getid,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, KnobClient) {
    let server = MockServer::start().await;
    let identity = IdentityContext::new("demo", "alice", "default", "dom-p");
    let client = KnobClient::new(
        ClientConfig::new(identity)
            .endpoint(server.uri())
            .project_id("p-1"),
    )
    .unwrap();
    (server, client)
}

fn v1(suffix: &str) -> String {
    format!("/v1/{suffix}")
}

// ── Request shape ───────────────────────────────────────────────────

#[tokio::test]
async fn test_identity_headers_on_every_request() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(v1("gates")))
        .and(header("X-Project-Name", "demo"))
        .and(header("X-User-Name", "alice"))
        .and(header("X-User-Domain-Id", "default"))
        .and(header("X-Project-Domain-Id", "dom-p"))
        .and(header("X-Project-Id", "p-1"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"gates": []})))
        .expect(1)
        .mount(&server)
        .await;

    let gates = client.gates.list(&[]).await.unwrap();
    assert!(gates.is_empty());
}

#[tokio::test]
async fn test_delete_sends_octet_stream() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(v1("targets/t-1")))
        .and(header("Content-Type", "application/octet-stream"))
        .and(header("X-User-Name", "alice"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.targets.delete("t-1").await.unwrap();
}

#[tokio::test]
async fn test_list_params_pass_through() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(v1("targets")))
        .and(query_param("all_projects", "true"))
        .and(query_param("name", "web 1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"targets": []})))
        .expect(1)
        .mount(&server)
        .await;

    let params = [
        ("all_projects".to_owned(), "true".to_owned()),
        ("name".to_owned(), "web 1".to_owned()),
    ];
    client.targets.list(&params).await.unwrap();
}

// ── Envelopes ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_unwraps_in_response_order() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(v1("gates")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"gates": [{"id": "1"}, {"id": "2"}]})),
        )
        .mount(&server)
        .await;

    let gates = client.gates.list(&[]).await.unwrap();
    let ids: Vec<_> = gates.iter().map(|g| g.id().unwrap().as_str().to_owned()).collect();
    assert_eq!(ids, ["1", "2"]);
    assert!(gates.iter().all(knob_api::Resource::is_loaded));
}

#[tokio::test]
async fn test_list_drops_falsy_entries() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(v1("targets")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"targets": [{}, null, {"id": "3"}]})),
        )
        .mount(&server)
        .await;

    let targets = client.targets.list(&[]).await.unwrap();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].id(), Some(ResourceId::Id("3")));
}

#[tokio::test]
async fn test_list_unwraps_legacy_values_key() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(v1("delegates")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "delegates": {"values": [{"id": "d-1", "name": "ops"}]}
        })))
        .mount(&server)
        .await;

    let delegates = client.delegates.list(&[]).await.unwrap();
    assert_eq!(delegates.len(), 1);
    assert_eq!(delegates[0].info().name.as_deref(), Some("ops"));
}

#[tokio::test]
async fn test_list_missing_envelope_key() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(v1("associates")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;

    let result = client.associates.list(&[]).await;
    assert!(
        matches!(&result, Err(Error::MissingEnvelope { key }) if key == "associates"),
        "expected MissingEnvelope, got: {result:?}"
    );
}

#[tokio::test]
async fn test_get_accepts_singular_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(v1("associates/a-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "associate": {"id": "a-1", "name": "db", "status": "ACTIVE"}
        })))
        .mount(&server)
        .await;

    let associate = client.associates.get("a-1").await.unwrap();
    assert!(associate.is_loaded());
    assert_eq!(associate.info().status.as_deref(), Some("ACTIVE"));
}

#[tokio::test]
async fn test_invalid_json_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(v1("gates/g-1")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.gates.get("g-1").await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}

// ── Create / refresh / update ───────────────────────────────────────

#[tokio::test]
async fn test_create_then_refresh_merges_state() {
    let (server, client) = setup().await;

    let body = json!({"name": "g1", "net_id": "n1", "public_net_id": "p1"});
    Mock::given(method("POST"))
        .and(path(v1("gates")))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "g1-uuid", "name": "g1", "status": "BUILD"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(v1("gates/g1-uuid")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ACTIVE"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut gate = client.gates.create(&body).await.unwrap();
    assert!(!gate.is_loaded());
    assert_eq!(gate.id().unwrap().as_str(), "g1-uuid");

    gate.refresh().await.unwrap();
    assert!(gate.is_loaded());
    assert_eq!(gate.info().name.as_deref(), Some("g1"));
    assert_eq!(gate.info().status.as_deref(), Some("ACTIVE"));
}

#[tokio::test]
async fn test_failed_refresh_keeps_state_and_loaded_flag() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(v1("targets")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "target": {"id": "t-9", "name": "web", "status": "BUILD"}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(v1("targets/t-9")))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let mut target = client.targets.create(&json!({"name": "web"})).await.unwrap();
    let result = target.refresh().await;

    assert!(matches!(result, Err(Error::Server { status: 503, .. })));
    assert!(target.is_loaded());
    assert_eq!(target.info().status.as_deref(), Some("BUILD"));
}

#[tokio::test]
async fn test_create_raw_returns_unwrapped_mapping() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(v1("delegates")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "delegate": {"id": "d-2", "extra": [1, 2]}
        })))
        .mount(&server)
        .await;

    let raw = client.delegates.create_raw(&json!({"name": "x"})).await.unwrap();
    assert_eq!(raw, json!({"id": "d-2", "extra": [1, 2]}));
}

#[tokio::test]
async fn test_update_with_empty_body_returns_none() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path(v1("gates/g-1")))
        .and(body_json(json!({"name": "renamed"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let updated = client
        .gates
        .update("g-1", &json!({"name": "renamed"}), UpdateMode::Replace)
        .await
        .unwrap();
    assert!(updated.is_none());
}

#[tokio::test]
async fn test_merge_update_uses_patch() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path(v1("associates/a-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "associate": {"id": "a-1", "name": "db2"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let updated = client
        .associates
        .update("a-1", &json!({"name": "db2"}), UpdateMode::Merge)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.info().name.as_deref(), Some("db2"));
    assert!(!updated.is_loaded());
}

#[tokio::test]
async fn test_resource_update_and_delete_use_own_id() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(v1("targets")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "targets": [{"uuid": "t-uuid", "id": "7", "name": "web"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(v1("targets/t-uuid")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(v1("targets/t-uuid")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let target = client.targets.list(&[]).await.unwrap().remove(0);
    assert_eq!(getid(&target).unwrap(), ResourceId::Uuid("t-uuid"));
    target
        .update(&json!({"hostname": "10.0.0.9"}), UpdateMode::Replace)
        .await
        .unwrap();
    target.delete().await.unwrap();
}

// ── Nested sub-resources ────────────────────────────────────────────

#[tokio::test]
async fn test_gate_targets_sub_collection() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(v1("gates/g-1/targets")))
        .and(body_json(json!({"target_id": "t-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "target": {"id": "t-1", "name": "web"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(v1("gates/g-1/targets")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "targets": [{"id": "t-1", "name": "web"}, {}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(v1("gates/g-1/targets/t-1")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let added = client
        .gates
        .add_target("g-1", &json!({"target_id": "t-1"}))
        .await
        .unwrap();
    assert_eq!(added.info().name.as_deref(), Some("web"));

    let listed = client.gates.list_targets("g-1").await.unwrap();
    assert_eq!(listed.len(), 1);

    client.gates.remove_target("g-1", &added).await.unwrap();
}

#[tokio::test]
async fn test_gate_keys_sub_collection() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(v1("gates/g-1/keys")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": {"id": "k-1", "fingerprint": "SHA256:abc"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(v1("gates/g-1/keys")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "keys": [{"id": "k-1", "fingerprint": "SHA256:abc"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(v1("gates/g-1/keys/k-1")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "title": "Not Found", "description": "no such key"
        })))
        .mount(&server)
        .await;

    let key = client
        .gates
        .add_key("g-1", &json!({"public_key": "ssh-ed25519 AAAA"}))
        .await
        .unwrap();
    assert_eq!(key.extra["fingerprint"], json!("SHA256:abc"));

    let keys = client.gates.list_keys("g-1").await.unwrap();
    assert_eq!(keys, vec![key.clone()]);

    let err = client.gates.remove_key("g-1", &key).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Not Found: no such key");
}

#[tokio::test]
async fn test_nested_create_through_gate_object() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(v1("gates/g-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "gate": {"id": "g-1", "name": "edge"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(v1("gates/g-1/targets")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "t-5"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(v1("targets/t-5")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "t-5"})))
        .mount(&server)
        .await;

    let gate = client.gates.get("g-1").await.unwrap();
    let raw = gate.create(&json!({"hostname": "10.0.0.5"})).await.unwrap();
    assert_eq!(raw, json!({"id": "t-5"}));

    let target = client.targets.get("t-5").await.unwrap();
    let result = target.create(&json!({})).await;
    assert!(matches!(result, Err(Error::UnsupportedOperation(_))));
}

// ── Status mapping ──────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_missing_gate_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(v1("gates/missing-id")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "title": "Not Found",
            "description": "no such gate"
        })))
        .mount(&server)
        .await;

    let err = client.gates.delete("missing-id").await.unwrap_err();
    assert!(err.is_not_found());
    match err {
        Error::Client { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not Found: no such gate");
        }
        other => panic!("expected Client error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_401_is_auth_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(v1("gates")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "title": "Unauthorized"
        })))
        .mount(&server)
        .await;

    let err = client.gates.list(&[]).await.unwrap_err();
    assert!(err.is_auth());
    assert_eq!(err.message(), Some("Unauthorized"));
}

#[tokio::test]
async fn test_5xx_with_empty_body_uses_description() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(v1("gates")))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = client.gates.create(&json!({"name": "g"})).await.unwrap_err();
    assert_eq!(err.status_code(), Some(502));
    assert!(err.is_transient());
    assert_eq!(err.to_string(), "Raised for 5xx responses from the server.");
}

#[tokio::test]
async fn test_4xx_without_title_keeps_raw_body() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path(v1("delegates/d-1")))
        .respond_with(ResponseTemplate::new(422).set_body_string("name is required"))
        .mount(&server)
        .await;

    let err = client
        .delegates
        .update("d-1", &json!({}), UpdateMode::Replace)
        .await
        .unwrap_err();
    assert!(matches!(&err, Error::Client { status: 422, .. }));
    assert!(!err.is_not_found());
    assert_eq!(err.to_string(), "name is required");
}

// ── Services ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_services_query_parameters() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(v1("ssh_services")))
        .and(query_param("type", "bastion"))
        .and(query_param("all_projects", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "services": [
                {"tenant_id": "t", "name": "proxy-a", "project_id": "p-1", "status": "ACTIVE"},
                null
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let services = client
        .services
        .list(&ServiceQuery::default().service_type("bastion").all_projects(true))
        .await
        .unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].name.as_deref(), Some("proxy-a"));
}

#[tokio::test]
async fn test_services_bare_list_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(v1("ssh_services")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "proxy-b", "status": "DOWN"}
        ])))
        .mount(&server)
        .await;

    let services = client.services.list(&ServiceQuery::default()).await.unwrap();
    assert_eq!(services[0].status.as_deref(), Some("DOWN"));
}

// ── Identifier resolution ───────────────────────────────────────────

#[tokio::test]
async fn test_uuid_identifiers_round_trip_through_paths() {
    let (server, client) = setup().await;
    let id = uuid::Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path(v1(&format!("gates/{id}"))))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "gate": {"uuid": id, "name": "edge"}
        })))
        .mount(&server)
        .await;

    let gate = client.gates.get(&id).await.unwrap();
    assert_eq!(gate.id(), Some(ResourceId::Uuid(&id)));
}

/// Any request reaching the server fails the test on drop.
async fn refuse_all(server: &MockServer) {
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_empty_or_relative_identifier_never_reaches_server() {
    let (server, client) = setup().await;
    refuse_all(&server).await;

    for bad in ["", ".", ".."] {
        let err = client.gates.delete(bad).await.unwrap_err();
        assert!(
            matches!(err, Error::InvalidIdentifier { ref id, .. } if id == bad),
            "{bad:?}: {err:?}"
        );
    }
    assert!(matches!(
        client.targets.delete("..").await,
        Err(Error::InvalidIdentifier { .. })
    ));
    assert!(matches!(
        client.gates.remove_target("g1", "").await,
        Err(Error::InvalidIdentifier { .. })
    ));
    assert!(matches!(
        client.gates.list_keys("").await,
        Err(Error::InvalidIdentifier { .. })
    ));
}

#[tokio::test]
async fn test_identifier_with_slash_is_one_segment() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(v1("gates/g1/targets/t1")))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(v1("gates/g1%2Ftargets%2Ft1")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.gates.delete("g1/targets/t1").await.unwrap();
}

#[tokio::test]
async fn test_created_object_without_identifier_cannot_delete_collection() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(v1("gates")))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"status": "BUILD"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let gate = client.gates.create(&json!({"name": "g1"})).await.unwrap();
    assert_eq!(gate.id(), None);
    assert!(matches!(
        gate.delete().await,
        Err(Error::InvalidIdentifier { .. })
    ));
}
