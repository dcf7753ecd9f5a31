use super::*;
use crate::config::PortalConfig;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod export;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Layer path mounted on the mock server
const LAYER: &str = "/FeatureServer/0";

fn layer_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), LAYER)
}

/// Config pointed at the mock server, writing into a temp dir
fn test_config(server: &MockServer, output: &TempDir) -> Config {
    Config {
        service_url: layer_url(server),
        output_dir: output.path().to_path_buf(),
        ..Config::default()
    }
}

/// Mount the ids-only query; `expect(1)` enforces a single enumeration
async fn mount_object_ids(server: &MockServer, ids: &[i64]) {
    Mock::given(method("GET"))
        .and(path(format!("{LAYER}/query")))
        .and(query_param("returnIdsOnly", "true"))
        .and(query_param("where", "1=1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objectIdFieldName": "OBJECTID",
            "objectIds": ids,
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Mount a record's attachment listing; `expect(1)` enforces exactly one
/// lister invocation per enumerated id
async fn mount_attachments(server: &MockServer, id: i64, infos: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("{LAYER}/{id}/attachments")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "attachmentInfos": infos })),
        )
        .expect(1)
        .mount(server)
        .await;
}

/// Mount a record fetch returning the given attribute map
async fn mount_feature(server: &MockServer, id: i64, attributes: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("{LAYER}/{id}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "feature": { "attributes": attributes } })),
        )
        .mount(server)
        .await;
}

/// Mount an attachment's binary endpoint
async fn mount_attachment_bytes(server: &MockServer, id: i64, attachment_id: i64, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("{LAYER}/{id}/attachments/{attachment_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}
