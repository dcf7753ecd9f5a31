//! Feature service REST client
//!
//! Thin client over the four service endpoints the exporter consumes: the
//! ids-only query, per-record attachment listing, single-record fetch, and
//! the raw attachment binary. The client is immutable once constructed; the
//! optional request token is fixed at construction time and appended to every
//! request, so no shared mutable state exists during the concurrent fan-out.

use crate::error::{Error, Result};
use crate::types::{AttachmentInfo, RecordId};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// Client for one feature layer, holding the HTTP client and optional token
#[derive(Clone, Debug)]
pub struct FeatureServiceClient {
    http: reqwest::Client,
    service_url: Url,
    token: Option<String>,
    log_responses: bool,
}

/// Error envelope feature services embed in HTTP 200 responses
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    code: Option<i64>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectIdsResponse {
    /// Null (rather than an empty array) when the layer has no records
    #[serde(default, rename = "objectIds")]
    object_ids: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
struct AttachmentsResponse {
    #[serde(default, rename = "attachmentInfos")]
    attachment_infos: Vec<AttachmentInfo>,
}

/// Record-fetch response; some services nest the attribute map under a
/// `feature` object, others return it at the top level
#[derive(Debug, Deserialize)]
struct FeatureResponse {
    #[serde(default)]
    attributes: Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    feature: Option<FeatureBody>,
}

#[derive(Debug, Deserialize)]
struct FeatureBody {
    #[serde(default)]
    attributes: Option<serde_json::Map<String, Value>>,
}

impl FeatureServiceClient {
    /// Create a client for the given layer URL
    ///
    /// `token` is the session token obtained from
    /// [`auth::generate_token`](crate::auth::generate_token), or `None` for
    /// anonymous access.
    pub fn new(
        http: reqwest::Client,
        service_url: &str,
        token: Option<String>,
        log_responses: bool,
    ) -> Result<Self> {
        let mut service_url = Url::parse(service_url)?;
        // Normalize a trailing slash so path joins stay predictable
        if let Ok(mut segments) = service_url.path_segments_mut() {
            segments.pop_if_empty();
        }
        if service_url.cannot_be_a_base() {
            return Err(Error::Config {
                message: format!("service_url is not a base URL: {}", service_url),
                key: Some("service_url".to_string()),
            });
        }
        Ok(Self {
            http,
            service_url,
            token,
            log_responses,
        })
    }

    /// The normalized layer URL this client talks to
    pub fn service_url(&self) -> &Url {
        &self.service_url
    }

    /// Whether this client holds a token
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Build a URL under the layer URL from extra path segments
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.service_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    /// Append the token query parameter iff one is held
    fn append_token(&self, url: &mut Url) {
        if let Some(token) = &self.token {
            url.query_pairs_mut().append_pair("token", token);
        }
    }

    /// GET a JSON endpoint, surfacing both non-2xx statuses and the
    /// HTTP-200 `error` envelope as [`Error::Service`]
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        mut url: Url,
        operation: &str,
    ) -> Result<T> {
        self.append_token(&mut url);
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::service(operation, format!("HTTP {}", status)));
        }

        let body: Value = response.json().await?;
        if self.log_responses {
            tracing::debug!(operation, response = %body, "service response");
        }

        if let Some(error) = body.get("error") {
            let detail: ServiceErrorBody =
                serde_json::from_value(error.clone()).unwrap_or(ServiceErrorBody {
                    code: None,
                    message: None,
                });
            return Err(Error::service(
                operation,
                format!(
                    "code {} - {}",
                    detail.code.unwrap_or(-1),
                    detail.message.unwrap_or_else(|| "unknown error".to_string())
                ),
            ));
        }

        Ok(serde_json::from_value(body)?)
    }

    /// Query all record ids in the layer (ids-only query, no filtering)
    ///
    /// A `null` or absent `objectIds` member means the layer has no records.
    pub async fn query_object_ids(&self) -> Result<Vec<RecordId>> {
        let mut url = self.endpoint(&["query"]);
        url.query_pairs_mut()
            .append_pair("where", "1=1")
            .append_pair("returnIdsOnly", "true")
            .append_pair("f", "json");

        let response: ObjectIdsResponse = self.get_json(url, "query object ids").await?;
        Ok(response
            .object_ids
            .unwrap_or_default()
            .into_iter()
            .map(RecordId::from)
            .collect())
    }

    /// List the attachments of one record
    pub async fn get_attachments(&self, id: RecordId) -> Result<Vec<AttachmentInfo>> {
        let mut url = self.endpoint(&[&id.to_string(), "attachments"]);
        url.query_pairs_mut().append_pair("f", "json");

        let response: AttachmentsResponse = self.get_json(url, "list attachments").await?;
        Ok(response.attachment_infos)
    }

    /// Fetch one record's attribute map
    ///
    /// A record without an attribute map yields an empty map, which in turn
    /// yields a null naming context downstream.
    pub async fn get_feature_attributes(
        &self,
        id: RecordId,
    ) -> Result<serde_json::Map<String, Value>> {
        let mut url = self.endpoint(&[&id.to_string()]);
        url.query_pairs_mut().append_pair("f", "json");

        let response: FeatureResponse = self.get_json(url, "fetch record").await?;
        Ok(response
            .attributes
            .or_else(|| response.feature.and_then(|f| f.attributes))
            .unwrap_or_default())
    }

    /// The URL an attachment's bytes are served from
    ///
    /// `{service}/{record}/attachments/{attachment}`, with the token appended
    /// exactly once as a query parameter when one is held.
    pub fn attachment_url(&self, id: RecordId, attachment_id: i64) -> Url {
        let mut url = self.endpoint(&[
            &id.to_string(),
            "attachments",
            &attachment_id.to_string(),
        ]);
        self.append_token(&mut url);
        url
    }

    /// Download one attachment's bytes in full
    ///
    /// No streaming or partial-content handling; the whole body is buffered.
    pub async fn download_attachment(
        &self,
        id: RecordId,
        attachment_id: i64,
    ) -> Result<Vec<u8>> {
        let url = self.attachment_url(id, attachment_id);
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::service(
                "download attachment",
                format!("HTTP {}", status),
            ));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Render an attribute value as a naming context string
///
/// Strings pass through, numbers and booleans are formatted, and null or
/// structured values yield `None` (falling back to the default prefix).
pub(crate) fn attribute_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
