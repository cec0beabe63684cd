//! Shared Graph API plumbing for Instagram and Facebook.

use serde::Deserialize;
use subatime_fetch::FetchError;
use tracing::debug;

/// Graph API base URL.
pub(crate) const GRAPH_API_BASE: &str = "https://graph.facebook.com";

/// Graph API version used for both Instagram and Facebook fields.
const GRAPH_API_VERSION: &str = "v12.0";

/// Error envelope returned by the Graph API.
#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    kind: String,
}

/// Fetches a single numeric field from a Graph API object.
///
/// `OAuthException` errors are classified as authentication failures,
/// HTTP 404 as not-found, and everything else surfaces the provider's
/// message as an upstream error.
pub(crate) async fn fetch_count_field(
    http: &reqwest::Client,
    base_url: &str,
    object_id: &str,
    field: &str,
    access_token: &str,
) -> Result<u64, FetchError> {
    let request_url = format!(
        "{base_url}/{GRAPH_API_VERSION}/{object_id}?fields={field}&access_token={access_token}"
    );
    debug!(object_id, field, "Fetching Graph API field");

    let response = http.get(&request_url).send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        if let Ok(envelope) = serde_json::from_str::<GraphErrorEnvelope>(&body) {
            let error = envelope.error;
            return Err(if error.kind == "OAuthException" {
                FetchError::Auth(error.message)
            } else if status == reqwest::StatusCode::NOT_FOUND {
                FetchError::NotFound(error.message)
            } else {
                FetchError::Upstream(error.message)
            });
        }
        return Err(FetchError::Upstream(format!("HTTP {status}")));
    }

    let value: serde_json::Value = serde_json::from_str(&body)?;
    value
        .get(field)
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| FetchError::Upstream(format!("missing field '{field}' in response")))
}
