//! Back-office REST API client.
//!
//! Provides authenticated HTTP communication with the back-office API and
//! decodes every response through the `{ success, message, data, statusCode }`
//! envelope so callers only ever see well-typed data or an [`ApiError`].

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::config::ClientConfig;
use crate::error::{ApiError, GENERIC_FAILURE};

/// Default timeout for API requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout used specifically for the lightweight connectivity test.
const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_SEGMENT_LEN: usize = 128;

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise the API base URL:
/// - ensure a scheme is present (https, or http for localhost)
/// - strip trailing slashes
///
/// Any path prefix (e.g. `/api`) is kept; resource paths are appended to it.
pub fn normalize_api_url(url: &str) -> String {
    let mut url = url.trim().to_string();
    if url.is_empty() {
        return url;
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }

    url
}

/// Validate a record id before it is interpolated into a request path.
pub(crate) fn path_segment(id: &str) -> Result<&str, ApiError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidUrl("missing record id".to_string()));
    }
    if trimmed.len() > MAX_SEGMENT_LEN {
        return Err(ApiError::InvalidUrl("record id is too long".to_string()));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::InvalidUrl(format!(
            "record id contains unsupported characters: {trimmed}"
        )));
    }
    Ok(trimmed)
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// Wire shape shared by every endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub success: Option<bool>,
    pub message: Option<String>,
    pub data: Option<T>,
    pub status_code: Option<u16>,
}

fn looks_like_envelope(value: &Value) -> bool {
    value
        .as_object()
        .map(|obj| obj.contains_key("success") || obj.contains_key("data"))
        .unwrap_or(false)
}

/// Wire spellings folded onto the canonical camelCase key, as
/// `(variant, canonical)`. The canonical key wins when both are present.
const KEY_FOLDS: &[(&str, &str)] = &[
    ("_id", "id"),
    ("restaurant", "restaurantId"),
    ("branch", "branchId"),
    ("branchName", "branchId"),
    ("inventoryItem", "inventoryItemId"),
    ("itemId", "inventoryItemId"),
    ("accessToken", "token"),
];

/// The id of a reference that may arrive as a bare string or populated.
fn reference_id(value: &Value) -> Option<Value> {
    match value {
        Value::String(_) => Some(value.clone()),
        Value::Object(obj) => obj
            .get("id")
            .or_else(|| obj.get("_id"))
            .filter(|id| id.is_string())
            .cloned(),
        _ => None,
    }
}

/// Rewrite a payload in place so every object carries its canonical keys.
///
/// Mongo-style `_id`, populated references (`"branch": {"_id": ..}`) and
/// legacy spellings such as `branchName` are copied onto `id` and the
/// `*Id` fields. When both spellings arrive the canonical one is kept as
/// sent, an explicit `null` included. Variant keys stay in place for the
/// payloads that read them under their own name.
pub fn canonicalize_keys(value: &mut Value) {
    match value {
        Value::Array(items) => items.iter_mut().for_each(canonicalize_keys),
        Value::Object(obj) => {
            obj.values_mut().for_each(canonicalize_keys);
            for (variant, canonical) in KEY_FOLDS {
                if obj.contains_key(*canonical) {
                    continue;
                }
                if let Some(id) = obj.get(*variant).and_then(reference_id) {
                    obj.insert((*canonical).to_string(), id);
                }
            }
            for (key, field) in obj.iter_mut() {
                if key.ends_with("Id") && field.is_object() {
                    if let Some(id) = reference_id(field) {
                        *field = id;
                    }
                }
            }
        }
        _ => {}
    }
}

/// Decode a payload after folding its keys with [`canonicalize_keys`].
pub fn from_wire<T: DeserializeOwned>(mut value: Value) -> Result<T, ApiError> {
    canonicalize_keys(&mut value);
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Decode and validate a response body.
///
/// `success: false` becomes [`ApiError::Rejected`]. A missing or null `data`
/// decodes to `None`, which callers treat as an empty result. Bodies that are
/// not wrapped in an envelope are decoded as the payload itself.
pub fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<Option<T>, ApiError> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;

    if !looks_like_envelope(&value) {
        return from_wire(value).map(Some);
    }

    let envelope: Envelope<Value> =
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))?;

    if envelope.success == Some(false) {
        return Err(ApiError::Rejected {
            message: envelope
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            status_code: envelope.status_code,
        });
    }

    match envelope.data {
        None | Some(Value::Null) => Ok(None),
        Some(data) => from_wire(data).map(Some),
    }
}

/// Pull a human-readable message out of an error body, if there is one.
fn error_body_message(body: &str) -> Option<String> {
    let json = serde_json::from_str::<Value>(body).ok()?;
    json.get("message")
        .or_else(|| json.get("error"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn transport_error(url: &str, err: &reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout {
            url: url.to_string(),
        };
    }
    if err.is_builder() {
        return ApiError::InvalidUrl(url.to_string());
    }
    ApiError::Network {
        url: url.to_string(),
    }
}

/// A body that fails mid-read: connection loss stays a connectivity error,
/// anything else means the payload itself is unusable.
fn body_error(url: &str, err: &reqwest::Error) -> ApiError {
    if err.is_timeout() || err.is_request() || err.is_connect() {
        transport_error(url, err)
    } else {
        ApiError::Decode(err.to_string())
    }
}

fn status_error(status: StatusCode, path: &str, body: &str) -> ApiError {
    let message = error_body_message(body);
    match status.as_u16() {
        401 | 403 => ApiError::Unauthorized { message },
        404 => ApiError::NotFound {
            what: path.to_string(),
            message,
        },
        s => ApiError::Server { status: s, message },
    }
}

// ---------------------------------------------------------------------------
// Connectivity test
// ---------------------------------------------------------------------------

/// Result of a connectivity test.
#[derive(Debug, Serialize)]
pub struct ConnectivityResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Test connectivity to the back-office API with a lightweight health-check.
pub async fn test_connectivity(api_url: &str) -> ConnectivityResult {
    let url = normalize_api_url(api_url);
    let health_url = format!("{url}/health");

    let client = match Client::builder().timeout(CONNECTIVITY_TIMEOUT).build() {
        Ok(c) => c,
        Err(e) => {
            return ConnectivityResult {
                success: false,
                latency_ms: None,
                error: Some(format!("Failed to create HTTP client: {e}")),
            };
        }
    };

    let start = Instant::now();
    let resp = match client.get(&health_url).send().await {
        Ok(r) => r,
        Err(e) => {
            return ConnectivityResult {
                success: false,
                latency_ms: None,
                error: Some(transport_error(&url, &e).to_string()),
            };
        }
    };

    let latency = start.elapsed().as_millis() as u64;
    let status = resp.status();
    if status.is_success() {
        info!(latency_ms = latency, "connectivity test passed");
        ConnectivityResult {
            success: true,
            latency_ms: Some(latency),
            error: None,
        }
    } else {
        ConnectivityResult {
            success: false,
            latency_ms: Some(latency),
            error: Some(status_error(status, "/health", "").to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

struct ClientInner {
    http: Client,
    base_url: String,
    token: RwLock<Option<Zeroizing<String>>>,
}

/// Cheap-clone handle to the back-office API. Clones share the auth token.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("authenticated", &self.has_token())
            .finish()
    }
}

impl ApiClient {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = normalize_api_url(api_url);
        if base_url.is_empty() {
            return Err(ApiError::InvalidUrl("empty API URL".to_string()));
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                token: RwLock::new(None),
            }),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn set_token(&self, token: Zeroizing<String>) {
        let mut slot = self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(token);
    }

    /// Drop the in-memory token; `Zeroizing` wipes it on drop.
    pub fn clear_token(&self) {
        let mut slot = self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    pub fn has_token(&self) -> bool {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn bearer(&self) -> Option<Zeroizing<String>> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// GET a collection. A missing `data` field is an empty list.
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        Ok(self
            .request::<Vec<T>>(Method::GET, path, query, None)
            .await?
            .unwrap_or_default())
    }

    pub async fn get_one<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, ApiError> {
        self.request(Method::GET, path, query, None).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, ApiError> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.request(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, ApiError> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.request::<Value>(Method::DELETE, path, &[], None)
            .await
            .map(|_| ())
    }

    /// Perform an authenticated request and decode the envelope.
    ///
    /// `path` includes the leading slash, e.g. `/inventory/items`.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Option<T>, ApiError> {
        let base = &self.inner.base_url;
        let full_url = format!("{base}{path}");

        let mut req = self
            .inner
            .http
            .request(method.clone(), &full_url)
            .header("Accept", "application/json");
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(token) = self.bearer() {
            req = req.bearer_auth(token.as_str());
        }
        if let Some(b) = body {
            req = req.json(&b);
        }

        debug!(method = %method, path = %path, "api request");
        let resp = req.send().await.map_err(|e| {
            let err = transport_error(base, &e);
            warn!(method = %method, path = %path, error = %err, "api request failed");
            err
        })?;
        let status = resp.status();
        let body_text = resp.text().await.map_err(|e| {
            let err = body_error(base, &e);
            warn!(
                method = %method,
                path = %path,
                status = status.as_u16(),
                error = %err,
                "api response body unreadable"
            );
            err
        })?;

        if !status.is_success() {
            let err = status_error(status, path, &body_text);
            warn!(
                method = %method,
                path = %path,
                status = status.as_u16(),
                error = %err,
                "api request returned an error status"
            );
            return Err(err);
        }

        decode_envelope(&body_text)
    }
}
