// Hand-crafted async HTTP client for the Akvio platform API (v3).
//
// Base path: /v3/
// Auth: X-API-KEY header

use akvio_core::Device;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::types::{DeviceType, Page};

// ── Error response shape from the platform ───────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the Akvio platform API.
///
/// Uses API-key authentication and communicates via JSON REST endpoints
/// under `/v3/`.
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: Url,
    /// Designated master device type, resolved once per client.
    master_type: OnceCell<DeviceType>,
}

impl PlatformClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL and API key.
    ///
    /// Injects `X-API-KEY` as a default header on every request.
    pub fn from_api_key(base_url: &str, api_key: &secrecy::SecretString) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key_value =
            HeaderValue::from_str(api_key.expose_secret()).map_err(|e| Error::Authentication {
                message: format!("invalid API key header value: {e}"),
            })?;
        key_value.set_sensitive(true);
        headers.insert("X-API-KEY", key_value);

        let http = reqwest::Client::builder().default_headers(headers).build()?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self {
            http,
            base_url,
            master_type: OnceCell::new(),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            master_type: OnceCell::new(),
        })
    }

    /// Build the base URL with the `/v3/` suffix.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;

        // Strip trailing slash for uniform handling
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/v3") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/v3/"));
        }

        Ok(url)
    }

    /// Stable identity of the platform this client talks to. Changing it
    /// means every cached selection belongs to a different world.
    pub fn identity(&self) -> &str {
        self.base_url.as_str()
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"devices"`) onto the base URL.
    fn url(&self, path: &str) -> Url {
        // base_url always ends with `/v3/`, so joining `devices/…` works.
        self.base_url
            .join(path)
            .expect("path should be valid relative URL")
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path);
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::InvalidApiKey;
        }

        let raw = resp.text().await.unwrap_or_default();

        if let Ok(err) = serde_json::from_str::<ErrorResponse>(&raw) {
            Error::Api {
                status: status.as_u16(),
                message: err
                    .message
                    .or(err.error)
                    .unwrap_or_else(|| status.to_string()),
            }
        } else {
            Error::Api {
                status: status.as_u16(),
                message: if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                },
            }
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Device types ─────────────────────────────────────────────────

    /// The designated master device type, fetched once and cached for
    /// the lifetime of the client.
    pub async fn master_device_type(&self) -> Result<&DeviceType, Error> {
        self.master_type
            .get_or_try_init(|| self.get("device-types/master"))
            .await
    }

    // ── Devices ──────────────────────────────────────────────────────

    /// List devices, optionally narrowed by search text, a JSON filter
    /// expression, and a parent (master) device id. Listings always
    /// request `fields=id,name,domain` — nothing else is needed to
    /// drive a selection.
    pub async fn list_devices(
        &self,
        search: Option<&str>,
        filter: Option<&str>,
        parent_id: Option<&str>,
    ) -> Result<Vec<Device>, Error> {
        let mut params: Vec<(&str, String)> = vec![("fields", "id,name,domain".to_owned())];
        if let Some(search) = search {
            params.push(("search", search.to_owned()));
        }
        if let Some(filter) = filter {
            params.push(("filter", filter.to_owned()));
        }
        if let Some(parent_id) = parent_id {
            params.push(("parentId", parent_id.to_owned()));
        }

        let page: Page<Device> = self.get_with_params("devices", &params).await?;
        Ok(page.data)
    }

    // ── Device data ──────────────────────────────────────────────────

    /// Topics the device has published data on.
    pub async fn list_topics(&self, device_id: &str) -> Result<Vec<String>, Error> {
        self.get(&format!("devices/{device_id}/query/topics")).await
    }

    /// Data keys observed on a device's topic.
    pub async fn list_data_keys(&self, device_id: &str, topic: &str) -> Result<Vec<String>, Error> {
        self.get_with_params(
            &format!("devices/{device_id}/query/keys"),
            &[("topic", topic.to_owned())],
        )
        .await
    }
}
