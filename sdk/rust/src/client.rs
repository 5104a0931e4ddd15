use std::path::Path;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::envelope::ApiResponse;
use crate::error::ApiError;
use crate::resource::{format_with_root, DEFAULT_API_ROOT};

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Origin the API root is served from, e.g. the dev proxy. A path on it
    /// (`http://host/kennel/`) is kept in front of the API root.
    pub base_url: String,
    /// Path prefix every resource lives under.
    pub api_root: String,
    /// Optional whole-request deadline. `None` leaves timing to the caller.
    pub timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            api_root: DEFAULT_API_ROOT.to_string(),
            timeout: None,
        }
    }
}

/// A file to send through [`ApiClient::upload`].
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
            mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    ///
    /// Only common image, PDF and plain-text extensions are recognized.
    /// Anything else is sent without a content type; use
    /// [`UploadFile::with_mime`] to set one explicitly.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        Ok(Self {
            mime: guess_mime(path).map(str::to_string),
            file_name,
            bytes,
        })
    }
}

fn guess_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => return None,
    };
    Some(mime)
}

/// The backend API client.
///
/// Every method issues exactly one request and resolves to an
/// [`ApiResponse`]. Transport and HTTP failures are folded into the envelope;
/// nothing here returns `Err` or panics once the client is built.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    api_root: String,
}

impl ApiClient {
    /// Create a client for `base_url` with default settings.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_config(ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        })
    }

    pub fn with_config(config: ApiConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url).map_err(|source| ApiError::InvalidBaseUrl {
            url: config.base_url.clone(),
            source,
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl {
                url: config.base_url,
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ApiError::Client)?;

        Ok(Self {
            client,
            base_url,
            api_root: config.api_root,
        })
    }

    /// Root-relative path for `resource_path` under this client's API root.
    pub fn format_api_url(&self, resource_path: &str) -> String {
        format_with_root(&self.api_root, resource_path)
    }

    /// Absolute URL for `resource_path`: the base URL's path, then the API
    /// root, then the resource. The base URL's own query and fragment are
    /// dropped.
    pub fn endpoint(&self, resource_path: &str) -> Url {
        let resource = self.format_api_url(resource_path);
        let (path, query) = match resource.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (resource.as_str(), None),
        };

        let mut url = self.base_url.clone();
        let full_path = format!("{}{}", url.path().trim_end_matches('/'), path);
        url.set_path(&full_path);
        url.set_query(query);
        url.set_fragment(None);
        url
    }

    pub async fn get(&self, path: &str) -> ApiResponse {
        self.dispatch(Method::GET, path, Ok).await
    }

    /// GET with query parameters, e.g. `&[("sex", "F")]`.
    pub async fn get_with_params<Q>(&self, path: &str, params: &Q) -> ApiResponse
    where
        Q: Serialize + ?Sized,
    {
        self.dispatch(Method::GET, path, |req| Ok(req.query(params)))
            .await
    }

    pub async fn post<B>(&self, path: &str, body: &B) -> ApiResponse
    where
        B: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(body);
        self.dispatch(Method::POST, path, move |req| json_body(req, payload))
            .await
    }

    pub async fn put<B>(&self, path: &str, body: &B) -> ApiResponse
    where
        B: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(body);
        self.dispatch(Method::PUT, path, move |req| json_body(req, payload))
            .await
    }

    pub async fn delete(&self, path: &str) -> ApiResponse {
        self.dispatch(Method::DELETE, path, Ok).await
    }

    /// Upload a file as multipart form data with a `type` discriminator
    /// (`"image"`, `"document"`, ...).
    pub async fn upload(&self, file: UploadFile, kind: &str) -> ApiResponse {
        let kind = kind.to_string();
        self.dispatch(Method::POST, "uploads", move |req| {
            let mut part = Part::bytes(file.bytes).file_name(file.file_name);
            if let Some(mime) = file.mime {
                part = part
                    .mime_str(&mime)
                    .map_err(|e| ApiError::Encode(e.to_string()))?;
            }
            let form = Form::new().part("file", part).text("type", kind);
            Ok(req.multipart(form))
        })
        .await
    }

    async fn dispatch<F>(&self, method: Method, path: &str, build: F) -> ApiResponse
    where
        F: FnOnce(RequestBuilder) -> Result<RequestBuilder, ApiError>,
    {
        match self.try_dispatch(method.clone(), path, build).await {
            Ok(data) => ApiResponse::success(data),
            Err(e) => {
                tracing::warn!(method = %method, path = %path, error = %e, "API request failed");
                ApiResponse::failure(e.to_string())
            }
        }
    }

    async fn try_dispatch<F>(&self, method: Method, path: &str, build: F) -> Result<Value, ApiError>
    where
        F: FnOnce(RequestBuilder) -> Result<RequestBuilder, ApiError>,
    {
        let url = self.endpoint(path);

        tracing::debug!(method = %method, url = %url, "API request");

        let request = build(self.client.request(method, url))?;
        let response = request.send().await.map_err(|e| {
            if e.is_builder() {
                ApiError::Encode(e.to_string())
            } else {
                ApiError::Transport(e)
            }
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(ApiError::Transport)?;

        if !status.is_success() {
            return Err(ApiError::from_status(status, &body));
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn json_body(
    req: RequestBuilder,
    payload: Result<Vec<u8>, serde_json::Error>,
) -> Result<RequestBuilder, ApiError> {
    let payload = payload.map_err(|e| ApiError::Encode(e.to_string()))?;
    Ok(req
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .body(payload))
}
