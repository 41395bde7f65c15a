use std::path::Path;
use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::csrf;
use super::error::ApiError;
use crate::config::Config;
use crate::state::data::{
    LoginRequest, LoginResponse, Photo, RegisterRequest, ShareRequest,
};

/// The one HTTP client every view talks to the backend through.
///
/// Cheap to clone: the connection pool and cookie jar are shared.
/// No timeouts, retries or caching are configured.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the configured backend
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        Ok(ApiClient {
            http,
            jar,
            base_url: config.api_url.clone(),
        })
    }

    /// Absolute URL for a path relative to the API base
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", url, e)))
    }

    /// URL serving the binary content of an uploaded file
    pub fn media_url(&self, file: &str) -> Result<Url, ApiError> {
        self.endpoint(&format!("media/{}/", file))
    }

    /// CSRF token currently stored in the cookie jar for `url`
    pub fn csrf_token(&self, url: &Url) -> Option<String> {
        let header = self.jar.cookies(url)?;
        csrf::cookie_value(header.to_str().ok()?, csrf::COOKIE_NAME)
    }

    /// Start a request, attaching the CSRF header to unsafe methods
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let token = if csrf::is_safe_method(&method) {
            None
        } else {
            self.csrf_token(&url)
        };

        let builder = self.http.request(method, url);
        match token {
            Some(token) => builder.header(csrf::HEADER_NAME, token),
            None => builder,
        }
    }

    fn authorized(&self, method: Method, url: Url, token: &str) -> RequestBuilder {
        self.request(method, url).bearer_auth(token)
    }

    // ========== Auth ==========

    /// `POST /auth/login/`
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self
            .request(Method::POST, self.endpoint("auth/login/")?)
            .json(&body)
            .send()
            .await?;

        json_body(response).await
    }

    /// `POST /auth/register/`
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        let response = self
            .request(Method::POST, self.endpoint("auth/register/")?)
            .json(request)
            .send()
            .await?;

        ensure_success(response).await?;
        info!("👤 Registered user {}", request.username);
        Ok(())
    }

    // ========== Photos ==========

    /// `GET /photos/` - owned photos plus those shared with the user
    pub async fn list_photos(&self, token: &str) -> Result<Vec<Photo>, ApiError> {
        let response = self
            .authorized(Method::GET, self.endpoint("photos/")?, token)
            .send()
            .await?;

        json_body(response).await
    }

    /// `GET {base}/media/{file}/` - raw bytes of an uploaded photo
    pub async fn fetch_media(&self, token: &str, file: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.media_url(file)?;
        debug!("Fetching preview from {}", url);

        let response = self.authorized(Method::GET, url, token).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// `POST /photos/` as multipart with the file in field `file`
    pub async fn upload_photo(&self, token: &str, path: &Path) -> Result<(), ApiError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "photo".to_string());

        let data = tokio::fs::read(path).await?;
        info!("⬆️  Uploading {} ({} bytes)", file_name, data.len());

        let form = Form::new().part("file", Part::bytes(data).file_name(file_name));
        let response = self
            .authorized(Method::POST, self.endpoint("photos/")?, token)
            .multipart(form)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        debug!("Upload response: {}", response.text().await.unwrap_or_default());
        Ok(())
    }

    /// `DELETE /photos/{id}/` - only succeeds for owned photos
    pub async fn delete_photo(&self, token: &str, photo_id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("photos/{}/", photo_id))?;
        let response = self.authorized(Method::DELETE, url, token).send().await?;

        ensure_success(response).await?;
        Ok(())
    }

    /// `POST /photos/share/`
    pub async fn share_photo(&self, token: &str, request: &ShareRequest) -> Result<(), ApiError> {
        let response = self
            .authorized(Method::POST, self.endpoint("photos/share/")?, token)
            .json(request)
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Turn a non-2xx response into `ApiError::Status` with its raw body
async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::from_status(status, body))
}

async fn json_body<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = ensure_success(response).await?;
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}
