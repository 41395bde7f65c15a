/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the REST backend and the UI layer.
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::previews::Preview;

/// An authenticated user session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token sent with every authenticated request
    pub token: String,
    /// Shown in the header; absent when the server never reported one
    pub email: Option<String>,
}

/// A photo as returned by `GET /photos/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: i64,
    #[serde(default)]
    pub original_name: String,
    /// Server-side file reference, used to build the media URL
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub created_at: String,
    /// True for photos uploaded by the current user
    #[serde(rename = "isOwned", default)]
    pub is_owned: bool,
}

impl Photo {
    /// Photos without a usable file reference are not listed at all
    pub fn has_file(&self) -> bool {
        self.file
            .as_deref()
            .is_some_and(|file| !file.trim().is_empty())
    }

    /// Upload time in local time, or the raw value if it doesn't parse
    pub fn uploaded_at(&self) -> String {
        match DateTime::parse_from_rfc3339(&self.created_at) {
            Ok(ts) => ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
            Err(_) => self.created_at.clone(),
        }
    }
}

/// A photo together with its fetched preview, if the fetch worked
#[derive(Debug, Clone)]
pub struct LoadedPhoto {
    pub photo: Photo,
    pub preview: Option<Preview>,
}

/// Body of `POST /auth/login/`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response of `POST /auth/login/`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Body of `POST /auth/register/`
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Body of `POST /photos/share/`
#[derive(Debug, Clone, Serialize)]
pub struct ShareRequest {
    pub photo: i64,
    pub shared_to: String,
}

/// Split photos into (owned, shared with me), keeping order
pub fn partition(photos: &[Photo]) -> (Vec<&Photo>, Vec<&Photo>) {
    photos.iter().partition(|photo| photo.is_owned)
}
