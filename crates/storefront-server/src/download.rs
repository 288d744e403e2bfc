//! Download Route
//!
//! Serves purchased files from a single directory. Requested names are
//! reduced to their final path component before touching the filesystem.

use axum::{
    body::Body,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, header},
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::PathBuf;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use storefront_payments::LinkSigner;

use crate::error::ApiError;
use crate::state::AppState;

const NOT_FOUND: &str = "File not found.";

/// Directory of deliverable files
#[derive(Clone, Debug)]
pub struct DownloadDir {
    root: PathBuf,
    signer: Option<LinkSigner>,
}

/// Signature parameters of a signed download link
#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    pub expires: Option<i64>,
    pub signature: Option<String>,
}

/// Strip directory components, `path.basename` style
///
/// Returns `None` when nothing usable is left (empty, `.` or `..`).
pub fn sanitize_filename(requested: &str) -> Option<&str> {
    let name = requested.rsplit(['/', '\\']).next()?;
    match name {
        "" | "." | ".." => None,
        name => Some(name),
    }
}

impl DownloadDir {
    pub fn new(root: impl Into<PathBuf>, signer: Option<LinkSigner>) -> Self {
        Self {
            root: root.into(),
            signer,
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Existing file for a sanitized name
    async fn resolve(&self, name: &str) -> Option<PathBuf> {
        let path = self.root.join(name);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(path),
            _ => None,
        }
    }

    /// Check the link signature when signing is enabled
    fn authorize(&self, name: &str, query: &DownloadQuery, now: DateTime<Utc>) -> Result<(), ApiError> {
        let Some(signer) = &self.signer else {
            return Ok(());
        };

        let (Some(expires), Some(signature)) = (query.expires, query.signature.as_deref()) else {
            tracing::warn!(file = %name, "Unsigned download link rejected");
            return Err(ApiError::Forbidden("This download link is invalid or has expired.".into()));
        };

        signer.verify(name, expires, signature, now).map_err(|e| {
            tracing::warn!(file = %name, error = %e, "Download link rejected");
            ApiError::from(e)
        })
    }
}

/// `Content-Disposition` keeping the requested name
///
/// Non-ASCII names get an ASCII `filename` fallback plus an RFC 5987
/// `filename*` parameter carrying the UTF-8 name.
fn attachment(name: &str) -> HeaderValue {
    let fallback: String = name
        .chars()
        .map(|c| match c {
            '\\' | '"' => format!("\\{c}"),
            c if c.is_ascii() && !c.is_ascii_control() => c.to_string(),
            _ => "_".into(),
        })
        .collect();

    let mut value = format!("attachment; filename=\"{fallback}\"");
    if !name.is_ascii() {
        // Form encoding writes spaces as '+' and leaves '*' bare; neither is an RFC 5987 attr-char.
        let encoded = url::form_urlencoded::byte_serialize(name.as_bytes())
            .collect::<String>()
            .replace('+', "%20")
            .replace('*', "%2A");
        value.push_str(&format!("; filename*=UTF-8''{encoded}"));
    }

    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// `GET /download/{filename}`
pub async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    Query(query): Query<DownloadQuery>,
    request: Request,
) -> Result<Response, ApiError> {
    let Some(name) = sanitize_filename(&filename) else {
        return Err(ApiError::NotFound(NOT_FOUND.into()));
    };

    let Some(path) = state.downloads.resolve(name).await else {
        tracing::debug!(requested = %filename, file = %name, "Download not found");
        return Err(ApiError::NotFound(NOT_FOUND.into()));
    };

    state.downloads.authorize(name, &query, Utc::now())?;

    let mut response = match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, attachment(name));

    tracing::info!(file = %name, status = %response.status(), "Serving download");

    Ok(response.map(Body::new))
}
