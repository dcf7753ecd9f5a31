//! Portal token exchange
//!
//! Exchanges portal credentials for a session token before any enumeration
//! begins. Authentication is all-or-nothing: it either yields a token used on
//! every subsequent request, or fails the run (no anonymous fallback).

use crate::config::PortalConfig;
use crate::error::{Error, Result};
use serde::Deserialize;
use url::Url;

/// Token lifetime requested from the portal, in minutes
const TOKEN_EXPIRATION_MINUTES: u32 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// The portal's generateToken endpoint for a configured portal URL
///
/// Accepts portal URLs both with and without the `/sharing/rest` suffix.
fn token_endpoint(portal_url: &str) -> Result<Url> {
    let mut url = Url::parse(portal_url)?;
    {
        let mut segments = url.path_segments_mut().map_err(|_| Error::Config {
            message: format!("portal.url is not a base URL: {}", portal_url),
            key: Some("portal.url".to_string()),
        })?;
        segments.pop_if_empty();
    }
    let has_sharing_rest = url
        .path()
        .trim_end_matches('/')
        .ends_with("/sharing/rest");
    if let Ok(mut segments) = url.path_segments_mut() {
        if !has_sharing_rest {
            segments.extend(["sharing", "rest"]);
        }
        segments.push("generateToken");
    }
    Ok(url)
}

/// Exchange portal credentials for a session token scoped to the service
///
/// Issues a single form POST to the portal's generateToken endpoint with the
/// service URL as referer. Any failure here is fatal to the pipeline.
pub async fn generate_token(
    http: &reqwest::Client,
    portal: &PortalConfig,
    service_url: &str,
) -> Result<String> {
    let url = token_endpoint(&portal.url)?;
    tracing::info!(portal = %portal.url, username = %portal.username, "requesting token");

    let expiration = TOKEN_EXPIRATION_MINUTES.to_string();
    let params = [
        ("username", portal.username.as_str()),
        ("password", portal.password.as_str()),
        ("client", "referer"),
        ("referer", service_url),
        ("expiration", expiration.as_str()),
        ("f", "json"),
    ];

    let response = http.post(url).form(&params).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Auth(format!("token endpoint returned HTTP {}", status)));
    }

    let body: TokenResponse = response.json().await?;
    if let Some(error) = body.error {
        return Err(Error::Auth(format!("portal rejected credentials: {}", error)));
    }
    body.token
        .ok_or_else(|| Error::Auth("portal response contained no token".to_string()))
}
