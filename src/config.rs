//! Configuration types for attachment-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for [`AttachmentExporter`](crate::AttachmentExporter)
///
/// Only `service_url` is required; everything else has a sensible default.
/// The configuration is static for the lifetime of an exporter: there is no
/// runtime mutation, and the authentication token derived from [`portal`](Self::portal)
/// is held by the HTTP client rather than any shared mutable state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Feature layer URL, including the layer index (e.g.
    /// `https://services.example.com/arcgis/rest/services/Sites/FeatureServer/0`)
    pub service_url: String,

    /// Directory the exported tree is rooted at (default: "./attachments")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Prefix for per-record subdirectories and flat-layout filenames (default: "record")
    ///
    /// Overridden per record by the value of [`prefix_field`](Self::prefix_field)
    /// when that field is configured and non-null.
    #[serde(default = "default_directory_prefix")]
    pub directory_prefix: String,

    /// Attribute field whose value replaces the generic prefix (default: None)
    ///
    /// Intended for non-null unique values; no uniqueness check is performed,
    /// so colliding values can overwrite files in flat layout.
    #[serde(default)]
    pub prefix_field: Option<String>,

    /// Write all attachments into one flat directory instead of one
    /// subdirectory per record (default: false)
    #[serde(default)]
    pub flat: bool,

    /// Portal credentials for token-based authentication (default: None)
    ///
    /// When absent, all requests are made anonymously.
    #[serde(default)]
    pub portal: Option<PortalConfig>,

    /// Maximum number of records processed concurrently (default: 4)
    #[serde(default = "default_max_concurrent_records")]
    pub max_concurrent_records: usize,

    /// Maximum number of attachment downloads in flight per record (default: 8)
    #[serde(default = "default_max_concurrent_attachments")]
    pub max_concurrent_attachments: usize,

    /// Timeout applied to every HTTP request (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Log full service responses at debug level (default: false)
    #[serde(default)]
    pub log_responses: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_url: String::new(),
            output_dir: default_output_dir(),
            directory_prefix: default_directory_prefix(),
            prefix_field: None,
            flat: false,
            portal: None,
            max_concurrent_records: default_max_concurrent_records(),
            max_concurrent_attachments: default_max_concurrent_attachments(),
            request_timeout: default_request_timeout(),
            log_responses: false,
        }
    }
}

impl Config {
    /// Validate the configuration, returning a keyed error for the first
    /// invalid setting found
    pub fn validate(&self) -> Result<()> {
        if self.service_url.trim().is_empty() {
            return Err(Error::Config {
                message: "service_url must not be empty".to_string(),
                key: Some("service_url".to_string()),
            });
        }
        if self.max_concurrent_records == 0 {
            return Err(Error::Config {
                message: "max_concurrent_records must be at least 1".to_string(),
                key: Some("max_concurrent_records".to_string()),
            });
        }
        if self.max_concurrent_attachments == 0 {
            return Err(Error::Config {
                message: "max_concurrent_attachments must be at least 1".to_string(),
                key: Some("max_concurrent_attachments".to_string()),
            });
        }
        if let Some(field) = &self.prefix_field
            && field.trim().is_empty()
        {
            return Err(Error::Config {
                message: "prefix_field must not be blank when set".to_string(),
                key: Some("prefix_field".to_string()),
            });
        }
        if let Some(portal) = &self.portal {
            portal.validate()?;
        }
        Ok(())
    }
}

/// Portal credentials used to generate a request token
///
/// All three fields are required together; partially-specified credentials
/// fail validation rather than silently falling back to anonymous access.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Portal base URL (e.g. `https://www.arcgis.com`)
    pub url: String,

    /// Portal username
    pub username: String,

    /// Portal password
    pub password: String,
}

impl PortalConfig {
    fn validate(&self) -> Result<()> {
        for (value, key) in [
            (&self.url, "portal.url"),
            (&self.username, "portal.username"),
            (&self.password, "portal.password"),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config {
                    message: format!("{} must not be empty", key),
                    key: Some(key.to_string()),
                });
            }
        }
        Ok(())
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./attachments")
}

fn default_directory_prefix() -> String {
    "record".to_string()
}

fn default_max_concurrent_records() -> usize {
    4
}

fn default_max_concurrent_attachments() -> usize {
    8
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
