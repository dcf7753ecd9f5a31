//! # attachment-dl
//!
//! Library for exporting every file attachment of a remote feature service
//! layer to a local directory tree.
//!
//! ## Design Philosophy
//!
//! attachment-dl is designed to be:
//! - **One-shot** - A run enumerates, downloads, and writes, then returns
//! - **Failure-isolating** - One bad record or file never stops the others
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Bounded** - Concurrency is capped by configuration, not by the number
//!   of attachments on the server
//!
//! ## Quick Start
//!
//! ```no_run
//! use attachment_dl::{AttachmentExporter, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         service_url:
//!             "https://services.example.com/arcgis/rest/services/Sites/FeatureServer/0"
//!                 .to_string(),
//!         output_dir: "./attachments".into(),
//!         ..Default::default()
//!     };
//!
//!     let exporter = AttachmentExporter::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = exporter.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let summary = exporter.run().await?;
//!     println!(
//!         "wrote {} files ({} failed)",
//!         summary.files_written, summary.files_failed
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Portal token exchange
pub mod auth;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Core exporter implementation
pub mod exporter;
/// Output path construction
pub mod paths;
/// Feature service REST client
pub mod service;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, PortalConfig};
pub use error::{Error, Result};
pub use exporter::AttachmentExporter;
pub use service::FeatureServiceClient;
pub use types::{AttachmentInfo, Event, ExportSummary, RecordId};
