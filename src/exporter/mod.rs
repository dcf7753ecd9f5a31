//! Core exporter implementation
//!
//! [`AttachmentExporter`] drives the whole pipeline: optional token exchange,
//! ids-only enumeration, then a bounded concurrent fan-out of one task per
//! record. Tasks never cancel each other; the run completes when every task
//! has settled, and the tallies come back as an [`ExportSummary`].

mod record;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::auth;
use crate::config::Config;
use crate::error::Result;
use crate::service::FeatureServiceClient;
use crate::types::{Event, ExportSummary};
use std::sync::Arc;
use tokio::sync::{Semaphore, broadcast};
use tokio::task::JoinSet;

/// Buffer size for the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Exports every attachment of a feature layer to a local directory tree
///
/// Cloneable; all shared state is immutable or Arc-wrapped. See the crate
/// docs for a usage example.
#[derive(Clone)]
pub struct AttachmentExporter {
    /// Configuration (wrapped in Arc for sharing across record tasks)
    config: Arc<Config>,
    /// HTTP client shared by authentication, queries, and downloads
    http: reqwest::Client,
    /// Event broadcast channel sender (multiple subscribers supported)
    event_tx: broadcast::Sender<Event>,
}

impl AttachmentExporter {
    /// Create an exporter from a validated configuration
    ///
    /// Fails fast on invalid configuration; no network traffic happens until
    /// [`run`](Self::run).
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            config: Arc::new(config),
            http,
            event_tx,
        })
    }

    /// Subscribe to export events
    ///
    /// Multiple subscribers are supported; a lagging subscriber drops events
    /// rather than blocking the pipeline.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Run the export to completion
    ///
    /// Authentication and enumeration failures are fatal and returned as
    /// errors. Everything downstream is isolated: a failing record or file is
    /// logged, counted in the summary, and does not affect its siblings.
    pub async fn run(&self) -> Result<ExportSummary> {
        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        // Token exchange happens once, before any fan-out; the token is then
        // immutable inside the client
        let token = match &self.config.portal {
            Some(portal) => {
                Some(auth::generate_token(&self.http, portal, &self.config.service_url).await?)
            }
            None => None,
        };

        let client = Arc::new(FeatureServiceClient::new(
            self.http.clone(),
            &self.config.service_url,
            token,
            self.config.log_responses,
        )?);

        let ids = client.query_object_ids().await?;
        tracing::info!(total = ids.len(), "enumerated record ids");
        self.event_tx.send(Event::Enumerated { total: ids.len() }).ok();

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_records));
        let mut tasks: JoinSet<record::RecordOutcome> = JoinSet::new();

        for id in ids.iter().copied() {
            let client = Arc::clone(&client);
            let config = Arc::clone(&self.config);
            let event_tx = self.event_tx.clone();
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    // Semaphore is never closed during a run; treat closure
                    // as a skipped record rather than panicking
                    Err(_) => return record::RecordOutcome::failed(),
                };
                record::process_record(client, config, event_tx, id).await
            });
        }

        let mut summary = ExportSummary {
            records_total: ids.len(),
            ..ExportSummary::default()
        };
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    summary.files_written += outcome.files_written;
                    summary.files_failed += outcome.files_failed;
                    if !outcome.record_ok {
                        summary.records_failed += 1;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "record task panicked");
                    summary.records_failed += 1;
                }
            }
        }

        tracing::info!(
            records_total = summary.records_total,
            records_failed = summary.records_failed,
            files_written = summary.files_written,
            files_failed = summary.files_failed,
            "export complete"
        );
        self.event_tx.send(Event::Completed { summary }).ok();

        Ok(summary)
    }
}
