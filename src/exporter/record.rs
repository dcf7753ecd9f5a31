//! Per-record export task
//!
//! One invocation per enumerated record id: list the record's attachments,
//! resolve the naming field once if configured, then download and write each
//! attachment through a bounded buffered stream. All failures here are
//! isolated to the record or file they occurred on.

use crate::config::Config;
use crate::error::Result;
use crate::paths;
use crate::service::{FeatureServiceClient, attribute_as_string};
use crate::types::{AttachmentInfo, Event, RecordId};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;

/// What one record task produced
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RecordOutcome {
    /// False when the attachment listing or field resolution failed
    pub(crate) record_ok: bool,
    /// Files written for this record
    pub(crate) files_written: usize,
    /// Downloads or writes that failed for this record
    pub(crate) files_failed: usize,
}

impl RecordOutcome {
    /// Outcome for a record that was skipped before any download started
    pub(crate) fn failed() -> Self {
        Self {
            record_ok: false,
            ..Self::default()
        }
    }
}

/// Process one record end to end
pub(crate) async fn process_record(
    client: Arc<FeatureServiceClient>,
    config: Arc<Config>,
    event_tx: broadcast::Sender<Event>,
    id: RecordId,
) -> RecordOutcome {
    let attachments = match client.get_attachments(id).await {
        Ok(attachments) => attachments,
        Err(e) => {
            tracing::warn!(record_id = %id, error = %e, "attachment listing failed, skipping record");
            event_tx
                .send(Event::RecordFailed {
                    record_id: id,
                    error: e.to_string(),
                })
                .ok();
            return RecordOutcome::failed();
        }
    };

    if attachments.is_empty() {
        tracing::debug!(record_id = %id, "record has no attachments");
        return RecordOutcome {
            record_ok: true,
            ..RecordOutcome::default()
        };
    }

    // Resolve the naming field once per record, not once per attachment
    let naming_context = match &config.prefix_field {
        Some(field) => match client.get_feature_attributes(id).await {
            Ok(attributes) => attributes.get(field).and_then(attribute_as_string),
            Err(e) => {
                tracing::warn!(record_id = %id, error = %e, "field resolution failed, skipping record");
                event_tx
                    .send(Event::RecordFailed {
                        record_id: id,
                        error: e.to_string(),
                    })
                    .ok();
                return RecordOutcome::failed();
            }
        },
        None => None,
    };

    let results: Vec<bool> = stream::iter(attachments)
        .map(|attachment| {
            let client = Arc::clone(&client);
            let config = Arc::clone(&config);
            let event_tx = event_tx.clone();
            let naming_context = naming_context.clone();

            async move {
                let attachment_id = attachment.id;
                match download_and_write(&client, &config, naming_context.as_deref(), id, &attachment)
                    .await
                {
                    Ok(path) => {
                        tracing::debug!(record_id = %id, attachment_id, path = %path.display(), "wrote attachment");
                        event_tx
                            .send(Event::FileWritten {
                                record_id: id,
                                attachment_id,
                                path,
                            })
                            .ok();
                        true
                    }
                    Err(e) => {
                        tracing::warn!(record_id = %id, attachment_id, error = %e, "attachment failed");
                        event_tx
                            .send(Event::FileFailed {
                                record_id: id,
                                attachment_id,
                                error: e.to_string(),
                            })
                            .ok();
                        false
                    }
                }
            }
        })
        .buffer_unordered(config.max_concurrent_attachments)
        .collect()
        .await;

    let files_written = results.iter().filter(|ok| **ok).count();
    RecordOutcome {
        record_ok: true,
        files_written,
        files_failed: results.len() - files_written,
    }
}

/// Download one attachment and persist it at its computed path
///
/// Directory creation is idempotent and an existing file at the destination
/// is silently overwritten.
async fn download_and_write(
    client: &FeatureServiceClient,
    config: &Config,
    naming_context: Option<&str>,
    id: RecordId,
    attachment: &AttachmentInfo,
) -> Result<PathBuf> {
    let data = client.download_attachment(id, attachment.id).await?;

    let path = paths::attachment_path(
        &config.output_dir,
        config.flat,
        &config.directory_prefix,
        naming_context,
        id,
        attachment,
    );
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, &data).await?;

    Ok(path)
}
