//! Output path construction
//!
//! Pure functions mapping a record id, attachment descriptor, and optional
//! naming context onto the destination directory and filename. Two layouts
//! exist: nested (one subdirectory per record) and flat (every file in the
//! output directory, disambiguated by filename prefix).

use crate::types::{AttachmentInfo, RecordId};
use std::path::{Path, PathBuf};

/// Split an attachment name into stem and extension at the last dot
///
/// Names without a dot have no extension. Splitting at the last dot keeps
/// multi-dot names intact ("my.file.v2.jpg" keeps the "my.file.v2" stem).
pub fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        // A leading dot is part of the stem, not an extension separator
        Some(("", _)) | None => (name, None),
        Some((stem, ext)) => (stem, Some(ext)),
    }
}

/// Directory a record's attachments are written into
///
/// Flat layout uses the output directory itself; nested layout appends one
/// `<context-or-prefix>_<id>` subdirectory per record.
pub fn record_directory(
    output_dir: &Path,
    flat: bool,
    directory_prefix: &str,
    naming_context: Option<&str>,
    id: RecordId,
) -> PathBuf {
    if flat {
        output_dir.to_path_buf()
    } else {
        let prefix = naming_context.unwrap_or(directory_prefix);
        output_dir.join(format!("{}_{}", prefix, id))
    }
}

/// Full destination path for one attachment
///
/// - nested: `<out>/<context-or-prefix>_<id>/<stem>_<attachmentId>.<ext>`
/// - flat with context: `<out>/<context>_<stem>_<attachmentId>.<ext>`
/// - flat without context: `<out>/<id>_<stem>_<attachmentId>.<ext>`
pub fn attachment_path(
    output_dir: &Path,
    flat: bool,
    directory_prefix: &str,
    naming_context: Option<&str>,
    id: RecordId,
    attachment: &AttachmentInfo,
) -> PathBuf {
    let directory = record_directory(output_dir, flat, directory_prefix, naming_context, id);
    let (stem, extension) = split_name(&attachment.name);

    let mut file_name = if flat {
        match naming_context {
            Some(context) => format!("{}_{}_{}", context, stem, attachment.id),
            None => format!("{}_{}_{}", id, stem, attachment.id),
        }
    } else {
        format!("{}_{}", stem, attachment.id)
    };
    if let Some(ext) = extension {
        file_name.push('.');
        file_name.push_str(ext);
    }

    directory.join(file_name)
}
