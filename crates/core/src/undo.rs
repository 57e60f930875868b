//! Undo package metadata codec.
//!
//! Undo packages are stored as two application data blobs: the package
//! content under `UndoPackage_<id>` and a metadata string under
//! `UndoPackageMetadata_<id>`. The metadata string has exactly five
//! `|`-separated fields:
//!
//! ```text
//! dd-MM-yyyy-HH-mm-ss|<import user uri>|<package id>|<action count>|<description>
//! ```
//!
//! A package is only listed when both blobs exist.

use crate::models::ApplicationData;
use serde::Serialize;
use std::collections::HashSet;
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

/// Application id prefix of undo package content blobs.
pub const CONTENT_PREFIX: &str = "UndoPackage_";

/// Application id prefix of undo package metadata blobs.
pub const METADATA_PREFIX: &str = "UndoPackageMetadata_";

const FIELD_COUNT: usize = 5;

const CREATION_TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[day]-[month]-[year]-[hour]-[minute]-[second]");

/// Decoded undo package metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndoPackageRecord {
    /// Package identifier; equals the application id of the content blob.
    pub package_id: String,
    pub creation_time: PrimitiveDateTime,
    /// URI of the user that ran the import.
    pub import_user: String,
    pub actions: i32,
    pub description: String,
    /// Application id of the metadata blob itself, needed to delete it.
    pub metadata_key: String,
}

impl UndoPackageRecord {
    /// Render the record back into its metadata string.
    pub fn encode(&self) -> String {
        // The format description only contains numeric components.
        let created = self
            .creation_time
            .format(CREATION_TIME_FORMAT)
            .unwrap_or_default();
        format!(
            "{created}|{}|{}|{}|{}",
            self.import_user, self.package_id, self.actions, self.description
        )
    }
}

/// Decode a metadata blob stored under `blob_key`. All or nothing.
pub fn decode(blob_key: &str, raw: &[u8]) -> crate::Result<UndoPackageRecord> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| crate::Error::malformed(blob_key, format!("not valid UTF-8: {e}")))?;

    let fields: Vec<&str> = text.split('|').collect();
    let [created, import_user, package_id, actions, description] = fields.as_slice() else {
        return Err(crate::Error::malformed(
            blob_key,
            format!("expected {FIELD_COUNT} fields, got {}", fields.len()),
        ));
    };

    let creation_time = PrimitiveDateTime::parse(created, CREATION_TIME_FORMAT).map_err(|e| {
        crate::Error::malformed(blob_key, format!("invalid creation time '{created}': {e}"))
    })?;
    let actions = actions.parse::<i32>().map_err(|_| {
        crate::Error::malformed(blob_key, format!("invalid action count '{actions}'"))
    })?;

    Ok(UndoPackageRecord {
        package_id: package_id.to_string(),
        creation_time,
        import_user: import_user.to_string(),
        actions,
        description: description.to_string(),
        metadata_key: blob_key.to_string(),
    })
}

/// Records whose package has a content blob, in the order they were supplied.
///
/// The iterator is lazy and can be restarted by cloning it before use.
pub fn correlate<'a>(
    records: &'a [UndoPackageRecord],
    content_keys: &'a HashSet<String>,
) -> impl Iterator<Item = &'a UndoPackageRecord> + Clone + 'a {
    records
        .iter()
        .filter(move |record| content_keys.contains(&record.package_id))
}

/// Result of enumerating undo packages from raw application data.
#[derive(Debug, Default)]
pub struct UndoPackageListing {
    /// Correlated packages, in metadata order.
    pub packages: Vec<UndoPackageRecord>,
    /// Metadata blobs that could not be decoded.
    pub skipped: Vec<crate::Error>,
}

/// Split raw application data into content and metadata blobs, decode the
/// metadata and keep only packages that still have their content.
///
/// Malformed metadata is skipped and reported in [`UndoPackageListing::skipped`]
/// so a single corrupt record does not hide the others.
pub fn enumerate(entries: &[ApplicationData]) -> UndoPackageListing {
    let content_keys: HashSet<String> = entries
        .iter()
        .filter(|entry| entry.application_id.starts_with(CONTENT_PREFIX))
        .map(|entry| entry.application_id.clone())
        .collect();

    let mut records = Vec::new();
    let mut skipped = Vec::new();
    for entry in entries
        .iter()
        .filter(|entry| entry.application_id.starts_with(METADATA_PREFIX))
    {
        match decode(&entry.application_id, &entry.data) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(
                    metadata_key = %entry.application_id,
                    error = %e,
                    "Skipping malformed undo package metadata"
                );
                skipped.push(e);
            }
        }
    }

    let packages: Vec<UndoPackageRecord> = correlate(&records, &content_keys).cloned().collect();
    let orphaned = records.len() - packages.len();
    if orphaned > 0 {
        tracing::debug!(orphaned, "Ignoring undo package metadata without content");
    }

    UndoPackageListing { packages, skipped }
}
