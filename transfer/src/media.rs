//! Media migration against the remote upload library.
//!
//! Local files are matched against the remote library by name and
//! dimensions. Files already present remotely are reused, missing ones are
//! uploaded when uploads are enabled, and every surviving remote record is
//! tagged with the local id it replaces so payload rewriting can find it.

use std::collections::HashSet;

use courier_engine::{ErrorDetail, ErrorItem, MediaFile, MediaIndex};
use futures::future::join_all;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::client::RemoteClient;
use crate::store::LocalStore;

/// Outcome of a media migration.
#[derive(Debug, Default)]
pub struct MediaOutcome {
    /// Remote records for every migrated file, indexed for rewriting
    pub index: MediaIndex,
    /// Per file failures
    pub errors: Vec<ErrorItem>,
}

/// Migrate a batch of local files into the remote media library.
///
/// With `upload` disabled only files already present remotely end up in the
/// index; everything else is left out and payload rewriting falls back to
/// sending bare file attributes.
pub async fn migrate_media(
    client: &RemoteClient,
    store: &dyn LocalStore,
    files: Vec<MediaFile>,
    upload: bool,
) -> MediaOutcome {
    if files.is_empty() {
        return MediaOutcome::default();
    }

    let listing = match client.fetch("/upload/files").await {
        Ok(listing) => listing,
        Err(err) => return listing_failure(format!("{err}")),
    };
    let existing: Vec<MediaFile> = match serde_json::from_value(listing) {
        Ok(existing) => existing,
        Err(err) => return listing_failure(format!("{err}")),
    };

    let (matched, to_upload): (Vec<&MediaFile>, Vec<&MediaFile>) = files
        .iter()
        .partition(|file| existing.iter().any(|remote| remote.same_asset(file)));
    let to_upload = distinct_assets(to_upload);

    let matched_records: Vec<Value> = matched
        .iter()
        .map(|file| match existing.iter().find(|remote| remote.same_asset(file)) {
            Some(remote) => tag_record(
                serde_json::to_value(remote).unwrap_or(Value::Null),
                file.id,
            ),
            None => tag_record(file.payload(), file.id),
        })
        .collect();

    let mut errors = Vec::new();

    if !to_upload.is_empty() && upload {
        tracing::debug!(
            "Reusing {} remote files, uploading {}",
            matched.len(),
            to_upload.len()
        );

        let results = join_all(
            to_upload
                .iter()
                .map(|file| upload_file(client, store, file)),
        )
        .await;

        let mut records = Vec::new();
        for result in results {
            match result {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(error) => errors.push(error),
            }
        }
        records.extend(matched_records);

        return MediaOutcome {
            index: MediaIndex::new(dedup_by_remote_id(records)),
            errors,
        };
    }

    MediaOutcome {
        index: MediaIndex::new(matched_records),
        errors,
    }
}

/// Send one local file to the remote upload endpoint. Returns the tagged
/// remote record, or `None` when the remote answered without one.
async fn upload_file(
    client: &RemoteClient,
    store: &dyn LocalStore,
    file: &MediaFile,
) -> std::result::Result<Option<Value>, ErrorItem> {
    let failure = || {
        ErrorItem::new(format!(
            "Failed to upload file: {} with id {}",
            file.name, file.id
        ))
    };

    let bytes = store.media_bytes(file).await.map_err(|err| {
        failure().with_details(vec![ErrorDetail::new(err.to_string(), "Store error")])
    })?;

    let mut part = Part::bytes(bytes).file_name(file.name.clone());
    if let Some(mime) = &file.mime {
        part = part.mime_str(mime).map_err(|_| failure())?;
    }
    let form = Form::new().part("files", part);

    let response = client
        .upload("/upload", form)
        .await
        .map_err(|err| failure().with_details(err.error_details()))?;

    Ok(response
        .get(0)
        .filter(|record| !record.is_null())
        .map(|record| tag_record(record.clone(), file.id)))
}

fn tag_record(mut record: Value, local_id: i64) -> Value {
    if let Some(object) = record.as_object_mut() {
        object.insert("localId".to_string(), Value::from(local_id));
    }
    record
}

/// Keep the first file per (name, width, height) triple. Skipped duplicates
/// still resolve through the index by name.
fn distinct_assets(files: Vec<&MediaFile>) -> Vec<&MediaFile> {
    let mut distinct: Vec<&MediaFile> = Vec::new();
    for file in files {
        if !distinct.iter().any(|kept| kept.same_asset(file)) {
            distinct.push(file);
        }
    }
    distinct
}

/// Keep the first record per remote id. Records without an id pass through.
fn dedup_by_remote_id(records: Vec<Value>) -> Vec<Value> {
    let mut seen = HashSet::new();
    let mut deduped = Vec::new();
    for record in records {
        if let Some(id) = record.get("id").and_then(Value::as_i64) {
            if !seen.insert(id) {
                continue;
            }
        }
        deduped.push(record);
    }
    deduped
}

fn listing_failure(err: String) -> MediaOutcome {
    MediaOutcome {
        index: MediaIndex::default(),
        errors: vec![ErrorItem::new(format!("Failed to fetch files: {err}"))],
    }
}
