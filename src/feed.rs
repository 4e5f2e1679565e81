use std::{collections::HashSet, ffi::OsStr, path::Path};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use self::raw::RawElement;
use crate::{manifest::PackageMetadata, store::FeedStore};

pub(crate) mod atom;
pub(crate) mod raw;

pub(crate) const FEED_TITLE: &str = "MyPrivateVsixGallery";
pub(crate) const FEED_ID: &str = "MyPrivateVsixGalleryV1";
pub(crate) const FEED_FILE_NAME: &str = "MyPrivateVsixGallery.xml";
pub(crate) const CONTENT_TYPE: &str = "octet/stream";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Content {
    /// Relative reference to the package, resolved against the feed location
    pub(crate) src: String,
    pub(crate) media_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FeedEntry {
    pub(crate) id: String,
    pub(crate) author: String,
    pub(crate) title: String,
    pub(crate) summary: String,
    pub(crate) content: Option<Content>,
    pub(crate) version: String,
    pub(crate) updated: Option<DateTime<Utc>>,
    /// The entry as read from a previous feed. When present it is written back
    /// unchanged and the fields above are only a view of it.
    pub(crate) source: Option<RawElement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Feed {
    pub(crate) title: String,
    pub(crate) id: String,
    pub(crate) updated: DateTime<Utc>,
    pub(crate) entries: Vec<FeedEntry>,
}

impl FeedEntry {
    pub(crate) fn build(metadata: &PackageMetadata, file_name: &str, updated: DateTime<Utc>) -> Self {
        Self {
            id: metadata.id.clone(),
            author: metadata.publisher.clone(),
            title: metadata.display_name.clone(),
            summary: metadata.description.clone(),
            content: Some(Content {
                src: file_name.to_string(),
                media_type: CONTENT_TYPE.to_string(),
            }),
            version: metadata.version.clone(),
            updated: Some(updated),
            source: None,
        }
    }
}

impl Feed {
    pub(crate) fn new(entries: Vec<FeedEntry>, updated: DateTime<Utc>) -> Self {
        Self {
            title: FEED_TITLE.to_string(),
            id: FEED_ID.to_string(),
            updated,
            entries,
        }
    }
}

/// Appends previous entries whose id is not among the new ones, keeping both orders.
pub(crate) fn merge_entries(mut entries: Vec<FeedEntry>, previous: Vec<FeedEntry>) -> Vec<FeedEntry> {
    let ids = entries.iter().map(|entry| entry.id.clone()).collect::<HashSet<_>>();

    for entry in previous {
        if ids.contains(&entry.id) {
            debug!(id = %entry.id, "replacing previous entry");
            continue;
        }

        entries.push(entry);
    }

    entries
}

pub(crate) fn load_previous(store: &impl FeedStore, feed_path: &Path) -> Result<Vec<FeedEntry>> {
    if !store.exists(feed_path) {
        debug!(path = ?feed_path, "no previous feed");
        return Ok(vec![]);
    }

    let text = store.read_to_string(feed_path)?;
    atom::parse_entries(&text).with_context(|| format!("failed to parse {:?} as feed", feed_path))
}

pub(crate) fn write_feed(store: &impl FeedStore, feed_path: &Path, feed: &Feed) -> Result<()> {
    let xml = feed.to_xml()?;

    if store.exists(feed_path) {
        store.remove_file(feed_path)?;
    }

    store.write(feed_path, &xml)
}

/// Regenerates the feed in `destination` for a package already copied there.
pub(crate) fn update_feed(
    store: &impl FeedStore,
    package: &Path,
    destination: &Path,
    now: DateTime<Utc>,
) -> Result<Feed> {
    let file_name = package
        .file_name()
        .and_then(OsStr::to_str)
        .with_context(|| format!("{:?} has no usable file name", package))?;
    let metadata = PackageMetadata::read(&destination.join(file_name))?;
    let entries = vec![FeedEntry::build(&metadata, file_name, now)];

    let feed_path = destination.join(FEED_FILE_NAME);
    let previous = load_previous(store, &feed_path)?;
    let feed = Feed::new(merge_entries(entries, previous), now);
    info!(entries = feed.entries.len(), "feed generated");

    write_feed(store, &feed_path, &feed)?;
    info!(path = ?feed_path, "feed written");

    Ok(feed)
}
