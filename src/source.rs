//! The narrow fetch/mutate interface to the device photo library.
//!
//! The core never talks to photo storage directly; everything goes through
//! this trait so that ingestion, deletion and favorite sync can be exercised
//! against a scripted source in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::error::Error;
use crate::record::{AssetId, GeoPoint, Thumbnail};

/// Metadata for one enumerated asset, before its thumbnail is fetched.
#[derive(Debug, Clone)]
pub struct AssetInfo {
    pub id: AssetId,
    pub creation_date: Option<DateTime<Utc>>,
    pub location: Option<GeoPoint>,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub is_favorite: bool,
}

/// The library changed out from under us; re-ingest from scratch.
#[derive(Debug, Clone, Copy)]
pub struct LibraryChange;

/// Edge length (in pixels) of the thumbnails requested during ingestion.
pub const THUMBNAIL_EDGE: u32 = 150;

#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Enumerate the whole library, ordered by creation date ascending.
    async fn enumerate(&self) -> Result<Vec<AssetInfo>, Error>;

    /// Fetch a decoded thumbnail no larger than `target` on either edge.
    ///
    /// `None` is a per-item failure: the item still counts toward pass
    /// completion but produces no record.
    async fn fetch_thumbnail(&self, id: &AssetId, target: u32) -> Option<Thumbnail>;

    /// Persist a favorite flag. Local state is only updated on `Ok`.
    fn set_favorite(&self, id: &AssetId, favorite: bool) -> Result<(), Error>;

    /// Delete the given assets from the backing store.
    async fn delete(&self, ids: &[AssetId]) -> Result<(), Error>;

    /// Register for change notification. Dropping the receiver ends the
    /// subscription.
    fn subscribe(&self) -> mpsc::Receiver<LibraryChange>;
}
