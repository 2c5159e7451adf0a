//! Core data model: the ingested photo record and its small satellite types.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::RgbaImage;

/// Stable external identifier of a library asset.
///
/// All collection operations (dedup, lookup, removal) key on this id, never
/// on structural equality of the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Decoded thumbnail handle. Renderers borrow it; nobody mutates it.
pub type Thumbnail = Arc<RgbaImage>;

/// Geocoordinate attached to an asset. Stored, not interpreted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// One ingested photo: immutable identity plus two mutable flags.
#[derive(Debug, Clone)]
pub struct PhotoRecord {
    pub id: AssetId,
    pub thumbnail: Thumbnail,
    /// Absent-date records are kept in the canonical sequence but excluded
    /// from time-based grouping.
    pub creation_date: Option<DateTime<Utc>>,
    pub location: Option<GeoPoint>,
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Round-trips to the asset source.
    pub is_favorite: bool,
    /// Edit-mode flag; true iff the id is in the selection set.
    pub is_selected: bool,
}

impl PhotoRecord {
    /// Year/month of the creation date, if any.
    #[must_use]
    pub fn year_month(&self) -> Option<(i32, u32)> {
        use chrono::Datelike;
        self.creation_date.map(|d| (d.year(), d.month()))
    }
}
