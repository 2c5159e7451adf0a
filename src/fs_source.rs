//! Directory-backed [`AssetSource`]: treats a filesystem tree as the photo
//! library. Used by the binary and as a realistic source for tests.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher, recommended_watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::Error;
use crate::record::{AssetId, Thumbnail};
use crate::source::{AssetInfo, AssetSource, LibraryChange};

#[derive(Debug)]
pub struct FsAssetSource {
    root: PathBuf,
    /// Favorite flags have no filesystem representation; kept in memory for
    /// the lifetime of the source.
    favorites: Mutex<HashSet<AssetId>>,
    /// Live notify watchers, one per subscription; dropped with the source.
    watchers: Mutex<Vec<RecommendedWatcher>>,
}

impl FsAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::BadDir(root.display().to_string()));
        }
        Ok(Self {
            root,
            favorites: Mutex::new(HashSet::new()),
            watchers: Mutex::new(Vec::new()),
        })
    }
}

/// Return `true` if `path` has an allowed image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ref e) if ["jpg", "jpeg", "png", "gif", "webp"].contains(&e.as_str())
    )
}

#[async_trait]
impl AssetSource for FsAssetSource {
    async fn enumerate(&self) -> Result<Vec<AssetInfo>, Error> {
        if !self.root.is_dir() {
            return Err(Error::BadDir(self.root.display().to_string()));
        }
        let root = self.root.clone();
        let favorites = self.favorites.lock().unwrap().clone();
        tokio::task::spawn_blocking(move || scan_assets(&root, &favorites))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?
    }

    async fn fetch_thumbnail(&self, id: &AssetId, target: u32) -> Option<Thumbnail> {
        let path = PathBuf::from(id.as_str());
        let res =
            tokio::task::spawn_blocking(move || decode_thumbnail(&path, target)).await;
        res.ok().flatten()
    }

    fn set_favorite(&self, id: &AssetId, favorite: bool) -> Result<(), Error> {
        let mut favorites = self.favorites.lock().unwrap();
        if favorite {
            favorites.insert(id.clone());
        } else {
            favorites.remove(id);
        }
        Ok(())
    }

    async fn delete(&self, ids: &[AssetId]) -> Result<(), Error> {
        let paths: Vec<PathBuf> = ids.iter().map(|id| PathBuf::from(id.as_str())).collect();
        tokio::task::spawn_blocking(move || {
            for path in &paths {
                delete_if_exists(path)?;
            }
            Ok(())
        })
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
    }

    fn subscribe(&self) -> mpsc::Receiver<LibraryChange> {
        let (tx, rx) = mpsc::channel(8);
        let watcher = recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if is_library_mutation(&event.kind) => {
                // Coalesce bursts: any pending notification already triggers
                // a full re-ingest.
                let _ = tx.try_send(LibraryChange);
            }
            Ok(_) => {}
            Err(e) => warn!("watch error: {e}"),
        });
        match watcher {
            Ok(mut w) => match w.watch(&self.root, RecursiveMode::Recursive) {
                Ok(()) => {
                    info!(watching = %self.root.display(), "library watcher registered");
                    self.watchers.lock().unwrap().push(w);
                }
                Err(e) => warn!(root = %self.root.display(), "failed to watch library: {e}"),
            },
            Err(e) => warn!("failed to create library watcher: {e}"),
        }
        rx
    }
}

fn is_library_mutation(kind: &EventKind) -> bool {
    use notify::event::ModifyKind;
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Remove(_)
            | EventKind::Modify(ModifyKind::Name(_) | ModifyKind::Data(_))
    )
}

fn scan_assets(root: &Path, favorites: &HashSet<AssetId>) -> Result<Vec<AssetInfo>, Error> {
    let mut out = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if !is_supported_image(path) {
            continue;
        }
        // Header-only probe; full decode is deferred to the thumbnail fetch.
        let (width, height) = match image::image_dimensions(path) {
            Ok(dims) => dims,
            Err(e) => {
                debug!(path = %path.display(), "unreadable image header: {e}");
                continue;
            }
        };
        let id = AssetId::new(path.to_string_lossy());
        out.push(AssetInfo {
            creation_date: read_exif_datetime(path).or_else(|| file_mtime(path)),
            location: None,
            pixel_width: width,
            pixel_height: height,
            is_favorite: favorites.contains(&id),
            id,
        });
    }
    // Creation-date ascending; undated entries sort first.
    out.sort_by_key(|a| a.creation_date);
    Ok(out)
}

fn decode_thumbnail(path: &Path, target: u32) -> Option<Thumbnail> {
    let img = image::ImageReader::open(path)
        .ok()?
        .with_guessed_format()
        .ok()?
        .decode()
        .ok()?;
    Some(Arc::new(img.thumbnail(target, target).to_rgba8()))
}

/// Capture time from EXIF, preferring `DateTimeOriginal` over `DateTime`.
fn read_exif_datetime(path: &Path) -> Option<DateTime<Utc>> {
    let file = File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut buf).ok()?;
    let field = exif
        .get_field(exif::Tag::DateTimeOriginal, exif::In::PRIMARY)
        .or_else(|| exif.get_field(exif::Tag::DateTime, exif::In::PRIMARY))?;
    let exif::Value::Ascii(groups) = &field.value else {
        return None;
    };
    let dt = exif::DateTime::from_ascii(groups.first()?).ok()?;
    let naive = chrono::NaiveDate::from_ymd_opt(dt.year.into(), dt.month.into(), dt.day.into())?
        .and_hms_opt(dt.hour.into(), dt.minute.into(), dt.second.into())?;
    Some(naive.and_utc())
}

fn file_mtime(path: &Path) -> Option<DateTime<Utc>> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}

fn delete_if_exists(path: &Path) -> Result<(), Error> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "deleted asset file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "asset already gone; skipping");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
