pub mod error;
pub mod events;
pub mod fs_source;
pub mod index;
pub mod prefs;
pub mod record;
pub mod selection;
pub mod source;
pub mod zoom;
pub mod tasks {
    pub mod gallery;
    pub mod ingest;
}

pub use error::Error;
pub use index::{GallerySnapshot, PhotoIndex};
pub use record::{AssetId, PhotoRecord};
pub use zoom::ZoomStageController;
