use crate::record::{AssetId, PhotoRecord};

/// Messages from an ingestion pass to the gallery owner loop.
///
/// Every event carries the pass generation so that counter updates from a
/// superseded pass can be ignored while record insertion stays idempotent.
#[derive(Debug)]
pub enum IngestEvent {
    /// Enumeration finished; `ids` is the full set the pass will process.
    PassStarted { pass: u64, ids: Vec<AssetId> },
    /// One asset decoded into a record.
    Ingested { pass: u64, record: PhotoRecord },
    /// One asset's thumbnail fetch failed; counts toward completion only.
    Skipped { pass: u64, id: AssetId },
}

/// UI-side operations, serialized onto the gallery owner loop.
#[derive(Debug)]
pub enum Command {
    /// Open a record in the detail pager.
    Open(AssetId),
    /// Close the detail pager.
    CloseDetail,
    ToggleSelection(AssetId),
    /// Exit edit mode: empty the set, unflag every record.
    ClearSelection,
    /// Delete the multi-select set, or the open record when the set is empty.
    DeleteSelected,
    ToggleFavorite(AssetId),
}
