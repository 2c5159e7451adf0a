//! The single serialized owner of the photo index.
//!
//! Every mutation — UI commands, ingestion completions, bulk-delete results,
//! library-change notifications — arrives as a message and is applied inline
//! in one `select!` loop, then a fresh snapshot is published on the watch
//! channel for renderers. Background work never touches the index directly.

use std::sync::Arc;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::events::{Command, IngestEvent};
use crate::index::{GallerySnapshot, PhotoIndex};
use crate::record::AssetId;
use crate::source::AssetSource;
use crate::tasks::ingest;

/// Outcome of an off-loop bulk deletion.
#[derive(Debug)]
struct BulkDelete {
    ids: Vec<AssetId>,
    ok: bool,
}

pub async fn run(
    source: Arc<dyn AssetSource>,
    mut commands: Receiver<Command>,
    snapshots: watch::Sender<GallerySnapshot>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut index = PhotoIndex::new();
    // Held locally so the ingest receiver can never observe a closed channel.
    let (ingest_tx, mut ingest_rx) = mpsc::channel::<IngestEvent>(64);
    let (deleted_tx, mut deleted_rx) = mpsc::channel::<BulkDelete>(4);
    let mut changes = source.subscribe();
    let mut changes_open = true;

    let mut pass: u64 = 1;
    spawn_pass(&source, pass, &ingest_tx, &cancel);

    loop {
        select! {
            _ = cancel.cancelled() => {
                info!("cancel received; exiting gallery task");
                break;
            }

            Some(event) = ingest_rx.recv() => {
                match event {
                    IngestEvent::PassStarted { pass, ids } => index.begin_pass(pass, ids),
                    IngestEvent::Ingested { pass, record } => index.record_ingested(pass, record),
                    IngestEvent::Skipped { pass, id } => index.record_skipped(pass, &id),
                }
                publish(&snapshots, &index);
            }

            change = changes.recv(), if changes_open => {
                if change.is_some() {
                    pass += 1;
                    info!(pass, "library changed; re-ingesting from scratch");
                    index.set_loading(true);
                    spawn_pass(&source, pass, &ingest_tx, &cancel);
                    publish(&snapshots, &index);
                } else {
                    changes_open = false;
                }
            }

            Some(done) = deleted_rx.recv() => {
                if done.ok {
                    index.remove_many(&done.ids);
                } else {
                    warn!(count = done.ids.len(), "bulk delete rejected by source; keeping records");
                }
                index.clear_selection();
                index.set_loading(false);
                publish(&snapshots, &index);
            }

            maybe_cmd = commands.recv() => {
                let Some(cmd) = maybe_cmd else {
                    // UI side closed; nothing left to serve.
                    break;
                };
                handle_command(cmd, &mut index, &source, &deleted_tx).await;
                publish(&snapshots, &index);
            }
        }
    }
    Ok(())
}

async fn handle_command(
    cmd: Command,
    index: &mut PhotoIndex,
    source: &Arc<dyn AssetSource>,
    deleted_tx: &Sender<BulkDelete>,
) {
    match cmd {
        Command::Open(id) => {
            index.open(&id);
        }
        Command::CloseDetail => index.close_detail(),
        Command::ToggleSelection(id) => {
            index.toggle_selection(&id);
        }
        Command::ClearSelection => index.clear_selection(),
        Command::ToggleFavorite(id) => {
            let Some(record) = index.get(&id) else { return };
            let target = !record.is_favorite;
            // Source first; local state only moves on success.
            match source.set_favorite(&id, target) {
                Ok(()) => {
                    index.set_favorite_local(&id, target);
                }
                Err(e) => warn!(%id, "favorite not persisted: {e}"),
            }
        }
        Command::DeleteSelected => {
            if index.selection_count() == 0 {
                // No multi-select: delete the record open in the detail pager.
                let Some(id) = index.selected().cloned() else { return };
                match source.delete(std::slice::from_ref(&id)).await {
                    Ok(()) => {
                        index.remove_record(&id);
                    }
                    Err(e) => warn!(%id, "delete rejected by source; keeping record: {e}"),
                }
            } else {
                // Bulk removal runs off the owner loop and reports back.
                let ids = index.selection_ids();
                index.set_loading(true);
                let source = Arc::clone(source);
                let deleted_tx = deleted_tx.clone();
                tokio::spawn(async move {
                    let ok = match source.delete(&ids).await {
                        Ok(()) => true,
                        Err(e) => {
                            warn!(count = ids.len(), "bulk delete failed: {e}");
                            false
                        }
                    };
                    let _ = deleted_tx.send(BulkDelete { ids, ok }).await;
                });
            }
        }
    }
}

fn spawn_pass(
    source: &Arc<dyn AssetSource>,
    pass: u64,
    events: &Sender<IngestEvent>,
    cancel: &CancellationToken,
) {
    let source = Arc::clone(source);
    let events = events.clone();
    let cancel = cancel.child_token();
    tokio::spawn(async move {
        if let Err(e) = ingest::run(source, pass, events, cancel).await {
            warn!(pass, "ingestion pass failed: {e:#}");
        }
    });
}

fn publish(snapshots: &watch::Sender<GallerySnapshot>, index: &PhotoIndex) {
    snapshots.send_replace(index.snapshot());
}
