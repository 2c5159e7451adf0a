//! One ingestion pass: enumerate the source, fan out thumbnail fetches with a
//! bounded in-flight window, and stream completions to the gallery owner loop
//! in whatever order they finish.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::select;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::events::IngestEvent;
use crate::record::{PhotoRecord, Thumbnail};
use crate::source::{AssetInfo, AssetSource, THUMBNAIL_EDGE};

const MAX_IN_FLIGHT: usize = 8;

pub async fn run(
    source: Arc<dyn AssetSource>,
    pass: u64,
    events: Sender<IngestEvent>,
    cancel: CancellationToken,
) -> Result<()> {
    let assets = source
        .enumerate()
        .await
        .context("enumerating photo library")?;
    info!(pass, total = assets.len(), "enumeration complete");

    let ids = assets.iter().map(|a| a.id.clone()).collect();
    if events
        .send(IngestEvent::PassStarted { pass, ids })
        .await
        .is_err()
    {
        // Owner loop is gone; nothing to ingest for.
        return Ok(());
    }

    let mut fetches: JoinSet<(AssetInfo, Option<Thumbnail>)> = JoinSet::new();
    let mut queue = assets.into_iter();
    loop {
        while fetches.len() < MAX_IN_FLIGHT {
            let Some(info) = queue.next() else { break };
            let source = Arc::clone(&source);
            fetches.spawn(async move {
                let thumb = source.fetch_thumbnail(&info.id, THUMBNAIL_EDGE).await;
                (info, thumb)
            });
        }
        if fetches.is_empty() {
            break;
        }

        select! {
            _ = cancel.cancelled() => {
                debug!(pass, "cancel received; abandoning ingestion pass");
                break;
            }

            Some(join_res) = fetches.join_next() => {
                let Ok((info, thumb)) = join_res else { continue };
                let event = match thumb {
                    Some(thumbnail) => IngestEvent::Ingested {
                        pass,
                        record: into_record(info, thumbnail),
                    },
                    None => IngestEvent::Skipped { pass, id: info.id },
                };
                if events.send(event).await.is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}

fn into_record(info: AssetInfo, thumbnail: Thumbnail) -> PhotoRecord {
    PhotoRecord {
        id: info.id,
        thumbnail,
        creation_date: info.creation_date,
        location: info.location,
        pixel_width: info.pixel_width,
        pixel_height: info.pixel_height,
        is_favorite: info.is_favorite,
        is_selected: false,
    }
}
