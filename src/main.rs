//! Binary entrypoint: ingest a directory-backed photo library, report the
//! index, then keep re-ingesting on library changes until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use photogallery::fs_source::FsAssetSource;
use photogallery::index::GallerySnapshot;
use photogallery::prefs::Preferences;
use photogallery::source::AssetSource;
use photogallery::tasks::gallery;
use photogallery::zoom::{Orientation, ZoomStageController};

/// Simple CLI
#[derive(Debug, Parser)]
#[command(name = "photo-gallery", about = "Photo gallery index over a directory library")]
struct Cli {
    /// Photo library directory
    #[arg(value_name = "DIR")]
    library: PathBuf,

    /// Path to the preferences YAML file
    #[arg(short, long, value_name = "FILE", default_value = "gallery-prefs.yaml")]
    prefs: PathBuf,

    /// Viewport width used for grid layout reporting
    #[arg(long, value_name = "UNITS", default_value_t = 390.0)]
    viewport_width: f32,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("photogallery={}", level).parse().unwrap())
        .add_directive(format!("photo_gallery={}", level).parse().unwrap())
        .add_directive("notify=warn".parse().unwrap());
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let prefs = Preferences::load(&cli.prefs)
        .with_context(|| format!("loading preferences from {}", cli.prefs.display()))?;
    let mut zoom = ZoomStageController::new(
        Orientation::Portrait,
        prefs.zoom_stage_index,
        prefs.grid_item_size,
    );
    zoom.set_viewport_width(cli.viewport_width);
    info!(
        stage = zoom.stage_index(),
        columns = zoom.columns(),
        item_size = zoom.item_size(),
        "grid layout restored"
    );

    let source: Arc<dyn AssetSource> = Arc::new(
        FsAssetSource::new(&cli.library)
            .with_context(|| format!("opening photo library at {}", cli.library.display()))?,
    );

    let (_cmd_tx, cmd_rx) = mpsc::channel(16);
    let (snap_tx, mut snap_rx) = watch::channel(GallerySnapshot::default());
    let cancel = CancellationToken::new();
    let owner = tokio::spawn(gallery::run(source, cmd_rx, snap_tx, cancel.clone()));

    // Wait out the initial ingestion pass, then report the index.
    loop {
        snap_rx
            .changed()
            .await
            .context("gallery task stopped before first pass completed")?;
        let snapshot = snap_rx.borrow_and_update().clone();
        if !snapshot.is_loading {
            info!(
                photos = snapshot.photos.len(),
                years = ?snapshot.sorted_years,
                "library ingested"
            );
            break;
        }
    }

    // Stay up so library changes keep re-ingesting; Ctrl-C ends the session.
    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    cancel.cancel();
    let _ = owner.await;

    Preferences {
        grid_item_size: zoom.item_size(),
        zoom_stage_index: zoom.stage_index(),
    }
    .save(&cli.prefs)
    .context("saving preferences")?;
    Ok(())
}
