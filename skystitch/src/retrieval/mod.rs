//! Level selection and tile stitching
//!
//! [`ImageRetriever`] walks candidate zoom levels from the provider's
//! maximum down to 1 and returns the first level that yields a complete
//! composite within the pixel budget, cropped to the exact bounding box.
//! Within one level all tile fetches fan out concurrently; the first
//! failed or placeholder tile cancels its in-flight siblings and the
//! search falls through to the next coarser level.
//!
//! # Two-phase pipeline per level
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │ Phase 1: fan-out                                       │
//! │   JoinSet of tile fetches, Semaphore-bounded,          │
//! │   CancellationToken wired to every task                │
//! └───────────────────────────┬────────────────────────────┘
//!                             ▼
//! ┌────────────────────────────────────────────────────────┐
//! │ Phase 2: deterministic assembly                        │
//! │   paste row-major into one canvas, then crop to the    │
//! │   bounding box's pixel rectangle                       │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! Every buffer is owned by the single attempt that allocated it; nothing
//! is shared or reused across levels or requests.

mod error;

pub use error::RetrievalError;

use crate::config::RetrievalConfig;
use crate::coord::{
    geo_to_pixel, pixel_to_tile, tile_to_pixel, tile_to_quadkey, PixelPoint, TileIndex, MIN_LEVEL,
};
use crate::geo::BoundingBox;
use crate::provider::{TileFetchError, TileFetcher};
use image::{imageops, RgbaImage};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A successfully retrieved composite and the zoom level it came from.
#[derive(Debug, Clone)]
pub struct RetrievedImage {
    /// The stitched composite, cropped to the requested bounding box
    pub image: RgbaImage,
    /// Zoom level the tiles were fetched at
    pub level: u8,
}

/// The bounding box's pixel-space footprint at one zoom level.
struct LevelFootprint {
    top_left: PixelPoint,
    span_x: u64,
    span_y: u64,
    first_tile: TileIndex,
    last_tile: TileIndex,
}

impl LevelFootprint {
    fn of(bbox: &BoundingBox, level: u8) -> Self {
        let a = geo_to_pixel(bbox.upper_left, level);
        let b = geo_to_pixel(bbox.lower_right, level);

        // Normalise: corner order in pixel space is not guaranteed by the
        // geographic corner order.
        let (x1, x2) = (a.x.min(b.x), a.x.max(b.x));
        let (y1, y2) = (a.y.min(b.y), a.y.max(b.y));

        let top_left = PixelPoint { x: x1, y: y1 };
        Self {
            top_left,
            span_x: x2 - x1,
            span_y: y2 - y1,
            first_tile: pixel_to_tile(top_left),
            last_tile: pixel_to_tile(PixelPoint { x: x2, y: y2 }),
        }
    }

    fn columns(&self) -> u32 {
        self.last_tile.x - self.first_tile.x + 1
    }

    fn rows(&self) -> u32 {
        self.last_tile.y - self.first_tile.y + 1
    }
}

/// Maximal-resolution image retriever.
///
/// Generic over the [`TileFetcher`] boundary so the level search and
/// stitching can be exercised without any network I/O.
pub struct ImageRetriever<F: TileFetcher + 'static> {
    fetcher: Arc<F>,
    config: RetrievalConfig,
}

impl<F: TileFetcher + 'static> ImageRetriever<F> {
    pub fn new(fetcher: Arc<F>, config: RetrievalConfig) -> Self {
        Self { fetcher, config }
    }

    /// Retrieves the finest-resolution composite covering `bbox`.
    ///
    /// Levels are tried strictly from the provider's maximum down to 1;
    /// the first level whose tiles all exist and whose pixel area fits
    /// the configured budget wins.
    pub async fn retrieve(&self, bbox: &BoundingBox) -> Result<RetrievedImage, RetrievalError> {
        let max_zoom = self.fetcher.max_zoom();

        for level in (MIN_LEVEL..=max_zoom).rev() {
            if let Some(image) = self.try_level(bbox, level).await? {
                info!(
                    level = level,
                    width = image.width(),
                    height = image.height(),
                    "Retrieval complete"
                );
                return Ok(RetrievedImage { image, level });
            }
        }

        Err(RetrievalError::NoLevelSucceeded { max_zoom })
    }

    /// Attempts one candidate level.
    ///
    /// `Ok(None)` means "recoverable, try the next coarser level"; the
    /// only error is the fatal degenerate-box case.
    async fn try_level(
        &self,
        bbox: &BoundingBox,
        level: u8,
    ) -> Result<Option<RgbaImage>, RetrievalError> {
        let footprint = LevelFootprint::of(bbox, level);

        // A span of <= 1 pixel cannot improve at any other level worth
        // trying; fail the whole request.
        if footprint.span_x <= 1 || footprint.span_y <= 1 {
            warn!(level = level, "Bounding box degenerates to a single pixel");
            return Err(RetrievalError::DegenerateBoundingBox);
        }

        let area = footprint.span_x * footprint.span_y;
        if area > self.config.max_pixels() {
            debug!(
                level = level,
                area = area,
                budget = self.config.max_pixels(),
                "Level exceeds pixel budget, trying next coarser level"
            );
            return Ok(None);
        }

        debug!(
            level = level,
            columns = footprint.columns(),
            rows = footprint.rows(),
            "Fetching tile range"
        );

        let tiles = match self.fetch_level_tiles(&footprint, level).await {
            Some(tiles) => tiles,
            None => return Ok(None),
        };

        let composite = assemble(
            &tiles,
            footprint.columns(),
            footprint.rows(),
            self.fetcher.tile_size(),
        );

        // Translate the bounding box into the composite's local space.
        let origin = tile_to_pixel(footprint.first_tile);
        let cropped = imageops::crop_imm(
            &composite,
            (footprint.top_left.x - origin.x) as u32,
            (footprint.top_left.y - origin.y) as u32,
            footprint.span_x as u32,
            footprint.span_y as u32,
        )
        .to_image();

        Ok(Some(cropped))
    }

    /// Phase 1: fan out every tile fetch for the level.
    ///
    /// Returns the tiles in row-major order, or `None` when any tile was
    /// unavailable (after cancelling the remaining in-flight fetches).
    async fn fetch_level_tiles(
        &self,
        footprint: &LevelFootprint,
        level: u8,
    ) -> Option<Vec<RgbaImage>> {
        let columns = footprint.columns();
        let count = columns as usize * footprint.rows() as usize;
        let tile_size = self.fetcher.tile_size();

        let cancel = CancellationToken::new();
        let semaphore = Arc::new(Semaphore::new(self.config.parallel_fetches()));
        let mut fetches: JoinSet<(usize, Result<RgbaImage, TileFetchError>)> = JoinSet::new();

        for index in 0..count {
            let tile = TileIndex {
                x: footprint.first_tile.x + (index as u32 % columns),
                y: footprint.first_tile.y + (index as u32 / columns),
            };
            let quadkey = tile_to_quadkey(tile, level);
            let fetcher = Arc::clone(&self.fetcher);
            let cancel = cancel.clone();
            let semaphore = Arc::clone(&semaphore);

            fetches.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (index, Err(TileFetchError::Cancelled)),
                };
                if cancel.is_cancelled() {
                    return (index, Err(TileFetchError::Cancelled));
                }
                tokio::select! {
                    _ = cancel.cancelled() => (index, Err(TileFetchError::Cancelled)),
                    result = fetcher.fetch_tile(&quadkey) => (index, result),
                }
            });
        }

        let mut tiles: Vec<Option<RgbaImage>> = (0..count).map(|_| None).collect();
        let mut level_failed = false;

        while let Some(joined) = fetches.join_next().await {
            let (index, result) = match joined {
                Ok(outcome) => outcome,
                Err(e) if e.is_cancelled() => continue,
                Err(e) => {
                    warn!(level = level, error = %e, "Tile fetch task panicked");
                    cancel.cancel();
                    level_failed = true;
                    continue;
                }
            };

            match result {
                Ok(image) if image.width() == tile_size && image.height() == tile_size => {
                    tiles[index] = Some(image);
                }
                Ok(image) => {
                    warn!(
                        level = level,
                        width = image.width(),
                        height = image.height(),
                        expected = tile_size,
                        "Tile has unexpected dimensions, abandoning level"
                    );
                    cancel.cancel();
                    level_failed = true;
                }
                Err(TileFetchError::Cancelled) => {}
                Err(e) => {
                    debug!(level = level, error = %e, "Tile unavailable, abandoning level");
                    cancel.cancel();
                    level_failed = true;
                }
            }
        }

        if level_failed {
            return None;
        }

        // All fetches reported success, so every slot is filled.
        tiles.into_iter().collect()
    }
}

/// Phase 2: paste row-major tiles into one canvas.
fn assemble(tiles: &[RgbaImage], columns: u32, rows: u32, tile_size: u32) -> RgbaImage {
    let mut canvas = RgbaImage::new(columns * tile_size, rows * tile_size);
    for (index, tile) in tiles.iter().enumerate() {
        let x = (index as u32 % columns) * tile_size;
        let y = (index as u32 / columns) * tile_size;
        imageops::replace(&mut canvas, tile, x as i64, y as i64);
    }
    canvas
}
