//! End-to-end level-selection scenarios driven through a scripted fetcher.

use image::{Rgba, RgbaImage};
use skystitch::config::RetrievalConfig;
use skystitch::coord::{geo_to_pixel, pixel_to_tile, tile_to_quadkey, GeoPoint, PixelPoint};
use skystitch::geo::BoundingBox;
use skystitch::provider::{TileFetchError, TileFetcher};
use skystitch::retrieval::{ImageRetriever, RetrievalError};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// In-memory fetcher with per-quadkey placeholders and per-level outages.
struct ScriptedFetcher {
    tile_size: u32,
    max_zoom: u8,
    placeholder_quadkeys: HashSet<String>,
    unavailable_levels: HashSet<u8>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    fn new(max_zoom: u8) -> Self {
        Self {
            tile_size: 256,
            max_zoom,
            placeholder_quadkeys: HashSet::new(),
            unavailable_levels: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with_placeholder(mut self, quadkey: String) -> Self {
        self.placeholder_quadkeys.insert(quadkey);
        self
    }

    fn with_unavailable_levels(mut self, levels: impl IntoIterator<Item = u8>) -> Self {
        self.unavailable_levels.extend(levels);
        self
    }

    fn fetched_levels(&self) -> HashSet<u8> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|quadkey| quadkey.len() as u8)
            .collect()
    }
}

impl TileFetcher for ScriptedFetcher {
    async fn fetch_tile(&self, quadkey: &str) -> Result<RgbaImage, TileFetchError> {
        self.calls.lock().unwrap().push(quadkey.to_string());

        let level = quadkey.len() as u8;
        if self.unavailable_levels.contains(&level) {
            return Err(TileFetchError::Unavailable("scripted outage".to_string()));
        }
        if self.placeholder_quadkeys.contains(quadkey) {
            return Err(TileFetchError::Placeholder);
        }
        Ok(RgbaImage::from_pixel(
            self.tile_size,
            self.tile_size,
            Rgba([level, 0, 0, 255]),
        ))
    }

    fn tile_size(&self) -> u32 {
        self.tile_size
    }

    fn max_zoom(&self) -> u8 {
        self.max_zoom
    }
}

fn reference_bbox() -> BoundingBox {
    BoundingBox::around(GeoPoint::new(48.994435, 12.111247), 0.15)
}

/// Pixel spans of the bounding box at a level, normalised the same way
/// the retriever normalises them.
fn spans_at(bbox: &BoundingBox, level: u8) -> (u64, u64) {
    let a = geo_to_pixel(bbox.upper_left, level);
    let b = geo_to_pixel(bbox.lower_right, level);
    (
        a.x.max(b.x) - a.x.min(b.x),
        a.y.max(b.y) - a.y.min(b.y),
    )
}

#[tokio::test]
async fn retrieves_at_max_zoom_when_everything_exists() {
    let fetcher = Arc::new(ScriptedFetcher::new(19));
    let retriever = ImageRetriever::new(Arc::clone(&fetcher), RetrievalConfig::default());

    let bbox = reference_bbox();
    let retrieved = retriever.retrieve(&bbox).await.unwrap();

    assert_eq!(retrieved.level, 19);
    let (span_x, span_y) = spans_at(&bbox, 19);
    assert_eq!(
        retrieved.image.dimensions(),
        (span_x as u32, span_y as u32)
    );
    // Only one level's tiles were ever requested
    assert_eq!(fetcher.fetched_levels(), HashSet::from([19]));
}

#[tokio::test]
async fn budget_excess_selects_next_coarser_level() {
    let bbox = reference_bbox();
    let max_zoom = 19;

    // Pick a budget that rules out the top level but not everything:
    // area quarters per coarser level, so a budget just under the top
    // level's area admits the next one down.
    let (top_x, top_y) = spans_at(&bbox, max_zoom);
    let budget = top_x * top_y - 1;
    let expected = (1..=max_zoom)
        .rev()
        .find(|&level| {
            let (x, y) = spans_at(&bbox, level);
            x * y <= budget
        })
        .unwrap();
    assert!(expected < max_zoom);

    let fetcher = Arc::new(ScriptedFetcher::new(max_zoom));
    let retriever = ImageRetriever::new(
        Arc::clone(&fetcher),
        RetrievalConfig::new().with_max_pixels(budget),
    );

    let retrieved = retriever.retrieve(&bbox).await.unwrap();
    assert_eq!(retrieved.level, expected);
    // The over-budget level was skipped without fetching a single tile
    assert!(!fetcher.fetched_levels().contains(&max_zoom));
}

#[tokio::test]
async fn one_placeholder_tile_abandons_the_whole_level() {
    let bbox = reference_bbox();
    let max_zoom = 19;

    // Find a quadkey inside the covering range at the top level
    let a = geo_to_pixel(bbox.upper_left, max_zoom);
    let b = geo_to_pixel(bbox.lower_right, max_zoom);
    let first = pixel_to_tile(PixelPoint {
        x: a.x.min(b.x),
        y: a.y.min(b.y),
    });
    let last = pixel_to_tile(PixelPoint {
        x: a.x.max(b.x),
        y: a.y.max(b.y),
    });
    let middle = skystitch::coord::TileIndex {
        x: (first.x + last.x) / 2,
        y: (first.y + last.y) / 2,
    };
    let missing = tile_to_quadkey(middle, max_zoom);

    let fetcher = Arc::new(ScriptedFetcher::new(max_zoom).with_placeholder(missing));
    let retriever = ImageRetriever::new(Arc::clone(&fetcher), RetrievalConfig::default());

    let retrieved = retriever.retrieve(&bbox).await.unwrap();
    // The level with the hole was abandoned entirely
    assert_eq!(retrieved.level, max_zoom - 1);
    let (span_x, span_y) = spans_at(&bbox, max_zoom - 1);
    assert_eq!(
        retrieved.image.dimensions(),
        (span_x as u32, span_y as u32)
    );
}

#[tokio::test]
async fn exhausting_every_level_reports_no_level_succeeded() {
    let fetcher = Arc::new(ScriptedFetcher::new(6).with_unavailable_levels(1..=6));
    let retriever = ImageRetriever::new(fetcher, RetrievalConfig::default());

    let result = retriever.retrieve(&reference_bbox()).await;
    assert_eq!(
        result.err(),
        Some(RetrievalError::NoLevelSucceeded { max_zoom: 6 })
    );
}

#[tokio::test]
async fn degenerate_box_beats_unavailable_tiles() {
    // Even with every level down, a collapsed box must report the
    // degenerate outcome, not exhaustion.
    let fetcher = Arc::new(ScriptedFetcher::new(19).with_unavailable_levels(1..=19));
    let retriever = ImageRetriever::new(fetcher, RetrievalConfig::default());

    let bbox = BoundingBox::around(GeoPoint::new(48.0, 12.0), 1e-9);
    let result = retriever.retrieve(&bbox).await;
    assert_eq!(result.err(), Some(RetrievalError::DegenerateBoundingBox));
}

#[tokio::test]
async fn outage_then_budget_compose() {
    let bbox = reference_bbox();
    let max_zoom = 19;

    // Budget admits the top level, but the top two levels are down
    let fetcher = Arc::new(
        ScriptedFetcher::new(max_zoom).with_unavailable_levels([max_zoom, max_zoom - 1]),
    );
    let retriever = ImageRetriever::new(Arc::clone(&fetcher), RetrievalConfig::default());

    let retrieved = retriever.retrieve(&bbox).await.unwrap();
    assert_eq!(retrieved.level, max_zoom - 2);
    assert_eq!(
        fetcher.fetched_levels(),
        HashSet::from([max_zoom, max_zoom - 1, max_zoom - 2])
    );
}
