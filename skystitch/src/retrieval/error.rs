//! Error types for imagery retrieval.

use thiserror::Error;

/// Fatal retrieval outcomes.
///
/// Per-tile and per-level failures never surface here; they degrade the
/// search to the next coarser level internally. Only conditions that end
/// the whole request escape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrievalError {
    /// The bounding box spans at most one pixel, so no level can produce
    /// a usable image.
    #[error("bounding box collapses to a single pixel; no valid imagery for this box")]
    DegenerateBoundingBox,
    /// Every level from the finest down to 1 was skipped or abandoned.
    #[error("no zoom level from {max_zoom} down to 1 produced a complete image")]
    NoLevelSucceeded { max_zoom: u8 },
}
