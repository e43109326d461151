//! Provider-facing types and traits

use image::RgbaImage;
use std::future::Future;
use thiserror::Error;

/// Why a tile could not be produced.
///
/// All three variants mean the same thing to the level search: the
/// candidate level cannot be completed and the next coarser one should
/// be tried.
#[derive(Debug, Clone, Error)]
pub enum TileFetchError {
    /// Network failure, HTTP error status, or undecodable payload
    #[error("tile unavailable: {0}")]
    Unavailable(String),
    /// The provider returned its sentinel "no imagery here" tile
    #[error("provider returned the placeholder tile")]
    Placeholder,
    /// The fetch was cancelled because a sibling fetch already failed
    #[error("tile fetch cancelled")]
    Cancelled,
}

/// Trait for tile image sources.
///
/// Implementors resolve a quadkey to a decoded square pixel buffer of
/// side [`tile_size`](TileFetcher::tile_size). The retriever is generic
/// over this trait; tests drive it with in-memory fetchers.
pub trait TileFetcher: Send + Sync {
    /// Fetches and decodes the tile identified by `quadkey`.
    ///
    /// Returns [`TileFetchError::Placeholder`] when the provider serves
    /// its "no data" sentinel for these coordinates.
    fn fetch_tile(
        &self,
        quadkey: &str,
    ) -> impl Future<Output = Result<RgbaImage, TileFetchError>> + Send;

    /// Side length in pixels of every tile this fetcher returns.
    fn tile_size(&self) -> u32;

    /// Finest zoom level the backing service advertises.
    fn max_zoom(&self) -> u8;
}
