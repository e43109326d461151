//! Tile providers and the fetch boundary
//!
//! The retriever only sees the [`TileFetcher`] trait; everything
//! HTTP-shaped lives behind it. [`BingTileService`] is the production
//! implementation, bootstrapped from the imagery-metadata endpoint.

mod bing;
mod http;
mod types;

pub use bing::{
    BingTileService, ImagerySession, ServiceMetadataError, IMAGERY_METADATA_URL,
    PLACEHOLDER_QUADKEY,
};
pub use http::{AsyncHttpClient, AsyncReqwestClient, HttpError};
pub use types::{TileFetchError, TileFetcher};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
