//! Skystitch - maximal-resolution aerial imagery retrieval
//!
//! Converts a geographic bounding box into the finest composite raster
//! the tile service can supply: pick the highest zoom level whose pixel
//! area fits the budget and whose tiles all exist, fetch the covering
//! tiles, stitch them into one image, and crop to the exact box.
//!
//! # Example
//!
//! ```ignore
//! use skystitch::config::RetrievalConfig;
//! use skystitch::coord::GeoPoint;
//! use skystitch::geo::BoundingBox;
//! use skystitch::provider::{AsyncReqwestClient, BingTileService};
//! use skystitch::retrieval::ImageRetriever;
//! use std::sync::Arc;
//!
//! let http = AsyncReqwestClient::new()?;
//! let service = BingTileService::connect(http, &api_key).await?;
//! let retriever = ImageRetriever::new(Arc::new(service), RetrievalConfig::default());
//!
//! let bbox = BoundingBox::around(GeoPoint::new(48.994435, 12.111247), 0.15);
//! let retrieved = retriever.retrieve(&bbox).await?;
//! println!("level {}", retrieved.level);
//! ```

pub mod config;
pub mod coord;
pub mod geo;
pub mod logging;
pub mod output;
pub mod provider;
pub mod retrieval;

/// Version of the skystitch library and CLI.
///
/// Synchronized across the workspace; injected from `Cargo.toml` at
/// compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
