//! Bing Maps aerial imagery provider
//!
//! Session-oriented: one REST call to the imagery-metadata endpoint
//! yields the tile URL template, subdomain list, tile size and maximum
//! zoom for the session. The same bootstrap fetches the service's
//! placeholder tile (served for any quadkey without imagery) so later
//! responses can be compared against it byte-for-byte.

use super::http::{AsyncHttpClient, HttpError};
use super::types::{TileFetchError, TileFetcher};
use image::RgbaImage;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Imagery-metadata REST endpoint; the API key is appended.
pub const IMAGERY_METADATA_URL: &str =
    "https://dev.virtualearth.net/REST/V1/Imagery/Metadata/Aerial?output=json&key=";

/// A quadkey no real tile ever has (level 20, all ones); the service
/// answers it with the placeholder image.
pub const PLACEHOLDER_QUADKEY: &str = "11111111111111111111";

/// Session bootstrap failures. Fatal: retrieval never starts without a
/// usable session.
#[derive(Debug, Error)]
pub enum ServiceMetadataError {
    /// The metadata or placeholder request itself failed
    #[error("imagery metadata request failed: {0}")]
    Http(#[from] HttpError),
    /// The endpoint answered with something we cannot use
    #[error("malformed imagery metadata: {0}")]
    Malformed(String),
}

/// Immutable per-session service metadata.
///
/// Fetched once at session start and passed by reference afterwards;
/// never a hidden global.
#[derive(Debug, Clone)]
pub struct ImagerySession {
    tile_url_template: String,
    subdomains: Vec<String>,
    tile_size: u32,
    max_zoom: u8,
}

impl ImagerySession {
    /// Builds a session from explicit parts, for tests or alternative
    /// tile endpoints. The template must contain the `{subdomain}` and
    /// `{quadkey}` placeholders.
    pub fn new(
        tile_url_template: String,
        subdomains: Vec<String>,
        tile_size: u32,
        max_zoom: u8,
    ) -> Self {
        Self {
            tile_url_template,
            subdomains,
            tile_size,
            max_zoom,
        }
    }

    pub fn tile_url_template(&self) -> &str {
        &self.tile_url_template
    }

    pub fn subdomains(&self) -> &[String] {
        &self.subdomains
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    /// Expands the URL template for one quadkey.
    ///
    /// Always uses the first advertised subdomain; the service treats
    /// them as interchangeable mirrors.
    fn tile_url(&self, quadkey: &str) -> String {
        self.tile_url_template
            .replace("{subdomain}", &self.subdomains[0])
            .replace("{quadkey}", quadkey)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataResponse {
    resource_sets: Vec<ResourceSet>,
}

#[derive(Deserialize)]
struct ResourceSet {
    resources: Vec<ImageryResource>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageryResource {
    image_url: String,
    image_url_subdomains: Vec<String>,
    image_height: u32,
    zoom_max: u8,
}

/// Bing Maps tile service.
///
/// Downloads aerial tiles using quadkey-based URLs discovered through the
/// imagery-metadata endpoint.
pub struct BingTileService<C: AsyncHttpClient> {
    http: C,
    session: ImagerySession,
    placeholder_tile: Vec<u8>,
}

impl<C: AsyncHttpClient> BingTileService<C> {
    /// Establishes a session: fetches imagery metadata for `api_key`,
    /// then the placeholder tile used for missing-imagery detection.
    pub async fn connect(http: C, api_key: &str) -> Result<Self, ServiceMetadataError> {
        let url = format!("{}{}", IMAGERY_METADATA_URL, api_key);
        let body = http.get(&url).await?;
        let session = parse_session(&body)?;

        info!(
            max_zoom = session.max_zoom(),
            tile_size = session.tile_size(),
            subdomains = session.subdomains().len(),
            "Imagery session established"
        );

        Self::from_session(http, session).await
    }

    /// Establishes a session from already-known metadata, fetching only
    /// the placeholder tile.
    pub async fn from_session(
        http: C,
        session: ImagerySession,
    ) -> Result<Self, ServiceMetadataError> {
        let placeholder_tile = http.get(&session.tile_url(PLACEHOLDER_QUADKEY)).await?;
        debug!(
            bytes = placeholder_tile.len(),
            "Cached placeholder tile for missing-imagery detection"
        );

        Ok(Self {
            http,
            session,
            placeholder_tile,
        })
    }

    /// The session metadata this service was built from.
    pub fn session(&self) -> &ImagerySession {
        &self.session
    }

    /// Whether a raw tile response is the service's placeholder image.
    pub fn is_placeholder(&self, bytes: &[u8]) -> bool {
        bytes == self.placeholder_tile
    }
}

fn parse_session(body: &[u8]) -> Result<ImagerySession, ServiceMetadataError> {
    let response: MetadataResponse = serde_json::from_slice(body)
        .map_err(|e| ServiceMetadataError::Malformed(e.to_string()))?;

    let resource = response
        .resource_sets
        .first()
        .and_then(|set| set.resources.first())
        .ok_or_else(|| ServiceMetadataError::Malformed("no imagery resource".to_string()))?;

    if resource.image_url_subdomains.is_empty() {
        return Err(ServiceMetadataError::Malformed(
            "imagery resource lists no subdomains".to_string(),
        ));
    }

    Ok(ImagerySession::new(
        resource.image_url.clone(),
        resource.image_url_subdomains.clone(),
        resource.image_height,
        resource.zoom_max,
    ))
}

impl<C: AsyncHttpClient> TileFetcher for BingTileService<C> {
    async fn fetch_tile(&self, quadkey: &str) -> Result<RgbaImage, TileFetchError> {
        let url = self.session.tile_url(quadkey);
        let bytes = self
            .http
            .get(&url)
            .await
            .map_err(|e| TileFetchError::Unavailable(e.to_string()))?;

        if self.is_placeholder(&bytes) {
            debug!(quadkey = quadkey, "Provider served the placeholder tile");
            return Err(TileFetchError::Placeholder);
        }

        let image = image::load_from_memory(&bytes)
            .map_err(|e| TileFetchError::Unavailable(format!("undecodable tile: {}", e)))?
            .to_rgba8();

        Ok(image)
    }

    fn tile_size(&self) -> u32 {
        self.session.tile_size
    }

    fn max_zoom(&self) -> u8 {
        self.session.max_zoom
    }
}
