//! Skystitch CLI - Command-line interface
//!
//! Retrieves the maximal-resolution aerial composite for a centre point
//! and writes it to the output directory.

use clap::Parser;
use skystitch::config::RetrievalConfig;
use skystitch::coord::GeoPoint;
use skystitch::geo::{BoundingBox, DEFAULT_ARC_LENGTH_KM};
use skystitch::logging::init_logging;
use skystitch::output::OutputWriter;
use skystitch::provider::{AsyncReqwestClient, BingTileService};
use skystitch::retrieval::{ImageRetriever, RetrievalError};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::error;

#[derive(Parser)]
#[command(name = "skystitch", version = skystitch::VERSION)]
#[command(about = "Retrieve maximal-resolution aerial imagery around a point", long_about = None)]
struct Args {
    /// Latitude of the centre point in decimal degrees
    #[arg(allow_negative_numbers = true)]
    lat: f64,

    /// Longitude of the centre point in decimal degrees
    #[arg(allow_negative_numbers = true)]
    lon: f64,

    /// Arc-length radius around the centre, in kilometres
    #[arg(long, default_value_t = DEFAULT_ARC_LENGTH_KM)]
    radius: f64,

    /// Output directory for retrieved imagery
    #[arg(long, default_value = "./output")]
    output: PathBuf,

    /// Bing Maps API key
    #[arg(long, conflicts_with = "api_key_file")]
    api_key: Option<String>,

    /// File containing the Bing Maps API key on its first line
    #[arg(long, default_value = "apikey.txt")]
    api_key_file: PathBuf,

    /// Maximum composite area in pixels before a level is skipped
    #[arg(long)]
    max_pixels: Option<u64>,

    /// Maximum number of concurrent tile fetches
    #[arg(long, default_value_t = 32)]
    parallel: usize,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if !(-90.0..=90.0).contains(&args.lat) {
        eprintln!("Error: latitude must be between -90 and 90");
        process::exit(2);
    }
    if !(-180.0..=180.0).contains(&args.lon) {
        eprintln!("Error: longitude must be between -180 and 180");
        process::exit(2);
    }

    let logging_guard = match init_logging("logs", "skystitch.log") {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: failed to initialize logging: {}", e);
            process::exit(2);
        }
    };

    let code = run(args).await;
    // Flush the file writer before terminating
    drop(logging_guard);
    process::exit(code);
}

async fn run(args: Args) -> i32 {
    let api_key = match read_api_key(&args) {
        Ok(key) => key,
        Err(e) => {
            error!(error = %e, "Could not obtain an API key");
            return 2;
        }
    };

    let http = match AsyncReqwestClient::new() {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to create HTTP client");
            return 2;
        }
    };

    let service = match BingTileService::connect(http, &api_key).await {
        Ok(service) => service,
        Err(e) => {
            error!(error = %e, "Imagery session bootstrap failed");
            return 2;
        }
    };

    let mut config = RetrievalConfig::new().with_parallel_fetches(args.parallel);
    if let Some(max_pixels) = args.max_pixels {
        config = config.with_max_pixels(max_pixels);
    }

    let center = GeoPoint::new(args.lat, args.lon);
    let bbox = BoundingBox::around(center, args.radius);
    let retriever = ImageRetriever::new(Arc::new(service), config);

    let retrieved = match retriever.retrieve(&bbox).await {
        Ok(retrieved) => retrieved,
        Err(RetrievalError::DegenerateBoundingBox) => {
            println!("Cannot find valid aerial imagery for the given bounding box.");
            return 1;
        }
        Err(e @ RetrievalError::NoLevelSucceeded { .. }) => {
            println!(
                "Cannot retrieve the desired image: {} \
                 (possible reason: expected tile imagery does not exist).",
                e
            );
            return 1;
        }
    };

    let writer = OutputWriter::new(&args.output);
    match writer.write_jpeg(&retrieved) {
        Ok(path) => {
            println!(
                "Successfully retrieved imagery at level {}: {}",
                retrieved.level,
                path.display()
            );
            0
        }
        Err(e) => {
            error!(error = %e, "Failed to write output image");
            1
        }
    }
}

fn read_api_key(args: &Args) -> Result<String, String> {
    if let Some(key) = &args.api_key {
        return Ok(key.clone());
    }

    let contents = std::fs::read_to_string(&args.api_key_file).map_err(|e| {
        format!(
            "could not read API key file {}: {}",
            args.api_key_file.display(),
            e
        )
    })?;

    let key = contents.lines().next().unwrap_or("").trim().to_string();
    if key.is_empty() {
        return Err(format!(
            "API key file {} is empty",
            args.api_key_file.display()
        ));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["skystitch", "48.994435", "12.111247"]);
        assert_eq!(args.radius, DEFAULT_ARC_LENGTH_KM);
        assert_eq!(args.output, PathBuf::from("./output"));
        assert_eq!(args.parallel, 32);
        assert!(args.api_key.is_none());
        assert!(args.max_pixels.is_none());
    }

    #[test]
    fn test_negative_coordinates_parse_as_values() {
        let args = Args::parse_from(["skystitch", "--", "-33.8688", "151.2093"]);
        assert!((args.lat + 33.8688).abs() < 1e-9);
    }
}
