//! Parallel cutout fetch demo
//!
//! Mirrors the three ways of getting the same cutout data and times each:
//! 1. The conventional cutout web API, one target at a time
//! 2. Direct cube reads, one target at a time
//! 3. Direct cube reads fanned out across all available workers
//!
//! Usage: CUTOUT_CATALOG=targets.csv cargo run --release --example parallel_fetch

use cutout_dl::catalog::{dedup_by_id, filter_by_depth, load_catalog_file};
use cutout_dl::cutout::{ApiCutoutFetcher, CubeCutoutFetcher, CubeGeometry, CutoutFetcher};
use cutout_dl::{Config, Dispatcher, SectorLookupClient, SkyCoord};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Minimum transit depth (ppm) for a target to be worth a cutout
const MIN_DEPTH_PPM: f64 = 5000.0;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let catalog_path =
        std::env::var("CUTOUT_CATALOG").expect("Set CUTOUT_CATALOG to a catalog CSV path");

    let config = Config::default();
    config.validate()?;
    let workers = config.effective_workers();

    println!("═══════════════════════════════════════════════════════════");
    println!("  cutout-dl Parallel Fetch");
    println!("═══════════════════════════════════════════════════════════");
    println!("  Catalog: {}", catalog_path);
    println!("  Sector: {}", config.fetch.sector);
    println!("  Workers: {}", workers);
    println!("═══════════════════════════════════════════════════════════");

    // Load the candidate table, keep the deep transits, make IDs unique
    let rows = load_catalog_file(Path::new(&catalog_path))?;
    let rows = dedup_by_id(filter_by_depth(rows, MIN_DEPTH_PPM));
    println!("  {} targets after depth filter and dedup", rows.len());

    // One sector lookup per target builds the shared read-only index
    let lookup = SectorLookupClient::from_config(&config);
    let index = Arc::new(lookup.build_target_index(&rows, config.fetch.sector).await?);

    // Full-frame geometry of the sector's cubes; the plate scale is the
    // instrument's nominal 21 arcsec/pixel
    let geometry = CubeGeometry {
        rows: 2078,
        cols: 2136,
        frames: 100,
        bytes_per_pixel: 4,
        data_offset: 2880,
        ref_row: 1024.0,
        ref_col: 1024.0,
        ref_coord: SkyCoord::new(64.0, -68.0),
        scale_deg_per_px: 21.0 / 3600.0,
    };

    let api_fetcher: Arc<dyn CutoutFetcher> = Arc::new(ApiCutoutFetcher::from_config(&config));
    let cube_fetcher: Arc<dyn CutoutFetcher> =
        Arc::new(CubeCutoutFetcher::from_config(&config, geometry));
    let out_dir = config.fetch.output_dir.clone();

    // Method 1: cutout web API, sequential
    let start = Instant::now();
    for id in index.ids() {
        if let Some(target) = index.get(id) {
            api_fetcher.fetch_and_save(target, &out_dir).await?;
        }
    }
    println!("  Method 1 (web API, sequential):  {:.2?}", start.elapsed());

    // Method 2: cube reads, sequential
    let start = Instant::now();
    for id in index.ids() {
        if let Some(target) = index.get(id) {
            cube_fetcher.fetch_and_save(target, &out_dir).await?;
        }
    }
    println!("  Method 2 (cube, sequential):     {:.2?}", start.elapsed());

    // Method 3: cube reads, partitioned across workers
    let dispatcher = Dispatcher::new(&config);
    let report = dispatcher
        .run_targets(
            index.ids().collect(),
            workers,
            Arc::clone(&index),
            Arc::clone(&cube_fetcher),
            out_dir,
        )
        .await?;
    println!(
        "  Method 3 (cube, {} workers):      {:.2?}",
        workers, report.elapsed
    );
    println!(
        "  completed={} failed={} skipped={}",
        report.completed(),
        report.failed(),
        report.skipped()
    );

    Ok(())
}
