//! End-to-end fetch tests against mock remote services
//!
//! Drives the full pipeline — catalog rows, sector lookup, partitioning,
//! parallel dispatch — against wiremock stand-ins for the cutout API and the
//! cube store, and checks the artifacts on disk.

mod common;

use common::{mount_cutout_api, mount_lookup, test_config};
use cutout_dl::catalog::{dedup_by_id, filter_by_depth, load_catalog};
use cutout_dl::cutout::{ApiCutoutFetcher, CubeCutoutFetcher, CubeGeometry};
use cutout_dl::{Dispatcher, Sector, SectorLookupClient, SkyCoord, Target, TargetId, TargetIndex};
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CATALOG: &str = "\
tic_id,ra,dec,depth,period
261136679,63.3739396,-69.226822,5000.0,4.13
38846515,104.733036,-30.226852,18000.0,2.85
150428135,111.289059,-43.616042,7500.0,0.94
";

const CUTOUT_BYTES: &[u8] = b"PK\x03\x04 fake cutout payload";

#[tokio::test]
async fn full_pipeline_produces_one_artifact_per_target() {
    let server = MockServer::start().await;
    mount_lookup(&server, &[("0055", "3", "2")]).await;
    mount_cutout_api(&server, CUTOUT_BYTES).await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server.uri(), dir.path());

    let rows = load_catalog(CATALOG.as_bytes()).unwrap();
    let rows = dedup_by_id(filter_by_depth(rows, 5000.0));

    let lookup = SectorLookupClient::from_config(&config);
    let index = Arc::new(
        lookup
            .build_target_index(&rows, config.fetch.sector)
            .await
            .unwrap(),
    );

    let dispatcher = Dispatcher::new(&config);
    let report = dispatcher
        .run_targets(
            index.ids().collect(),
            config.effective_workers(),
            Arc::clone(&index),
            Arc::new(ApiCutoutFetcher::from_config(&config)),
            config.fetch.output_dir.clone(),
        )
        .await
        .unwrap();

    assert!(report.all_succeeded());
    assert_eq!(report.completed(), 3);
    assert_eq!(report.outcomes.len(), 2, "one outcome per worker");

    for id in [261136679u64, 38846515, 150428135] {
        let artifact = dir.path().join(format!("{id}.zip"));
        assert_eq!(std::fs::read(&artifact).unwrap(), CUTOUT_BYTES);
    }
}

#[tokio::test]
async fn one_failing_target_does_not_stop_the_rest() {
    let server = MockServer::start().await;
    mount_lookup(&server, &[("0055", "3", "2")]).await;

    // The middle target's cutout request fails; the catch-all succeeds
    Mock::given(method("GET"))
        .and(path("/astrocut"))
        .and(query_param("ra", "104.733036"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_cutout_api(&server, CUTOUT_BYTES).await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server.uri(), dir.path());

    let rows = load_catalog(CATALOG.as_bytes()).unwrap();
    let lookup = SectorLookupClient::from_config(&config);
    let index = Arc::new(
        lookup
            .build_target_index(&rows, config.fetch.sector)
            .await
            .unwrap(),
    );

    let dispatcher = Dispatcher::new(&config);
    let report = dispatcher
        .run_targets(
            index.ids().collect(),
            2,
            Arc::clone(&index),
            Arc::new(ApiCutoutFetcher::from_config(&config)),
            config.fetch.output_dir.clone(),
        )
        .await
        .unwrap();

    assert_eq!(report.completed(), 2);
    assert_eq!(report.failed(), 1);
    assert!(dir.path().join("261136679.zip").exists());
    assert!(dir.path().join("150428135.zip").exists());
    assert!(!dir.path().join("38846515.zip").exists());
}

#[tokio::test]
async fn cube_fetcher_reads_the_expected_byte_ranges() {
    let server = MockServer::start().await;

    // A 2-frame, 4x4, 1-byte-per-pixel cube; the target sits on the
    // reference pixel (2,2), so a size-2 cutout covers rows 1-2, cols 1-2
    let geometry = CubeGeometry {
        rows: 4,
        cols: 4,
        frames: 2,
        bytes_per_pixel: 1,
        data_offset: 0,
        ref_row: 2.0,
        ref_col: 2.0,
        ref_coord: SkyCoord::new(60.0, -70.0),
        scale_deg_per_px: 1.0,
    };
    let cube_path = "/tess/public/mast/tess-s0055-3-2-cube.fits";

    // Frame 0 band: rows 1-2 of the first frame, bytes 4..=11
    Mock::given(method("GET"))
        .and(path(cube_path))
        .and(header("range", "bytes=4-11"))
        .respond_with(ResponseTemplate::new(206).set_body_bytes((4u8..12).collect::<Vec<u8>>()))
        .mount(&server)
        .await;
    // Frame 1 band: same rows one frame (16 bytes) later
    Mock::given(method("GET"))
        .and(path(cube_path))
        .and(header("range", "bytes=20-27"))
        .respond_with(ResponseTemplate::new(206).set_body_bytes((20u8..28).collect::<Vec<u8>>()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let fetcher = CubeCutoutFetcher::new(server.uri(), Sector::new(55), 2, geometry);
    let target = Target {
        id: TargetId::new(261136679),
        coord: SkyCoord::new(60.0, -70.0),
        channel: cutout_dl::ChannelLabel::new(3, 2),
    };

    let index = Arc::new(TargetIndex::build([target]));
    let config = test_config(&server.uri(), dir.path());
    let dispatcher = Dispatcher::new(&config);
    let report = dispatcher
        .run_targets(
            vec![target.id],
            1,
            index,
            Arc::new(fetcher),
            dir.path().to_path_buf(),
        )
        .await
        .unwrap();

    assert!(report.all_succeeded());
    // Column window sliced locally out of each full-width band
    let pixels = std::fs::read(dir.path().join("261136679.fits")).unwrap();
    assert_eq!(pixels, vec![5, 6, 9, 10, 21, 22, 25, 26]);
}

#[tokio::test]
async fn empty_catalog_dispatch_returns_immediately_with_no_artifacts() {
    let server = MockServer::start().await;
    mount_cutout_api(&server, CUTOUT_BYTES).await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server.uri(), dir.path());

    let dispatcher = Dispatcher::new(&config);
    let report = dispatcher
        .run_targets(
            Vec::new(),
            4,
            Arc::new(TargetIndex::build([])),
            Arc::new(ApiCutoutFetcher::from_config(&config)),
            config.fetch.output_dir.clone(),
        )
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 4);
    assert!(report.all_succeeded());
    assert_eq!(report.completed(), 0);
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}
