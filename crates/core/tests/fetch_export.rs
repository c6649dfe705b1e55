//! Fetch-to-CSV integration tests.
//!
//! These tests drive whole commands through `collect` with a mock transport:
//! - TPB search ranking and request parameters
//! - EZTV pagination, dedup and page bounds
//! - EZTV filters (season, 1080p+) and top-seeded selection
//! - Upstream failures aborting the run
//! - Export of the ranked records and what a failed run leaves on disk

use std::path::Path;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;
use tempfile::TempDir;

use torrent_api_core::{
    collect, fetch_and_export, Config, ExportError, ExportTarget, FetchCommand, Resolution,
    RunError, Source, SourceError, Sources, TpbCategory, WriteMode,
    testing::{fixtures, MockTransport},
};

/// Test helper wiring both sources to one mock transport.
struct TestHarness {
    sources: Sources,
    transport: MockTransport,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(Config::default())
    }

    fn with_config(config: Config) -> Self {
        let transport = MockTransport::new();
        let sources = Sources::new(&config, Arc::new(transport.clone()));
        Self { sources, transport }
    }

    /// EZTV paging with small pages so a handful of fixtures spans several.
    fn with_eztv_pages(page_size: u32, max_pages: u32) -> Self {
        let mut config = Config::default();
        config.eztv.page_size = page_size;
        config.eztv.max_pages = max_pages;
        Self::with_config(config)
    }
}

fn tpb_search(query: &str) -> FetchCommand {
    FetchCommand::TpbSearch {
        query: query.to_string(),
        category: TpbCategory::Movies,
        limit: 50,
    }
}

fn eztv_show(season: Option<u32>, min_1080p: bool) -> FetchCommand {
    FetchCommand::EztvShow {
        imdb_id: "tt1442462".to_string(),
        show_name: "The Good Wife".to_string(),
        season,
        min_1080p,
    }
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .expect("Failed to open CSV");
    reader
        .records()
        .map(|r| r.expect("Bad CSV row").iter().map(str::to_string).collect())
        .collect()
}

// =============================================================================
// TPB
// =============================================================================

#[tokio::test]
async fn test_tpb_search_ranks_by_seeders() {
    let harness = TestHarness::new();
    harness
        .transport
        .push_json(json!([
            fixtures::tpb_item("Movie.A.2019.1080p", 50, &fixtures::info_hash(1)),
            fixtures::tpb_item("Movie.B.2021.2160p", 80, &fixtures::info_hash(2)),
            fixtures::tpb_item("Movie.C.2019.720p", 80, &fixtures::info_hash(3)),
        ]))
        .await;

    let output = collect(&harness.sources, &tpb_search("movie")).await.unwrap();

    assert_eq!(output.source, Source::Tpb);
    let titles: Vec<_> = output.records.iter().map(|r| r.title.as_str()).collect();
    // Equal seeders keep upstream order.
    assert_eq!(
        titles,
        vec!["Movie.B.2021.2160p", "Movie.C.2019.720p", "Movie.A.2019.1080p"]
    );

    let years: Vec<_> = output.records.iter().map(|r| r.year).collect();
    assert_eq!(years, vec![Some(2021), Some(2019), Some(2019)]);

    let resolutions: Vec<_> = output.records.iter().map(|r| r.resolution).collect();
    assert_eq!(
        resolutions,
        vec![
            Resolution::Uhd2160,
            Resolution::Hd720,
            Resolution::FullHd1080
        ]
    );

    for record in &output.records {
        let magnet = record.magnet_link.as_deref().unwrap();
        assert!(magnet.starts_with("magnet:?xt=urn:btih:"));
        assert_eq!(record.size, "2.00 GB");
        assert_eq!(record.date.as_deref(), Some("2020-09-13"));
    }
}

#[tokio::test]
async fn test_tpb_search_sends_query_and_category() {
    let harness = TestHarness::new();
    harness.transport.push_json(json!([])).await;

    let command = FetchCommand::TpbSearch {
        query: "  the office ".to_string(),
        category: TpbCategory::Tv,
        limit: 10,
    };
    let output = collect(&harness.sources, &command).await.unwrap();
    assert!(output.records.is_empty());

    let requests = harness.transport.recorded_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, Config::default().tpb.base_url);
    assert_eq!(requests[0].param("q"), Some("the office"));
    assert_eq!(requests[0].param("cat"), Some("208"));
    assert_eq!(output.plan.prefix, "tpb_tv_the_office");
}

#[tokio::test]
async fn test_tpb_no_results_sentinel_is_empty() {
    let harness = TestHarness::new();
    harness
        .transport
        .push_json(json!([{
            "id": "0",
            "name": "No results returned",
            "info_hash": "0000000000000000000000000000000000000000",
            "seeders": "0",
            "leechers": "0"
        }]))
        .await;

    let output = collect(&harness.sources, &tpb_search("zzzz")).await.unwrap();
    assert!(output.records.is_empty());
}

#[tokio::test]
async fn test_tpb_drops_invalid_records_and_keeps_the_rest() {
    let harness = TestHarness::new();
    let mut negative = fixtures::tpb_item("Broken.2019.1080p", 0, &fixtures::info_hash(9));
    negative["seeders"] = json!("-5");
    let mut untitled = fixtures::tpb_item("x", 10, &fixtures::info_hash(8));
    untitled["name"] = json!("");

    harness
        .transport
        .push_json(json!([
            negative,
            fixtures::tpb_item("Good.2020.720p", 7, &fixtures::info_hash(1)),
            untitled,
            "not an object",
        ]))
        .await;

    let output = collect(&harness.sources, &tpb_search("good")).await.unwrap();
    assert_eq!(output.records.len(), 1);
    assert_eq!(output.records[0].title, "Good.2020.720p");
    assert_eq!(output.records[0].seeders, 7);
}

#[tokio::test]
async fn test_tpb_limit_truncates_before_ranking() {
    let harness = TestHarness::new();
    harness
        .transport
        .push_json(json!([
            fixtures::tpb_item("First.2019", 1, &fixtures::info_hash(1)),
            fixtures::tpb_item("Second.2019", 2, &fixtures::info_hash(2)),
            fixtures::tpb_item("Third.2019", 100, &fixtures::info_hash(3)),
        ]))
        .await;

    let command = FetchCommand::TpbSearch {
        query: "x".to_string(),
        category: TpbCategory::Movies,
        limit: 2,
    };
    let output = collect(&harness.sources, &command).await.unwrap();
    let titles: Vec<_> = output.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Second.2019", "First.2019"]);
}

#[tokio::test]
async fn test_tpb_empty_query_is_rejected_without_request() {
    let harness = TestHarness::new();
    let result = collect(&harness.sources, &tpb_search("   ")).await;

    assert!(matches!(result, Err(SourceError::InvalidQuery(_))));
    assert_eq!(harness.transport.request_count().await, 0);
}

#[tokio::test]
async fn test_tpb_malformed_response_aborts() {
    let harness = TestHarness::new();
    harness.transport.push_json(json!(42)).await;

    let result = collect(&harness.sources, &tpb_search("movie")).await;
    assert!(matches!(result, Err(SourceError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_tpb_upstream_error_propagates() {
    let harness = TestHarness::new();
    harness
        .transport
        .push_error(SourceError::Http {
            status: 503,
            body: "unavailable".to_string(),
        })
        .await;

    let result = collect(&harness.sources, &tpb_search("movie")).await;
    assert!(matches!(result, Err(SourceError::Http { status: 503, .. })));
}

// =============================================================================
// EZTV
// =============================================================================

#[tokio::test]
async fn test_eztv_show_ranks_resolution_before_seeds() {
    let harness = TestHarness::new();
    harness
        .transport
        .push_json(fixtures::eztv_page(vec![
            fixtures::eztv_item("Show S01E01 720p", 1, 1, 10, &fixtures::info_hash(1)),
            fixtures::eztv_item("Show S01E01 1080p", 1, 1, 5, &fixtures::info_hash(2)),
        ]))
        .await;

    let output = collect(&harness.sources, &eztv_show(None, false))
        .await
        .unwrap();

    assert_eq!(output.source, Source::Eztv);
    assert_eq!(output.records.len(), 2);
    assert_eq!(output.records[0].resolution, Resolution::FullHd1080);
    assert_eq!(output.records[0].seeders, 5);
    assert_eq!(output.records[1].resolution, Resolution::Hd720);
    assert_eq!(output.records[0].season, Some(1));
    assert_eq!(output.records[0].episode, Some(1));

    let requests = harness.transport.recorded_requests().await;
    assert_eq!(requests[0].param("imdb_id"), Some("1442462"));
}

#[tokio::test]
async fn test_eztv_show_orders_by_season_then_episode() {
    let harness = TestHarness::new();
    harness
        .transport
        .push_json(fixtures::eztv_page(vec![
            fixtures::eztv_item("Show S02E01 1080p", 2, 1, 90, &fixtures::info_hash(1)),
            fixtures::eztv_item("Show S01E02 720p", 1, 2, 1, &fixtures::info_hash(2)),
            fixtures::eztv_item("Show S01E01 480p", 1, 1, 3, &fixtures::info_hash(3)),
        ]))
        .await;

    let output = collect(&harness.sources, &eztv_show(None, false))
        .await
        .unwrap();
    let episodes: Vec<_> = output
        .records
        .iter()
        .map(|r| (r.season, r.episode))
        .collect();
    assert_eq!(
        episodes,
        vec![(Some(1), Some(1)), (Some(1), Some(2)), (Some(2), Some(1))]
    );
}

#[tokio::test]
async fn test_eztv_show_season_and_quality_filters() {
    let harness = TestHarness::new();
    harness
        .transport
        .push_json(fixtures::eztv_page(vec![
            fixtures::eztv_item("Show S01E01 1080p", 1, 1, 5, &fixtures::info_hash(1)),
            fixtures::eztv_item("Show S02E01 720p", 2, 1, 50, &fixtures::info_hash(2)),
            fixtures::eztv_item("Show S02E01 2160p", 2, 1, 8, &fixtures::info_hash(3)),
            fixtures::eztv_item("Show S02E02 1080p", 2, 2, 4, &fixtures::info_hash(4)),
        ]))
        .await;

    let output = collect(&harness.sources, &eztv_show(Some(2), true))
        .await
        .unwrap();

    let titles: Vec<_> = output.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Show S02E01 2160p", "Show S02E02 1080p"]);
    assert_eq!(output.plan.prefix, "eztv_The_Good_Wife_S02_HQ");
}

#[tokio::test]
async fn test_eztv_show_follows_pages_until_short_page() {
    let harness = TestHarness::with_eztv_pages(2, 10);
    harness
        .transport
        .push_json(fixtures::eztv_page(vec![
            fixtures::eztv_item("Show S01E01", 1, 1, 1, &fixtures::info_hash(1)),
            fixtures::eztv_item("Show S01E02", 1, 2, 1, &fixtures::info_hash(2)),
        ]))
        .await;
    harness
        .transport
        .push_json(fixtures::eztv_page(vec![fixtures::eztv_item(
            "Show S01E03",
            1,
            3,
            1,
            &fixtures::info_hash(3),
        )]))
        .await;

    let output = collect(&harness.sources, &eztv_show(None, false))
        .await
        .unwrap();
    assert_eq!(output.records.len(), 3);

    let requests = harness.transport.recorded_requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].param("page"), Some("1"));
    assert_eq!(requests[1].param("page"), Some("2"));
    assert_eq!(requests[1].param("limit"), Some("2"));
}

#[tokio::test]
async fn test_eztv_pagination_is_bounded_by_max_pages() {
    let harness = TestHarness::with_eztv_pages(2, 3);
    harness
        .transport
        .set_fallback(fixtures::eztv_page(vec![
            fixtures::eztv_item("Show S01E01", 1, 1, 1, &fixtures::info_hash(1)),
            fixtures::eztv_item("Show S01E02", 1, 2, 1, &fixtures::info_hash(2)),
        ]))
        .await;

    let output = collect(&harness.sources, &eztv_show(None, false))
        .await
        .unwrap();

    assert_eq!(harness.transport.request_count().await, 3);
    // Every page repeated the same two torrents.
    assert_eq!(output.records.len(), 2);
}

#[tokio::test]
async fn test_eztv_latest_dedups_across_pages() {
    let harness = TestHarness::with_eztv_pages(2, 5);
    for hashes in [[1, 2], [2, 3], [4, 5]] {
        let items = hashes
            .iter()
            .map(|&n| {
                fixtures::eztv_item(
                    &format!("Show S01E{:02}", n),
                    1,
                    n,
                    u64::from(n),
                    &fixtures::info_hash(n),
                )
            })
            .collect();
        harness.transport.push_json(fixtures::eztv_page(items)).await;
    }

    let command = FetchCommand::EztvLatest {
        limit: 4,
        page: 1,
        min_1080p: false,
    };
    let output = collect(&harness.sources, &command).await.unwrap();

    // Upstream order, duplicates removed, cut at the limit.
    let episodes: Vec<_> = output.records.iter().map(|r| r.episode).collect();
    assert_eq!(episodes, vec![Some(1), Some(2), Some(3), Some(4)]);
    assert_eq!(harness.transport.request_count().await, 3);
    assert_eq!(output.plan.prefix, "eztv_latest");
}

#[tokio::test]
async fn test_eztv_latest_min_1080p_keeps_upstream_order() {
    let harness = TestHarness::new();
    harness
        .transport
        .push_json(fixtures::eztv_page(vec![
            fixtures::eztv_item("A S01E01 1080p", 1, 1, 1, &fixtures::info_hash(1)),
            fixtures::eztv_item("B S01E01 720p", 1, 1, 99, &fixtures::info_hash(2)),
            fixtures::eztv_item("C S01E01", 1, 1, 50, &fixtures::info_hash(3)),
            fixtures::eztv_item("D S01E01 4K", 1, 1, 20, &fixtures::info_hash(4)),
        ]))
        .await;

    let command = FetchCommand::EztvLatest {
        limit: 10,
        page: 1,
        min_1080p: true,
    };
    let output = collect(&harness.sources, &command).await.unwrap();
    let titles: Vec<_> = output.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["A S01E01 1080p", "D S01E01 4K"]);
}

#[tokio::test]
async fn test_eztv_top_selects_best_seeded() {
    let harness = TestHarness::new();
    harness
        .transport
        .push_json(fixtures::eztv_page(vec![
            fixtures::eztv_item("Low S01E01", 1, 1, 5, &fixtures::info_hash(1)),
            fixtures::eztv_item("High S01E01", 1, 1, 30, &fixtures::info_hash(2)),
            fixtures::eztv_item("Mid S01E01", 1, 1, 10, &fixtures::info_hash(3)),
        ]))
        .await;

    let command = FetchCommand::EztvTop {
        limit_fetch: 100,
        top_n: 2,
        min_1080p: false,
    };
    let output = collect(&harness.sources, &command).await.unwrap();
    let seeds: Vec<_> = output.records.iter().map(|r| r.seeders).collect();
    assert_eq!(seeds, vec![30, 10]);
    assert_eq!(output.plan.prefix, "eztv_top_2_seeded");
}

#[tokio::test]
async fn test_eztv_failure_mid_pagination_aborts() {
    let harness = TestHarness::with_eztv_pages(2, 5);
    harness
        .transport
        .push_json(fixtures::eztv_page(vec![
            fixtures::eztv_item("Show S01E01", 1, 1, 1, &fixtures::info_hash(1)),
            fixtures::eztv_item("Show S01E02", 1, 2, 1, &fixtures::info_hash(2)),
        ]))
        .await;
    harness.transport.push_error(SourceError::Timeout).await;

    let result = collect(&harness.sources, &eztv_show(None, false)).await;
    assert!(matches!(result, Err(SourceError::Timeout)));
}

#[tokio::test]
async fn test_eztv_malformed_envelope_aborts() {
    let harness = TestHarness::new();
    harness.transport.push_json(json!([])).await;

    let result = collect(&harness.sources, &eztv_show(None, false)).await;
    assert!(matches!(result, Err(SourceError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_eztv_show_without_torrents_is_empty() {
    let harness = TestHarness::new();
    harness
        .transport
        .push_json(json!({"torrents_count": 0, "page": 1, "limit": 100}))
        .await;

    let output = collect(&harness.sources, &eztv_show(Some(1), false))
        .await
        .unwrap();
    assert!(output.records.is_empty());
}

// =============================================================================
// Export
// =============================================================================

fn target(output_dir: &Path, mode: WriteMode) -> ExportTarget {
    ExportTarget {
        output_dir: output_dir.to_path_buf(),
        timestamp: None,
        mode,
    }
}

#[tokio::test]
async fn test_fetch_and_export_writes_ranked_csv() {
    let harness = TestHarness::new();
    harness
        .transport
        .push_json(json!([
            fixtures::tpb_item("Movie.A.2019.1080p", 50, &fixtures::info_hash(1)),
            fixtures::tpb_item("Movie.B.2021.2160p", 80, &fixtures::info_hash(2)),
        ]))
        .await;

    let out_dir = TempDir::new().expect("Failed to create temp dir");
    let summary = fetch_and_export(
        &harness.sources,
        &tpb_search("movie"),
        &target(out_dir.path(), WriteMode::Overwrite),
    )
    .await
    .unwrap();

    assert_eq!(summary.rows, 2);
    assert_eq!(
        summary.path,
        out_dir.path().join("Movies").join("tpb_movies_movie.csv")
    );

    let rows = read_rows(&summary.path);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][0], "Title");
    assert_eq!(rows[1][0], "Movie.B.2021.2160p");
    assert_eq!(rows[1][1], "2021");
    assert_eq!(rows[1][2], "2160p");
    assert_eq!(rows[1][3], "80");
    assert_eq!(rows[2][0], "Movie.A.2019.1080p");
}

#[tokio::test]
async fn test_fetch_and_export_timestamped_name() {
    let harness = TestHarness::new();
    harness.transport.push_json(fixtures::eztv_page(vec![])).await;

    let out_dir = TempDir::new().expect("Failed to create temp dir");
    let mut target = target(out_dir.path(), WriteMode::Overwrite);
    target.timestamp = Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap());

    let command = FetchCommand::EztvLatest {
        limit: 10,
        page: 1,
        min_1080p: false,
    };
    let summary = fetch_and_export(&harness.sources, &command, &target)
        .await
        .unwrap();

    assert_eq!(summary.rows, 0);
    assert_eq!(
        summary.path,
        out_dir
            .path()
            .join("TV_Shows")
            .join("eztv_latest_2024-03-01_09-05-07.csv")
    );
    assert_eq!(read_rows(&summary.path).len(), 1);
}

#[tokio::test]
async fn test_failed_fetch_creates_nothing() {
    let harness = TestHarness::new();
    harness.transport.push_error(SourceError::Timeout).await;

    let root = TempDir::new().expect("Failed to create temp dir");
    let out_dir = root.path().join("Outputs");

    let result = fetch_and_export(
        &harness.sources,
        &tpb_search("movie"),
        &target(&out_dir, WriteMode::Overwrite),
    )
    .await;

    assert!(matches!(result, Err(RunError::Source(SourceError::Timeout))));
    assert!(!out_dir.exists());
}

#[tokio::test]
async fn test_failed_fetch_keeps_previous_file() {
    let harness = TestHarness::new();
    harness
        .transport
        .push_json(json!([fixtures::tpb_item(
            "Movie.2019",
            5,
            &fixtures::info_hash(1)
        )]))
        .await;
    harness.transport.push_json(json!(42)).await;

    let out_dir = TempDir::new().expect("Failed to create temp dir");
    let target = target(out_dir.path(), WriteMode::Overwrite);
    let first = fetch_and_export(&harness.sources, &tpb_search("movie"), &target)
        .await
        .unwrap();
    let before = std::fs::read(&first.path).unwrap();

    let result = fetch_and_export(&harness.sources, &tpb_search("movie"), &target).await;
    assert!(matches!(
        result,
        Err(RunError::Source(SourceError::MalformedResponse(_)))
    ));
    assert_eq!(std::fs::read(&first.path).unwrap(), before);
}

#[tokio::test]
async fn test_failed_write_keeps_previous_file() {
    let harness = TestHarness::new();
    harness
        .transport
        .push_json(json!([fixtures::tpb_item(
            "Movie.2019",
            5,
            &fixtures::info_hash(1)
        )]))
        .await;

    let out_dir = TempDir::new().expect("Failed to create temp dir");
    let movies = out_dir.path().join("Movies");
    std::fs::create_dir_all(&movies).unwrap();
    let path = movies.join("tpb_movies_movie.csv");
    // A CSV of the other source cannot be appended to.
    std::fs::write(&path, "Title,Year,Season\nShow,,1\n").unwrap();
    let before = std::fs::read(&path).unwrap();

    let result = fetch_and_export(
        &harness.sources,
        &tpb_search("movie"),
        &target(out_dir.path(), WriteMode::Append),
    )
    .await;

    assert!(matches!(
        result,
        Err(RunError::Export(ExportError::HeaderMismatch { .. }))
    ));
    assert_eq!(std::fs::read(&path).unwrap(), before);
    // No temp file left behind.
    assert_eq!(std::fs::read_dir(&movies).unwrap().count(), 1);
}

#[tokio::test]
async fn test_append_runs_accumulate_rows() {
    let harness = TestHarness::new();
    for n in 1..=2 {
        harness
            .transport
            .push_json(json!([fixtures::tpb_item(
                &format!("Movie.{}.2019", n),
                5,
                &fixtures::info_hash(n)
            )]))
            .await;
    }

    let out_dir = TempDir::new().expect("Failed to create temp dir");
    let target = target(out_dir.path(), WriteMode::Append);
    fetch_and_export(&harness.sources, &tpb_search("movie"), &target)
        .await
        .unwrap();
    let summary = fetch_and_export(&harness.sources, &tpb_search("movie"), &target)
        .await
        .unwrap();

    let rows = read_rows(&summary.path);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1][0], "Movie.1.2019");
    assert_eq!(rows[2][0], "Movie.2.2019");
}
