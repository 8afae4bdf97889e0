//! End-to-end tests for the HTTP surface: the CSV export contract and the
//! generated plot documents, exercised against a seeded throwaway archive.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use skyreport_server::app_state::AppState;
use skyreport_server::archive::Archive;
use skyreport_server::plotgen::PlotCatalog;
use skyreport_server::routes::app_router;

/// Create a fresh archive db seeded with `(dateTime, outTemp, rain)` rows.
fn seeded_archive(tag: &str, rows: &[(i64, f64, f64)]) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "skyreport-test-{}-{}.sdb",
        tag,
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);

    let connection = rusqlite::Connection::open(&path).unwrap();
    connection
        .execute_batch(
            "CREATE TABLE archive (
                 dateTime INTEGER NOT NULL UNIQUE PRIMARY KEY,
                 outTemp REAL,
                 dewpoint REAL,
                 outHumidity REAL,
                 barometer REAL,
                 windSpeed REAL,
                 windGust REAL,
                 rain REAL
             );",
        )
        .unwrap();
    for (stamp, temp, rain) in rows {
        connection
            .execute(
                "INSERT INTO archive (dateTime, outTemp, rain) VALUES (?1, ?2, ?3)",
                rusqlite::params![stamp, temp, rain],
            )
            .unwrap();
    }
    path
}

fn test_app(database: &Path) -> Router {
    let state = AppState {
        archive: Arc::new(Archive::new(database.to_path_buf())),
        plots: Arc::new(PlotCatalog::default()),
    };
    app_router().with_state(state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn export_filters_the_window_half_open() {
    let db = seeded_archive(
        "window",
        &[(100, 1.0, 0.0), (200, 2.0, 0.0), (300, 3.0, 0.0), (400, 4.0, 0.0)],
    );

    let (status, _, body) = get(test_app(&db), "/weather.csv?begin=200&end=400").await;
    assert_eq!(status, StatusCode::OK);

    let lines: Vec<&str> = body.lines().collect();
    assert!(lines[0].starts_with("dateTimeISO,dateTime,"));
    assert_eq!(lines.len(), 3);
    assert!(lines[1].contains(",200,"));
    assert!(lines[2].contains(",300,"));
}

#[tokio::test]
async fn export_without_bounds_returns_everything_ascending() {
    let db = seeded_archive("all", &[(300, 3.0, 0.0), (100, 1.0, 0.0), (200, 2.0, 0.0)]);

    let (status, _, body) = get(test_app(&db), "/weather.csv").await;
    assert_eq!(status, StatusCode::OK);

    let stamps: Vec<&str> = body
        .lines()
        .skip(1)
        .map(|line| line.split(',').nth(1).unwrap())
        .collect();
    assert_eq!(stamps, vec!["100", "200", "300"]);
}

#[tokio::test]
async fn export_sets_the_csv_headers() {
    let db = seeded_archive("headers", &[(100, 1.0, 0.0)]);

    let (status, headers, _) = get(test_app(&db), "/weather.csv").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "text/csv; charset=utf-8; header=present"
    );
    let disposition = headers
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(disposition.starts_with("attachment; filename=\"weather-"));
    assert!(disposition.ends_with(".csv\""));
}

#[tokio::test]
async fn export_filename_covers_a_single_day_window() {
    let db = seeded_archive("filename", &[(100, 1.0, 0.0)]);

    let (_, headers, _) = get(
        test_app(&db),
        "/weather.csv?begin=2024-01-01T00:00:00&end=2024-01-02T00:00:00",
    )
    .await;
    let disposition = headers
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(
        disposition,
        "attachment; filename=\"weather-2024-01-01.csv\""
    );
}

#[tokio::test]
async fn export_filename_covers_a_range() {
    let db = seeded_archive("range", &[(100, 1.0, 0.0)]);

    let (_, headers, _) = get(
        test_app(&db),
        "/weather.csv?begin=2024-01-01T00:00:00&end=2024-01-08T00:00:00",
    )
    .await;
    let disposition = headers
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(
        disposition,
        "attachment; filename=\"weather-2024-01-01-to-2024-01-07.csv\""
    );
}

#[tokio::test]
async fn invalid_bound_is_a_400_naming_the_parameter() {
    let db = seeded_archive("badparam", &[(100, 1.0, 0.0)]);

    let (status, headers, body) = get(test_app(&db), "/weather.csv?begin=soonish").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("begin"));
    assert!(body.contains("soonish"));
    assert!(headers.get(header::CONTENT_DISPOSITION).is_none());
}

#[tokio::test]
async fn non_get_is_a_405_with_allow() {
    let db = seeded_archive("method", &[(100, 1.0, 0.0)]);

    let response = test_app(&db)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/weather.csv")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(!body.starts_with(b"dateTimeISO"));
}

#[tokio::test]
async fn missing_archive_fails_the_request() {
    let path = std::env::temp_dir().join("skyreport-test-absent.sdb");
    let _ = std::fs::remove_file(&path);

    let (status, _, _) = get(test_app(&path), "/weather.csv").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn plot_document_has_data_layout_and_fonts() {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    let db = seeded_archive(
        "plot",
        &[
            (now - 3000, 20.5, 0.0),
            (now - 2400, 21.0, 0.2),
            (now - 1800, 21.5, 0.0),
        ],
    );

    let (status, headers, body) = get(test_app(&db), "/plots/day_temperature.plotly.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    let document: serde_json::Value = serde_json::from_str(&body).unwrap();
    let traces = document["data"].as_array().unwrap();
    assert_eq!(traces.len(), 2);
    assert_eq!(traces[0]["type"], "scatter");
    assert_eq!(traces[0]["x"].as_array().unwrap().len(), 3);
    assert_eq!(document["layout"]["xaxis"]["type"], "date");
    assert_eq!(document["fonts"][0]["family"], "Open Sans");
}

#[tokio::test]
async fn unknown_plot_is_a_404() {
    let db = seeded_archive("plot404", &[(100, 1.0, 0.0)]);

    let (status, _, _) = get(test_app(&db), "/plots/day_sunshine.plotly.json").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
