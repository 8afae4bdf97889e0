//! The CSV export endpoint.
//!
//! `GET /weather.csv?begin=…&end=…` returns the archived readings inside
//! the requested window as CSV, ascending by timestamp, with one synthetic
//! leading `dateTimeISO` column holding each record's timestamp as a
//! local-time ISO-8601 string. Anything but GET gets a 405 with
//! `Allow: GET`; an unparseable bound gets a 400 naming it. Archive
//! failures are not retried and surface as a plain 500.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::archive::{ArchivePage, QueryWindow};
use crate::errors::{internal_error, AppError};

/// Column name of the synthetic timestamp added in front of the archive
/// columns.
const ISO_COLUMN: &str = "dateTimeISO";

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub begin: Option<String>,
    pub end: Option<String>,
}

pub async fn export_csv(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let window = resolve_window(query.begin.as_deref(), query.end.as_deref())?;

    let archive = state.archive.clone();
    let query_window = window.clone();
    let page = tokio::task::spawn_blocking(move || archive.select_window(&query_window))
        .await
        .map_err(internal_error)?
        .map_err(|err| AppError::Archive(err.to_string()))?;

    let body = render_csv(&page)?;
    let filename = attachment_filename(&window, Local::now().date_naive());

    tracing::debug!(rows = page.rows.len(), %filename, "serving archive export");

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "text/csv; charset=utf-8; header=present".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

/// Catch-all for the export route's non-GET methods.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Resolve the optional `begin`/`end` parameters into a window. Each value
/// is either a literal epoch-seconds timestamp or a date/time expression.
pub fn resolve_window(begin: Option<&str>, end: Option<&str>) -> Result<QueryWindow, AppError> {
    Ok(QueryWindow {
        begin: begin.map(|raw| resolve_bound("begin", raw)).transpose()?,
        end: end.map(|raw| resolve_bound("end", raw)).transpose()?,
    })
}

fn resolve_bound(name: &'static str, raw: &str) -> Result<i64, AppError> {
    let raw = raw.trim();
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
        return raw.parse().map_err(|_| AppError::BadParameter {
            name,
            value: raw.to_string(),
            reason: "timestamp out of range".to_string(),
        });
    }

    parse_date_expr(raw)
        .map(|stamp| stamp.timestamp())
        .ok_or_else(|| AppError::BadParameter {
            name,
            value: raw.to_string(),
            reason: "unrecognized date/time expression".to_string(),
        })
}

/// The formats the report pages emit, interpreted in local time when no
/// offset is given.
fn parse_date_expr(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.with_timezone(&Local));
    }

    const STAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
    for format in STAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Local.from_local_datetime(&naive).earliest();
        }
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Local
        .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
        .earliest()
}

/// Epoch seconds as local-time ISO-8601 with the UTC offset spelled out,
/// e.g. `2024-06-01T14:05:00+02:00`.
pub fn local_iso(stamp: i64) -> String {
    match Local.timestamp_opt(stamp, 0) {
        chrono::LocalResult::Single(stamp) => stamp.to_rfc3339_opts(SecondsFormat::Secs, false),
        _ => stamp.to_string(),
    }
}

fn local_date(stamp: i64) -> Option<NaiveDate> {
    match Local.timestamp_opt(stamp, 0) {
        chrono::LocalResult::Single(stamp) => Some(stamp.date_naive()),
        _ => None,
    }
}

/// Attachment filename derived from the resolved range. The exclusive end
/// bound loses one second before its calendar date is taken, so a window
/// ending exactly at midnight names the preceding day.
pub fn attachment_filename(window: &QueryWindow, today: NaiveDate) -> String {
    let begin_date = window.begin.and_then(local_date);
    let end_date = window.end.and_then(|end| local_date(end - 1));

    match (begin_date, end_date) {
        (Some(begin), Some(end)) if begin != end => format!("weather-{begin}-to-{end}.csv"),
        (_, Some(end)) => format!("weather-{end}.csv"),
        (Some(begin), None) => format!("weather-{begin}.csv"),
        (None, None) => format!("weather-{today}.csv"),
    }
}

/// CSV with a header row; the synthetic ISO column leads, every archive
/// column follows unmodified.
pub fn render_csv(page: &ArchivePage) -> Result<String, AppError> {
    let stamp_index = page
        .columns
        .iter()
        .position(|column| column == "dateTime")
        .ok_or_else(|| AppError::Archive("archive has no dateTime column".to_string()))?;

    let mut csv = String::new();
    csv.push_str(ISO_COLUMN);
    for column in &page.columns {
        csv.push(',');
        csv.push_str(&escape_csv(column));
    }
    csv.push('\n');

    for row in &page.rows {
        let stamp = row
            .get(stamp_index)
            .and_then(|field| field.as_epoch())
            .ok_or_else(|| AppError::Archive("archive row without a timestamp".to_string()))?;
        csv.push_str(&escape_csv(&local_iso(stamp)));
        for field in row {
            csv.push(',');
            csv.push_str(&escape_csv(&field.render()));
        }
        csv.push('\n');
    }

    Ok(csv)
}

fn escape_csv(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }

    let needs_quotes = value.contains(',') || value.contains('"') || value.contains('\n');
    if needs_quotes {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::Field;

    #[test]
    fn numeric_bounds_pass_through() {
        let window = resolve_window(Some("1704067200"), Some("1704153600")).unwrap();
        assert_eq!(window.begin, Some(1704067200));
        assert_eq!(window.end, Some(1704153600));
    }

    #[test]
    fn missing_bounds_leave_the_window_open() {
        let window = resolve_window(None, None).unwrap();
        assert_eq!(window, QueryWindow::default());
    }

    #[test]
    fn date_expressions_resolve_in_local_time() {
        let window = resolve_window(Some("2024-01-01"), Some("2024-01-02T00:00:00")).unwrap();
        let begin = window.begin.unwrap();
        let end = window.end.unwrap();
        assert_eq!(end - begin, 86_400);
        assert_eq!(local_date(begin), Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
    }

    #[test]
    fn bad_bound_names_parameter_and_value() {
        let err = resolve_window(Some("soonish"), None).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("begin"));
        assert!(message.contains("soonish"));
    }

    #[test]
    fn single_day_window_names_one_date() {
        let window = resolve_window(Some("2024-01-01T00:00:00"), Some("2024-01-02T00:00:00")).unwrap();
        let today = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert_eq!(attachment_filename(&window, today), "weather-2024-01-01.csv");
    }

    #[test]
    fn multi_day_window_names_the_range() {
        let window = resolve_window(Some("2024-01-01T00:00:00"), Some("2024-01-08T00:00:00")).unwrap();
        let today = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert_eq!(
            attachment_filename(&window, today),
            "weather-2024-01-01-to-2024-01-07.csv"
        );
    }

    #[test]
    fn open_window_defaults_to_today() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(
            attachment_filename(&QueryWindow::default(), today),
            "weather-2024-06-01.csv"
        );
    }

    #[test]
    fn begin_only_window_uses_the_begin_date() {
        let window = resolve_window(Some("2024-03-05"), None).unwrap();
        let today = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert_eq!(attachment_filename(&window, today), "weather-2024-03-05.csv");
    }

    #[test]
    fn csv_leads_with_the_iso_column_and_passes_rows_through() {
        let page = ArchivePage {
            columns: vec![
                "dateTime".to_string(),
                "outTemp".to_string(),
                "remarks".to_string(),
            ],
            rows: vec![
                vec![
                    Field::Integer(0),
                    Field::Real(21.5),
                    Field::Text("calm, \"clear\"".to_string()),
                ],
                vec![Field::Integer(300), Field::Null, Field::Null],
            ],
        };

        let csv = render_csv(&page).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("dateTimeISO,dateTime,outTemp,remarks"));

        let first = lines.next().unwrap();
        assert!(first.starts_with(&escape_csv(&local_iso(0))));
        assert!(first.ends_with(",0,21.5,\"calm, \"\"clear\"\"\""));

        let second = lines.next().unwrap();
        assert!(second.ends_with(",300,,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn csv_requires_the_timestamp_column() {
        let page = ArchivePage {
            columns: vec!["outTemp".to_string()],
            rows: vec![],
        };
        assert!(render_csv(&page).is_err());
    }

    #[test]
    fn local_iso_carries_an_utc_offset() {
        let iso = local_iso(1_704_067_200);
        // RFC 3339 local rendering always spells the offset.
        assert!(iso.contains('T'));
        assert!(iso.contains('+') || iso.contains('-'));
    }
}
