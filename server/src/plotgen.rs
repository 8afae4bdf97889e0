//! On-demand plot documents for the report UI.
//!
//! `GET /plots/<period>_<plot>.plotly.json` builds a `{data, layout, fonts}`
//! document from the archive: one trace per configured series over a
//! trailing window, timestamps rendered as local-time ISO-8601. Line traces
//! get explicit gap points so the charting library breaks the line across
//! holes in the record instead of bridging them.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Local;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::archive::{Archive, QueryWindow, SeriesAggregate};
use crate::errors::{internal_error, AppError};
use crate::export::local_iso;

/// Families referenced by the layout, advertised for pre-loading.
const FONT_FAMILY: &str = "Open Sans";

const DAY: i64 = 24 * 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Line,
    Bar,
}

#[derive(Debug, Clone)]
pub struct SeriesDef {
    /// Archive observation column.
    pub column: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub width: u32,
    pub kind: TraceKind,
    /// How bucketed periods fold this observation.
    pub aggregate: SeriesAggregate,
}

#[derive(Debug, Clone)]
pub struct PlotDef {
    /// Plot stem, combined with a period into `<period>_<name>`.
    pub name: &'static str,
    pub unit_label: &'static str,
    /// Fraction of the window beyond which a line break is inserted.
    pub gap_fraction: Option<f64>,
    pub series: Vec<SeriesDef>,
}

#[derive(Debug, Clone)]
pub struct PeriodSpec {
    pub name: &'static str,
    pub length: i64,
    /// Bucket size for aggregated periods; `None` plots raw records.
    pub aggregate_interval: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct PlotCatalog {
    periods: Vec<PeriodSpec>,
    plots: Vec<PlotDef>,
}

impl Default for PlotCatalog {
    fn default() -> Self {
        Self {
            periods: vec![
                PeriodSpec { name: "day", length: DAY, aggregate_interval: None },
                PeriodSpec { name: "week", length: 7 * DAY, aggregate_interval: Some(3600) },
                PeriodSpec { name: "month", length: 30 * DAY, aggregate_interval: Some(3 * 3600) },
                PeriodSpec { name: "year", length: 365 * DAY, aggregate_interval: Some(DAY) },
            ],
            plots: vec![
                PlotDef {
                    name: "temperature",
                    unit_label: "\u{00b0}C",
                    gap_fraction: Some(0.05),
                    series: vec![
                        SeriesDef {
                            column: "outTemp",
                            label: "Outside Temperature",
                            color: "#d9564a",
                            width: 2,
                            kind: TraceKind::Line,
                            aggregate: SeriesAggregate::Avg,
                        },
                        SeriesDef {
                            column: "dewpoint",
                            label: "Dew Point",
                            color: "#4aa3ff",
                            width: 1,
                            kind: TraceKind::Line,
                            aggregate: SeriesAggregate::Avg,
                        },
                    ],
                },
                PlotDef {
                    name: "humidity",
                    unit_label: "%",
                    gap_fraction: Some(0.05),
                    series: vec![SeriesDef {
                        column: "outHumidity",
                        label: "Humidity",
                        color: "#59b377",
                        width: 2,
                        kind: TraceKind::Line,
                        aggregate: SeriesAggregate::Avg,
                    }],
                },
                PlotDef {
                    name: "barometer",
                    unit_label: "hPa",
                    gap_fraction: Some(0.05),
                    series: vec![SeriesDef {
                        column: "barometer",
                        label: "Barometer",
                        color: "#b48ead",
                        width: 2,
                        kind: TraceKind::Line,
                        aggregate: SeriesAggregate::Avg,
                    }],
                },
                PlotDef {
                    name: "wind",
                    unit_label: "km/h",
                    gap_fraction: Some(0.05),
                    series: vec![
                        SeriesDef {
                            column: "windSpeed",
                            label: "Wind Speed",
                            color: "#4aa3ff",
                            width: 2,
                            kind: TraceKind::Line,
                            aggregate: SeriesAggregate::Avg,
                        },
                        SeriesDef {
                            column: "windGust",
                            label: "Gust",
                            color: "#e5c07b",
                            width: 1,
                            kind: TraceKind::Line,
                            aggregate: SeriesAggregate::Avg,
                        },
                    ],
                },
                PlotDef {
                    name: "rain",
                    unit_label: "mm",
                    gap_fraction: None,
                    series: vec![SeriesDef {
                        column: "rain",
                        label: "Rain",
                        color: "#4aa3ff",
                        width: 1,
                        kind: TraceKind::Bar,
                        aggregate: SeriesAggregate::Sum,
                    }],
                },
            ],
        }
    }
}

impl PlotCatalog {
    /// Split `<period>_<plot>` into its configured parts.
    pub fn resolve(&self, name: &str) -> Option<(PeriodSpec, PlotDef)> {
        let (period_name, plot_name) = name.split_once('_')?;
        let period = self.periods.iter().find(|p| p.name == period_name)?;
        let plot = self.plots.iter().find(|p| p.name == plot_name)?;
        Some((period.clone(), plot.clone()))
    }
}

pub async fn serve_plot(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, AppError> {
    let stem = name.strip_suffix(".plotly.json").unwrap_or(&name);
    let (period, plot) = state
        .plots
        .resolve(stem)
        .ok_or_else(|| AppError::NotFound(format!("no plot named {stem:?}")))?;

    let archive = state.archive.clone();
    let now = Local::now().timestamp();
    let document = tokio::task::spawn_blocking(move || generate(&archive, &period, &plot, now))
        .await
        .map_err(internal_error)?
        .map_err(|err| AppError::Archive(err.to_string()))?;

    Ok(Json(document))
}

/// Build the full descriptor for one plot over the window ending at `now`.
pub fn generate(
    archive: &Archive,
    period: &PeriodSpec,
    plot: &PlotDef,
    now: i64,
) -> anyhow::Result<Value> {
    let begin = now - period.length;
    let window = QueryWindow {
        begin: Some(begin),
        end: Some(now),
    };

    let mut data = Vec::new();
    for series in &plot.series {
        let aggregate = period
            .aggregate_interval
            .map(|interval| (series.aggregate, interval));
        let mut points = archive.select_series(series.column, &window, aggregate)?;

        // Aggregated line points sit at the middle of their bucket; bars
        // keep the bucket start and carry the bucket as their width.
        if let Some(interval) = period.aggregate_interval {
            if series.kind == TraceKind::Line {
                for point in &mut points {
                    point.0 += interval / 2;
                }
            }
        }

        data.push(trace(series, period, plot, &points));
    }

    Ok(json!({
        "data": data,
        "fonts": font_list(),
        "layout": layout(plot, begin, now, period.length),
    }))
}

fn trace(series: &SeriesDef, period: &PeriodSpec, plot: &PlotDef, points: &[(i64, f64)]) -> Value {
    match series.kind {
        TraceKind::Line => {
            let broken = match plot.gap_fraction {
                Some(fraction) => {
                    insert_gaps(points, ((period.length as f64) * fraction) as i64)
                }
                None => points.iter().map(|&(x, y)| (x, Some(y))).collect(),
            };
            let x: Vec<String> = broken.iter().map(|&(stamp, _)| local_iso(stamp)).collect();
            let y: Vec<Option<f64>> = broken.iter().map(|&(_, value)| value).collect();
            json!({
                "name": series.label,
                "x": x,
                "y": y,
                "type": "scatter",
                "mode": "lines",
                "connectgaps": false,
                "line": {
                    "color": series.color,
                    "width": series.width,
                },
            })
        }
        TraceKind::Bar => {
            let x: Vec<String> = points.iter().map(|&(stamp, _)| local_iso(stamp)).collect();
            let y: Vec<f64> = points.iter().map(|&(_, value)| value).collect();
            // plotly works in milliseconds, not seconds.
            let bar_width = period.aggregate_interval.unwrap_or(300) * 1000;
            json!({
                "name": series.label,
                "x": x,
                "y": y,
                "type": "bar",
                "width": bar_width,
                "marker": {
                    "color": series.color,
                    "line": { "width": series.width },
                },
            })
        }
    }
}

fn layout(plot: &PlotDef, begin: i64, end: i64, window: i64) -> Value {
    json!({
        "showlegend": true,
        "legend": { "orientation": "h" },
        "font": { "family": FONT_FAMILY },
        "margin": { "l": 48, "r": 16, "b": 40, "t": 24, "pad": 4 },
        "xaxis": {
            // type is required so the range applies even with no data
            "type": "date",
            "range": [local_iso(begin), local_iso(end)],
            "tickformat": x_tick_format(window),
            "tickmode": "auto",
        },
        "yaxis": {
            "title": plot.unit_label,
            "tickmode": "auto",
        },
        "hovermode": "x",
    })
}

/// FontFace descriptors for every family the layout names, each once.
fn font_list() -> Vec<Value> {
    let mut families = vec![FONT_FAMILY];
    families.dedup();
    families
        .into_iter()
        .map(|family| json!({ "family": family }))
        .collect()
}

/// d3-style tick format picked from the window length: time-only inside a
/// day, date+time up to a month, date-only beyond.
fn x_tick_format(window: i64) -> &'static str {
    if window > 30 * DAY {
        "%x"
    } else if window > DAY {
        "%x %X"
    } else {
        "%X"
    }
}

/// For consecutive points further apart than `max_dx`, add a null point
/// midway so the line breaks there.
fn insert_gaps(points: &[(i64, f64)], max_dx: i64) -> Vec<(i64, Option<f64>)> {
    let mut out = Vec::with_capacity(points.len());
    let mut previous: Option<i64> = None;
    for &(x, y) in points {
        if let Some(x0) = previous {
            let dx = x - x0;
            if max_dx > 0 && dx > max_dx {
                out.push((x - dx / 2, None));
            }
        }
        out.push((x, Some(y)));
        previous = Some(x);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaps_break_lines_across_holes() {
        let points = vec![(0, 1.0), (300, 2.0), (4000, 3.0)];
        let broken = insert_gaps(&points, 600);
        assert_eq!(
            broken,
            vec![
                (0, Some(1.0)),
                (300, Some(2.0)),
                (2150, None),
                (4000, Some(3.0)),
            ]
        );
    }

    #[test]
    fn dense_series_gets_no_gaps() {
        let points = vec![(0, 1.0), (300, 2.0), (600, 3.0)];
        assert_eq!(insert_gaps(&points, 600).len(), 3);
    }

    #[test]
    fn tick_format_widens_with_the_window() {
        assert_eq!(x_tick_format(DAY), "%X");
        assert_eq!(x_tick_format(7 * DAY), "%x %X");
        assert_eq!(x_tick_format(365 * DAY), "%x");
    }

    #[test]
    fn catalog_resolves_period_and_plot() {
        let catalog = PlotCatalog::default();
        let (period, plot) = catalog.resolve("week_barometer").unwrap();
        assert_eq!(period.name, "week");
        assert_eq!(plot.name, "barometer");
        assert!(catalog.resolve("fortnight_barometer").is_none());
        assert!(catalog.resolve("week_sunshine").is_none());
        assert!(catalog.resolve("nounderscores").is_none());
    }

    #[test]
    fn font_list_names_each_family_once() {
        let fonts = font_list();
        assert_eq!(fonts.len(), 1);
        assert_eq!(fonts[0]["family"], FONT_FAMILY);
    }
}
