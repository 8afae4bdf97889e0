//! Read-only access to the station archive.
//!
//! The archive is an external SQLite table `archive` keyed by an integer
//! `dateTime` column holding epoch seconds. Rows are otherwise opaque: the
//! export passes every column through unmodified, so queries discover the
//! schema from the statement instead of declaring it.

use std::path::PathBuf;

use anyhow::{bail, Context};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

/// Half-open time filter: `begin` inclusive, `end` exclusive. A missing
/// bound leaves that side of the window open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryWindow {
    pub begin: Option<i64>,
    pub end: Option<i64>,
}

impl QueryWindow {
    /// SQL conditions and bind parameters for whichever bounds are present.
    pub fn conditions(&self) -> (Vec<String>, Vec<i64>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        if let Some(begin) = self.begin {
            clauses.push("dateTime >= ?".to_string());
            params.push(begin);
        }
        if let Some(end) = self.end {
            clauses.push("dateTime < ?".to_string());
            params.push(end);
        }
        (clauses, params)
    }
}

/// One archive cell, preserved loosely enough to round-trip into CSV.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Field {
    pub fn render(&self) -> String {
        match self {
            Field::Null => String::new(),
            Field::Integer(value) => value.to_string(),
            Field::Real(value) => value.to_string(),
            Field::Text(value) => value.clone(),
        }
    }

    pub fn as_epoch(&self) -> Option<i64> {
        match self {
            Field::Integer(value) => Some(*value),
            Field::Real(value) => Some(*value as i64),
            _ => None,
        }
    }
}

/// A windowed slice of the archive: discovered column names plus rows in
/// ascending `dateTime` order.
#[derive(Debug, Clone)]
pub struct ArchivePage {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Field>>,
}

/// Aggregation applied when a series is bucketed over an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesAggregate {
    Avg,
    Sum,
}

impl SeriesAggregate {
    fn sql(self) -> &'static str {
        match self {
            SeriesAggregate::Avg => "AVG",
            SeriesAggregate::Sum => "SUM",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Archive {
    path: PathBuf,
}

impl Archive {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn open(&self) -> anyhow::Result<Connection> {
        Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("opening archive {}", self.path.display()))
    }

    /// Every column of every record inside the window, ascending.
    pub fn select_window(&self, window: &QueryWindow) -> anyhow::Result<ArchivePage> {
        let connection = self.open()?;

        let (clauses, params) = window.conditions();
        let mut sql = "SELECT * FROM archive".to_string();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY dateTime ASC");

        let mut statement = connection.prepare(&sql).context("preparing export query")?;
        let columns: Vec<String> = statement
            .column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let width = columns.len();

        let mut out = Vec::new();
        let mut rows = statement
            .query(rusqlite::params_from_iter(params))
            .context("querying archive")?;
        while let Some(row) = rows.next()? {
            let mut fields = Vec::with_capacity(width);
            for index in 0..width {
                fields.push(match row.get_ref(index)? {
                    ValueRef::Null => Field::Null,
                    ValueRef::Integer(value) => Field::Integer(value),
                    ValueRef::Real(value) => Field::Real(value),
                    ValueRef::Text(value) => Field::Text(String::from_utf8_lossy(value).to_string()),
                    // The archive schema has no blob columns; treat any as absent.
                    ValueRef::Blob(_) => Field::Null,
                });
            }
            out.push(fields);
        }

        Ok(ArchivePage { columns, rows: out })
    }

    /// One observation column as a (timestamp, value) series, NULLs dropped,
    /// ascending. With an aggregate the series is bucketed on the interval
    /// and stamped at each bucket's start.
    pub fn select_series(
        &self,
        column: &str,
        window: &QueryWindow,
        aggregate: Option<(SeriesAggregate, i64)>,
    ) -> anyhow::Result<Vec<(i64, f64)>> {
        if !is_identifier(column) {
            bail!("invalid observation column name {column:?}");
        }

        let connection = self.open()?;
        let (mut clauses, params) = window.conditions();
        clauses.push(format!("{column} IS NOT NULL"));
        let filter = clauses.join(" AND ");

        let sql = match aggregate {
            Some((aggregate, interval)) if interval > 0 => format!(
                "SELECT (dateTime / {interval}) * {interval} AS bucket, {agg}({column}) \
                 FROM archive WHERE {filter} GROUP BY bucket ORDER BY bucket ASC",
                agg = aggregate.sql(),
            ),
            _ => format!(
                "SELECT dateTime, {column} FROM archive WHERE {filter} ORDER BY dateTime ASC"
            ),
        };

        let mut statement = connection.prepare(&sql).context("preparing series query")?;
        let mut rows = statement
            .query(rusqlite::params_from_iter(params))
            .context("querying series")?;

        let mut series = Vec::new();
        while let Some(row) = rows.next()? {
            let stamp: i64 = row.get(0)?;
            let value: f64 = row.get(1)?;
            series.push((stamp, value));
        }
        Ok(series)
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.chars().next().is_some_and(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_conditions_cover_all_shapes() {
        let both = QueryWindow {
            begin: Some(100),
            end: Some(200),
        };
        let (clauses, params) = both.conditions();
        assert_eq!(clauses, vec!["dateTime >= ?", "dateTime < ?"]);
        assert_eq!(params, vec![100, 200]);

        let open = QueryWindow::default();
        assert!(open.conditions().0.is_empty());

        let tail = QueryWindow {
            begin: None,
            end: Some(50),
        };
        assert_eq!(tail.conditions().0, vec!["dateTime < ?"]);
    }

    #[test]
    fn fields_render_for_csv() {
        assert_eq!(Field::Null.render(), "");
        assert_eq!(Field::Integer(7).render(), "7");
        assert_eq!(Field::Real(21.5).render(), "21.5");
        assert_eq!(Field::Text("SW".to_string()).render(), "SW");
    }

    #[test]
    fn identifier_guard_rejects_sql() {
        assert!(is_identifier("outTemp"));
        assert!(is_identifier("wind_gust"));
        assert!(!is_identifier("outTemp; DROP TABLE archive"));
        assert!(!is_identifier("1temp"));
        assert!(!is_identifier(""));
    }
}
