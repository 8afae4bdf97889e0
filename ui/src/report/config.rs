//! The declared report: tab groups, widgets, plot grid, and table rows.
//!
//! The page layout is fixed by the skin; this module is the single place
//! that names its parts. Widget ids double as the stems of the
//! `<name>_widget` element ids and of the persisted `<name>.state` keys.

/// Mutually exclusive history periods, in display order.
pub const HISTORY_TABS: &[&str] = &["day", "week", "month", "year"];

/// Column sets rendered in the hi/lo and totals tables. `rainyear` is only
/// ever shown in place of `year`, driven by the rain-year toggle.
pub const TABLE_COLUMNS: &[&str] = &["day", "week", "month", "year", "rainyear"];

#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    /// Collapsible widgets, in page order.
    pub widgets: Vec<String>,
    /// Plot names rendered inside each history panel.
    pub plots: Vec<String>,
    /// Observation rows of the hi/lo table.
    pub hilo_rows: Vec<String>,
    /// Observation rows of the totals table.
    pub totals_rows: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            widgets: to_owned(&["current", "plots", "hilo", "totals", "almanac", "about"]),
            plots: to_owned(&["temperature", "humidity", "barometer", "wind", "rain"]),
            hilo_rows: to_owned(&["outtemp", "humidity", "barometer", "wind"]),
            totals_rows: to_owned(&["rain", "rain_days"]),
        }
    }
}

fn to_owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// Descriptor URL for one plot slot, e.g. `/plots/day_temperature.plotly.json`.
pub fn plot_src(period: &str, name: &str) -> String {
    format!("/plots/{period}_{name}.plotly.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_src_joins_period_and_name() {
        assert_eq!(
            plot_src("week", "barometer"),
            "/plots/week_barometer.plotly.json"
        );
    }

    #[test]
    fn default_report_declares_the_tabbed_widget() {
        let config = ReportConfig::default();
        assert!(config.widgets.iter().any(|w| w == "plots"));
        assert!(!config.plots.is_empty());
    }
}
