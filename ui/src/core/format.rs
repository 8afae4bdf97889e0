//! Formatting helpers for presenting readings.

use time::OffsetDateTime;

/// Stamp shown in the report footer, e.g. `2024-06-01 14:05`.
pub fn format_report_stamp(stamp: OffsetDateTime) -> String {
    use time::macros::format_description;

    stamp
        .format(&format_description!(
            "[year]-[month]-[day] [hour]:[minute]"
        ))
        .unwrap_or_else(|_| "\u{2014}".to_string())
}
