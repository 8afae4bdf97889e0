use dioxus::prelude::*;

use crate::core::state::ActiveStore;
use crate::report::config::{self, ReportConfig, HISTORY_TABS, TABLE_COLUMNS};
use crate::report::controller::{ReportController, TabGroup, WidgetMode, YearType};
use crate::report::plots;
use crate::{i18n, t};

type Controller = Signal<ReportController<ActiveStore>>;

#[component]
pub fn Report() -> Element {
    i18n::init();

    let controller: Controller = use_signal(|| {
        let mut controller = ReportController::new(ActiveStore::default(), ReportConfig::default());
        controller.setup(None);
        controller
    });

    // Lazy chart loading tracks the active history panel. Slots already
    // rendered have shed their descriptor attribute and are skipped.
    use_effect(move || {
        let panel = controller.with(|c| format!("history_{}", c.history()));
        plots::load_descendant_plots(&panel);
    });

    let widgets = controller.with(|c| c.config().widgets.clone());
    let stamp = crate::core::format::format_report_stamp(time::OffsetDateTime::now_utc());

    rsx! {
        section { class: "page page-report",
            header { class: "report__masthead",
                h1 { class: "report__title", {t!("report-title")} }
                p { class: "report__tagline", {t!("report-tagline")} }
            }

            for widget in widgets {
                WidgetFrame { controller, id: widget.clone(),
                    {widget_body(&widget, controller)}
                }
            }

            footer { class: "report__footer",
                {t!("footer-generated", stamp = stamp)}
            }
        }
    }
}

fn widget_body(widget: &str, controller: Controller) -> Element {
    match widget {
        "current" => rsx! { CurrentConditions {} },
        "plots" => rsx! { HistoryPanels { controller } },
        "hilo" => rsx! { HiLoTable { controller } },
        "totals" => rsx! { TotalsTable { controller } },
        "almanac" => rsx! { Almanac {} },
        "about" => rsx! { AboutStation {} },
        _ => rsx! { p { class: "widget__placeholder", {t!("no-reading")} } },
    }
}

/// Collapsible section chrome shared by every widget. The contents node is
/// the `widget_contents` child the controller shows and hides.
#[component]
fn WidgetFrame(controller: Controller, id: String, children: Element) -> Element {
    let expanded = controller.with(|c| c.widget_mode(&id)) == WidgetMode::Expanded;
    let title = i18n::label(&format!("widget-{id}"));
    let toggle_id = id.clone();

    rsx! {
        section { id: "{id}_widget", class: "widget",
            header { class: "widget__titlebar",
                h2 { class: "widget__title", "{title}" }
                button {
                    r#type: "button",
                    class: "widget__toggle",
                    aria_expanded: "{expanded}",
                    onclick: move |_| {
                        controller.with_mut(|c| {
                            c.toggle_widget(&toggle_id, None);
                        });
                    },
                    if expanded { "\u{2212}" } else { "+" }
                }
            }
            div {
                class: "widget_contents",
                style: if expanded { "" } else { "display:none" },
                {children}
            }
        }
    }
}

struct HistoryTabEntry {
    id: &'static str,
    label: String,
    button_class: String,
    visible: bool,
}

#[component]
fn HistoryPanels(controller: Controller) -> Element {
    let plot_names = controller.with(|c| c.config().plots.clone());

    let tabs: Vec<HistoryTabEntry> = HISTORY_TABS
        .iter()
        .copied()
        .map(|tab| HistoryTabEntry {
            id: tab,
            label: i18n::label(&format!("tab-{tab}")),
            button_class: format!(
                "tabbar__button {}",
                controller.with(|c| c.button_class(TabGroup::History, tab))
            ),
            visible: controller.with(|c| c.panel_visible(TabGroup::History, tab)),
        })
        .collect();

    rsx! {
        div { class: "tabbar", role: "tablist",
            for entry in tabs.iter() {
                {render_history_button(entry, controller)}
            }
        }
        for entry in tabs.iter() {
            {render_history_panel(entry, &plot_names)}
        }
    }
}

fn render_history_button(entry: &HistoryTabEntry, mut controller: Controller) -> Element {
    let tab = entry.id;
    let label = entry.label.clone();
    let button_class = entry.button_class.clone();
    let selected = entry.visible;

    rsx! {
        button {
            id: "button_history_{tab}",
            r#type: "button",
            role: "tab",
            aria_selected: "{selected}",
            class: "{button_class}",
            onclick: move |_| {
                controller.with_mut(|c| {
                    c.choose_tab(TabGroup::History, tab);
                });
            },
            "{label}"
        }
    }
}

fn render_history_panel(entry: &HistoryTabEntry, plot_names: &[String]) -> Element {
    let tab = entry.id;
    let style = if entry.visible { "" } else { "display:none" };

    let slots: Vec<(String, String, String)> = plot_names
        .iter()
        .map(|name| {
            (
                name.clone(),
                config::plot_src(tab, name),
                i18n::label(&format!("plot-{name}")),
            )
        })
        .collect();

    rsx! {
        div { id: "history_{tab}", class: "history__panel", style: "{style}",
            div { class: "history__grid",
                for (name, src, label) in slots.into_iter() {
                    div {
                        id: "plot_{tab}_{name}",
                        class: "history__plot",
                        "data-plotly-src": "{src}",
                        span { class: "history__plot-fallback",
                            "{label} \u{2014} "
                            {t!("plot-loading")}
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn HiLoTable(controller: Controller) -> Element {
    let rows = controller.with(|c| c.config().hilo_rows.clone());
    let on_year_tab = controller.with(|c| c.history() == "year");
    let year_label = match controller.with(|c| c.year_type()) {
        YearType::Year => t!("yeartype-year"),
        YearType::RainYear => t!("yeartype-rainyear"),
    };

    rsx! {
        if on_year_tab {
            button {
                id: "button_hilo_yeartype",
                r#type: "button",
                class: "table__yeartype",
                onclick: move |_| {
                    controller.with_mut(|c| c.toggle_rain_year());
                },
                "{year_label}"
            }
        }
        {render_observation_table(controller, TabGroup::HiLo, &rows)}
    }
}

#[component]
fn TotalsTable(controller: Controller) -> Element {
    let rows = controller.with(|c| c.config().totals_rows.clone());
    rsx! {
        {render_observation_table(controller, TabGroup::Totals, &rows)}
    }
}

/// One observation-per-row table whose period columns track the active tab.
/// Cell values are stamped into the page by the report generator; the
/// controller only drives which column set is visible.
fn render_observation_table(controller: Controller, group: TabGroup, rows: &[String]) -> Element {
    let group_key = group.key();

    let columns: Vec<(&'static str, String, &'static str)> = TABLE_COLUMNS
        .iter()
        .copied()
        .map(|column| {
            let visible = controller.with(|c| c.column_visible(group, column));
            (
                column,
                i18n::label(&format!("col-{column}")),
                if visible { "" } else { "display:none" },
            )
        })
        .collect();

    let row_labels: Vec<(String, String)> = rows
        .iter()
        .map(|row| (row.clone(), i18n::label(&format!("obs-{row}"))))
        .collect();

    rsx! {
        table { class: "obs-table obs-table--{group_key}",
            thead {
                tr {
                    th { scope: "col", {t!("hilo-observation")} }
                    for (column, label, style) in columns.iter() {
                        th { scope: "col", class: "{group_key}_{column}", style: "{style}",
                            "{label}"
                        }
                    }
                }
            }
            tbody {
                for (row, row_label) in row_labels.iter() {
                    tr { class: "obs-table__row obs-table__row--{row}",
                        th { scope: "row", "{row_label}" }
                        for (column, _, style) in columns.iter() {
                            td { class: "{group_key}_{column}", style: "{style}",
                                span { class: "obs-table__value", "\u{2014}" }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn CurrentConditions() -> Element {
    let readings = [
        ("current-outtemp", "outtemp"),
        ("current-humidity", "humidity"),
        ("current-barometer", "barometer"),
        ("current-wind", "wind"),
    ];
    let entries: Vec<(String, &'static str)> = readings
        .iter()
        .map(|(label_key, reading)| (i18n::label(label_key), *reading))
        .collect();

    rsx! {
        dl { class: "current",
            for (label, reading) in entries.into_iter() {
                div { class: "current__entry current__entry--{reading}",
                    dt { class: "current__label", "{label}" }
                    dd { class: "current__value", {t!("no-reading")} }
                }
            }
            div { class: "current__entry current__entry--stamp",
                dt { class: "current__label", {t!("current-updated")} }
                dd { class: "current__value", {t!("no-reading")} }
            }
        }
    }
}

#[component]
fn Almanac() -> Element {
    let entries: Vec<String> = ["almanac-sunrise", "almanac-sunset", "almanac-moon"]
        .iter()
        .map(|key| i18n::label(key))
        .collect();

    rsx! {
        dl { class: "almanac",
            for label in entries.into_iter() {
                div { class: "almanac__entry",
                    dt { class: "almanac__label", "{label}" }
                    dd { class: "almanac__value", {t!("no-reading")} }
                }
            }
        }
    }
}

#[component]
fn AboutStation() -> Element {
    rsx! {
        p { class: "about__text", {t!("about-station")} }
        p { class: "about__export",
            a { href: "/weather.csv", {t!("about-export")} }
        }
    }
}
