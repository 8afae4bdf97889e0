//! The report controller: one explicit state object for tab selections,
//! the rain-year flag, and widget modes.
//!
//! The rendered page is a pure projection of this state; nothing is read
//! back from markup. Every mutation persists through the injected
//! [`StateStore`], so a reload restores the same view.

use std::collections::BTreeMap;

use crate::core::state::StateStore;

use super::config::ReportConfig;

/// History period applied when nothing was persisted yet.
pub const DEFAULT_TAB: &str = "day";

const RAIN_YEAR_COLUMN: &str = "rainyear";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetMode {
    Expanded,
    Collapsed,
}

impl WidgetMode {
    pub fn as_str(self) -> &'static str {
        match self {
            WidgetMode::Expanded => "expanded",
            WidgetMode::Collapsed => "collapsed",
        }
    }

    fn from_state(value: &str) -> Self {
        match value {
            "collapsed" => WidgetMode::Collapsed,
            _ => WidgetMode::Expanded,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            WidgetMode::Expanded => WidgetMode::Collapsed,
            WidgetMode::Collapsed => WidgetMode::Expanded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearType {
    Year,
    RainYear,
}

impl YearType {
    pub fn as_str(self) -> &'static str {
        match self {
            YearType::Year => "year",
            YearType::RainYear => "rainyear",
        }
    }

    fn from_state(value: &str) -> Self {
        match value {
            "rainyear" => YearType::RainYear,
            _ => YearType::Year,
        }
    }

    fn flipped(self) -> Self {
        match self {
            YearType::Year => YearType::RainYear,
            YearType::RainYear => YearType::Year,
        }
    }
}

/// Named sets of mutually exclusive views. `History` owns the tab buttons;
/// the table groups track it through their `<group>_<id>` column classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabGroup {
    History,
    HiLo,
    Totals,
}

impl TabGroup {
    /// Persisted key, and the stem of the group's element ids/classes.
    pub fn key(self) -> &'static str {
        match self {
            TabGroup::History => "history",
            TabGroup::HiLo => "hilo",
            TabGroup::Totals => "totals",
        }
    }
}

pub struct ReportController<S: StateStore> {
    store: S,
    config: ReportConfig,
    history: String,
    hilo: String,
    totals: String,
    year_type: YearType,
    widgets: BTreeMap<String, WidgetMode>,
}

impl<S: StateStore> ReportController<S> {
    pub fn new(store: S, config: ReportConfig) -> Self {
        Self {
            store,
            config,
            history: DEFAULT_TAB.to_string(),
            hilo: DEFAULT_TAB.to_string(),
            totals: DEFAULT_TAB.to_string(),
            year_type: YearType::Year,
            widgets: BTreeMap::new(),
        }
    }

    /// Restore persisted selections and apply them. With no explicit widget
    /// list, the declared report set stands in for scanning the document.
    /// Returns the id of the history panel that became visible so its plots
    /// can be loaded.
    pub fn setup(&mut self, widgets: Option<&[String]>) -> String {
        self.year_type =
            YearType::from_state(&self.store.get_state("year_type", YearType::Year.as_str()));

        let names: Vec<String> = match widgets {
            Some(list) => list.to_vec(),
            None => self.config.widgets.clone(),
        };
        for name in names {
            let mode = WidgetMode::from_state(
                &self
                    .store
                    .get_state(&format!("{name}.state"), WidgetMode::Expanded.as_str()),
            );
            self.widgets.insert(name, mode);
        }

        let mut restored = self.store.get_state(TabGroup::History.key(), DEFAULT_TAB);
        if !super::config::HISTORY_TABS.contains(&restored.as_str()) {
            restored = DEFAULT_TAB.to_string();
        }
        self.choose_tab(TabGroup::History, &restored)
            .unwrap_or_else(|| format!("history_{DEFAULT_TAB}"))
    }

    /// Select a tab: exactly one button and panel per group are active, and
    /// the choice is persisted under the group's key. For the history group
    /// the newly shown panel id is returned so its plots load lazily; the
    /// table columns follow along.
    pub fn choose_tab(&mut self, group: TabGroup, id: &str) -> Option<String> {
        match group {
            TabGroup::History => {
                self.history = id.to_string();
                self.store.set_state(group.key(), id);
                self.apply_columns();
                Some(format!("history_{id}"))
            }
            TabGroup::HiLo | TabGroup::Totals => {
                self.choose_columns(group, id);
                None
            }
        }
    }

    /// Show exactly the `<group>_<id>` column set and persist the choice.
    pub fn choose_columns(&mut self, group: TabGroup, id: &str) {
        match group {
            TabGroup::HiLo => self.hilo = id.to_string(),
            TabGroup::Totals => self.totals = id.to_string(),
            TabGroup::History => return,
        }
        self.store.set_state(group.key(), id);
    }

    fn apply_columns(&mut self) {
        let effective = if self.history == "year" && self.year_type == YearType::RainYear {
            RAIN_YEAR_COLUMN.to_string()
        } else {
            self.history.clone()
        };
        self.choose_columns(TabGroup::HiLo, &effective);
        self.choose_columns(TabGroup::Totals, &effective);
    }

    /// Flip the year/rain-year state and re-apply the columns. The swap is
    /// only visible while `year` is the active history selection.
    pub fn toggle_rain_year(&mut self) {
        self.year_type = self.year_type.flipped();
        self.store.set_state("year_type", self.year_type.as_str());
        self.apply_columns();
    }

    /// Show or hide a widget's contents. With no explicit mode the current
    /// one is flipped; either way the result is persisted.
    pub fn toggle_widget(&mut self, id: &str, mode: Option<WidgetMode>) -> WidgetMode {
        let next = mode.unwrap_or_else(|| self.widget_mode(id).flipped());
        self.widgets.insert(id.to_string(), next);
        self.store.set_state(&format!("{id}.state"), next.as_str());
        next
    }

    // --- projection queries -------------------------------------------------

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn history(&self) -> &str {
        &self.history
    }

    pub fn year_type(&self) -> YearType {
        self.year_type
    }

    pub fn widget_mode(&self, id: &str) -> WidgetMode {
        self.widgets
            .get(id)
            .copied()
            .unwrap_or(WidgetMode::Expanded)
    }

    pub fn tab_selected(&self, group: TabGroup, id: &str) -> bool {
        self.selection(group) == id
    }

    /// Class for the `button_<group>_<id>` element.
    pub fn button_class(&self, group: TabGroup, id: &str) -> &'static str {
        if self.tab_selected(group, id) {
            "selected"
        } else {
            "unselected"
        }
    }

    /// Whether the `<group>_<id>` panel is shown.
    pub fn panel_visible(&self, group: TabGroup, id: &str) -> bool {
        self.tab_selected(group, id)
    }

    /// Whether cells carrying the `<group>_<id>` class are shown.
    pub fn column_visible(&self, group: TabGroup, id: &str) -> bool {
        self.selection(group) == id
    }

    fn selection(&self, group: TabGroup) -> &str {
        match group {
            TabGroup::History => &self.history,
            TabGroup::HiLo => &self.hilo,
            TabGroup::Totals => &self.totals,
        }
    }
}
