//! Platform-independent description of the preview panel.
//!
//! The DOM renderer and the CLI both draw from a [`PanelModel`]; neither
//! inspects [`ViewState`] directly.

use serde::Serialize;

use crate::chunk::Row;
use crate::i18n::Locale;
use crate::state::{ViewState, ViewStatus};

/// One entry of the sheet tab strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tab<'a> {
    pub name: &'a str,
    pub active: bool,
}

/// What the panel shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PanelModel<'a> {
    Loading {
        message: &'static str,
    },
    Failed {
        message: &'a str,
    },
    Ready {
        tabs: Vec<Tab<'a>>,
        /// Loaded rows of the active sheet.
        rows: &'a [Row],
        /// Label of the lazy-load sentinel, present while rows remain.
        sentinel: Option<&'static str>,
    },
}

impl<'a> PanelModel<'a> {
    #[must_use]
    pub fn build(state: &'a ViewState, locale: Locale) -> Self {
        match state.status() {
            ViewStatus::Loading => Self::Loading {
                message: locale.loading(),
            },
            ViewStatus::Failed(message) => Self::Failed {
                message: message.as_str(),
            },
            ViewStatus::Ready => {
                let active = state.active_sheet();
                let tabs = state
                    .sheet_names()
                    .iter()
                    .map(|name| Tab {
                        name: name.as_str(),
                        active: active == Some(name.as_str()),
                    })
                    .collect();
                let (rows, sentinel) = match active {
                    Some(sheet) => (
                        state.loaded_rows(sheet),
                        state.has_more(sheet).then(|| locale.loading_more()),
                    ),
                    None => (&[][..], None),
                };
                Self::Ready {
                    tabs,
                    rows,
                    sentinel,
                }
            }
        }
    }

    #[must_use]
    pub fn active_tab(&self) -> Option<&'a str> {
        match self {
            Self::Ready { tabs, .. } => tabs.iter().find(|t| t.active).map(|t| t.name),
            _ => None,
        }
    }

    #[must_use]
    pub fn has_sentinel(&self) -> bool {
        matches!(self, Self::Ready { sentinel: Some(_), .. })
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::error::PreviewError;
    use crate::types::{CellValue, Sheet, Workbook};

    fn state_with(sheets: &[(&str, u32)]) -> ViewState {
        let mut state = ViewState::default();
        let token = state.begin_load();
        let sheets = sheets
            .iter()
            .map(|&(name, rows)| {
                let mut s = Sheet::new(name);
                for r in 0..rows {
                    s.set_cell(r, 0, CellValue::Text(format!("{name}{r}")));
                }
                s.fit_used_range();
                s
            })
            .collect();
        state.finish_load(token, Ok(Workbook::new(sheets)), Locale::Ko);
        state
    }

    #[test]
    fn test_loading_panel() {
        let state = ViewState::default();
        assert_eq!(
            PanelModel::build(&state, Locale::Ko),
            PanelModel::Loading {
                message: "스프레드시트를 불러오는 중..."
            }
        );
    }

    #[test]
    fn test_ready_panel_tabs_in_order() {
        let state = state_with(&[("First", 10), ("Second", 50)]);
        let panel = PanelModel::build(&state, Locale::Ko);
        let PanelModel::Ready { tabs, rows, sentinel } = &panel else {
            panic!("expected Ready");
        };
        let names: Vec<_> = tabs.iter().map(|t| t.name).collect();
        assert_eq!(names, ["First", "Second"]);
        assert!(tabs[0].active && !tabs[1].active);
        assert_eq!(rows.len(), 10);
        assert_eq!(*sentinel, None);
        assert_eq!(panel.active_tab(), Some("First"));
    }

    #[test]
    fn test_sentinel_follows_active_sheet() {
        let mut state = state_with(&[("Small", 10), ("Big", 50)]);
        state.set_active_sheet("Big");
        let panel = PanelModel::build(&state, Locale::En);
        assert!(panel.has_sentinel());
        let PanelModel::Ready { sentinel, .. } = panel else {
            panic!("expected Ready");
        };
        assert_eq!(sentinel, Some("Loading data..."));
    }

    #[test]
    fn test_failed_panel_serializes_without_tabs() {
        let mut state = ViewState::default();
        let token = state.begin_load();
        state.finish_load(token, Err(PreviewError::Fetch("offline".into())), Locale::En);
        let panel = PanelModel::build(&state, Locale::En);
        let json = serde_json::to_value(&panel).unwrap();
        assert_eq!(json["state"], "failed");
        assert!(json["message"].as_str().unwrap().contains("offline"));
        assert!(json.get("tabs").is_none());
    }
}
