//! DOM rendering of a [`PanelModel`].
//!
//! The grid is append-only: rows already in the table are never rebuilt, only
//! the rows loaded since the last render are added. The table is cleared when
//! the active sheet or the panel state changes.

use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Event, HtmlElement};

use crate::chunk::Row;
use crate::panel::{PanelModel, Tab};

const CLASS_LOADING: &str = "spreadsheet-preview__loading";
const CLASS_SPINNER: &str = "spreadsheet-preview__loading-spinner";
const CLASS_ERROR: &str = "spreadsheet-preview__error";
const CLASS_WRAPPER: &str = "spreadsheet-preview__wrapper";
const CLASS_TABS: &str = "spreadsheet-preview__tabs";
const CLASS_TAB: &str = "spreadsheet-preview__tab";
const CLASS_CONTAINER: &str = "spreadsheet-preview__container";
const CLASS_GRID: &str = "spreadsheet-preview__grid";
const CLASS_SENTINEL: &str = "spreadsheet-preview__sentinel";
const ATTR_SHEET: &str = "data-sheet";

/// Which top-level view is currently in the DOM.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mounted {
    Nothing,
    Loading,
    Failed(String),
    Ready(ReadyDom),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ReadyDom {
    sheet: Option<String>,
    rows: usize,
}

/// Elements of the `Ready` layout.
struct ReadyElements {
    tabs: Element,
    container: Element,
    grid: Element,
}

type ClickCallback = Closure<dyn FnMut(Event)>;

pub(crate) struct PanelDom {
    document: Document,
    root: HtmlElement,
    mounted: Mounted,
    ready: Option<ReadyElements>,
    sentinel: Option<Element>,
    click_listener: Option<ClickCallback>,
}

fn create(document: &Document, tag: &str, class: &str) -> Result<Element, JsValue> {
    let el = document.create_element(tag)?;
    el.set_class_name(class);
    Ok(el)
}

fn set_styles(el: &Element, styles: &[(&str, &str)]) {
    if let Some(el) = el.dyn_ref::<HtmlElement>() {
        let style = el.style();
        for (name, value) in styles {
            let _ = style.set_property(name, value);
        }
    }
}

impl PanelDom {
    pub(crate) fn new(root: HtmlElement) -> Result<Self, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        Ok(Self {
            document,
            root,
            mounted: Mounted::Nothing,
            ready: None,
            sentinel: None,
            click_listener: None,
        })
    }

    /// Route clicks on any tab button to `on_tab`, with the tab's sheet name.
    ///
    /// A single listener on the root covers tabs created by later renders.
    pub(crate) fn listen_tabs(&mut self, on_tab: Rc<dyn Fn(String)>) -> Result<(), JsValue> {
        self.unlisten_tabs();
        let selector = format!(".{CLASS_TAB}");
        let listener = Closure::wrap(Box::new(move |event: Event| {
            let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            let Ok(Some(tab)) = target.closest(&selector) else {
                return;
            };
            if let Some(name) = tab.get_attribute(ATTR_SHEET) {
                on_tab(name);
            }
        }) as Box<dyn FnMut(Event)>);
        self.root
            .add_event_listener_with_callback("click", listener.as_ref().unchecked_ref())?;
        self.click_listener = Some(listener);
        Ok(())
    }

    fn unlisten_tabs(&mut self) {
        if let Some(listener) = self.click_listener.take() {
            let _ = self
                .root
                .remove_event_listener_with_callback("click", listener.as_ref().unchecked_ref());
        }
    }

    /// Scroll container of the grid, the observer root. `None` unless `Ready`.
    pub(crate) fn scroll_root(&self) -> Option<&Element> {
        self.ready.as_ref().map(|r| &r.container)
    }

    /// Bring the DOM in line with `panel`.
    ///
    /// Returns the freshly created sentinel element, if the panel has one.
    pub(crate) fn render(&mut self, panel: &PanelModel<'_>) -> Result<Option<Element>, JsValue> {
        match panel {
            PanelModel::Loading { message } => {
                if self.mounted != Mounted::Loading {
                    self.mount_loading(message)?;
                }
                Ok(None)
            }
            PanelModel::Failed { message } => {
                if !matches!(&self.mounted, Mounted::Failed(m) if m.as_str() == *message) {
                    self.mount_failed(message)?;
                }
                Ok(None)
            }
            PanelModel::Ready {
                tabs,
                rows,
                sentinel,
            } => {
                if !matches!(self.mounted, Mounted::Ready(_)) {
                    self.mount_ready()?;
                }
                self.render_tabs(tabs)?;
                self.render_rows(panel.active_tab(), rows)?;
                self.render_sentinel(*sentinel)
            }
        }
    }

    fn clear(&mut self) {
        self.root.set_inner_html("");
        self.ready = None;
        self.sentinel = None;
        self.mounted = Mounted::Nothing;
    }

    fn mount_loading(&mut self, message: &str) -> Result<(), JsValue> {
        self.clear();
        let loading = create(&self.document, "div", CLASS_LOADING)?;
        let spinner = create(&self.document, "div", CLASS_SPINNER)?;
        let text = self.document.create_element("p")?;
        text.set_text_content(Some(message));
        loading.append_child(&spinner)?;
        loading.append_child(&text)?;
        self.root.append_child(&loading)?;
        self.mounted = Mounted::Loading;
        Ok(())
    }

    fn mount_failed(&mut self, message: &str) -> Result<(), JsValue> {
        self.clear();
        let error = create(&self.document, "div", CLASS_ERROR)?;
        let text = self.document.create_element("p")?;
        text.set_text_content(Some(message));
        error.append_child(&text)?;
        self.root.append_child(&error)?;
        self.mounted = Mounted::Failed(message.to_string());
        Ok(())
    }

    fn mount_ready(&mut self) -> Result<(), JsValue> {
        self.clear();
        let wrapper = create(&self.document, "div", CLASS_WRAPPER)?;
        let tabs = create(&self.document, "div", CLASS_TABS)?;
        let container = create(&self.document, "div", CLASS_CONTAINER)?;
        set_styles(&container, &[("overflow", "auto"), ("max-height", "100%")]);
        let grid = create(&self.document, "table", CLASS_GRID)?;

        container.append_child(&grid)?;
        wrapper.append_child(&tabs)?;
        wrapper.append_child(&container)?;
        self.root.append_child(&wrapper)?;

        self.ready = Some(ReadyElements {
            tabs,
            container,
            grid,
        });
        self.mounted = Mounted::Ready(ReadyDom {
            sheet: None,
            rows: 0,
        });
        Ok(())
    }

    fn render_tabs(&self, tabs: &[Tab<'_>]) -> Result<(), JsValue> {
        let Some(ready) = &self.ready else {
            return Ok(());
        };
        ready.tabs.set_inner_html("");
        for tab in tabs {
            let class = if tab.active {
                format!("{CLASS_TAB} active")
            } else {
                CLASS_TAB.to_string()
            };
            let button = create(&self.document, "button", &class)?;
            button.set_attribute("type", "button")?;
            button.set_attribute(ATTR_SHEET, tab.name)?;
            button.set_text_content(Some(tab.name));
            ready.tabs.append_child(&button)?;
        }
        Ok(())
    }

    fn render_rows(&mut self, active: Option<&str>, rows: &[Row]) -> Result<(), JsValue> {
        let (Some(ready), Mounted::Ready(shown)) = (&self.ready, &mut self.mounted) else {
            return Ok(());
        };

        if shown.sheet.as_deref() != active || shown.rows > rows.len() {
            ready.grid.set_inner_html("");
            ready.container.set_scroll_top(0);
            shown.sheet = active.map(str::to_string);
            shown.rows = 0;
        }

        for row in rows.iter().skip(shown.rows) {
            let tr = self.document.create_element("tr")?;
            for value in row {
                let td = self.document.create_element("td")?;
                td.set_text_content(Some(value.as_str()));
                tr.append_child(&td)?;
            }
            ready.grid.append_child(&tr)?;
        }
        shown.rows = rows.len();
        Ok(())
    }

    fn render_sentinel(&mut self, label: Option<&str>) -> Result<Option<Element>, JsValue> {
        if let Some(old) = self.sentinel.take() {
            old.remove();
        }
        let (Some(label), Some(ready)) = (label, &self.ready) else {
            return Ok(None);
        };
        let sentinel = create(&self.document, "div", CLASS_SENTINEL)?;
        sentinel.set_text_content(Some(label));
        ready.container.append_child(&sentinel)?;
        self.sentinel = Some(sentinel.clone());
        Ok(Some(sentinel))
    }

    /// Remove everything this panel added to the root, listener included.
    pub(crate) fn teardown(&mut self) {
        self.unlisten_tabs();
        self.clear();
    }
}

impl Drop for PanelDom {
    fn drop(&mut self) {
        self.unlisten_tabs();
    }
}
