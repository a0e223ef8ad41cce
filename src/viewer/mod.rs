//! `SheetPreview` - the wasm-exported preview panel.
//!
//! Owns a [`PreviewSession`] behind `Rc<RefCell<_>>` so DOM callbacks can
//! reach it. Callbacks hold only a `Weak` reference; once the JS side frees
//! the viewer they become no-ops.
//!
//! Borrow discipline: state is never borrowed across an `await` or across a
//! call into JS (`on_change`), since DOM work can re-enter our closures.

mod dom;
mod observer;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::{Function, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::HtmlElement;

use crate::config::ViewerConfig;
use crate::error::PreviewError;
use crate::fetch::fetch_bytes;
use crate::mime::FileDescriptor;
use crate::session::PreviewSession;
use crate::state::{ChunkOutcome, ViewStatus};

use dom::PanelDom;
use observer::SentinelObserver;

/// Shared state reachable from event handlers.
pub(crate) struct SharedState {
    pub(crate) session: PreviewSession,
    pub(crate) dom: PanelDom,
    pub(crate) observer: SentinelObserver,
    pub(crate) on_change: Option<Function>,
    pub(crate) destroyed: bool,
}

type Shared = Rc<RefCell<SharedState>>;

/// Chunked CSV/XLSX preview mounted into a host element.
#[wasm_bindgen]
pub struct SheetPreview {
    state: Shared,
}

/// Redraw from the session's panel model and re-attach the observer.
///
/// The sentinel element is recreated on every `Ready` render, so the observer
/// is reconnected each time; an observer fires once on `observe`, which keeps
/// loading while the sentinel stays in view.
fn render(state: &Shared) {
    let callback = {
        let Ok(mut guard) = state.try_borrow_mut() else {
            log::warn!("render skipped: state already borrowed");
            return;
        };
        let s = &mut *guard;
        if s.destroyed {
            return;
        }

        let panel = s.session.panel();
        match s.dom.render(&panel) {
            Ok(Some(sentinel)) => {
                let threshold = s.session.config().sentinel_threshold;
                let handler = sentinel_handler(Rc::downgrade(state));
                if let Some(root) = s.dom.scroll_root() {
                    if let Err(e) = s.observer.connect(root, &sentinel, threshold, handler) {
                        log::error!("failed to observe sentinel: {e:?}");
                    }
                }
            }
            Ok(None) => s.observer.disconnect(),
            Err(e) => {
                log::error!("render failed: {e:?}");
                s.observer.disconnect();
            }
        }
        s.on_change.clone()
    };

    if let Some(callback) = callback {
        if let Err(e) = callback.call0(&JsValue::NULL) {
            log::warn!("onChange callback threw: {e:?}");
        }
    }
}

/// Sentinel visible: reserve the chunk now, materialize it in a task.
///
/// Reserving synchronously raises the in-flight flag, so a second observer
/// entry arriving before the task runs is refused. The task then re-renders,
/// which replaces the observer; doing that outside the observer callback keeps
/// the running closure alive.
fn sentinel_handler(weak: Weak<RefCell<SharedState>>) -> Rc<dyn Fn(f64)> {
    Rc::new(move |ratio: f64| {
        let Some(state) = weak.upgrade() else {
            return;
        };
        let ticket = {
            let Ok(mut s) = state.try_borrow_mut() else {
                return;
            };
            if s.destroyed || ratio < s.session.config().sentinel_threshold {
                return;
            }
            s.session.begin_next_chunk()
        };
        let Some(ticket) = ticket else {
            return;
        };

        let weak = Rc::downgrade(&state);
        spawn_local(async move {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let outcome = {
                let mut s = state.borrow_mut();
                if s.destroyed {
                    s.session.abort_chunk(ticket);
                    return;
                }
                s.session.complete_chunk(ticket)
            };
            if matches!(outcome, ChunkOutcome::Appended { .. }) {
                render(&state);
            }
        });
    })
}

fn tab_handler(weak: Weak<RefCell<SharedState>>) -> Rc<dyn Fn(String)> {
    Rc::new(move |name: String| {
        let Some(state) = weak.upgrade() else {
            return;
        };
        let changed = {
            let Ok(mut s) = state.try_borrow_mut() else {
                return;
            };
            let previous = s.session.state().active_sheet().map(str::to_string);
            s.session.set_active_sheet(&name) && previous.as_deref() != Some(name.as_str())
        };
        if changed {
            render(&state);
        }
    })
}

#[wasm_bindgen]
impl SheetPreview {
    /// Mount a preview into `container`.
    ///
    /// `config` is an optional object with `chunkSize`, `sentinelThreshold`,
    /// `locale`, `downloadUrlTemplate` and `logLevel`.
    #[wasm_bindgen(constructor)]
    pub fn new(container: HtmlElement, config: JsValue) -> Result<SheetPreview, JsValue> {
        let config = ViewerConfig::from_js(config)?;
        crate::logging::init(config.level_filter()?);

        let session = PreviewSession::new(config)?;
        let dom = PanelDom::new(container)?;
        let state = Rc::new(RefCell::new(SharedState {
            session,
            dom,
            observer: SentinelObserver::new(),
            on_change: None,
            destroyed: false,
        }));

        let on_tab = tab_handler(Rc::downgrade(&state));
        state.borrow_mut().dom.listen_tabs(on_tab)?;

        Ok(SheetPreview { state })
    }

    /// Fetch and show a file. Resolves to the final status string.
    ///
    /// `descriptor` is `{ id?, mime_type, link? }`. An empty `url` is resolved
    /// from the descriptor. Re-opening the current file is a no-op.
    pub fn open(&self, descriptor: JsValue, url: Option<String>) -> Result<Promise, JsValue> {
        let descriptor: FileDescriptor = serde_wasm_bindgen::from_value(descriptor)
            .map_err(|e| PreviewError::Config(format!("malformed file descriptor: {e}")))?;

        let url = match url.filter(|u| !u.is_empty()) {
            Some(url) => url,
            None => {
                let template = self.state.borrow().session.config().download_url_template.clone();
                descriptor
                    .resolve_url(&template)
                    .ok_or_else(|| PreviewError::Config("file has neither id nor link".into()))?
            }
        };

        // unsupported types fail without a request
        let unsupported = (!descriptor.is_supported()).then(|| descriptor.mime_type.clone());
        let token = {
            let mut s = self.state.borrow_mut();
            if s.destroyed || !s.session.needs_reload(&descriptor, &url) {
                let status = s.session.state().status().as_str();
                return Ok(Promise::resolve(&JsValue::from_str(status)));
            }
            s.observer.disconnect();
            s.session.begin_open(descriptor, &url)
        };
        render(&self.state);

        let weak = Rc::downgrade(&self.state);
        Ok(future_to_promise(async move {
            let fetched = match unsupported {
                None => fetch_bytes(&url).await,
                Some(mime) => Err(PreviewError::UnsupportedMime(mime)),
            };
            let Some(state) = weak.upgrade() else {
                return Ok(JsValue::UNDEFINED);
            };
            let (applied, status) = {
                let mut s = state.borrow_mut();
                let applied = !s.destroyed && s.session.finish_open(token, fetched);
                (applied, s.session.state().status().as_str())
            };
            if applied {
                render(&state);
            }
            Ok(JsValue::from_str(status))
        }))
    }

    /// Switch the visible sheet. Returns `false` for unknown names.
    pub fn set_active_sheet(&self, name: &str) -> bool {
        let changed = self.state.borrow_mut().session.set_active_sheet(name);
        if changed {
            render(&self.state);
        }
        changed
    }

    /// Load the next chunk of the active sheet, as a sentinel trigger would.
    ///
    /// Returns `appended`, `exhausted`, `busy` or `ignored`.
    pub fn load_next_chunk(&self) -> String {
        let outcome = self.state.borrow_mut().session.load_next_chunk();
        if matches!(outcome, ChunkOutcome::Appended { .. }) {
            render(&self.state);
        }
        outcome.as_str().to_string()
    }

    /// `loading`, `ready` or `failed`.
    pub fn status(&self) -> String {
        self.state.borrow().session.state().status().as_str().to_string()
    }

    /// Localized error text while `failed`.
    pub fn error_message(&self) -> Option<String> {
        match self.state.borrow().session.state().status() {
            ViewStatus::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.state.borrow().session.state().sheet_names().to_vec()
    }

    pub fn active_sheet(&self) -> Option<String> {
        self.state
            .borrow()
            .session
            .state()
            .active_sheet()
            .map(str::to_string)
    }

    pub fn loaded_row_count(&self, name: &str) -> usize {
        self.state.borrow().session.state().loaded_rows(name).len()
    }

    pub fn total_rows(&self, name: &str) -> u32 {
        self.state.borrow().session.state().total_rows(name)
    }

    /// The current panel model as a plain JS object.
    pub fn panel(&self) -> Result<JsValue, JsValue> {
        let s = self.state.borrow();
        serde_wasm_bindgen::to_value(&s.session.panel())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
    }

    /// Called after every redraw.
    pub fn set_on_change(&self, callback: Option<Function>) {
        self.state.borrow_mut().on_change = callback;
    }

    /// Detach the observer and the click listener and empty the container.
    pub fn destroy(&self) {
        let mut s = self.state.borrow_mut();
        if s.destroyed {
            return;
        }
        s.destroyed = true;
        s.observer.disconnect();
        s.dom.teardown();
        s.on_change = None;
        log::debug!("preview destroyed");
    }

    /// Whether the sentinel observer is attached (for tests and debugging).
    pub fn is_observing(&self) -> bool {
        self.state.borrow().observer.is_connected()
    }
}
