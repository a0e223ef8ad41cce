//! Scoped `IntersectionObserver` watching the lazy-load sentinel.

use std::rc::Rc;

use js_sys::{Array, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

type EntriesCallback = Closure<dyn FnMut(Array, IntersectionObserver)>;

/// At most one live observer. Connecting again replaces the previous one,
/// and dropping the wrapper disconnects it.
#[derive(Default)]
pub(crate) struct SentinelObserver {
    observer: Option<IntersectionObserver>,
    callback: Option<EntriesCallback>,
}

impl SentinelObserver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Observe `sentinel` inside the scroll container `root`.
    ///
    /// `on_visible` receives the intersection ratio of each intersecting
    /// entry. It is called from inside the observer callback, so it must not
    /// reconnect or drop this observer synchronously.
    pub(crate) fn connect(
        &mut self,
        root: &Element,
        sentinel: &Element,
        threshold: f64,
        on_visible: Rc<dyn Fn(f64)>,
    ) -> Result<(), JsValue> {
        self.disconnect();

        let callback = Closure::wrap(Box::new(move |entries: Array, _: IntersectionObserver| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                if entry.is_intersecting() {
                    on_visible(entry.intersection_ratio());
                }
            }
        }) as Box<dyn FnMut(Array, IntersectionObserver)>);

        let init = IntersectionObserverInit::new();
        Reflect::set(&init, &JsValue::from_str("root"), root)?;
        Reflect::set(
            &init,
            &JsValue::from_str("threshold"),
            &JsValue::from_f64(threshold),
        )?;

        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;
        observer.observe(sentinel);

        self.observer = Some(observer);
        self.callback = Some(callback);
        Ok(())
    }

    pub(crate) fn disconnect(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
        self.callback = None;
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.observer.is_some()
    }
}

impl Drop for SentinelObserver {
    fn drop(&mut self) {
        self.disconnect();
    }
}
