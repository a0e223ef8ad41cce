//! Browser tests for the wasm preview panel.
//!
//! Run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::HtmlElement;

use xlpreview::{is_supported_mime, FileDescriptor, SheetPreview};

wasm_bindgen_test_configure!(run_in_browser);

fn container() -> HtmlElement {
    let document = web_sys::window().unwrap().document().unwrap();
    let el: HtmlElement = document.create_element("div").unwrap().dyn_into().unwrap();
    el.style().set_property("height", "200px").unwrap();
    document.body().unwrap().append_child(&el).unwrap();
    el
}

fn count(root: &HtmlElement, selector: &str) -> u32 {
    root.query_selector_all(selector).unwrap().length()
}

fn csv_data_url(rows: u32) -> String {
    let body: String = (1..=rows).map(|i| format!("{i},item%20{i}%0A")).collect();
    format!("data:text/csv,{body}")
}

async fn open(preview: &SheetPreview, mime: &str, url: &str) -> String {
    let descriptor = serde_wasm_bindgen::to_value(&FileDescriptor::external(url, mime)).unwrap();
    let promise = preview.open(descriptor, Some(url.to_string())).unwrap();
    JsFuture::from(promise).await.unwrap().as_string().unwrap()
}

#[wasm_bindgen_test]
fn test_mime_filter() {
    assert!(is_supported_mime("text/csv"));
    assert!(is_supported_mime(
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    ));
    assert!(!is_supported_mime("application/pdf"));
}

#[wasm_bindgen_test]
fn test_new_panel_is_loading() {
    let root = container();
    let preview = SheetPreview::new(root.clone(), JsValue::UNDEFINED).unwrap();
    assert_eq!(preview.status(), "loading");
    assert!(preview.sheet_names().is_empty());
    assert!(!preview.set_active_sheet("Sheet1"));
    assert!(!preview.is_observing());
}

#[wasm_bindgen_test]
async fn test_open_csv_renders_first_chunk() {
    let root = container();
    let preview = SheetPreview::new(root.clone(), JsValue::UNDEFINED).unwrap();

    let status = open(&preview, "text/csv", &csv_data_url(45)).await;
    assert_eq!(status, "ready");
    assert_eq!(preview.sheet_names(), vec!["Sheet1".to_string()]);
    assert_eq!(count(&root, ".spreadsheet-preview__tab"), 1);
    assert_eq!(count(&root, ".spreadsheet-preview__grid tr"), 30);
    assert_eq!(count(&root, ".spreadsheet-preview__sentinel"), 1);
    assert!(preview.is_observing());

    assert_eq!(preview.load_next_chunk(), "appended");
    assert_eq!(count(&root, ".spreadsheet-preview__grid tr"), 45);
    assert_eq!(count(&root, ".spreadsheet-preview__sentinel"), 0);
    assert!(!preview.is_observing());

    preview.destroy();
    assert_eq!(root.child_element_count(), 0);
}

#[wasm_bindgen_test]
async fn test_throwing_change_callback_does_not_break_rendering() {
    let root = container();
    let preview = SheetPreview::new(root.clone(), JsValue::UNDEFINED).unwrap();
    preview.set_on_change(Some(js_sys::Function::new_no_args(
        "throw new Error('host callback failed');",
    )));

    let status = open(&preview, "text/csv", &csv_data_url(45)).await;
    assert_eq!(status, "ready");
    assert_eq!(preview.load_next_chunk(), "appended");
    assert_eq!(count(&root, ".spreadsheet-preview__grid tr"), 45);
    preview.destroy();
}

#[wasm_bindgen_test]
async fn test_unsupported_type_fails_without_fetch() {
    let root = container();
    let config = js_sys::JSON::parse(r#"{"locale":"en"}"#).unwrap();
    let preview = SheetPreview::new(root.clone(), config).unwrap();

    let status = open(&preview, "application/pdf", "data:application/pdf,x").await;
    assert_eq!(status, "failed");
    let message = preview.error_message().unwrap();
    assert!(message.starts_with("An error occurred while loading the file"));
    assert_eq!(count(&root, ".spreadsheet-preview__error"), 1);
    assert_eq!(count(&root, ".spreadsheet-preview__tab"), 0);
}

#[wasm_bindgen_test]
fn test_invalid_config_rejected() {
    let config = js_sys::JSON::parse(r#"{"chunkSize":0}"#).unwrap();
    assert!(SheetPreview::new(container(), config).is_err());
}
