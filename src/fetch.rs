//! Retrieve file bytes and turn them into a [`Workbook`].
//!
//! Wasm builds go through the browser `fetch` API; native builds use a
//! blocking `reqwest` client for `http(s)://` and read everything else from
//! disk. There is no timeout and no retry on either side.

use crate::error::{PreviewError, Result};
use crate::parser::parse_bytes;
use crate::types::Workbook;

#[cfg(target_arch = "wasm32")]
mod platform {
    use js_sys::Uint8Array;
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::Response;

    use crate::error::{PreviewError, Result};

    fn js_error(value: &JsValue) -> PreviewError {
        let detail = value
            .as_string()
            .or_else(|| {
                value
                    .dyn_ref::<js_sys::Error>()
                    .map(|e| String::from(e.message()))
            })
            .unwrap_or_else(|| format!("{value:?}"));
        PreviewError::Fetch(detail)
    }

    /// GET `url` with `window.fetch` and collect the body.
    pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
        let window =
            web_sys::window().ok_or_else(|| PreviewError::Fetch("no window object".into()))?;

        let response = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(|e| js_error(&e))?;
        let response: Response = response
            .dyn_into()
            .map_err(|_| PreviewError::Fetch("fetch did not resolve to a Response".into()))?;

        if !response.ok() {
            return Err(PreviewError::HttpStatus {
                status: response.status(),
                url: url.to_string(),
            });
        }

        let body = response.array_buffer().map_err(|e| js_error(&e))?;
        let buffer = JsFuture::from(body).await.map_err(|e| js_error(&e))?;
        Ok(Uint8Array::new(&buffer).to_vec())
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod platform {
    use std::path::Path;

    use crate::error::{PreviewError, Result};

    const USER_AGENT: &str = concat!("xlpreview/", env!("CARGO_PKG_VERSION"));

    fn http_get(url: &str) -> Result<Vec<u8>> {
        let http = reqwest::blocking::Client::builder()
            .timeout(None)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PreviewError::Fetch(format!("failed to build HTTP client: {e}")))?;

        let response = http
            .get(url)
            .send()
            .map_err(|e| PreviewError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PreviewError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response
            .bytes()
            .map_err(|e| PreviewError::Fetch(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Read `url`: `http(s)://` over the network, `file://` or a bare path from disk.
    pub fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return http_get(url);
        }
        let path = url.strip_prefix("file://").unwrap_or(url);
        Ok(std::fs::read(Path::new(path))?)
    }
}

pub use platform::fetch_bytes;

fn parse_fetched(url: &str, bytes: &[u8], mime: Option<&str>) -> Result<Workbook> {
    log::debug!("fetched {} bytes from {url}", bytes.len());
    if bytes.is_empty() && mime.is_none() {
        return Err(PreviewError::Parse(format!("{url} returned an empty body")));
    }
    parse_bytes(bytes, mime)
}

/// Fetch `url` and parse it; `mime` picks the reader when known.
#[cfg(target_arch = "wasm32")]
pub async fn load(url: &str, mime: Option<&str>) -> Result<Workbook> {
    log::info!("loading {url}");
    let bytes = fetch_bytes(url).await?;
    parse_fetched(url, &bytes, mime)
}

/// Fetch `url` and parse it; `mime` picks the reader when known.
#[cfg(not(target_arch = "wasm32"))]
pub fn load(url: &str, mime: Option<&str>) -> Result<Workbook> {
    log::info!("loading {url}");
    let bytes = fetch_bytes(url)?;
    parse_fetched(url, &bytes, mime)
}
