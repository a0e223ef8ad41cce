//! Viewer configuration supplied by the host.
//!
//! Every field has a default, so an empty object (or `undefined` from JS)
//! yields the stock behaviour: 30-row chunks, sentinel at 50% visibility.

use serde::{Deserialize, Serialize};

use crate::chunk::CHUNK_SIZE;
use crate::error::{PreviewError, Result};
use crate::i18n::Locale;

/// Default download URL pattern for files hosted by the chat server.
pub const DEFAULT_DOWNLOAD_URL_TEMPLATE: &str = "/api/v4/files/{id}?download=1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    /// Rows materialized per chunk.
    pub chunk_size: u32,
    /// Fraction of the sentinel that must be visible to request the next chunk.
    pub sentinel_threshold: f64,
    pub locale: Locale,
    /// Download URL for hosted files; `{id}` is replaced by the file id.
    pub download_url_template: String,
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            sentinel_threshold: 0.5,
            locale: Locale::default(),
            download_url_template: DEFAULT_DOWNLOAD_URL_TEMPLATE.to_string(),
            log_level: "warn".to_string(),
        }
    }
}

impl ViewerConfig {
    /// Check ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(PreviewError::Config("chunkSize must be at least 1".into()));
        }
        if !(self.sentinel_threshold > 0.0 && self.sentinel_threshold <= 1.0) {
            return Err(PreviewError::Config(format!(
                "sentinelThreshold must be in (0, 1], got {}",
                self.sentinel_threshold
            )));
        }
        if !self.download_url_template.contains("{id}") {
            return Err(PreviewError::Config(
                "downloadUrlTemplate must contain {id}".into(),
            ));
        }
        self.level_filter().map(|_| ())
    }

    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        self.log_level
            .parse::<log::LevelFilter>()
            .map_err(|_| PreviewError::Config(format!("unknown logLevel {:?}", self.log_level)))
    }

    /// Parse from a JSON document, e.g. a host-provided settings blob.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PreviewError::Config(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read from a JS object; `undefined`/`null` mean defaults.
    #[cfg(target_arch = "wasm32")]
    pub fn from_js(value: wasm_bindgen::JsValue) -> Result<Self> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        let config: Self = serde_wasm_bindgen::from_value(value)
            .map_err(|e| PreviewError::Config(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}
