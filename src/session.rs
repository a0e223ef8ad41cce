//! One preview panel's worth of state, independent of any renderer.
//!
//! The wasm viewer wraps a [`PreviewSession`] in `Rc<RefCell<_>>` and drives
//! it from DOM callbacks; the CLI and the integration tests drive it directly.

use crate::config::ViewerConfig;
use crate::error::{PreviewError, Result};
use crate::mime::FileDescriptor;
use crate::panel::PanelModel;
use crate::parser::parse_bytes;
use crate::state::{ChunkOutcome, ChunkTicket, LoadToken, ViewState};

#[derive(Debug)]
pub struct PreviewSession {
    config: ViewerConfig,
    state: ViewState,
    descriptor: Option<FileDescriptor>,
    url: Option<String>,
}

impl PreviewSession {
    pub fn new(config: ViewerConfig) -> Result<Self> {
        config.validate()?;
        let state = ViewState::new(config.chunk_size);
        Ok(Self {
            config,
            state,
            descriptor: None,
            url: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    #[must_use]
    pub fn descriptor(&self) -> Option<&FileDescriptor> {
        self.descriptor.as_ref()
    }

    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// A new URL or a different file identity means a fresh load.
    #[must_use]
    pub fn needs_reload(&self, descriptor: &FileDescriptor, url: &str) -> bool {
        self.url.as_deref() != Some(url) || self.descriptor.as_ref() != Some(descriptor)
    }

    /// Enter `Loading` for `descriptor` at `url`, dropping all per-sheet state.
    pub fn begin_open(&mut self, descriptor: FileDescriptor, url: &str) -> LoadToken {
        log::info!("opening {url} ({})", descriptor.mime_type);
        self.descriptor = Some(descriptor);
        self.url = Some(url.to_string());
        self.state.begin_load()
    }

    /// Parse fetched bytes (or record the fetch error) for the load `token`.
    ///
    /// Returns `false` if a newer load has started since; the bytes are then
    /// not parsed at all.
    pub fn finish_open(&mut self, token: LoadToken, fetched: Result<Vec<u8>>) -> bool {
        if !self.state.is_current(token) {
            log::warn!("ignoring fetch result for superseded load");
            return false;
        }
        let result = fetched.and_then(|bytes| self.parse_current(&bytes));
        self.state.finish_load(token, result, self.config.locale)
    }

    fn parse_current(&self, bytes: &[u8]) -> Result<crate::types::Workbook> {
        let descriptor = self
            .descriptor
            .as_ref()
            .ok_or_else(|| PreviewError::Parse("no file is open".into()))?;
        if !descriptor.is_supported() {
            return Err(PreviewError::UnsupportedMime(descriptor.mime_type.clone()));
        }
        parse_bytes(bytes, Some(&descriptor.mime_type))
    }

    /// Load already-fetched bytes in one step.
    pub fn open_bytes(&mut self, descriptor: FileDescriptor, url: &str, bytes: Vec<u8>) -> bool {
        let token = self.begin_open(descriptor, url);
        self.finish_open(token, Ok(bytes))
    }

    /// Fetch `url` (blocking) and load it.
    ///
    /// An unsupported MIME type fails the load without touching the network.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn open(&mut self, descriptor: FileDescriptor, url: &str) -> bool {
        let unsupported = (!descriptor.is_supported())
            .then(|| PreviewError::UnsupportedMime(descriptor.mime_type.clone()));
        let token = self.begin_open(descriptor, url);
        let fetched = match unsupported {
            Some(error) => Err(error),
            None => crate::fetch::fetch_bytes(url),
        };
        self.finish_open(token, fetched)
    }

    /// Fetch the descriptor's own download URL and load it.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn open_descriptor(&mut self, descriptor: FileDescriptor) -> Result<bool> {
        let url = descriptor
            .resolve_url(&self.config.download_url_template)
            .ok_or_else(|| PreviewError::Config("file has neither id nor link".into()))?;
        Ok(self.open(descriptor, &url))
    }

    pub fn set_active_sheet(&mut self, name: &str) -> bool {
        self.state.set_active_sheet(name)
    }

    /// Load the next chunk of the active sheet.
    pub fn load_next_chunk(&mut self) -> ChunkOutcome {
        let Some(active) = self.state.active_sheet().map(str::to_string) else {
            return ChunkOutcome::Ignored;
        };
        self.state.load_next_chunk(&active)
    }

    /// Reserve the next chunk of the active sheet; see [`ViewState::begin_chunk`].
    pub fn begin_next_chunk(&mut self) -> Option<ChunkTicket> {
        let active = self.state.active_sheet()?.to_string();
        self.state.begin_chunk(&active)
    }

    pub fn complete_chunk(&mut self, ticket: ChunkTicket) -> ChunkOutcome {
        self.state.complete_chunk(ticket)
    }

    pub fn abort_chunk(&mut self, ticket: ChunkTicket) {
        self.state.abort_chunk(ticket);
    }

    /// Sentinel visibility changed; load more once it crosses the threshold.
    pub fn on_sentinel_visible(&mut self, ratio: f64) -> ChunkOutcome {
        if ratio < self.config.sentinel_threshold {
            return ChunkOutcome::Ignored;
        }
        self.load_next_chunk()
    }

    #[must_use]
    pub fn panel(&self) -> PanelModel<'_> {
        PanelModel::build(&self.state, self.config.locale)
    }
}
