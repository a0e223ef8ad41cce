//! Preview state machine.
//!
//! A [`ViewState`] moves `Loading -> Ready` or `Loading -> Failed` once per
//! file. While `Ready`, each sheet grows by whole chunks through
//! [`ViewState::load_next_chunk`]; loaded rows are append-only and are only
//! discarded when [`ViewState::begin_load`] starts the next file.
//!
//! Two guards keep the state consistent when callbacks interleave:
//! - a load generation, so a late result for a superseded file is dropped;
//! - a single in-flight flag shared by all sheets, so two chunk requests
//!   issued back to back append exactly one chunk.

use std::collections::HashMap;

use crate::chunk::{chunk_bounds, extract_rows, Row, CHUNK_SIZE};
use crate::error::{PreviewError, Result};
use crate::i18n::Locale;
use crate::types::Workbook;

/// Lifecycle of one preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    Loading,
    Ready,
    /// Localized message shown in place of the grid.
    Failed(String),
}

impl ViewStatus {
    /// Short machine-readable name: `loading`, `ready` or `failed`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Failed(_) => "failed",
        }
    }
}

/// Identifies one call to [`ViewState::begin_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadToken(u64);

/// A chunk request that holds the in-flight flag until completed or aborted.
///
/// Not `Clone`: the ticket is the flag, and only its holder may lower it.
#[derive(Debug, PartialEq, Eq)]
pub struct ChunkTicket {
    generation: u64,
    serial: u64,
    sheet: String,
    cursor: u32,
    start_row: u32,
    end_row: u32,
}

impl ChunkTicket {
    #[must_use]
    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// First and last sheet row (inclusive) this chunk covers.
    #[must_use]
    pub fn rows(&self) -> (u32, u32) {
        (self.start_row, self.end_row)
    }
}

/// Result of a chunk request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// `rows` new rows were appended.
    Appended { rows: usize },
    /// The sheet has no rows left to load.
    Exhausted,
    /// Another chunk is in flight.
    Busy,
    /// Not `Ready`, unknown sheet, or a ticket from a superseded load.
    Ignored,
}

impl ChunkOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Appended { .. } => "appended",
            Self::Exhausted => "exhausted",
            Self::Busy => "busy",
            Self::Ignored => "ignored",
        }
    }
}

/// Per-sheet loading progress.
#[derive(Debug, Clone, Default)]
pub struct SheetProgress {
    rows: Vec<Row>,
    total_rows: u32,
    cursor: u32,
}

/// Everything the panel needs to draw one preview.
#[derive(Debug)]
pub struct ViewState {
    generation: u64,
    status: ViewStatus,
    workbook: Option<Workbook>,
    sheet_names: Vec<String>,
    active_sheet: Option<String>,
    progress: HashMap<String, SheetProgress>,
    /// Serial of the outstanding [`ChunkTicket`], if any.
    in_flight: Option<u64>,
    next_serial: u64,
    chunk_size: u32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(CHUNK_SIZE)
    }
}

impl ViewState {
    /// Fresh state in `Loading`; `chunk_size` is clamped to at least 1.
    #[must_use]
    pub fn new(chunk_size: u32) -> Self {
        Self {
            generation: 0,
            status: ViewStatus::Loading,
            workbook: None,
            sheet_names: Vec::new(),
            active_sheet: None,
            progress: HashMap::new(),
            in_flight: None,
            next_serial: 0,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Start loading a new file: drop all per-sheet state and enter `Loading`.
    ///
    /// Any outstanding [`LoadToken`] or [`ChunkTicket`] becomes stale.
    pub fn begin_load(&mut self) -> LoadToken {
        self.generation = self.generation.wrapping_add(1);
        self.status = ViewStatus::Loading;
        self.workbook = None;
        self.sheet_names.clear();
        self.active_sheet = None;
        self.progress.clear();
        self.in_flight = None;
        LoadToken(self.generation)
    }

    #[must_use]
    pub fn is_current(&self, token: LoadToken) -> bool {
        token.0 == self.generation
    }

    /// Apply the result of a load started with `token`.
    ///
    /// On success the first chunk of every sheet is materialized and the first
    /// sheet becomes active. On failure, or when two sheets share a name, the
    /// state enters `Failed` with a localized message. Returns `false` (and changes nothing) when `token`
    /// has been superseded.
    pub fn finish_load(
        &mut self,
        token: LoadToken,
        result: Result<Workbook>,
        locale: Locale,
    ) -> bool {
        if !self.is_current(token) {
            log::warn!(
                "discarding stale load result (generation {}, current {})",
                token.0,
                self.generation
            );
            return false;
        }

        let result = result.and_then(|workbook| {
            if let Some(name) = workbook.duplicate_sheet_name() {
                return Err(PreviewError::Parse(format!("duplicate sheet name {name:?}")));
            }
            Ok(workbook)
        });

        match result {
            Ok(workbook) => {
                self.progress = workbook
                    .sheets
                    .iter()
                    .map(|sheet| {
                        let total_rows = sheet.total_rows();
                        let rows = sheet
                            .used_range()
                            .and_then(|range| {
                                chunk_bounds(range, 0, self.chunk_size)
                                    .map(|(start, end)| extract_rows(sheet, range, start, end))
                            })
                            .unwrap_or_default();
                        let progress = SheetProgress {
                            rows,
                            total_rows,
                            cursor: 1,
                        };
                        (sheet.name.clone(), progress)
                    })
                    .collect();
                self.sheet_names = workbook.sheet_names();
                self.active_sheet = self.sheet_names.first().cloned();
                self.workbook = Some(workbook);
                self.status = ViewStatus::Ready;
                log::info!(
                    "preview ready: {} sheet(s), active {:?}",
                    self.sheet_names.len(),
                    self.active_sheet
                );
            }
            Err(e) => {
                log::warn!("preview load failed ({:?}): {}", e.kind(), e);
                self.status = ViewStatus::Failed(locale.load_failed(&e.to_string()));
            }
        }
        true
    }

    #[must_use]
    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status == ViewStatus::Ready
    }

    #[must_use]
    pub fn workbook(&self) -> Option<&Workbook> {
        self.workbook.as_ref()
    }

    /// Sheet names in file order.
    #[must_use]
    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    #[must_use]
    pub fn active_sheet(&self) -> Option<&str> {
        self.active_sheet.as_deref()
    }

    #[must_use]
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Make `name` the active sheet. Touches nothing but the selection.
    ///
    /// Returns `false` when not `Ready` or the sheet does not exist.
    pub fn set_active_sheet(&mut self, name: &str) -> bool {
        if !self.is_ready() || !self.progress.contains_key(name) {
            return false;
        }
        if self.active_sheet.as_deref() != Some(name) {
            log::debug!("active sheet -> {name:?}");
            self.active_sheet = Some(name.to_string());
        }
        true
    }

    /// Rows loaded so far for `sheet` (empty for unknown sheets).
    #[must_use]
    pub fn loaded_rows(&self, sheet: &str) -> &[Row] {
        self.progress.get(sheet).map_or(&[], |p| p.rows.as_slice())
    }

    #[must_use]
    pub fn cursor(&self, sheet: &str) -> u32 {
        self.progress.get(sheet).map_or(0, |p| p.cursor)
    }

    #[must_use]
    pub fn total_rows(&self, sheet: &str) -> u32 {
        self.progress.get(sheet).map_or(0, |p| p.total_rows)
    }

    /// `cursor * chunk_size < total_rows`: the sentinel should be shown.
    #[must_use]
    pub fn has_more(&self, sheet: &str) -> bool {
        self.progress.get(sheet).is_some_and(|p| {
            u64::from(p.cursor) * u64::from(self.chunk_size) < u64::from(p.total_rows)
        })
    }

    fn prepare_chunk(&self, sheet: &str) -> std::result::Result<ChunkTicket, ChunkOutcome> {
        if !self.is_ready() {
            return Err(ChunkOutcome::Ignored);
        }
        let Some(progress) = self.progress.get(sheet) else {
            return Err(ChunkOutcome::Ignored);
        };
        if self.in_flight.is_some() {
            return Err(ChunkOutcome::Busy);
        }
        let range = self
            .workbook
            .as_ref()
            .and_then(|wb| wb.sheet(sheet))
            .and_then(|s| s.used_range())
            .ok_or(ChunkOutcome::Exhausted)?;
        let (start_row, end_row) =
            chunk_bounds(range, progress.cursor, self.chunk_size).ok_or(ChunkOutcome::Exhausted)?;

        Ok(ChunkTicket {
            generation: self.generation,
            serial: self.next_serial,
            sheet: sheet.to_string(),
            cursor: progress.cursor,
            start_row,
            end_row,
        })
    }

    /// Reserve the next chunk of `sheet`, raising the in-flight flag.
    ///
    /// `None` when another chunk is in flight, the sheet is exhausted or
    /// unknown, or the state is not `Ready`.
    pub fn begin_chunk(&mut self, sheet: &str) -> Option<ChunkTicket> {
        let ticket = self.prepare_chunk(sheet).ok()?;
        self.reserve(&ticket);
        Some(ticket)
    }

    fn reserve(&mut self, ticket: &ChunkTicket) {
        self.in_flight = Some(ticket.serial);
        self.next_serial = self.next_serial.wrapping_add(1);
    }

    fn holds_flag(&self, ticket: &ChunkTicket) -> bool {
        ticket.generation == self.generation && self.in_flight == Some(ticket.serial)
    }

    /// Materialize the ticket's rows, append them, and advance the cursor.
    pub fn complete_chunk(&mut self, ticket: ChunkTicket) -> ChunkOutcome {
        if !self.holds_flag(&ticket) {
            log::debug!("dropping chunk ticket that no longer holds the in-flight flag");
            return ChunkOutcome::Ignored;
        }
        self.in_flight = None;

        let Some(sheet) = self.workbook.as_ref().and_then(|wb| wb.sheet(&ticket.sheet)) else {
            return ChunkOutcome::Ignored;
        };
        let Some(range) = sheet.used_range() else {
            return ChunkOutcome::Exhausted;
        };
        let Some(progress) = self.progress.get_mut(&ticket.sheet) else {
            return ChunkOutcome::Ignored;
        };
        if progress.cursor != ticket.cursor {
            return ChunkOutcome::Ignored;
        }

        let rows = extract_rows(sheet, range, ticket.start_row, ticket.end_row);
        let appended = rows.len();
        progress.rows.extend(rows);
        progress.cursor = progress.cursor.saturating_add(1);
        log::debug!(
            "sheet {:?}: appended rows {}..={} ({} loaded of {})",
            ticket.sheet,
            ticket.start_row,
            ticket.end_row,
            progress.rows.len(),
            progress.total_rows
        );
        ChunkOutcome::Appended { rows: appended }
    }

    /// Release the in-flight flag without appending anything.
    #[allow(clippy::needless_pass_by_value)] // consumes the ticket
    pub fn abort_chunk(&mut self, ticket: ChunkTicket) {
        if self.holds_flag(&ticket) {
            self.in_flight = None;
        }
    }

    /// Load the next chunk of `sheet` in one step.
    pub fn load_next_chunk(&mut self, sheet: &str) -> ChunkOutcome {
        match self.prepare_chunk(sheet) {
            Ok(ticket) => {
                self.reserve(&ticket);
                self.complete_chunk(ticket)
            }
            Err(outcome) => outcome,
        }
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
    use crate::types::{CellValue, Sheet};

    fn sheet_with_rows(name: &str, rows: u32) -> Sheet {
        let mut sheet = Sheet::new(name);
        for r in 0..rows {
            sheet.set_cell(r, 0, CellValue::Number(f64::from(r)));
        }
        sheet.fit_used_range();
        sheet
    }

    fn ready_state(sheets: &[(&str, u32)]) -> ViewState {
        let mut state = ViewState::default();
        let token = state.begin_load();
        let wb = Workbook::new(sheets.iter().map(|&(n, r)| sheet_with_rows(n, r)).collect());
        assert!(state.finish_load(token, Ok(wb), Locale::En));
        state
    }

    #[test]
    fn test_first_chunk_of_every_sheet_on_load() {
        let state = ready_state(&[("A", 10), ("B", 50), ("C", 10)]);
        assert_eq!(state.status(), &ViewStatus::Ready);
        assert_eq!(state.sheet_names(), ["A", "B", "C"]);
        assert_eq!(state.active_sheet(), Some("A"));
        assert_eq!(state.loaded_rows("A").len(), 10);
        assert_eq!(state.loaded_rows("B").len(), 30);
        assert_eq!(state.loaded_rows("C").len(), 10);
        assert!(state.has_more("B"));
        assert!(!state.has_more("A"));
    }

    #[test]
    fn test_chunks_until_exhausted() {
        let mut state = ready_state(&[("Sheet1", 65)]);
        assert_eq!(state.load_next_chunk("Sheet1"), ChunkOutcome::Appended { rows: 30 });
        assert_eq!(state.loaded_rows("Sheet1").len(), 60);
        assert_eq!(state.load_next_chunk("Sheet1"), ChunkOutcome::Appended { rows: 5 });
        assert_eq!(state.loaded_rows("Sheet1").len(), 65);
        assert_eq!(state.cursor("Sheet1"), 3);
        assert!(!state.has_more("Sheet1"));
        for _ in 0..5 {
            assert_eq!(state.load_next_chunk("Sheet1"), ChunkOutcome::Exhausted);
        }
        assert_eq!(state.loaded_rows("Sheet1").len(), 65);
        assert_eq!(state.cursor("Sheet1"), 3);
        assert_eq!(state.loaded_rows("Sheet1")[64], vec!["64"]);
    }

    #[test]
    fn test_outstanding_ticket_blocks_every_sheet() {
        let mut state = ready_state(&[("A", 100), ("B", 100)]);
        let ticket = state.begin_chunk("A").unwrap();
        assert!(state.is_in_flight());
        assert!(state.begin_chunk("B").is_none());
        assert_eq!(state.load_next_chunk("A"), ChunkOutcome::Busy);
        assert_eq!(state.complete_chunk(ticket), ChunkOutcome::Appended { rows: 30 });
        assert_eq!(state.loaded_rows("A").len(), 60);
        assert_eq!(state.loaded_rows("B").len(), 30);
        assert!(!state.is_in_flight());
    }

    #[test]
    fn test_abort_releases_flag() {
        let mut state = ready_state(&[("A", 100)]);
        let ticket = state.begin_chunk("A").unwrap();
        assert_eq!(ticket.sheet(), "A");
        assert_eq!(ticket.rows(), (30, 59));
        state.abort_chunk(ticket);
        assert!(!state.is_in_flight());
        assert_eq!(state.loaded_rows("A").len(), 30);
        assert_eq!(state.cursor("A"), 1);
    }

    #[test]
    fn test_stale_ticket_cannot_release_newer_flag() {
        let mut state = ready_state(&[("A", 200)]);
        let stale = state.begin_chunk("A").unwrap();
        let token = state.begin_load();
        let wb = Workbook::new(vec![sheet_with_rows("A", 200)]);
        assert!(state.finish_load(token, Ok(wb), Locale::En));

        let current = state.begin_chunk("A").unwrap();
        assert_ne!(stale, current);
        state.abort_chunk(stale);
        assert!(state.is_in_flight());
        assert_eq!(state.load_next_chunk("A"), ChunkOutcome::Busy);

        assert_eq!(state.complete_chunk(current), ChunkOutcome::Appended { rows: 30 });
        assert!(!state.is_in_flight());
        assert_eq!(state.loaded_rows("A").len(), 60);
    }

    #[test]
    fn test_each_ticket_is_distinct() {
        let mut state = ready_state(&[("A", 200)]);
        let first = state.begin_chunk("A").unwrap();
        state.abort_chunk(first);
        let second = state.begin_chunk("A").unwrap();
        assert_eq!(second.rows(), (30, 59));
        assert_ne!(second.serial, 0);
        assert_eq!(state.complete_chunk(second), ChunkOutcome::Appended { rows: 30 });
    }

    #[test]
    fn test_duplicate_sheet_names_fail_the_load() {
        let mut state = ViewState::default();
        let token = state.begin_load();
        let wb = Workbook::new(vec![sheet_with_rows("Data", 5), sheet_with_rows("Data", 40)]);
        assert!(state.finish_load(token, Ok(wb), Locale::En));
        let ViewStatus::Failed(message) = state.status() else {
            panic!("expected Failed, got {:?}", state.status());
        };
        assert!(message.contains("duplicate sheet name \"Data\""));
        assert!(state.sheet_names().is_empty());
        assert_eq!(state.load_next_chunk("Data"), ChunkOutcome::Ignored);
    }

    #[test]
    fn test_switching_sheet_touches_nothing_else() {
        let mut state = ready_state(&[("A", 40), ("B", 40)]);
        state.load_next_chunk("A");
        let before = (state.loaded_rows("A").to_vec(), state.cursor("A"), state.total_rows("A"));
        assert!(state.set_active_sheet("B"));
        assert!(state.set_active_sheet("A"));
        let after = (state.loaded_rows("A").to_vec(), state.cursor("A"), state.total_rows("A"));
        assert_eq!(before, after);
        assert!(!state.set_active_sheet("Nope"));
        assert_eq!(state.active_sheet(), Some("A"));
    }

    #[test]
    fn test_new_load_resets_everything() {
        let mut state = ready_state(&[("A", 100)]);
        state.load_next_chunk("A");
        let stale_ticket = state.begin_chunk("A").unwrap();
        let token = state.begin_load();
        assert_eq!(state.status(), &ViewStatus::Loading);
        assert!(state.sheet_names().is_empty());
        assert!(state.loaded_rows("A").is_empty());
        assert!(!state.is_in_flight());
        assert_eq!(state.load_next_chunk("A"), ChunkOutcome::Ignored);

        let wb = Workbook::new(vec![sheet_with_rows("A", 100)]);
        assert!(state.finish_load(token, Ok(wb), Locale::En));
        assert_eq!(state.complete_chunk(stale_ticket), ChunkOutcome::Ignored);
        assert_eq!(state.loaded_rows("A").len(), 30);
    }

    #[test]
    fn test_stale_load_is_discarded() {
        let mut state = ViewState::default();
        let first = state.begin_load();
        let second = state.begin_load();
        assert!(state.finish_load(second, Ok(Workbook::new(vec![sheet_with_rows("New", 3)])), Locale::En));
        assert!(!state.finish_load(first, Ok(Workbook::new(vec![sheet_with_rows("Old", 3)])), Locale::En));
        assert_eq!(state.sheet_names(), ["New"]);
    }

    #[test]
    fn test_failed_load_has_localized_message() {
        let mut state = ViewState::default();
        let token = state.begin_load();
        state.finish_load(token, Err(PreviewError::Parse("bad header".into())), Locale::Ko);
        let ViewStatus::Failed(message) = state.status() else {
            panic!("expected Failed, got {:?}", state.status());
        };
        assert!(message.starts_with("파일을 불러오는 중 오류가 발생했습니다: "));
        assert!(message.contains("bad header"));
        assert!(state.sheet_names().is_empty());
        assert_eq!(state.load_next_chunk("Sheet1"), ChunkOutcome::Ignored);
    }

    #[test]
    fn test_empty_sheet_never_loads() {
        let mut state = ready_state(&[("Empty", 0)]);
        assert_eq!(state.total_rows("Empty"), 0);
        assert!(state.loaded_rows("Empty").is_empty());
        assert!(!state.has_more("Empty"));
        assert_eq!(state.load_next_chunk("Empty"), ChunkOutcome::Exhausted);
    }

    #[test]
    fn test_custom_chunk_size() {
        let mut state = ViewState::new(0);
        assert_eq!(state.chunk_size(), 1);
        let token = state.begin_load();
        state.finish_load(token, Ok(Workbook::new(vec![sheet_with_rows("S", 3)])), Locale::En);
        assert_eq!(state.loaded_rows("S").len(), 1);
        state.load_next_chunk("S");
        state.load_next_chunk("S");
        assert_eq!(state.loaded_rows("S").len(), 3);
        assert_eq!(state.load_next_chunk("S"), ChunkOutcome::Exhausted);
    }
}
