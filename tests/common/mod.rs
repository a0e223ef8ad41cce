//! Shared helpers for driving a preview session in integration tests.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use xlpreview::mime::{MIME_CSV, MIME_XLSX};
use xlpreview::{FileDescriptor, PreviewSession, Row, ViewStatus, ViewerConfig};

/// A session with default configuration.
pub fn session() -> PreviewSession {
    PreviewSession::new(ViewerConfig::default()).unwrap()
}

/// Open `bytes` as a hosted file with id `id`.
pub fn open(session: &mut PreviewSession, id: &str, mime: &str, bytes: Vec<u8>) {
    let url = format!("/api/v4/files/{id}?download=1");
    session.open_bytes(FileDescriptor::hosted(id, mime), &url, bytes);
}

/// New session with a CSV already loaded.
pub fn open_csv(bytes: Vec<u8>) -> PreviewSession {
    let mut s = session();
    open(&mut s, "csv", MIME_CSV, bytes);
    s
}

/// New session with an XLSX already loaded.
pub fn open_xlsx(bytes: Vec<u8>) -> PreviewSession {
    let mut s = session();
    open(&mut s, "xlsx", MIME_XLSX, bytes);
    s
}

pub fn assert_ready(session: &PreviewSession) {
    assert_eq!(
        session.state().status(),
        &ViewStatus::Ready,
        "expected Ready, got {:?}",
        session.state().status()
    );
}

/// The localized failure message, panicking unless the session failed.
pub fn failure_message(session: &PreviewSession) -> String {
    match session.state().status() {
        ViewStatus::Failed(message) => message.clone(),
        other => panic!("expected Failed, got {other:?}"),
    }
}

/// Loaded rows of the active sheet.
pub fn active_rows(session: &PreviewSession) -> &[Row] {
    let state = session.state();
    let active = state.active_sheet().expect("no active sheet");
    state.loaded_rows(active)
}

/// First column of each row.
pub fn first_column(rows: &[Row]) -> Vec<&str> {
    rows.iter().map(|r| r[0].as_str()).collect()
}

/// Keep firing the sentinel until the active sheet is exhausted.
///
/// Returns the number of chunks appended.
pub fn drain(session: &mut PreviewSession) -> usize {
    let mut appended = 0;
    while session
        .state()
        .active_sheet()
        .is_some_and(|s| session.state().has_more(s))
    {
        session.on_sentinel_visible(1.0);
        appended += 1;
        assert!(appended < 10_000, "sentinel never exhausted the sheet");
    }
    appended
}
