//! `log` sink for the browser console.
//!
//! Native builds leave logger installation to the binary (the CLI uses
//! `tracing-subscriber`); the level helpers here serve both.

use log::{LevelFilter, Record};

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn format_record(record: &Record<'_>) -> String {
    format!("[xlpreview {}] {}", record.target(), record.args())
}

#[cfg(target_arch = "wasm32")]
mod console {
    use log::{Level, Metadata, Record};
    use wasm_bindgen::JsValue;

    pub(super) struct ConsoleLogger;

    impl log::Log for ConsoleLogger {
        fn enabled(&self, metadata: &Metadata<'_>) -> bool {
            metadata.level() <= log::max_level()
        }

        fn log(&self, record: &Record<'_>) {
            if !self.enabled(record.metadata()) {
                return;
            }
            let line = JsValue::from_str(&super::format_record(record));
            match record.level() {
                Level::Error => web_sys::console::error_1(&line),
                Level::Warn => web_sys::console::warn_1(&line),
                Level::Info => web_sys::console::info_1(&line),
                Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
            }
        }

        fn flush(&self) {}
    }
}

/// Install the panic hook and console logger, then set the level.
///
/// Safe to call once per viewer: the logger is installed only the first time,
/// the level follows the most recent call.
#[cfg(target_arch = "wasm32")]
pub fn init(level: LevelFilter) {
    static LOGGER: console::ConsoleLogger = console::ConsoleLogger;
    console_error_panic_hook::set_once();
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

/// `EnvFilter` directive enabling `level` for this crate only.
#[must_use]
pub fn filter_directive(level: LevelFilter) -> String {
    format!(
        "{}={}",
        env!("CARGO_CRATE_NAME"),
        level.as_str().to_ascii_lowercase()
    )
}

/// Raise `base` by one level per `-v` flag, saturating at `trace`.
#[must_use]
pub fn level_from_verbosity(base: LevelFilter, verbose: u8) -> LevelFilter {
    const LEVELS: [LevelFilter; 6] = [
        LevelFilter::Off,
        LevelFilter::Error,
        LevelFilter::Warn,
        LevelFilter::Info,
        LevelFilter::Debug,
        LevelFilter::Trace,
    ];
    let start = LEVELS.iter().position(|l| *l == base).unwrap_or(2);
    let idx = start.saturating_add(usize::from(verbose));
    LEVELS.get(idx).copied().unwrap_or(LevelFilter::Trace)
}
