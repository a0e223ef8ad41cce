//! CLI tool for xlpreview - loads a CSV/XLSX file the way the preview panel
//! does and prints what the panel would show.
//!
//! Usage:
//!   xlpreview_cli <input.xlsx>                  # First chunk of the first sheet
//!   xlpreview_cli <input.csv> --chunks 2        # Plus two sentinel-triggered chunks
//!   xlpreview_cli <url> --mime text/csv --json  # Panel model as JSON
//!   xlpreview_cli <input.xlsx> --summary        # Sheet names and used ranges

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;
use tracing_subscriber::EnvFilter;

use xlpreview::logging::{filter_directive, level_from_verbosity};
use xlpreview::{FileDescriptor, FileFormat, PreviewSession, ViewStatus, ViewerConfig};

#[derive(Parser, Debug)]
#[command(name = "xlpreview_cli", version, about = "Chunked CSV/XLSX preview")]
struct Args {
    /// File path, file:// URL or http(s) URL
    input: String,

    /// MIME type; guessed from the extension when omitted
    #[arg(long)]
    mime: Option<String>,

    /// Sheet to show instead of the first one
    #[arg(long)]
    sheet: Option<String>,

    /// Extra chunks to load after the first
    #[arg(long, default_value_t = 0)]
    chunks: u32,

    /// Rows per chunk
    #[arg(long)]
    chunk_size: Option<u32>,

    /// Message language (ko, en)
    #[arg(long)]
    locale: Option<String>,

    /// Print the panel model as JSON
    #[arg(long, conflicts_with = "summary")]
    json: bool,

    /// Print sheet summaries as JSON
    #[arg(long)]
    summary: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

fn resolve_mime(args: &Args) -> Option<String> {
    args.mime.clone().or_else(|| {
        let path = args.input.split(['?', '#']).next().unwrap_or(&args.input);
        FileFormat::from_extension(path).map(|f| f.mime_type().to_string())
    })
}

fn build_config(args: &Args) -> ViewerConfig {
    let mut config = ViewerConfig::default();
    if let Some(size) = args.chunk_size {
        config.chunk_size = size;
    }
    if let Some(tag) = &args.locale {
        config.locale = xlpreview::i18n::Locale::from_tag(tag);
    }
    config
}

fn run(args: &Args) -> Result<(), String> {
    let mime = resolve_mime(args)
        .ok_or_else(|| format!("cannot tell the type of {}; pass --mime", args.input))?;

    let mut session = PreviewSession::new(build_config(args)).map_err(|e| e.to_string())?;
    session.open(FileDescriptor::external(args.input.as_str(), mime), &args.input);

    if let ViewStatus::Failed(message) = session.state().status() {
        return Err(message.clone());
    }

    if let Some(sheet) = &args.sheet {
        if !session.set_active_sheet(sheet) {
            return Err(format!(
                "no sheet named {sheet:?} (have: {})",
                session.state().sheet_names().join(", ")
            ));
        }
    }

    for _ in 0..args.chunks {
        let outcome = session.on_sentinel_visible(1.0);
        log::debug!("sentinel: {}", outcome.as_str());
        if !session.state().active_sheet().is_some_and(|s| session.state().has_more(s)) {
            break;
        }
    }

    let mut out = io::stdout().lock();
    if args.summary {
        let summaries = session
            .state()
            .workbook()
            .map(xlpreview::Workbook::summaries)
            .unwrap_or_default();
        serde_json::to_writer_pretty(&mut out, &summaries)
            .map_err(|e| e.to_string())
            .and_then(|()| writeln!(out).map_err(|e| e.to_string()))
    } else if args.json {
        serde_json::to_writer_pretty(&mut out, &session.panel())
            .map_err(|e| e.to_string())
            .and_then(|()| writeln!(out).map_err(|e| e.to_string()))
    } else {
        write_rows(&mut out, &session).map_err(|e| e.to_string())
    }
}

/// Tab-separated rows of the active sheet, then a progress line on stderr.
fn write_rows(out: &mut impl Write, session: &PreviewSession) -> io::Result<()> {
    let state = session.state();
    let Some(active) = state.active_sheet() else {
        return Ok(());
    };
    for row in state.loaded_rows(active) {
        writeln!(out, "{}", row.join("\t"))?;
    }
    eprintln!(
        "{active}: {} of {} rows{}",
        state.loaded_rows(active).len(),
        state.total_rows(active),
        if state.has_more(active) { " (more)" } else { "" }
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(level_from_verbosity(LevelFilter::Warn, args.verbose));

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
