//! DOCX Font Probe CLI tool
//!
//! Converts a DOCX file to PDF on stdout while logging font diagnostics to stderr.

use chrono::{SecondsFormat, Utc};
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::EnvFilter;

use docx_font_probe::probe::{self, ExitStatus, FallbackPolicy, ProbeOptions};
use docx_font_probe::settings::DrawingEngine;

/// DOCX Font Probe - Convert DOCX to PDF on stdout with font diagnostics on stderr
#[derive(Parser)]
#[command(name = "docx-font-probe")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXIT CODES:
    0  PDF written to stdout
    1  Conversion failed or invalid arguments
    2  DOCX file not found
    3  Font file not found

EXAMPLES:
    # Convert demo.docx next to the executable using the bundled fonts
    docx-font-probe > out.pdf

    # Convert a document with explicit fonts
    docx-font-probe report.docx --font Inter-Regular.ttf --font JetBrainsMono-Regular.ttf > report.pdf

    # Only log unresolved fonts instead of substituting the first font
    docx-font-probe report.docx --fallback none > report.pdf")]
struct Cli {
    /// DOCX file to convert (default: demo.docx beside the executable)
    document: Option<PathBuf>,

    /// Font file to register, in order; may be repeated
    /// (default: Inter-Regular.ttf and JetBrainsMono-Regular.ttf beside the executable)
    #[arg(long = "font", value_name = "PATH")]
    fonts: Vec<PathBuf>,

    /// Directory listed as a diagnostic
    #[arg(long, value_name = "DIR", default_value = probe::DEFAULT_SYSTEM_FONTS_DIR)]
    system_fonts: PathBuf,

    /// How text is drawn into the PDF
    #[arg(long, value_enum, default_value_t = EngineArg::Embedded)]
    engine: EngineArg,

    /// What to do when the document uses a font that is not registered
    #[arg(long, value_enum, default_value_t = FallbackArg::FirstFont)]
    fallback: FallbackArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum EngineArg {
    /// Embed the registered fonts
    Embedded,
    /// Use the base-14 Helvetica fonts
    Standard,
}

impl From<EngineArg> for DrawingEngine {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Embedded => DrawingEngine::Embedded,
            EngineArg::Standard => DrawingEngine::Standard,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FallbackArg {
    /// Substitute the first font file's bytes
    FirstFont,
    /// Log only
    None,
}

impl From<FallbackArg> for FallbackPolicy {
    fn from(arg: FallbackArg) -> Self {
        match arg {
            FallbackArg::FirstFont => FallbackPolicy::FirstFont,
            FallbackArg::None => FallbackPolicy::None,
        }
    }
}

/// `[2026-01-14T09:15:02.123456Z]` timestamps
struct UtcMicros;

impl FormatTime for UtcMicros {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "[{}]", Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_timer(UtcMicros)
        .with_env_filter(filter)
        .init();
}

fn options_from(cli: Cli) -> ProbeOptions {
    let defaults = ProbeOptions::with_base_dir(&probe::base_dir());

    ProbeOptions {
        document: cli.document.unwrap_or(defaults.document),
        fonts: if cli.fonts.is_empty() { defaults.fonts } else { cli.fonts },
        system_fonts_dir: cli.system_fonts,
        engine: cli.engine.into(),
        fallback: cli.fallback.into(),
    }
}

/// Parse the command line; usage errors exit 1 since 2 means a missing document
fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            process::exit(ExitStatus::Fatal.code());
        }
    }
}

fn main() {
    let cli = parse_cli();
    init_logging();

    let options = options_from(cli);

    let status = {
        let mut stdout = std::io::stdout().lock();
        let status = probe::run(&options, &mut stdout);
        let _ = stdout.flush();
        status
    };

    process::exit(status.code());
}
