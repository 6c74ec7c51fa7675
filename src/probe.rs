//! The probe procedure: validate inputs, register fonts, convert, stream the PDF
//!
//! Everything after input validation funnels into one fallible step whose
//! failure is logged as `FATAL:` and mapped to [`ExitStatus::Fatal`]. The
//! writer only ever receives a complete PDF.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{error, info, warn};

use crate::fonts::{list_font_files, FontRepository, QueryNotFoundFontArgs};
use crate::pdf;
use crate::server::DocumentServer;
use crate::settings::{self, DrawingEngine};

/// Document looked for beside the executable when none is given
pub const DEFAULT_DOCUMENT: &str = "demo.docx";

/// Font files looked for beside the executable when none are given
pub const DEFAULT_FONTS: &[&str] = &["Inter-Regular.ttf", "JetBrainsMono-Regular.ttf"];

/// Directory listed as a diagnostic
pub const DEFAULT_SYSTEM_FONTS_DIR: &str = "/usr/share/fonts";

/// Distinct repository font names logged before truncating
const MAX_LISTED_FONTS: usize = 30;

/// What to do when the renderer asks for a font nobody registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Hand the renderer the bytes of the first font file
    #[default]
    FirstFont,
    /// Log only; the renderer uses its own substitute
    None,
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackPolicy::FirstFont => write!(f, "first-font"),
            FallbackPolicy::None => write!(f, "none"),
        }
    }
}

/// Process exit status of a probe run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Fatal,
    DocumentNotFound,
    FontNotFound,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Fatal => 1,
            ExitStatus::DocumentNotFound => 2,
            ExitStatus::FontNotFound => 3,
        }
    }
}

/// Resolved inputs of a probe run
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOptions {
    pub document: PathBuf,
    /// Font files in registration order; the first one is the fallback
    pub fonts: Vec<PathBuf>,
    pub system_fonts_dir: PathBuf,
    pub engine: DrawingEngine,
    pub fallback: FallbackPolicy,
}

impl ProbeOptions {
    /// Default inputs relative to `base_dir`
    pub fn with_base_dir(base_dir: &Path) -> Self {
        Self {
            document: base_dir.join(DEFAULT_DOCUMENT),
            fonts: DEFAULT_FONTS.iter().map(|f| base_dir.join(f)).collect(),
            system_fonts_dir: PathBuf::from(DEFAULT_SYSTEM_FONTS_DIR),
            engine: DrawingEngine::default(),
            fallback: FallbackPolicy::default(),
        }
    }
}

/// Directory of the running executable, or the working directory if unknown
pub fn base_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Run the probe, writing the PDF to `out` on success
pub fn run<W: Write>(options: &ProbeOptions, out: &mut W) -> ExitStatus {
    log_environment(options);

    if !options.document.is_file() {
        error!("ERROR: DOCX not found: {}", options.document.display());
        return ExitStatus::DocumentNotFound;
    }
    for font in &options.fonts {
        if !font.is_file() {
            error!("ERROR: Font not found: {}", font.display());
            return ExitStatus::FontNotFound;
        }
    }

    let result = convert(options).and_then(|pdf| {
        out.write_all(&pdf).context("Failed to write PDF to stdout")?;
        out.flush().context("Failed to flush stdout")?;
        Ok(())
    });

    match result {
        Ok(()) => {
            info!("Done.");
            ExitStatus::Success
        }
        Err(e) => {
            error!("FATAL:");
            error!("{:?}", e);
            ExitStatus::Fatal
        }
    }
}

fn log_environment(options: &ProbeOptions) {
    info!(
        "OS: {} {} ({})",
        std::env::consts::OS,
        std::env::consts::ARCH,
        std::env::consts::FAMILY
    );
    info!(
        "Runtime: Rust ({}-{}, {} build), {} {}",
        std::env::consts::ARCH,
        std::env::consts::OS,
        if cfg!(debug_assertions) { "debug" } else { "release" },
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    info!("BaseDir: {}", base_dir().display());
    info!("DOCX: {}", options.document.display());
    for font in &options.fonts {
        info!("Font: {}", font.display());
    }
}

/// Configure, register fonts, load and export; returns the PDF bytes
fn convert(options: &ProbeOptions) -> anyhow::Result<Vec<u8>> {
    settings::set_drawing_engine(options.engine);
    info!("Drawing engine = {}", settings::drawing_engine());

    log_system_fonts(&options.system_fonts_dir);

    let mut repository = FontRepository::new();
    install_fallback(&mut repository, options);

    for font in &options.fonts {
        repository
            .add_font(font)
            .with_context(|| format!("Failed to register font {}", font.display()))?;
    }

    let mut server = DocumentServer::new(repository);
    log_repository(server.fonts());

    info!("Loading DOCX...");
    server
        .load_document(&options.document)
        .with_context(|| format!("Failed to load {}", options.document.display()))?;
    if let Some(document) = server.document() {
        info!("DOCX declares fonts: [{}]", document.declared_fonts.join(", "));
        info!("DOCX uses fonts: [{}]", document.used_font_families().join(", "));
    }

    info!("Exporting to PDF (stream)...");
    let mut bytes = Vec::new();
    server
        .export_to_pdf(&mut bytes)
        .context("Failed to export PDF")?;
    info!("PDF bytes: {}", bytes.len());

    let metadata = pdf::inspect(&bytes).context("Failed to read back the exported PDF")?;
    info!("PDF pages: {}", metadata.page_count);

    Ok(bytes)
}

/// Best-effort listing of installed font files
fn log_system_fonts(dir: &Path) {
    info!("Listing files in {}:", dir.display());
    match list_font_files(dir) {
        Ok(files) => {
            for file in files {
                info!("{}", file.display());
            }
        }
        Err(e) => warn!("Error listing files in {}: {}", dir.display(), e),
    }
}

/// Register the unresolved-font hook for the configured policy
fn install_fallback(repository: &mut FontRepository, options: &ProbeOptions) {
    let fallback_path = match options.fallback {
        FallbackPolicy::FirstFont => options.fonts.first().cloned(),
        FallbackPolicy::None => None,
    };

    repository.on_query_not_found_font(move |args: &mut QueryNotFoundFontArgs| {
        info!(
            "[QueryNotFoundFont] requested='{}', actual='{}'",
            args.requested_font, args.actual_font
        );

        let Some(path) = fallback_path.as_ref() else {
            return;
        };
        if args.font_file_data.is_none() {
            match std::fs::read(path) {
                Ok(bytes) => args.font_file_data = Some(bytes),
                Err(e) => warn!("Cannot read fallback font {}: {}", path.display(), e),
            }
        }
    });
}

/// Distinct registered names, case-insensitively, sorted
fn distinct_font_names(repository: &FontRepository) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for info in repository.fonts() {
        if !names.iter().any(|n| n.eq_ignore_ascii_case(&info.name)) {
            names.push(info.name);
        }
    }
    names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    names
}

fn log_repository(repository: &FontRepository) {
    let names = distinct_font_names(repository);
    info!("Font repository fonts: {}", names.len());
    for name in names.iter().take(MAX_LISTED_FONTS) {
        info!("  - {}", name);
    }
    if names.len() > MAX_LISTED_FONTS {
        info!("  - ...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options(dir: &Path) -> ProbeOptions {
        ProbeOptions {
            system_fonts_dir: dir.join("no-system-fonts"),
            ..ProbeOptions::with_base_dir(dir)
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitStatus::Success.code(), 0);
        assert_eq!(ExitStatus::Fatal.code(), 1);
        assert_eq!(ExitStatus::DocumentNotFound.code(), 2);
        assert_eq!(ExitStatus::FontNotFound.code(), 3);
    }

    #[test]
    fn test_defaults_beside_base_dir() {
        let opts = ProbeOptions::with_base_dir(Path::new("/opt/probe"));
        assert_eq!(opts.document, PathBuf::from("/opt/probe/demo.docx"));
        assert_eq!(
            opts.fonts,
            vec![
                PathBuf::from("/opt/probe/Inter-Regular.ttf"),
                PathBuf::from("/opt/probe/JetBrainsMono-Regular.ttf"),
            ]
        );
        assert_eq!(opts.system_fonts_dir, PathBuf::from("/usr/share/fonts"));
        assert_eq!(opts.engine, DrawingEngine::Embedded);
        assert_eq!(opts.fallback, FallbackPolicy::FirstFont);
    }

    #[test]
    fn test_missing_document_checked_first() {
        let dir = TempDir::new().expect("temp dir");
        let mut out = Vec::new();
        assert_eq!(run(&options(dir.path()), &mut out), ExitStatus::DocumentNotFound);
        assert!(out.is_empty());
    }

    #[test]
    fn test_missing_font() {
        let dir = TempDir::new().expect("temp dir");
        std::fs::write(dir.path().join(DEFAULT_DOCUMENT), b"whatever").expect("write");

        let mut out = Vec::new();
        assert_eq!(run(&options(dir.path()), &mut out), ExitStatus::FontNotFound);
        assert!(out.is_empty());
    }

    #[test]
    fn test_unusable_font_is_fatal() {
        let dir = TempDir::new().expect("temp dir");
        std::fs::write(dir.path().join(DEFAULT_DOCUMENT), b"whatever").expect("write");
        for font in DEFAULT_FONTS {
            std::fs::write(dir.path().join(font), b"not a font").expect("write");
        }

        let mut out = Vec::new();
        assert_eq!(run(&options(dir.path()), &mut out), ExitStatus::Fatal);
        assert!(out.is_empty());
    }

    #[test]
    fn test_fallback_policy_display() {
        assert_eq!(FallbackPolicy::FirstFont.to_string(), "first-font");
        assert_eq!(FallbackPolicy::None.to_string(), "none");
    }

    #[test]
    fn test_fallback_hook_supplies_first_font_bytes() {
        let dir = TempDir::new().expect("temp dir");
        let first = dir.path().join("first.ttf");
        std::fs::write(&first, b"font bytes").expect("write");

        let mut opts = options(dir.path());
        opts.fonts = vec![first];

        let mut repository = FontRepository::new();
        install_fallback(&mut repository, &opts);

        // The supplied bytes are not a real font, so the lookup fails, but only
        // after the hook handed them over
        match repository.query_not_found_font("Calibri") {
            Err(crate::Error::Font(message)) => assert!(message.contains("substitute data")),
            other => panic!("expected font error, got {:?}", other.map(|f| f.info().clone())),
        }
    }

    #[test]
    fn test_no_fallback_policy_leaves_data_empty() {
        let dir = TempDir::new().expect("temp dir");
        let mut opts = options(dir.path());
        opts.fallback = FallbackPolicy::None;

        let mut repository = FontRepository::new();
        install_fallback(&mut repository, &opts);

        // Empty repository and no data supplied
        match repository.query_not_found_font("Calibri") {
            Err(crate::Error::Font(message)) => assert!(message.contains("no registered font")),
            other => panic!("expected font error, got {:?}", other.map(|f| f.info().clone())),
        }
    }
}
