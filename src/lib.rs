//! DOCX Font Probe Library
//!
//! Converts DOCX documents to PDF with an explicit font repository, so font
//! registration and substitution can be checked in controlled environments.
//! This library provides functionality to:
//! - Load DOCX documents (body text, styles, theme fonts, page setup)
//! - Register font files and hook unresolved-font lookups
//! - Lay out paragraphs into pages
//! - Export to PDF with embedded or base-14 fonts
//!
//! # Example
//!
//! ```no_run
//! use docx_font_probe::fonts::FontRepository;
//! use docx_font_probe::server::DocumentServer;
//! use std::path::Path;
//!
//! let mut fonts = FontRepository::new();
//! fonts.add_font(Path::new("Inter-Regular.ttf")).expect("Failed to register font");
//! fonts.on_query_not_found_font(|args| {
//!     eprintln!("missing font: {}", args.requested_font);
//! });
//!
//! let mut server = DocumentServer::new(fonts);
//! server.load_document(Path::new("demo.docx")).expect("Failed to load DOCX");
//!
//! let mut pdf = Vec::new();
//! server.export_to_pdf(&mut pdf).expect("Failed to export PDF");
//! ```

pub mod error;
pub mod settings;
pub mod docx;
pub mod fonts;
pub mod layout;
pub mod pdf;
pub mod server;
pub mod probe;

// Re-export commonly used items
pub use error::{Error, Result};
