//! Font registration, lookup and substitution

mod face;
mod repository;
mod set;
mod standard;
mod system;

pub use face::{FontInfo, LoadedFont};
pub use repository::{FontRepository, QueryNotFoundFontArgs, QueryNotFoundFontHandler};
pub use set::{FontKey, FontSet, PdfFont};
pub use standard::{encode_win_ansi, StandardFont};
pub use system::list_font_files;
