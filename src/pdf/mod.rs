//! PDF export module

mod embed;
pub mod metadata;
pub mod writer;

// Re-export commonly used items
pub use metadata::{inspect, PdfMetadata};
pub use writer::{export, PRODUCER};
