//! Document text extraction

pub mod extractor;

pub use extractor::{ExtractedText, ExtractionStatus, TextExtractor};
