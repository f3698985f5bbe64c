// Downloader - catalog building, pairing, and collaborator invocation

pub mod catalog;
pub mod errors;
pub mod extractors;
pub mod fetch;
pub mod models;
pub mod tools;
pub mod utils;

pub use catalog::{build_choices, FormatCatalog, FormatChoice};
pub use errors::FetchError;
pub use extractors::{extract_streams, ExtractorConfig, ExtractorMode};
pub use fetch::{download_merged, ProgressUpdate};
pub use models::{ProgressSnapshot, StreamDescriptor, VideoInfo};
