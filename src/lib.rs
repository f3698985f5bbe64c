pub mod downloader;
pub mod server;

pub use downloader::{FetchError, FormatCatalog, FormatChoice, StreamDescriptor, VideoInfo};
