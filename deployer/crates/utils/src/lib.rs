pub mod archive;
pub mod download;
pub mod env_utils;

pub use archive::{extract_archive, ArchiveError, ArchiveKind};
pub use download::{fetch_archive, DownloadError};
