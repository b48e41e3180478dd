//! Link previews: fetch a URL, classify it from its headers, and pull a title,
//! description, media type, images and videos out of HTML pages.

pub mod adblock;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod models;

pub use extract::extract_preview;
pub use fetch::get_preview;
pub use models::{PreviewOptions, PreviewResult, VideoDescriptor};
