//! Page retrieval and text extraction.

pub mod extract;
pub mod fetcher;

pub use extract::extract_text;
pub use fetcher::{parse_absolute_url, ContentFetcher, FetchError, FetchedPage, HttpFetcher};
