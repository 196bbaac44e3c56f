//! Web acquisition for askweb.
//!
//! - Search providers behind the [`search::Searcher`] trait (`brave`, `duckduckgo`)
//! - Page retrieval behind the [`fetch::Fetcher`] trait
//! - Paragraph extraction with a character budget (`extract`)

pub mod extract;
pub mod fetch;
pub mod search;

pub use extract::{DEFAULT_MAX_ARTICLE_CHARS, extract};
pub use fetch::{DEFAULT_FETCH_TIMEOUT, FetchError, Fetcher, HttpFetcher, MAX_PAGE_BYTES};
pub use search::{BraveSearcher, DuckDuckGoSearcher, SearchError, Searcher};
