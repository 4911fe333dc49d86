//! Machine readable listings: the RSS channel and the search index.

pub mod json;
pub mod rss;

pub use self::json::build_search_index;
pub use self::rss::build_rss;
