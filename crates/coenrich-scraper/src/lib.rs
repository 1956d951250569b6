pub mod anti_block;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod rate_limit;
pub mod search;

pub use anti_block::{AntiBlockContext, ProxyEndpoint, USER_AGENTS};
pub use enrich::Enricher;
pub use error::ScraperError;
pub use extract::FieldExtractor;
pub use fetch::ProfileFetcher;
pub use rate_limit::DelayRange;
pub use search::{SearchResolver, SearchSettings};
