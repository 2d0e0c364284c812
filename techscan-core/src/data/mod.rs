//! Data sources: market data providers, the scan universe, metadata caches.

pub mod circuit_breaker;
pub mod metadata_cache;
pub mod provider;
pub mod synthetic;
pub mod universe;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use metadata_cache::{Cached, CompanyNames, UniverseCache};
pub use provider::{DataError, DataSource, FetchResult, Headline, MarketDataProvider};
pub use synthetic::SyntheticProvider;
pub use universe::{FileUniverse, Universe, UniverseSource, WikipediaUniverse};
pub use yahoo::YahooProvider;
