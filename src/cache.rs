pub mod single_flight;
pub mod store;

pub use single_flight::CachedFetch;
pub use store::{Cache, MemoryCache};
