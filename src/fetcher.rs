pub mod crime;
pub mod flood;
pub mod geocode;

pub use crime::CrimeFetcher;
pub use flood::FloodFetcher;
pub use geocode::GeocodeResolver;
