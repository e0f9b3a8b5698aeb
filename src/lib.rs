pub mod config;
pub mod export;
pub mod familienpass;
pub mod fetcher;
pub mod tracing;
