pub mod config;
pub mod error;
pub mod ladder;
pub mod live;
pub mod static_source;
pub mod sync;
