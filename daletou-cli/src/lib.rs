pub mod advisor;
pub mod analysis;
pub mod config;
pub mod display;
pub mod import;
