pub mod codec;
pub mod db;
pub mod models;
pub mod reconcile;
pub mod seed;

