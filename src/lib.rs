pub mod analytics;
pub mod config;
pub mod db;
pub mod model;
pub mod store;
pub mod utils;
