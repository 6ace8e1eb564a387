pub mod batch;
pub mod db;
pub mod error;
pub mod item;
pub mod schema;
pub mod scoring;
pub mod settings;
pub mod utils;
