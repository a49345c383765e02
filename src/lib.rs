pub mod api;
pub mod db;
pub mod error;
pub mod import;
pub mod lifecycle;
pub mod models;
