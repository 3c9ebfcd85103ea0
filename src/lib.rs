pub mod backup;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod db;
pub mod model;
pub mod store;
