pub mod app;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod merge;
pub mod output;
pub mod providers;
pub mod query;
pub mod store;
