pub mod api;
pub mod core;
pub mod error;
pub mod models;
pub mod settings;
pub mod storage;
