pub mod api;
pub mod config;
pub mod debuts;
pub mod error;
pub mod importers;
pub mod services;
