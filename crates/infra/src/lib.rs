//! Infrastructure layer: stores, services, database bootstrap, config.

pub mod config;
pub mod db;
pub mod services;
pub mod store;
pub mod workers;
