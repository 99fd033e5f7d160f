pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod response;
pub mod rest;
pub mod validate;

pub use config::{Config, ConnectionMode};
pub use db::{Connector, ReadingStore, TemperatureStore};
pub use errors::{Error, Result};
pub use validate::RequestValidator;
