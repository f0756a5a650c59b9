pub mod config;
pub mod dashboards;
pub mod error;
pub mod models;
pub mod promql;
pub mod registry;

pub use error::{Error, Result};
