pub mod config;
pub mod connectors;
pub mod dataset;
pub mod error;
pub mod output;
pub mod value;
