//! Value types shared by the lumen rule crates.
//!
//! - [`alert`]: the alert record produced further down the pipeline
//! - [`metric`]: ordered metric samples fed into rule evaluation
//! - [`config`]: environment-driven configuration

pub mod alert;
pub mod config;
pub mod error;
pub mod metric;

pub use alert::{AlertStatus, PureAlert};
pub use config::Config;
pub use error::*;
pub use metric::{Metric, MetricList};
