pub mod analyzers;
pub mod aqi;
pub mod config;
pub mod error;
pub mod fetch;
pub mod granularity;
pub mod observation;
pub mod output;
pub mod query;
pub mod reading;
pub mod source;
