pub mod config;
pub mod evaluate;
pub mod parse;
pub mod query;
pub mod throttle;
