pub mod config;
pub mod facade_pipeline;
pub mod logger;
