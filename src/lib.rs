pub mod app;
pub mod app_config;
pub mod error;
pub mod keeper;
pub mod time_util;
