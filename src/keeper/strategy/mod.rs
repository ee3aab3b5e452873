pub mod lend_engine;
pub mod strategy_config;
pub mod vault_engine;
