pub mod decision;
pub mod market;
pub mod portfolio;
pub mod vault;
