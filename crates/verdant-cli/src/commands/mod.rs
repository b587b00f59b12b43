pub mod composite;
pub mod config;
pub mod search;
