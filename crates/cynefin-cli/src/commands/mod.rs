pub mod config;
pub mod history;
pub mod transfer;
pub mod utils;
