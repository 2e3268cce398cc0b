#![forbid(unsafe_code)]

pub mod analytics;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod render;
pub mod selector;
pub mod utils;
pub mod warehouse;

pub use cli::app::{Cli, Command};
