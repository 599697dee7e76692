pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod models;
pub mod providers;
pub mod tools;
pub mod ui;

pub use error::{CalcError, Result};
