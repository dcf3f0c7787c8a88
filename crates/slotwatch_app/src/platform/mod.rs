mod app;
mod cli;
mod config;
mod logging;

pub use app::run_app;
