mod app;
mod chromium;
mod cli;
mod config;
mod logging;
mod report;
mod session;

pub use app::run_app;
