//! Terminal driver for the job tracker: configuration, line commands,
//! effect execution and text rendering around `tracker_core`.
mod app;
pub mod commands;
pub mod config;
pub mod effects;
pub mod render;

pub use app::run;
