pub mod commands;
pub mod config;
pub mod jobs;
pub mod state;
