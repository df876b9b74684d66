pub mod audio;
pub mod cli;
pub mod config;
pub mod extract;
pub mod prompt;
pub mod repositories;
