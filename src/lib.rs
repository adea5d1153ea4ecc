pub mod config;
pub mod diagnostics;
pub mod error;
pub mod job;
pub mod jobs;
pub mod plugin;
pub mod runner;
pub mod shutdown;
pub mod worker;
