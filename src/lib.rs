pub mod config;
pub mod error;
pub mod mail;
pub mod pipeline;
pub mod report;
pub mod sources;
