//! CLI command handlers

pub mod ask;
pub mod collections;
pub mod config;
pub mod ingest;
pub mod route;
