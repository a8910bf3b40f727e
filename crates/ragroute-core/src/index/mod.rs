//! Ingestion pipeline
//!
//! File discovery, text splitting, and document construction.

mod chunker;
mod processor;
mod scanner;

pub use chunker::*;
pub use processor::*;
pub use scanner::*;
