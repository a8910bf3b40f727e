//! External tools used by the fallback chain

mod web_search;

pub use web_search::*;
