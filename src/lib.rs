//! Normalizes an extension catalog into deduplicated, content-versioned
//! site templates with a self-checking integrity hash.

pub mod config;
pub mod error;
pub mod model;
pub mod parsers;
pub mod protocol;
pub mod services;
