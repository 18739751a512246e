//! Core logic for the docsetter search-index generator: path resolution,
//! configuration, HTML anchor extraction, entry normalization, and the
//! SQLite index writer.

pub mod config;
pub mod entry;
pub mod extract;
pub mod generate;
pub mod index;
pub mod runtime;
