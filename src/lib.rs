//! elscan - Equidistant letter sequence search over Hebrew texts.
//!
//! This library finds a term spelled out at a constant letter interval
//! ("skip distance") in a normalized Hebrew text, reading forward or
//! backward, and computes gematria values for the words it finds. Texts come
//! from a pluggable provider (local book files, in-memory, or the built-in
//! sample).
//!
//! # Modules
//!
//! - [`hebrew`] - Text normalization, term validation and letter statistics
//! - [`gematria`] - Letter values and numeric analysis
//! - [`els`] - Search results and result sets
//! - [`engine`] - Chunked search engine with caching and cancellation
//! - [`provider`] - Text provider trait and implementations
//! - [`commands`] - High-level operations (search, crossings, gematria, stats)
//! - [`config`] - Configuration loading
//! - [`cli`] - Command-line interface definitions

pub mod cli;
pub mod commands;
pub mod config;
pub mod els;
pub mod engine;
pub mod gematria;
pub mod hebrew;
pub mod provider;

#[cfg(feature = "mcp")]
pub mod mcp;
