//! Core types for the blob gap analyser.
//!
//! Holds the canonical event model, the error taxonomy, timestamp
//! normalisation, schema-drift tolerant field resolution, population
//! statistics and CLI settings shared by the other crates.

pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod stats;
pub mod time_utils;

pub use error::{BlobGapError, Result};
