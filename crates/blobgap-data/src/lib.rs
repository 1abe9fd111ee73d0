//! Data layer for the blob gap analyser.
//!
//! Responsible for recovering JSON fragments from possibly-corrupted files,
//! loading canonical events from the aggregate document or the batch
//! directory, computing inter-event gaps and running the top-level analysis
//! pipeline.

pub mod analysis;
pub mod analyzer;
pub mod fragments;
pub mod reader;

pub use blobgap_core as core;
