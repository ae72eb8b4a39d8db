//! Patent annotator - incremental biomedical entity annotation of patents.
//!
//! Discovers newly published patents, mirrors their XML into a sharded blob
//! store, runs a named-entity tagger over the English text fields and
//! persists the annotations plus per-patent entity frequencies.

pub mod annotator;
pub mod cli;
pub mod config;
pub mod jobs;
pub mod migrations;
pub mod models;
pub mod pipeline;
pub mod repository;
pub mod schema;
pub mod services;
pub mod sources;
pub mod storage;
