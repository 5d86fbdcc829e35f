//! Core library for docforge.
//!
//! Generates customised agreement documents from fixed `.docx` templates by
//! rewriting the template's main markup part. The pieces, bottom-up:
//!
//! - [`markup`]: tolerant structural scanner that turns the markup into typed
//!   regions (paragraph, run, text, table, row, cell, drawing) with exact byte
//!   spans, plus ordinal/anchored region selection.
//! - [`substitute`]: the substitution passes and the [`substitute::Engine`]
//!   that runs them in order.
//! - [`variant`]: serde-serialisable per-template descriptors; one engine
//!   serves every template.
//! - [`archive`], [`storage`]: the container and the template/output stores.
//! - [`pipeline`]: the per-process [`pipeline::DocumentService`] that ties it
//!   all together for one request.

pub mod archive;
pub mod config;
pub mod edits;
pub mod error;
pub mod markup;
pub mod pipeline;
pub mod storage;
pub mod substitute;
pub mod templates;
pub mod variant;
