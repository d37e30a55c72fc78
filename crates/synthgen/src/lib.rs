//! synthgen - synthetic file generation with recorded provenance
//!
//! Writes batches of files copied from a fixed seed pool into one storage root,
//! records every batch and file in the metadata store, and keeps disk and store in
//! step afterwards.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────────┐
//! │ SeedCatalog │────▶│  Generator  │────▶│ <base>/generated │
//! └─────────────┘     └──────┬──────┘     └────────┬─────────┘
//!                            │                     │
//!                            ▼                     ▼
//!                     ┌─────────────┐      ┌──────────────┐
//!                     │ SynthgenDb  │◀─────│  Reconciler  │
//!                     │  (SQLite)   │      └──────────────┘
//!                     └─────────────┘
//!                            ▲
//!                     ┌──────┴──────┐
//!                     │   Cleaner   │  (disk + rows)
//!                     └─────────────┘
//! ```
//!
//! # Core Concepts
//!
//! - **Batch**: one generate call and its aggregate row
//! - **Seed**: a template payload copied verbatim into a generated file
//! - **Reconciliation**: backfilling rows for files that appeared on disk by other means
//! - **Storage root**: the single directory all files of a deployment live in
//!
//! The engine assumes one writer per storage root. Generate, reconcile and clean are
//! not serialized against each other; callers that need that must do it themselves.

pub mod cleanup;
pub mod config;
pub mod error;
pub mod generator;
pub mod reconciler;
pub mod seeds;
pub mod service;

pub use cleanup::{CleanResult, Cleaner};
pub use config::SynthgenConfig;
pub use error::{ErrorKind, Result, SynthError};
pub use generator::{Generator, MAX_COUNT};
pub use reconciler::{ReconcileStats, Reconciler};
pub use seeds::{BundledSeeds, DirectorySeeds, Seed, SeedCatalog, SeedKind, SeedSource};
pub use service::SynthService;
pub use synthgen_db::{GeneratedFile, GenerationBatch, SynthgenDb};
