//! Driving the classic development environment client (finsql.exe)
//!
//! The client is a Windows GUI executable with a batch-mode command line.
//! This module owns everything about talking to it: argument assembly,
//! process lifecycle, diagnostic log classification, temp artifact cleanup,
//! and the export orchestration that ties them together.

mod args;
mod classify;
mod cleanup;
mod export;
mod process;

pub use args::VariantPolicy;
pub use process::POLL_INTERVAL;

pub(crate) use cleanup::{unique_temp_path, TempArtifact};
pub(crate) use export::{design_object, export_filter};
