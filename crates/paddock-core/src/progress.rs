//! Progress reporting for import operations.
//!
//! This module provides a trait-based abstraction for reporting progress during
//! imports, so the CLI can log while library callers stay silent.

use std::fmt;

use crate::{HorseStatus, ImportOutcome};

/// Where an import pulls its records from.
#[derive(Debug, Clone, Copy)]
pub enum ImportSource<'a> {
    /// A whole stable of the current account.
    Stable(HorseStatus),
    /// One horse, by id or pasted URL.
    Horse(&'a str),
}

impl fmt::Display for ImportSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportSource::Stable(kind) => write!(f, "{kind} stable"),
            ImportSource::Horse(id) => write!(f, "horse {id}"),
        }
    }
}

/// Events emitted during an import.
#[derive(Debug, Clone)]
pub enum ImportEvent<'a> {
    /// Import starting.
    Started {
        source: ImportSource<'a>,
        /// Partition receiving the records.
        target: HorseStatus,
    },

    /// Records already tracked in the target partition.
    ExistingRecordsFound { count: usize },

    /// Records returned by the registry.
    RecordsFetched { count: usize },

    /// A single record was skipped.
    RecordFailed {
        external_id: &'a str,
        reason: &'a str,
    },

    /// Fetching failed; nothing was reconciled or saved.
    FetchFailed {
        source: ImportSource<'a>,
        error: &'a str,
    },

    /// Reconciliation succeeded but the collection could not be saved.
    SaveFailed {
        collection: &'a str,
        error: &'a str,
    },

    /// Import finished and the collection was saved.
    Completed {
        target: HorseStatus,
        outcome: &'a ImportOutcome,
    },
}

/// Trait for reporting import progress.
///
/// The default implementation does nothing (silent mode), which is
/// appropriate for library usage where the caller doesn't need progress updates.
///
/// # Example
///
/// ```
/// use paddock_core::progress::{ImportEvent, ProgressReporter};
///
/// struct MyReporter;
///
/// impl ProgressReporter for MyReporter {
///     fn report(&self, event: ImportEvent<'_>) {
///         if let ImportEvent::RecordsFetched { count } = event {
///             println!("fetched {count}");
///         }
///     }
/// }
/// ```
pub trait ProgressReporter: Send + Sync {
    /// Called when an import event occurs.
    fn report(&self, event: ImportEvent<'_>) {
        let _ = event;
    }
}

/// A no-op reporter that ignores all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// A reporter that logs events using the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: ImportEvent<'_>) {
        use tracing::{error, info, warn};

        match event {
            ImportEvent::Started { source, target } => {
                info!("Importing {} into {} horses", source, target);
            }
            ImportEvent::ExistingRecordsFound { count } => {
                info!("Found {} horse(s) already tracked", count);
            }
            ImportEvent::RecordsFetched { count } => {
                info!("Registry returned {} horse(s)", count);
            }
            ImportEvent::RecordFailed {
                external_id,
                reason,
            } => {
                warn!(external_id, "Skipped horse: {}", reason);
            }
            ImportEvent::FetchFailed { source, error } => {
                error!("Import of {} failed: {}", source, error);
            }
            ImportEvent::SaveFailed { collection, error } => {
                error!(collection, "Imported but not saved: {}", error);
            }
            ImportEvent::Completed { target, outcome } => {
                info!("Imported into {} horses: {}", target, outcome);
            }
        }
    }
}
