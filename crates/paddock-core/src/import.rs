//! Import service for stable synchronization.
//!
//! This module ties the registry, the reconciliation rules and the store
//! together. One call fetches, reconciles every record into the caller's
//! collection and persists the whole partition.
//!
//! # Failure handling
//!
//! - Fetch failures (`Unauthenticated`, `Timeout`, HTTP errors, ...) abort
//!   the import before anything is touched: [`ImportError::Fetch`].
//! - Unusable records are collected in [`ImportOutcome::failures`] and do not
//!   stop the batch.
//! - A failed save is reported as [`ImportError::NotSaved`] together with
//!   the outcome. The collection keeps its reconciled state so the caller can
//!   retry with [`ImportService::save`].
//!
//! There is no retry inside the service.

use chrono::Utc;
use thiserror::Error;

use crate::progress::{ImportEvent, ImportSource, ProgressReporter, SilentReporter};
use crate::reconcile::{reconcile_batch, ImportOutcome};
use crate::traits::{CollectionStore, HorseRegistry};
use crate::{AppError, ExternalRecord, HorseCollection, HorseStatus, ImportConfig};

/// Failure of a whole import call.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The registry could not be queried; nothing was reconciled.
    #[error("{0}")]
    Fetch(AppError),

    /// Records were reconciled in memory but the collection was not saved.
    #[error("imported {outcome} but saving failed: {source}")]
    NotSaved {
        outcome: ImportOutcome,
        source: AppError,
    },
}

/// Service importing horses from a registry into local collections.
///
/// # Type Parameters
///
/// * `R` - Registry implementation (e.g., `ZedClient`)
/// * `S` - Collection store implementation (e.g., `JsonFileStore`)
///
/// # Example
///
/// ```ignore
/// let service = ImportService::new(client, store);
/// let mut racing = service.load(HorseStatus::Racing).await?;
/// let outcome = service.import_batch(HorseStatus::Racing, &mut racing).await?;
/// println!("{outcome}");
/// ```
pub struct ImportService<R, S>
where
    R: HorseRegistry,
    S: CollectionStore,
{
    registry: R,
    store: S,
    config: ImportConfig,
}

impl<R, S> Clone for ImportService<R, S>
where
    R: HorseRegistry + Clone,
    S: CollectionStore + Clone,
{
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            store: self.store.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R, S> ImportService<R, S>
where
    R: HorseRegistry,
    S: CollectionStore,
{
    /// Creates a new import service with default configuration.
    pub fn new(registry: R, store: S) -> Self {
        Self::with_config(registry, store, ImportConfig::default())
    }

    /// Creates an import service with custom per-status schemas.
    pub fn with_config(registry: R, store: S, config: ImportConfig) -> Self {
        Self {
            registry,
            store,
            config,
        }
    }

    /// Loads the persisted partition for `status`.
    pub async fn load(&self, status: HorseStatus) -> Result<HorseCollection, AppError> {
        let records = self.store.load(status.collection_name()).await?;
        Ok(HorseCollection::from_records(status, records))
    }

    /// Persists the whole partition.
    pub async fn save(&self, collection: &HorseCollection) -> Result<(), AppError> {
        self.store
            .save(collection.status().collection_name(), collection.records())
            .await
    }

    /// Imports a whole stable into `collection`.
    ///
    /// `kind` selects which stable to fetch; the collection's status decides
    /// which partition receives the records.
    pub async fn import_batch(
        &self,
        kind: HorseStatus,
        collection: &mut HorseCollection,
    ) -> Result<ImportOutcome, ImportError> {
        self.import_batch_with_progress(kind, collection, &SilentReporter)
            .await
    }

    /// Same as [`import_batch`](Self::import_batch), with progress events.
    pub async fn import_batch_with_progress<P: ProgressReporter>(
        &self,
        kind: HorseStatus,
        collection: &mut HorseCollection,
        reporter: &P,
    ) -> Result<ImportOutcome, ImportError> {
        let source = ImportSource::Stable(kind);
        self.start(source, collection, reporter);

        let batch = match self.registry.fetch_batch(kind).await {
            Ok(batch) => batch,
            Err(e) => return Err(fetch_failed(source, e, reporter)),
        };

        self.reconcile_and_save(batch, collection, reporter).await
    }

    /// Imports one horse into `collection`.
    ///
    /// # Arguments
    ///
    /// * `raw_id` - Horse id or pasted horse URL
    /// * `collection` - Partition chosen by the caller
    pub async fn import_single(
        &self,
        raw_id: &str,
        collection: &mut HorseCollection,
    ) -> Result<ImportOutcome, ImportError> {
        self.import_single_with_progress(raw_id, collection, &SilentReporter)
            .await
    }

    /// Same as [`import_single`](Self::import_single), with progress events.
    pub async fn import_single_with_progress<P: ProgressReporter>(
        &self,
        raw_id: &str,
        collection: &mut HorseCollection,
        reporter: &P,
    ) -> Result<ImportOutcome, ImportError> {
        let source = ImportSource::Horse(raw_id);
        self.start(source, collection, reporter);

        let record = match self.registry.fetch_one(raw_id).await {
            Ok(record) => record,
            Err(e) => return Err(fetch_failed(source, e, reporter)),
        };

        self.reconcile_and_save(vec![record], collection, reporter)
            .await
    }

    fn start<P: ProgressReporter>(
        &self,
        source: ImportSource<'_>,
        collection: &HorseCollection,
        reporter: &P,
    ) {
        reporter.report(ImportEvent::Started {
            source,
            target: collection.status(),
        });
        reporter.report(ImportEvent::ExistingRecordsFound {
            count: collection.len(),
        });
    }

    async fn reconcile_and_save<P: ProgressReporter>(
        &self,
        batch: Vec<ExternalRecord>,
        collection: &mut HorseCollection,
        reporter: &P,
    ) -> Result<ImportOutcome, ImportError> {
        reporter.report(ImportEvent::RecordsFetched { count: batch.len() });

        let schema = self.config.schema_for(collection.status());
        let outcome = reconcile_batch(collection, batch, &schema, Utc::now());

        for failure in &outcome.failures {
            reporter.report(ImportEvent::RecordFailed {
                external_id: &failure.external_id,
                reason: &failure.reason,
            });
        }

        if let Err(e) = self.save(collection).await {
            let error = e.to_string();
            reporter.report(ImportEvent::SaveFailed {
                collection: collection.status().collection_name(),
                error: &error,
            });
            return Err(ImportError::NotSaved { outcome, source: e });
        }

        reporter.report(ImportEvent::Completed {
            target: collection.status(),
            outcome: &outcome,
        });
        Ok(outcome)
    }
}

fn fetch_failed<P: ProgressReporter>(
    source: ImportSource<'_>,
    e: AppError,
    reporter: &P,
) -> ImportError {
    let error = e.to_string();
    reporter.report(ImportEvent::FetchFailed {
        source,
        error: &error,
    });
    ImportError::Fetch(e)
}
