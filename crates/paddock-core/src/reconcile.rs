//! Reconciliation of registry records against a local collection.
//!
//! Each incoming [`ExternalRecord`] is matched to a [`LocalRecord`] by
//! external id within one status partition:
//!
//! - **match**: display and rating fields are replaced, `initialBalance` and
//!   `initialRating` are kept as they are
//! - **no match**: a new record with a fresh local id and default local
//!   fields is appended
//! - **unusable record** (no id or no name): recorded as a failure, the rest
//!   of the batch still goes through
//!
//! The functions here are pure with respect to I/O; persisting the result is
//! the import service's job.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::{RatingFields, StatusSchema};
use crate::models::DEFAULT_COLOR;
use crate::{AppError, ExternalRecord, HorseCollection, LocalRecord};

/// What happened to a single reconciled record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created,
    Updated,
}

/// A record that could not be reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub external_id: String,
    pub reason: String,
}

/// Summary of one import call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub failures: Vec<RecordFailure>,
}

impl ImportOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: Result<ReconcileOutcome, AppError>) {
        self.total += 1;
        match result {
            Ok(ReconcileOutcome::Created) => self.created += 1,
            Ok(ReconcileOutcome::Updated) => self.updated += 1,
            Err(AppError::InvalidRecord {
                external_id,
                reason,
            }) => self.failures.push(RecordFailure {
                external_id,
                reason,
            }),
            Err(other) => self.failures.push(RecordFailure {
                external_id: String::new(),
                reason: other.to_string(),
            }),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} horse(s) ({} new, {} updated, {} failed)",
            self.total,
            self.created,
            self.updated,
            self.failed()
        )
    }
}

/// Reconciles one registry record into `collection`.
///
/// # Errors
///
/// Returns `AppError::InvalidRecord` if the record has no id or no name; the
/// collection is left untouched in that case.
pub fn reconcile_record(
    collection: &mut HorseCollection,
    incoming: ExternalRecord,
    schema: &StatusSchema,
    now: DateTime<Utc>,
) -> Result<ReconcileOutcome, AppError> {
    let external_id = incoming.id.trim().to_string();
    if external_id.is_empty() {
        return Err(AppError::InvalidRecord {
            external_id: "<missing>".to_string(),
            reason: "record has no id".to_string(),
        });
    }

    let name = match incoming.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            return Err(AppError::InvalidRecord {
                external_id,
                reason: "record has no name".to_string(),
            })
        }
    };

    let status = collection.status();

    if let Some(existing) = collection.find_by_external_id_mut(&external_id) {
        apply_registry_fields(existing, name, &incoming, schema);
        if existing.initial_rating.is_none() {
            existing.initial_rating = schema.rating_baseline;
        }
        existing.status = status;
        existing.last_reconciled_at = Some(now);
        return Ok(ReconcileOutcome::Updated);
    }

    let mut created = LocalRecord {
        id: Uuid::new_v4(),
        external_id: Some(external_id),
        status,
        name: String::new(),
        bloodline: None,
        color: None,
        gender: None,
        stars: None,
        speed_stars: None,
        sprint_stars: None,
        endurance_stars: None,
        initial_balance: 0.0,
        initial_rating: schema.rating_baseline,
        last_reconciled_at: Some(now),
    };
    apply_registry_fields(&mut created, name, &incoming, schema);
    collection.push(created);

    Ok(ReconcileOutcome::Created)
}

/// Reconciles a whole batch, collecting per-record failures.
pub fn reconcile_batch(
    collection: &mut HorseCollection,
    batch: Vec<ExternalRecord>,
    schema: &StatusSchema,
    now: DateTime<Utc>,
) -> ImportOutcome {
    let mut outcome = ImportOutcome::new();
    for incoming in batch {
        outcome.record(reconcile_record(collection, incoming, schema, now));
    }
    outcome
}

/// Copies everything the registry owns; local-only fields stay untouched.
fn apply_registry_fields(
    target: &mut LocalRecord,
    name: String,
    source: &ExternalRecord,
    schema: &StatusSchema,
) {
    target.name = name;
    target.bloodline = source.bloodline.clone();
    target.color = Some(
        source
            .color
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_COLOR)
            .to_string(),
    );
    target.gender = source.gender.clone();

    let (stars, speed, sprint, endurance) = match schema.ratings {
        RatingFields::All => (
            source.overall_rating,
            source.speed_rating,
            source.sprint_rating,
            source.endurance_rating,
        ),
        RatingFields::OverallOnly => (source.overall_rating, None, None, None),
        RatingFields::None => (None, None, None, None),
    };
    target.stars = stars;
    target.speed_stars = speed;
    target.sprint_stars = sprint;
    target.endurance_stars = endurance;
}
