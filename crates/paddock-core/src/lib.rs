//! Paddock Core - Domain types, reconciliation and the import service.

pub mod collection;
pub mod config;
pub mod credential;
pub mod error;
pub mod import;
pub mod models;
pub mod progress;
pub mod reconcile;
pub mod traits;

pub use collection::HorseCollection;
pub use config::{HttpConfig, ImportConfig, RatingFields, StatusSchema};
pub use credential::{Credential, Expiry};
pub use error::AppError;
pub use import::{ImportError, ImportService};
pub use models::{AccountProfile, ExternalRecord, HorseStatus, LocalRecord, StablePage};
pub use reconcile::{ImportOutcome, ReconcileOutcome, RecordFailure};
