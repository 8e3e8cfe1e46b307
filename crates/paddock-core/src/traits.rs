//! Trait definitions for external dependencies.
//!
//! The import service only talks to the outside world through these traits:
//!
//! - [`HorseRegistry`]: the remote API holding the user's stables
//! - [`CollectionStore`]: the blob store persisting local collections
//! - [`CredentialSource`]: whoever holds the API token
//!
//! Concrete implementations live in `paddock-client` and `paddock-store`;
//! tests use in-memory mocks.
//!
//! # Example
//!
//! ```
//! use paddock_core::traits::HorseRegistry;
//! use paddock_core::{AppError, HorseStatus};
//!
//! async fn count_racing<R: HorseRegistry>(registry: &R) -> Result<usize, AppError> {
//!     Ok(registry.fetch_batch(HorseStatus::Racing).await?.len())
//! }
//! ```

use std::future::Future;

use crate::{AccountProfile, AppError, ExternalRecord, HorseStatus, LocalRecord};

/// Source of the bearer token used for registry calls.
pub trait CredentialSource: Send + Sync {
    /// The raw token, if one is set.
    fn token(&self) -> Option<String>;

    /// Whether the token is missing, unreadable or past its expiry.
    fn is_expired(&self) -> bool;
}

/// Remote registry of horses.
///
/// Implementations must fail with `AppError::Unauthenticated` before any
/// network traffic when no usable credential is available.
pub trait HorseRegistry: Send + Sync {
    /// Fetches every horse of the given stable for the current credential.
    fn fetch_batch(
        &self,
        kind: HorseStatus,
    ) -> impl Future<Output = Result<Vec<ExternalRecord>, AppError>> + Send;

    /// Fetches one horse by id.
    ///
    /// # Arguments
    ///
    /// * `raw_id` - A horse id, or a pasted URL whose last path segment is the id
    fn fetch_one(
        &self,
        raw_id: &str,
    ) -> impl Future<Output = Result<ExternalRecord, AppError>> + Send;

    /// Looks horses up by name or id fragment.
    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<ExternalRecord>, AppError>> + Send;

    /// Fetches the account behind the current credential.
    fn me(&self) -> impl Future<Output = Result<AccountProfile, AppError>> + Send;
}

/// Key-value blob store for whole collections.
///
/// There is no incremental write: every save replaces the named collection.
pub trait CollectionStore: Send + Sync {
    /// Replaces the named collection with `records`.
    fn save(
        &self,
        collection: &str,
        records: &[LocalRecord],
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Loads the named collection; a collection never saved loads as empty.
    fn load(
        &self,
        collection: &str,
    ) -> impl Future<Output = Result<Vec<LocalRecord>, AppError>> + Send;
}
