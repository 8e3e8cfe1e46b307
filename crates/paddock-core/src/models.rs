//! Domain models shared by the client, the importer and the store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppError;

/// Color assigned when the registry does not report one.
pub const DEFAULT_COLOR: &str = "#CCCCCC";

/// Which stable a horse belongs to.
///
/// Local collections are partitioned by status; the same external horse may
/// be tracked once in each partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorseStatus {
    Racing,
    Breeding,
}

impl HorseStatus {
    pub const ALL: [HorseStatus; 2] = [HorseStatus::Racing, HorseStatus::Breeding];

    pub fn as_str(&self) -> &'static str {
        match self {
            HorseStatus::Racing => "racing",
            HorseStatus::Breeding => "breeding",
        }
    }

    /// Name of the persisted collection holding this partition.
    pub fn collection_name(&self) -> &'static str {
        match self {
            HorseStatus::Racing => "horses",
            HorseStatus::Breeding => "breedingHorses",
        }
    }
}

impl fmt::Display for HorseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HorseStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "racing" => Ok(HorseStatus::Racing),
            "breeding" => Ok(HorseStatus::Breeding),
            other => Err(AppError::InvalidInput(format!(
                "unknown horse status '{other}' (expected racing or breeding)"
            ))),
        }
    }
}

/// A horse as reported by the remote registry.
///
/// Ratings are absent until the registry has computed them.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ExternalRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bloodline: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub overall_rating: Option<f64>,
    #[serde(default)]
    pub speed_rating: Option<f64>,
    #[serde(default)]
    pub sprint_rating: Option<f64>,
    #[serde(default)]
    pub endurance_rating: Option<f64>,
}

/// Body of `GET /stable/{racing|breeding}`.
#[derive(Debug, Deserialize)]
pub struct StablePage {
    #[serde(default)]
    pub horses: Vec<ExternalRecord>,
}

/// Body of `GET /me`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountProfile {
    #[serde(default)]
    pub username: Option<String>,
}

/// A locally tracked horse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalRecord {
    pub id: Uuid,
    #[serde(default)]
    pub external_id: Option<String>,
    pub status: HorseStatus,
    pub name: String,
    #[serde(default)]
    pub bloodline: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub stars: Option<f64>,
    #[serde(default)]
    pub speed_stars: Option<f64>,
    #[serde(default)]
    pub sprint_stars: Option<f64>,
    #[serde(default)]
    pub endurance_stars: Option<f64>,
    #[serde(default)]
    pub initial_balance: f64,
    #[serde(default)]
    pub initial_rating: Option<u32>,
    #[serde(default)]
    pub last_reconciled_at: Option<DateTime<Utc>>,
}

impl LocalRecord {
    /// Creates a record entered by hand, never linked to the registry.
    pub fn manual(name: impl Into<String>, status: HorseStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            external_id: None,
            status,
            name: name.into(),
            bloodline: None,
            color: None,
            gender: None,
            stars: None,
            speed_stars: None,
            sprint_stars: None,
            endurance_stars: None,
            initial_balance: 0.0,
            initial_rating: None,
            last_reconciled_at: None,
        }
    }
}
