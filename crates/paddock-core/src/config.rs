use std::time::Duration;

use crate::HorseStatus;

/// Public ZED Champions API root.
pub const DEFAULT_API_BASE: &str = "https://api.zedchampions.com/v1";

/// HTTP client configuration for registry calls.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub api_base: String,
    /// Forwarding proxy tried before the direct API, when set.
    pub proxy_base: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            api_base: DEFAULT_API_BASE.to_string(),
            proxy_base: None,
        }
    }
}

/// Which rating fields a partition keeps from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingFields {
    All,
    OverallOnly,
    None,
}

/// Per-status shape of reconciled records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSchema {
    pub ratings: RatingFields,
    /// `initialRating` given to newly created records.
    pub rating_baseline: Option<u32>,
}

impl StatusSchema {
    pub fn racing() -> Self {
        Self {
            ratings: RatingFields::All,
            rating_baseline: Some(1000),
        }
    }

    pub fn breeding() -> Self {
        Self {
            ratings: RatingFields::OverallOnly,
            rating_baseline: None,
        }
    }
}

/// Reconciliation configuration.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub racing: StatusSchema,
    pub breeding: StatusSchema,
}

impl ImportConfig {
    pub fn schema_for(&self, status: HorseStatus) -> StatusSchema {
        match status {
            HorseStatus::Racing => self.racing,
            HorseStatus::Breeding => self.breeding,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            racing: StatusSchema::racing(),
            breeding: StatusSchema::breeding(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.api_base, "https://api.zedchampions.com/v1");
        assert!(config.proxy_base.is_none());
    }

    #[test]
    fn test_import_config_defaults() {
        let config = ImportConfig::default();
        let racing = config.schema_for(HorseStatus::Racing);
        assert_eq!(racing.ratings, RatingFields::All);
        assert_eq!(racing.rating_baseline, Some(1000));

        let breeding = config.schema_for(HorseStatus::Breeding);
        assert_eq!(breeding.ratings, RatingFields::OverallOnly);
        assert_eq!(breeding.rating_baseline, None);
    }
}
