//! House reference table.
//!
//! House pages do not say which town a house is in or whether it is a
//! guildhall; that comes from a published mapping loaded once at startup.
//! If the mapping cannot be loaded the table stays empty and lookups return
//! empty strings: requests keep working with those fields blank.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::{Result, ScrapeError};
use crate::scraper::fetcher::Fetcher;

/// Mapping file as published
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HouseMappingData {
    pub houses: Vec<HouseMapping>,
}

/// One house entry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HouseMapping {
    pub house_id: u32,
    pub town: String,
    #[serde(rename = "type")]
    pub house_type: String,
}

/// Read-only house id lookup
#[derive(Debug, Clone, Default)]
pub struct HouseTable {
    houses: HashMap<u32, HouseMapping>,
    available: bool,
}

impl HouseTable {
    /// Table that resolves nothing
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_data(data: HouseMappingData) -> Self {
        let houses = data
            .houses
            .into_iter()
            .map(|house| (house.house_id, house))
            .collect();
        Self {
            houses,
            available: true,
        }
    }

    /// Fetch the mapping. Never fails: on error the empty table is returned.
    pub async fn load(fetcher: &Fetcher, url: &str) -> Self {
        if url.is_empty() {
            warn!("No house mapping URL configured, house towns will be empty");
            return Self::empty();
        }

        match fetcher.fetch_json::<HouseMappingData>(url).await {
            Ok(data) => {
                let table = Self::from_data(data);
                info!("Loaded house mapping: {} houses", table.len());
                table
            }
            Err(e) => {
                warn!("Failed to load house mapping from {}: {}, house towns will be empty", url, e);
                Self::empty()
            }
        }
    }

    /// `(town, type)` for a house id, or two empty strings.
    pub fn resolve(&self, house_id: u32) -> (String, String) {
        self.houses
            .get(&house_id)
            .map(|house| (house.town.clone(), house.house_type.clone()))
            .unwrap_or_default()
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// [`ScrapeError::ReferenceDataUnavailable`] while lookups are degraded.
    pub fn ensure_available(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(ScrapeError::ReferenceDataUnavailable)
        }
    }

    pub fn len(&self) -> usize {
        self.houses.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;
    use crate::retry::RetryConfig;

    const SAMPLE_JSON: &str = r#"{
        "houses": [
            {"house_id": 10001, "town": "Thais", "type": "house"},
            {"house_id": 10301, "town": "Carlin", "type": "guildhall"}
        ]
    }"#;

    #[test]
    fn test_resolve() {
        let data: HouseMappingData = serde_json::from_str(SAMPLE_JSON).unwrap();
        let table = HouseTable::from_data(data);
        assert!(table.is_available());
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve(10301), ("Carlin".to_string(), "guildhall".to_string()));
        assert_eq!(table.resolve(99999), (String::new(), String::new()));
    }

    #[test]
    fn test_empty_table_degrades() {
        let table = HouseTable::empty();
        assert!(!table.is_available());
        assert!(matches!(
            table.ensure_available(),
            Err(ScrapeError::ReferenceDataUnavailable)
        ));
        assert_eq!(table.resolve(10001), (String::new(), String::new()));
    }

    #[tokio::test]
    async fn test_load_failure_returns_empty_table() {
        let upstream = UpstreamConfig {
            timeout_secs: 1,
            ..Default::default()
        };
        let fetcher = Fetcher::new(&upstream, RetryConfig::none()).unwrap();

        // Nothing listens on port 9 of the loopback interface.
        let table = HouseTable::load(&fetcher, "http://127.0.0.1:9/houses.json").await;
        assert!(!table.is_available());
        assert_eq!(table.resolve(10001), (String::new(), String::new()));

        let table = HouseTable::load(&fetcher, "").await;
        assert!(!table.is_available());
    }
}
