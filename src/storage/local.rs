//! Local filesystem storage implementation.

use std::collections::BTreeSet;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Local;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::models::{AvailabilityBySite, LowestPrices, PriceScanResult};
use crate::storage::{LAST_UPDATE, SnapshotStore, write_atomic};
use crate::utils::{file_timestamp, format_datetime};

const LOWEST_PRICES_FILE: &str = "lowest_prices.json";
const AVAILABILITY_FILE: &str = "last_availability.json";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        write_atomic(&self.path(key), &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write a snapshot object with a fresh `LAST_UPDATE` field.
    async fn write_snapshot<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let Value::Object(mut map) = serde_json::to_value(value)? else {
            return Err(AppError::persistence(key, "snapshot is not a JSON object"));
        };
        map.insert(
            LAST_UPDATE.to_string(),
            Value::String(format_datetime(&Local::now())),
        );
        self.write_json(key, &map).await
    }

    /// Read a snapshot object without its `LAST_UPDATE` field.
    async fn read_snapshot(&self, key: &str) -> Result<Map<String, Value>> {
        match self.read_bytes(key).await? {
            Some(bytes) => {
                let mut map: Map<String, Value> = serde_json::from_slice(&bytes)?;
                map.remove(LAST_UPDATE);
                Ok(map)
            }
            None => {
                log::warn!("No {key} found");
                Ok(Map::new())
            }
        }
    }

    async fn load_tracked<T: DeserializeOwned>(
        &self,
        key: &str,
        tracked: &BTreeSet<String>,
    ) -> Result<T> {
        let mut map = self
            .read_snapshot(key)
            .await
            .map_err(|e| AppError::persistence(self.path(key).display(), e))?;

        let before = map.len();
        map.retain(|id, _| tracked.contains(id));
        if map.len() < before {
            log::debug!("{key}: dropped {} untracked entries", before - map.len());
        }

        serde_json::from_value(Value::Object(map))
            .map_err(|e| AppError::persistence(self.path(key).display(), e))
    }

    async fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.write_snapshot(key, value)
            .await
            .map_err(|e| AppError::persistence(self.path(key).display(), e))
    }

    /// Archive name for this second, suffixed `_2`, `_3`... if already taken.
    async fn archive_key(&self, prefix: &str) -> Result<String> {
        let stamp = file_timestamp(&Local::now());
        let mut key = format!("{prefix}_{stamp}.json");
        let mut n = 1;
        while tokio::fs::try_exists(self.path(&key)).await? {
            n += 1;
            key = format!("{prefix}_{stamp}_{n}.json");
        }
        Ok(key)
    }

    async fn archive<T: Serialize>(&self, prefix: &str, value: &T) -> Result<String> {
        let key = self.archive_key(prefix).await?;
        self.write_json(&key, value)
            .await
            .map_err(|e| AppError::persistence(self.path(&key).display(), e))?;
        Ok(self.path(&key).display().to_string())
    }
}

#[async_trait]
impl SnapshotStore for LocalStorage {
    async fn load_lowest_prices(&self, tracked: &BTreeSet<String>) -> Result<LowestPrices> {
        self.load_tracked(LOWEST_PRICES_FILE, tracked).await
    }

    async fn save_lowest_prices(&self, prices: &LowestPrices) -> Result<()> {
        self.save(LOWEST_PRICES_FILE, prices).await
    }

    async fn load_availability(&self, tracked: &BTreeSet<String>) -> Result<AvailabilityBySite> {
        self.load_tracked(AVAILABILITY_FILE, tracked).await
    }

    async fn save_availability(&self, snapshot: &AvailabilityBySite) -> Result<()> {
        self.save(AVAILABILITY_FILE, snapshot).await
    }

    async fn archive_price_scan(&self, scan: &PriceScanResult) -> Result<String> {
        self.archive("prices", scan).await
    }

    async fn archive_availability_scan(&self, scan: &AvailabilityBySite) -> Result<String> {
        self.archive("availability", scan).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AvailabilityRecord, PriceOffer};
    use tempfile::TempDir;

    fn tracked(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_empty() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let prices = storage.load_lowest_prices(&tracked(&["a"])).await.unwrap();
        assert!(prices.is_empty());
    }

    #[tokio::test]
    async fn test_lowest_prices_round_trip_strips_last_update() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let prices: LowestPrices = [("item1".to_string(), 290.0), ("item2".to_string(), 300.0)]
            .into_iter()
            .collect();
        storage.save_lowest_prices(&prices).await.unwrap();

        let raw: Value =
            serde_json::from_slice(&std::fs::read(tmp.path().join(LOWEST_PRICES_FILE)).unwrap())
                .unwrap();
        assert!(raw.get(LAST_UPDATE).is_some_and(Value::is_string));

        let loaded = storage
            .load_lowest_prices(&tracked(&["item1", "item2"]))
            .await
            .unwrap();
        assert_eq!(loaded, prices);
    }

    #[tokio::test]
    async fn test_load_drops_untracked_keys() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(LOWEST_PRICES_FILE),
            r#"{"kept": 10, "stale": 20, "LAST_UPDATE": "03:24:00 17/12/1995"}"#,
        )
        .unwrap();
        let storage = LocalStorage::new(tmp.path());

        let loaded = storage.load_lowest_prices(&tracked(&["kept"])).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["kept"], 10.0);
    }

    #[tokio::test]
    async fn test_corrupted_snapshot_is_persistence_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(AVAILABILITY_FILE), "{not json").unwrap();
        let storage = LocalStorage::new(tmp.path());

        let err = storage.load_availability(&tracked(&["s"])).await.unwrap_err();
        assert!(matches!(err, AppError::Persistence { .. }));
    }

    #[tokio::test]
    async fn test_availability_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let mut snapshot = AvailabilityBySite::new();
        snapshot.entry("shop".to_string()).or_default().insert(
            "item1".to_string(),
            AvailabilityRecord {
                name: "Item 1".into(),
                url: "https://shop.test/item1".into(),
                available: true,
            },
        );
        storage.save_availability(&snapshot).await.unwrap();

        let loaded = storage.load_availability(&tracked(&["shop"])).await.unwrap();
        assert_eq!(loaded, snapshot);

        let none = storage.load_availability(&tracked(&["other"])).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_archive_file_name() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("results"));

        let scan: PriceScanResult = [(
            "a".to_string(),
            vec![PriceOffer {
                shop: "A".into(),
                price: 1.5,
            }],
        )]
        .into_iter()
        .collect();

        let location = storage.archive_price_scan(&scan).await.unwrap();
        let name = PathBuf::from(&location)
            .file_name()
            .unwrap()
            .to_string_lossy()
            .to_string();
        assert!(name.starts_with("prices_"));
        assert!(name.ends_with(".json"));
        assert_eq!(name.len(), "prices_YYYY_MM_DD__HH_MM_SS.json".len());

        let written: PriceScanResult =
            serde_json::from_slice(&std::fs::read(&location).unwrap()).unwrap();
        assert_eq!(written, scan);
    }

    #[tokio::test]
    async fn test_archives_in_same_second_are_kept() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let first: PriceScanResult = [("a".to_string(), Vec::new())].into_iter().collect();
        let second: PriceScanResult = [("b".to_string(), Vec::new())].into_iter().collect();

        let first_location = storage.archive_price_scan(&first).await.unwrap();
        let second_location = storage.archive_price_scan(&second).await.unwrap();
        assert_ne!(first_location, second_location);

        let read = |location: &str| -> PriceScanResult {
            serde_json::from_slice(&std::fs::read(location).unwrap()).unwrap()
        };
        assert_eq!(read(&first_location), first);
        assert_eq!(read(&second_location), second);
    }
}
