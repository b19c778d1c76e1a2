//! Tracked-entity files.
//!
//! Price items are loaded once and appended to by intake. Availability
//! sites are re-read at the start of every availability cycle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, RwLock};

use crate::error::{AppError, Result};
use crate::intake::IntakeListener;
use crate::models::{TrackedItem, TrackedItems, TrackedSites, parse_tracked_items, parse_tracked_sites};
use crate::parsers::ParserRegistry;
use crate::storage::write_atomic;

/// Owner of the tracked price items and availability sites.
pub struct TrackedStore {
    registry: Arc<ParserRegistry>,
    items_path: PathBuf,
    sites_path: PathBuf,
    items: RwLock<TrackedItems>,
    /// Serializes writes of the items file
    write_lock: Mutex<()>,
}

impl TrackedStore {
    /// Load tracked price items. Any malformed entry is fatal.
    pub async fn open(
        items_path: impl Into<PathBuf>,
        sites_path: impl Into<PathBuf>,
        registry: Arc<ParserRegistry>,
    ) -> Result<Self> {
        let items_path = items_path.into();
        let items = load_items(&items_path, &registry).await?;
        log::info!(
            "Loaded {} tracked price items from {}",
            items.len(),
            items_path.display()
        );

        Ok(Self {
            registry,
            items_path,
            sites_path: sites_path.into(),
            items: RwLock::new(items),
            write_lock: Mutex::new(()),
        })
    }

    /// Copy of the current tracked price items.
    pub async fn items(&self) -> TrackedItems {
        self.items.read().await.clone()
    }

    /// Read tracked availability sites. Any malformed entry is fatal.
    pub async fn load_sites(&self) -> Result<TrackedSites> {
        let json = read_config(&self.sites_path).await?;
        parse_tracked_sites(&json, &self.registry).map_err(|e| config_error(&self.sites_path, e))
    }

    /// Append a price item and persist the whole set. Returns the new id.
    ///
    /// The id is derived from the URL, so adding the same URL twice
    /// replaces the earlier entry.
    pub async fn add_item(&self, item: TrackedItem) -> Result<String> {
        self.registry.price_parser(&item.parser)?;

        let _guard = self.write_lock.lock().await;

        let id = item_id(&item.url);
        let mut next = self.items.read().await.clone();
        next.insert(id.clone(), item);

        let bytes = serde_json::to_vec_pretty(&next)?;
        write_atomic(&self.items_path, &bytes)
            .await
            .map_err(|e| AppError::persistence(self.items_path.display(), e))?;

        *self.items.write().await = next;
        log::info!("Tracked price item {id} added");
        Ok(id)
    }
}

#[async_trait]
impl IntakeListener for TrackedStore {
    async fn item_added(&self, item: TrackedItem) -> Result<String> {
        self.add_item(item).await
    }
}

/// Stable id for a new item: first 12 hex chars of the URL's SHA-256.
pub fn item_id(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    hex::encode(digest)[..12].to_string()
}

async fn load_items(path: &Path, registry: &ParserRegistry) -> Result<TrackedItems> {
    let json = read_config(path).await?;
    parse_tracked_items(&json, registry).map_err(|e| config_error(path, e))
}

async fn read_config(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::config(format!(
            "Could not load tracked file {}: {e}",
            path.display()
        ))
    })
}

fn config_error(path: &Path, e: AppError) -> AppError {
    match e {
        AppError::Config(message) => AppError::config(format!("{}: {message}", path.display())),
        other => AppError::config(format!("{}: {other}", path.display())),
    }
}
