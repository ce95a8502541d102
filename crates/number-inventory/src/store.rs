//! File-backed pool and seen-set storage.
//!
//! Layout on disk:
//! - `<number_dir>/<service>/<country>.txt`: the pool, one raw number per line.
//! - `<seen_dir>/<service>/<country>.txt`: the seen log, one raw number per line.
//!
//! Seen sets are loaded lazily on first access and cached per pool. Every
//! operation on a pool runs under that pool's own lock, so unrelated pools
//! never serialize behind each other.

use crate::error::InventoryError;
use crate::types::{PoolKey, StockLevel};
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

const POOL_EXTENSION: &str = ".txt";
const BACKUP_SUFFIX: &str = "_Backup.txt";

/// Cached seen-set for one pool.
#[derive(Default)]
struct SeenState {
    loaded: bool,
    numbers: HashSet<String>,
}

/// Number inventory over a pool directory and a seen directory.
pub struct Inventory {
    number_dir: PathBuf,
    seen_dir: PathBuf,
    pools: Mutex<HashMap<PoolKey, Arc<Mutex<SeenState>>>>,
}

impl Inventory {
    pub fn new(number_dir: impl Into<PathBuf>, seen_dir: impl Into<PathBuf>) -> Self {
        let inventory = Self {
            number_dir: number_dir.into(),
            seen_dir: seen_dir.into(),
            pools: Mutex::new(HashMap::new()),
        };

        info!(
            "Inventory initialized (numbers={:?}, seen={:?})",
            inventory.number_dir, inventory.seen_dir
        );

        inventory
    }

    /// Ordered raw contents of a pool. A missing pool is empty.
    pub async fn pool(&self, key: &PoolKey) -> Result<Vec<String>, InventoryError> {
        read_lines(&self.pool_path(key)?).await
    }

    /// Numbers already handed out from a pool.
    pub async fn seen(&self, key: &PoolKey) -> Result<HashSet<String>, InventoryError> {
        let seen_path = self.seen_path(key)?;
        let slot = self.slot(key).await;
        let mut state = slot.lock().await;
        load_seen(&mut state, &seen_path).await?;
        Ok(state.numbers.clone())
    }

    /// Pool minus seen, in first-appearance pool order without duplicates.
    pub async fn unseen(&self, key: &PoolKey) -> Result<Vec<String>, InventoryError> {
        let pool_path = self.pool_path(key)?;
        let seen_path = self.seen_path(key)?;
        let slot = self.slot(key).await;
        let mut state = slot.lock().await;
        load_seen(&mut state, &seen_path).await?;
        let pool = read_lines(&pool_path).await?;
        Ok(unseen_of(&pool, &state.numbers))
    }

    /// Record numbers as seen. Re-marking a seen number changes nothing.
    #[instrument(skip(self, numbers), fields(pool = %key))]
    pub async fn mark_seen(&self, key: &PoolKey, numbers: &[String]) -> Result<(), InventoryError> {
        let seen_path = self.seen_path(key)?;
        let slot = self.slot(key).await;
        let mut state = slot.lock().await;
        load_seen(&mut state, &seen_path).await?;
        let fresh: Vec<String> = numbers
            .iter()
            .filter(|n| state.numbers.insert((*n).clone()))
            .cloned()
            .collect();

        append_lines(&seen_path, &fresh).await
    }

    /// Atomically pick numbers from the unseen set and mark them seen.
    ///
    /// `select` receives the current unseen numbers (never empty) and returns
    /// the ones to hand out. The choice, the seen update and the seen log
    /// append all happen under the pool lock, so a concurrent `clear` never
    /// interleaves with them.
    #[instrument(skip(self, select), fields(pool = %key))]
    pub async fn claim<F>(&self, key: &PoolKey, select: F) -> Result<Vec<String>, InventoryError>
    where
        F: FnOnce(&[String]) -> Vec<String>,
    {
        let pool_path = self.pool_path(key)?;
        let seen_path = self.seen_path(key)?;
        let slot = self.slot(key).await;

        let mut state = slot.lock().await;
        load_seen(&mut state, &seen_path).await?;
        let pool = read_lines(&pool_path).await?;
        let unseen = unseen_of(&pool, &state.numbers);
        if unseen.is_empty() {
            debug!("Pool {} has no unseen numbers", key);
            return Ok(Vec::new());
        }

        let available: HashSet<&String> = unseen.iter().collect();
        let claimed: Vec<String> = select(&unseen)
            .into_iter()
            .filter(|n| available.contains(n))
            .filter(|n| state.numbers.insert(n.clone()))
            .collect();

        append_lines(&seen_path, &claimed).await?;
        debug!("Claimed {} numbers from {}", claimed.len(), key);
        Ok(claimed)
    }

    /// Rewrite a pool without duplicates, keeping first-seen order.
    /// Returns the resulting number count.
    #[instrument(skip(self), fields(pool = %key))]
    pub async fn compact(&self, key: &PoolKey) -> Result<usize, InventoryError> {
        let pool_path = self.pool_path(key)?;
        let slot = self.slot(key).await;
        let _guard = slot.lock().await;

        let pool = read_lines(&pool_path).await?;
        let mut distinct = HashSet::new();
        let kept: Vec<String> = pool
            .into_iter()
            .filter(|n| distinct.insert(n.clone()))
            .collect();

        write_lines(&pool_path, &kept).await?;
        info!("Compacted {} to {} numbers", key, kept.len());
        Ok(kept.len())
    }

    /// Append uploaded lines to a pool. Blank lines are dropped.
    /// Returns how many numbers were added.
    #[instrument(skip(self, lines), fields(pool = %key))]
    pub async fn append<S: AsRef<str>>(
        &self,
        key: &PoolKey,
        lines: &[S],
    ) -> Result<usize, InventoryError> {
        let numbers: Vec<String> = lines
            .iter()
            .map(|l| l.as_ref().trim())
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();

        if numbers.is_empty() {
            return Ok(0);
        }

        let pool_path = self.pool_path(key)?;
        let slot = self.slot(key).await;
        let _guard = slot.lock().await;
        append_lines(&pool_path, &numbers).await?;

        info!("Added {} numbers to {}", numbers.len(), key);
        Ok(numbers.len())
    }

    /// Truncate a pool and forget its seen state. Returns the count removed.
    ///
    /// A missing pool stays missing; no empty pool file is created for it.
    #[instrument(skip(self), fields(pool = %key))]
    pub async fn clear(&self, key: &PoolKey) -> Result<usize, InventoryError> {
        let pool_path = self.pool_path(key)?;
        let seen_path = self.seen_path(key)?;
        let slot = self.slot(key).await;
        let mut state = slot.lock().await;

        let removed = read_lines(&pool_path).await?.len();
        if fs::try_exists(&pool_path).await? {
            write_lines(&pool_path, &[]).await?;
        }
        remove_if_exists(&seen_path).await?;
        state.numbers.clear();
        state.loaded = true;

        info!("Cleared {} ({} numbers removed)", key, removed);
        Ok(removed)
    }

    /// Countries that have a pool file under a service, sorted.
    pub async fn countries(&self, service: &str) -> Result<Vec<String>, InventoryError> {
        validate_name(service)?;
        let dir = self.number_dir.join(service);

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut countries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(BACKUP_SUFFIX) {
                continue;
            }
            if let Some(country) = name.strip_suffix(POOL_EXTENSION) {
                countries.push(country.to_string());
            }
        }

        countries.sort();
        Ok(countries)
    }

    /// Stock counters for a pool.
    pub async fn stock(&self, key: &PoolKey) -> Result<StockLevel, InventoryError> {
        let pool_path = self.pool_path(key)?;
        let seen_path = self.seen_path(key)?;
        let slot = self.slot(key).await;
        let mut state = slot.lock().await;
        load_seen(&mut state, &seen_path).await?;

        let pool = read_lines(&pool_path).await?;
        let distinct: HashSet<&String> = pool.iter().collect();
        let used = distinct
            .iter()
            .filter(|n| state.numbers.contains(n.as_str()))
            .count();

        Ok(StockLevel {
            total: pool.len(),
            used,
            available: distinct.len() - used,
        })
    }

    /// Delete seen logs untouched for longer than `max_age`.
    ///
    /// A seen log is only removed when its pool is empty or gone, and the
    /// cached seen-set is dropped with it. Logs of stocked pools are kept so
    /// that no handed-out number becomes available again.
    #[instrument(skip(self))]
    pub async fn prune_seen(&self, max_age: Duration) -> Result<usize, InventoryError> {
        let mut services = match fs::read_dir(&self.seen_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let now = SystemTime::now();
        let mut removed = 0;

        while let Some(service_entry) = services.next_entry().await? {
            if !service_entry.file_type().await?.is_dir() {
                continue;
            }
            let service = service_entry.file_name().to_string_lossy().into_owned();
            let mut files = fs::read_dir(service_entry.path()).await?;

            while let Some(file) = files.next_entry().await? {
                let name = file.file_name().to_string_lossy().into_owned();
                let Some(country) = name.strip_suffix(POOL_EXTENSION) else {
                    continue;
                };

                let modified = file.metadata().await?.modified()?;
                let age = now.duration_since(modified).unwrap_or_default();
                if age <= max_age {
                    continue;
                }

                let key = PoolKey::new(service.as_str(), country);
                if self.prune_one(&key, &file.path()).await? {
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            info!("Pruned {} stale seen logs", removed);
        }
        Ok(removed)
    }

    async fn prune_one(&self, key: &PoolKey, seen_path: &Path) -> Result<bool, InventoryError> {
        let pool_path = match self.pool_path(key) {
            Ok(path) => path,
            Err(_) => {
                warn!("Skipping seen log with unusable name: {:?}", seen_path);
                return Ok(false);
            }
        };

        let slot = self.slot(key).await;
        let mut state = slot.lock().await;

        if !read_lines(&pool_path).await?.is_empty() {
            debug!("Keeping stale seen log for stocked pool {}", key);
            return Ok(false);
        }

        remove_if_exists(seen_path).await?;
        state.numbers.clear();
        state.loaded = false;
        debug!("Removed seen log for {}", key);
        Ok(true)
    }

    async fn slot(&self, key: &PoolKey) -> Arc<Mutex<SeenState>> {
        let mut pools = self.pools.lock().await;
        pools.entry(key.clone()).or_default().clone()
    }

    fn pool_path(&self, key: &PoolKey) -> Result<PathBuf, InventoryError> {
        pool_file(&self.number_dir, key)
    }

    fn seen_path(&self, key: &PoolKey) -> Result<PathBuf, InventoryError> {
        pool_file(&self.seen_dir, key)
    }
}

fn pool_file(root: &Path, key: &PoolKey) -> Result<PathBuf, InventoryError> {
    validate_name(&key.service)?;
    validate_name(&key.country)?;
    Ok(root
        .join(&key.service)
        .join(format!("{}{}", key.country, POOL_EXTENSION)))
}

/// Check that a service or country name is usable as a single path component.
pub fn validate_name(name: &str) -> Result<(), InventoryError> {
    let trimmed = name.trim();
    let invalid = trimmed.is_empty()
        || trimmed != name
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);

    if invalid {
        Err(InventoryError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

fn unseen_of(pool: &[String], seen: &HashSet<String>) -> Vec<String> {
    let mut emitted = HashSet::new();
    pool.iter()
        .filter(|n| !seen.contains(n.as_str()))
        .filter(|n| emitted.insert(n.as_str()))
        .cloned()
        .collect()
}

async fn load_seen(state: &mut SeenState, seen_path: &Path) -> Result<(), InventoryError> {
    if !state.loaded {
        state.numbers.extend(read_lines(seen_path).await?);
        state.loaded = true;
    }
    Ok(())
}

async fn read_lines(path: &Path) -> Result<Vec<String>, InventoryError> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

async fn append_lines(path: &Path, lines: &[String]) -> Result<(), InventoryError> {
    if lines.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let needs_separator = match fs::read(path).await {
        Ok(existing) => !existing.is_empty() && !existing.ends_with(b"\n"),
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => return Err(e.into()),
    };

    let mut buf = String::new();
    if needs_separator {
        buf.push('\n');
    }
    for line in lines {
        buf.push_str(line);
        buf.push('\n');
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(buf.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

async fn write_lines(path: &Path, lines: &[String]) -> Result<(), InventoryError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }

    // Write atomically using temp file + rename
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).await?;
    fs::rename(&temp_path, path).await?;
    Ok(())
}

async fn remove_if_exists(path: &Path) -> Result<(), InventoryError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
