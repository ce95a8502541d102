//! The relay engine: allocation, reconciliation and dispatch over one state object.

use crate::admin::{AdminOutcome, PendingAdminAction};
use crate::error::EngineError;
use crate::notify::{compose_notification, Notifier};
use crate::state::RelaySnapshot;
use crate::store::SnapshotStore;
use crate::types::*;
use chrono::Utc;
use number_inventory::{validate_name, Inventory, PoolKey};
use otp_parser::{extract_code, format_number, parse_masked, MaskedNumber};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

/// Largest allocation limit an admin may configure.
pub const MAX_NUMBER_LIMIT: usize = 10;

const TOP_CLIENTS: usize = 5;
const ACTIVE_SHOWN: usize = 15;
const RECENT_MATCHES: usize = 5;

/// Values used when no snapshot exists yet, plus the configured admins.
#[derive(Debug, Clone)]
pub struct RelayDefaults {
    pub number_limit: usize,
    pub services: Vec<String>,
    /// Always admins, in addition to those added at runtime.
    pub admins: Vec<ClientId>,
}

impl Default for RelayDefaults {
    fn default() -> Self {
        Self {
            number_limit: crate::state::DEFAULT_NUMBER_LIMIT,
            services: crate::state::default_services(),
            admins: Vec::new(),
        }
    }
}

/// Owns the relay state and drives every operation against it.
///
/// Allocation linearizes per pool through [`Inventory::claim`]; the state
/// lock is only taken for short in-memory updates, never across delivery or
/// snapshot I/O.
pub struct RelayEngine {
    inventory: Arc<Inventory>,
    state: RwLock<RelaySnapshot>,
    store: SnapshotStore,
    /// Serializes snapshot writes so a stale copy never overwrites a newer one.
    persist_lock: Mutex<()>,
    notifier: Arc<dyn Notifier>,
    rng: std::sync::Mutex<StdRng>,
    sessions: RwLock<HashMap<ClientId, PendingAdminAction>>,
    configured_admins: BTreeSet<ClientId>,
}

impl RelayEngine {
    /// Build an engine over an existing state.
    pub fn new(
        inventory: Arc<Inventory>,
        state: RelaySnapshot,
        store: SnapshotStore,
        admins: impl IntoIterator<Item = ClientId>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            inventory,
            state: RwLock::new(state),
            store,
            persist_lock: Mutex::new(()),
            notifier,
            rng: std::sync::Mutex::new(StdRng::from_entropy()),
            sessions: RwLock::new(HashMap::new()),
            configured_admins: admins.into_iter().collect(),
        }
    }

    /// Load the snapshot from `store`, or start from `defaults` if there is none.
    pub async fn open(
        inventory: Arc<Inventory>,
        store: SnapshotStore,
        defaults: RelayDefaults,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, EngineError> {
        let mut state = match store.load().await? {
            Some(state) => state,
            None => RelaySnapshot::with_defaults(defaults.number_limit, defaults.services),
        };

        let limit = state.number_limit.clamp(1, MAX_NUMBER_LIMIT);
        if limit != state.number_limit {
            warn!(
                "Number limit {} out of range, using {}",
                state.number_limit, limit
            );
            state.number_limit = limit;
        }

        info!(
            "Relay engine ready (limit={}, services={:?}, clients={})",
            state.number_limit,
            state.services,
            state.clients.len()
        );

        Ok(Self::new(inventory, state, store, defaults.admins, notifier))
    }

    /// Use a fixed random source so allocations are reproducible.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: std::sync::Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn inventory(&self) -> &Arc<Inventory> {
        &self.inventory
    }

    /// Write the current state to the snapshot store.
    pub async fn persist(&self) -> Result<(), EngineError> {
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.state.read().await.clone();
        self.store.save(&snapshot).await
    }

    // ── Clients ──────────────────────────────────────────────

    pub async fn is_admin(&self, client: &str) -> bool {
        self.configured_admins.contains(client) || self.state.read().await.admins.contains(client)
    }

    pub async fn is_banned(&self, client: &str) -> bool {
        self.state.read().await.banned.contains(client)
    }

    /// Record a client as known. Returns `true` the first time.
    #[instrument(skip(self))]
    pub async fn register_client(&self, client: &str) -> Result<bool, EngineError> {
        let added = {
            let mut state = self.state.write().await;
            if state.banned.contains(client) {
                return Err(EngineError::Banned(client.to_string()));
            }
            state.clients.insert(client.to_string())
        };

        if added {
            info!("New client registered");
            self.persist().await?;
        }
        Ok(added)
    }

    // ── Allocation ───────────────────────────────────────────

    /// Allocate up to the configured limit of unseen numbers from a pool.
    pub async fn allocate(&self, client: &str, key: &PoolKey) -> Result<Allocation, EngineError> {
        let limit = self.state.read().await.number_limit;
        self.allocate_with_limit(client, key, limit).await
    }

    /// Draw up to `limit` unseen numbers uniformly at random and make them the
    /// client's current holding.
    #[instrument(skip(self, key), fields(pool = %key))]
    pub async fn allocate_with_limit(
        &self,
        client: &str,
        key: &PoolKey,
        limit: usize,
    ) -> Result<Allocation, EngineError> {
        if limit == 0 {
            return Err(EngineError::InvalidInput("limit must be at least 1".into()));
        }
        {
            let state = self.state.read().await;
            if state.banned.contains(client) {
                return Err(EngineError::Banned(client.to_string()));
            }
            if !state.services.contains(&key.service) {
                return Err(EngineError::UnknownService(key.service.clone()));
            }
        }

        let batch = self
            .inventory
            .claim(key, |unseen| {
                let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
                unseen.choose_multiple(&mut *rng, limit).cloned().collect()
            })
            .await?;

        if batch.is_empty() {
            info!("Pool out of stock");
            return Ok(Allocation::OutOfStock);
        }

        self.state
            .write()
            .await
            .record_allocation(client, key, &batch, Utc::now());
        info!("Allocated {} numbers", batch.len());

        self.persist().await?;
        Ok(Allocation::Issued(batch))
    }

    // ── Reconciliation ───────────────────────────────────────

    /// Clients whose current holding fits `mask`, one entry per client.
    pub async fn resolve_holders(&self, mask: &MaskedNumber) -> Vec<Holder> {
        self.state.read().await.holders_of(mask)
    }

    /// Process a message from the monitoring channel.
    ///
    /// Every masked number is resolved against current holdings and each
    /// holder is notified. A failed delivery is recorded in the report and
    /// does not stop the others.
    #[instrument(skip_all)]
    pub async fn on_inbound_text(&self, text: &str) -> DispatchReport {
        let masks = parse_masked(text);
        if masks.is_empty() {
            debug!("No masked number in inbound text");
            return DispatchReport::default();
        }

        let code = extract_code(text);
        let mut report = DispatchReport {
            masked: masks.len(),
            code: code.clone(),
            deliveries: Vec::new(),
        };

        for mask in &masks {
            let holders = self.resolve_holders(mask).await;
            if holders.is_empty() {
                debug!("No holder for {}", mask);
                continue;
            }

            for holder in holders {
                let message = compose_notification(&holder.number, code.as_deref(), text);
                let outcome = match self.notifier.deliver(&holder.client, &message).await {
                    Ok(()) => {
                        self.state.write().await.record_match(MatchEvent {
                            time: Utc::now(),
                            number: format_number(&holder.number),
                            code: code.clone(),
                            client: holder.client.clone(),
                        });
                        if let Err(e) = self.persist().await {
                            error!("Failed to persist match event: {}", e);
                        }
                        DeliveryOutcome::Delivered
                    }
                    Err(e) => {
                        error!(client = %holder.client, "Failed to deliver code: {}", e);
                        DeliveryOutcome::Failed(e.0)
                    }
                };

                report.deliveries.push(Delivery {
                    client: holder.client,
                    number: holder.number,
                    outcome,
                });
            }
        }

        info!(
            "Inbound message: {} masked, {} delivered, {} failed",
            report.masked,
            report.delivered(),
            report.failed()
        );
        report
    }

    // ── Admin sessions ───────────────────────────────────────

    async fn require_admin(&self, client: &str) -> Result<(), EngineError> {
        if self.is_admin(client).await {
            Ok(())
        } else {
            Err(EngineError::NotAdmin(client.to_string()))
        }
    }

    /// Start a two-step action; returns the prompt to show the admin.
    pub async fn begin_admin_action(
        &self,
        admin: &str,
        action: PendingAdminAction,
    ) -> Result<&'static str, EngineError> {
        self.require_admin(admin).await?;
        self.sessions
            .write()
            .await
            .insert(admin.to_string(), action);
        Ok(action.prompt())
    }

    pub async fn has_pending_action(&self, admin: &str) -> bool {
        self.sessions.read().await.contains_key(admin)
    }

    /// Drop a pending action. Returns whether one was pending.
    pub async fn cancel_admin_action(&self, admin: &str) -> bool {
        self.sessions.write().await.remove(admin).is_some()
    }

    /// Apply `input` to the admin's pending action.
    ///
    /// Returns `Ok(None)` when nothing is pending. The pending action is
    /// consumed whether or not it succeeds.
    #[instrument(skip(self, input))]
    pub async fn complete_admin_action(
        &self,
        admin: &str,
        input: &str,
    ) -> Result<Option<AdminOutcome>, EngineError> {
        self.require_admin(admin).await?;
        let Some(action) = self.sessions.write().await.remove(admin) else {
            return Ok(None);
        };

        let input = input.trim();
        if input.is_empty() {
            return Err(EngineError::InvalidInput("empty input".into()));
        }

        let outcome = match action {
            PendingAdminAction::AddAdmin => {
                self.state.write().await.admins.insert(input.to_string());
                AdminOutcome::AdminAdded(input.to_string())
            }
            PendingAdminAction::RemoveAdmin => {
                self.state.write().await.admins.remove(input);
                AdminOutcome::AdminRemoved(input.to_string())
            }
            PendingAdminAction::Ban => {
                self.state.write().await.banned.insert(input.to_string());
                AdminOutcome::Banned(input.to_string())
            }
            PendingAdminAction::Unban => {
                self.state.write().await.banned.remove(input);
                AdminOutcome::Unbanned(input.to_string())
            }
            PendingAdminAction::AddService => {
                validate_name(input)
                    .map_err(|_| EngineError::InvalidInput(format!("bad service name: {input}")))?;
                let mut state = self.state.write().await;
                if state.services.iter().any(|s| s == input) {
                    return Ok(Some(AdminOutcome::ServiceExists(input.to_string())));
                }
                state.services.push(input.to_string());
                AdminOutcome::ServiceAdded(input.to_string())
            }
            PendingAdminAction::Broadcast => {
                let (sent, failed) = self.broadcast_text(input).await;
                return Ok(Some(AdminOutcome::Broadcast { sent, failed }));
            }
        };

        info!("Admin action applied: {:?}", action);
        self.persist().await?;
        Ok(Some(outcome))
    }

    /// Send a notice to every known client that is not banned.
    pub async fn broadcast(&self, admin: &str, text: &str) -> Result<AdminOutcome, EngineError> {
        self.require_admin(admin).await?;
        let (sent, failed) = self.broadcast_text(text).await;
        Ok(AdminOutcome::Broadcast { sent, failed })
    }

    async fn broadcast_text(&self, text: &str) -> (usize, usize) {
        let recipients: Vec<ClientId> = {
            let state = self.state.read().await;
            state
                .clients
                .iter()
                .filter(|c| !state.banned.contains(*c))
                .cloned()
                .collect()
        };

        let message = format!("📢 Notice\n\n{text}");
        let mut sent = 0;
        let mut failed = 0;
        for client in recipients {
            match self.notifier.deliver(&client, &message).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    warn!(client = %client, "Broadcast delivery failed: {}", e);
                    failed += 1;
                }
            }
        }

        info!("Broadcast sent to {} clients ({} failed)", sent, failed);
        (sent, failed)
    }

    // ── Direct admin operations ──────────────────────────────

    pub async fn set_limit(&self, admin: &str, limit: usize) -> Result<(), EngineError> {
        self.require_admin(admin).await?;
        if !(1..=MAX_NUMBER_LIMIT).contains(&limit) {
            return Err(EngineError::InvalidInput(format!(
                "limit must be between 1 and {MAX_NUMBER_LIMIT}"
            )));
        }
        self.state.write().await.number_limit = limit;
        info!("Number limit set to {}", limit);
        self.persist().await
    }

    /// Remove a service from the list. Its pools stay on disk.
    pub async fn remove_service(&self, admin: &str, service: &str) -> Result<bool, EngineError> {
        self.require_admin(admin).await?;
        let removed = {
            let mut state = self.state.write().await;
            let before = state.services.len();
            state.services.retain(|s| s != service);
            state.services.len() != before
        };
        if removed {
            info!("Service removed: {}", service);
            self.persist().await?;
        }
        Ok(removed)
    }

    /// Deduplicate every pool of every service, reporting each pool separately.
    pub async fn compact_all(&self, admin: &str) -> Result<Vec<PoolReport>, EngineError> {
        self.require_admin(admin).await?;
        let mut reports = Vec::new();

        for service in self.services().await {
            let countries = match self.inventory.countries(&service).await {
                Ok(countries) => countries,
                Err(e) => {
                    reports.push(PoolReport {
                        key: PoolKey::new(service.as_str(), "*"),
                        result: Err(e.to_string()),
                    });
                    continue;
                }
            };

            for country in countries {
                let key = PoolKey::new(service.as_str(), country);
                let result = self.inventory.compact(&key).await.map_err(|e| {
                    warn!("Compaction failed for {}: {}", key, e);
                    e.to_string()
                });
                reports.push(PoolReport { key, result });
            }
        }

        Ok(reports)
    }

    /// Empty a pool. Returns the number of lines removed.
    pub async fn clear_pool(&self, admin: &str, key: &PoolKey) -> Result<usize, EngineError> {
        self.require_admin(admin).await?;
        Ok(self.inventory.clear(key).await?)
    }

    /// Append uploaded numbers to a pool of a listed service.
    pub async fn upload<S: AsRef<str>>(
        &self,
        admin: &str,
        key: &PoolKey,
        lines: &[S],
    ) -> Result<usize, EngineError> {
        self.require_admin(admin).await?;
        if !self.state.read().await.services.contains(&key.service) {
            return Err(EngineError::UnknownService(key.service.clone()));
        }
        Ok(self.inventory.append(key, lines).await?)
    }

    // ── Read models ──────────────────────────────────────────

    pub async fn services(&self) -> Vec<String> {
        self.state.read().await.services.clone()
    }

    pub async fn number_limit(&self) -> usize {
        self.state.read().await.number_limit
    }

    pub async fn countries(&self, service: &str) -> Result<Vec<String>, EngineError> {
        Ok(self.inventory.countries(service).await?)
    }

    /// Available numbers per listed service.
    pub async fn service_summaries(&self) -> Result<Vec<ServiceSummary>, EngineError> {
        let mut summaries = Vec::new();
        for service in self.services().await {
            let mut available = 0;
            for country in self.inventory.countries(&service).await? {
                let key = PoolKey::new(service.as_str(), country);
                available += self.inventory.stock(&key).await?.available;
            }
            summaries.push(ServiceSummary { service, available });
        }
        Ok(summaries)
    }

    /// Stock of every pool of every listed service.
    pub async fn stock_report(&self) -> Result<Vec<PoolStock>, EngineError> {
        let mut report = Vec::new();
        for service in self.services().await {
            for country in self.inventory.countries(&service).await? {
                let key = PoolKey::new(service.as_str(), country);
                let stock = self.inventory.stock(&key).await?;
                report.push(PoolStock { key, stock });
            }
        }
        Ok(report)
    }

    /// A client's history, most recent first.
    pub async fn history(&self, client: &str, limit: usize) -> Vec<HistoryEntry> {
        self.state
            .read()
            .await
            .history
            .get(client)
            .map(|entries| entries.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub async fn statistics(&self, admin: &str) -> Result<Statistics, EngineError> {
        self.require_admin(admin).await?;

        let mut services = Vec::new();
        let mut total_numbers = 0;
        for service in self.services().await {
            let mut totals = ServiceTotals {
                service: service.clone(),
                total: 0,
                available: 0,
            };
            for country in self.inventory.countries(&service).await? {
                let stock = self
                    .inventory
                    .stock(&PoolKey::new(service.as_str(), country))
                    .await?;
                totals.total += stock.total;
                totals.available += stock.available;
            }
            total_numbers += totals.total;
            services.push(totals);
        }

        let state = self.state.read().await;
        let mut top_clients: Vec<TopClient> = state
            .stats
            .iter()
            .map(|(client, stats)| TopClient {
                client: client.clone(),
                total: stats.total,
                last_active: state.last_active.get(client).copied(),
            })
            .collect();
        top_clients.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.client.cmp(&b.client)));
        top_clients.truncate(TOP_CLIENTS);

        let admins = self
            .configured_admins
            .union(&state.admins)
            .count();

        Ok(Statistics {
            clients: state.clients.len(),
            banned: state.banned.len(),
            admins,
            total_numbers,
            services,
            top_clients,
        })
    }

    pub async fn match_status(&self, admin: &str) -> Result<MatchStatus, EngineError> {
        self.require_admin(admin).await?;
        let state = self.state.read().await;

        let active = state
            .holdings
            .iter()
            .filter(|(_, numbers)| !numbers.is_empty())
            .take(ACTIVE_SHOWN)
            .map(|(client, numbers)| ActiveHolding {
                client: client.clone(),
                numbers: numbers.len(),
                last_active: state.last_active.get(client).copied(),
            })
            .collect();

        let recent = state
            .match_log
            .iter()
            .rev()
            .take(RECENT_MATCHES)
            .cloned()
            .collect();

        Ok(MatchStatus { active, recent })
    }
}
