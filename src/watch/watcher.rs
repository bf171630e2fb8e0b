//! Periodic discount sweep over the watch registry.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::config::WatcherConfig;
use crate::monitoring::health::HealthState;
use crate::notify::format;
use crate::notify::Notifier;
use crate::store::models::AppId;
use crate::store::pacing::RequestPacer;
use crate::store::LookupService;
use crate::watch::discount::DiscountStrategy;
use crate::watch::policy::{Decision, DiscountEndPolicy};
use crate::watch::registry::{UserId, WatchRegistry};

/// Counters for one sweep. `notified`, `skipped` and `failed` count pairs;
/// `lookups` counts distinct apps queried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub pairs: usize,
    pub lookups: usize,
    pub notified: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct DiscountWatcher {
    lookup: Arc<dyn LookupService>,
    registry: Arc<WatchRegistry>,
    notifier: Arc<dyn Notifier>,
    strategy: Arc<dyn DiscountStrategy>,
    interval: Duration,
    pacer: RequestPacer,
    on_discount_end: DiscountEndPolicy,
    health: Option<HealthState>,
}

impl DiscountWatcher {
    pub fn new(
        config: &WatcherConfig,
        lookup: Arc<dyn LookupService>,
        registry: Arc<WatchRegistry>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            lookup,
            registry,
            notifier,
            strategy: config.discount_source.strategy(),
            interval: config.sweep_interval(),
            pacer: RequestPacer::new(config.lookup_delay()),
            on_discount_end: config.on_discount_end,
            health: None,
        }
    }

    pub fn with_strategy(mut self, strategy: Arc<dyn DiscountStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_health(mut self, health: HealthState) -> Self {
        self.health = Some(health);
        self
    }

    /// Check every watched app once and notify on discount changes.
    ///
    /// Each app is looked up once per sweep no matter how many users watch
    /// it. A failed lookup only skips the pairs for that app.
    #[instrument(skip(self))]
    pub async fn sweep(&self) -> SweepReport {
        let pairs = self.registry.snapshot().await;
        let mut report = SweepReport {
            pairs: pairs.len(),
            ..Default::default()
        };

        let mut by_app: BTreeMap<AppId, Vec<UserId>> = BTreeMap::new();
        for (user, app_id) in pairs {
            by_app.entry(app_id).or_default().push(user);
        }

        for (app_id, users) in by_app {
            self.pacer.ready().await;
            report.lookups += 1;

            let details = match self.lookup.get_details(app_id).await {
                Ok(details) => details,
                Err(e) => {
                    warn!(app_id, error = %e, "Lookup failed, skipping app this sweep");
                    report.failed += users.len();
                    continue;
                }
            };

            let price = match details.final_formatted() {
                Some(price) if !details.is_free => price.to_string(),
                _ => {
                    debug!(app_id, is_free = details.is_free, "No price to watch, skipping");
                    report.skipped += users.len();
                    continue;
                }
            };

            let discount = self.strategy.discount_percent(&details);

            for user in users {
                let decision = match self
                    .registry
                    .apply_discount(user, app_id, discount, self.on_discount_end)
                    .await
                {
                    Ok(decision) => decision,
                    Err(e) => {
                        // Unwatched between snapshot and now.
                        debug!(error = %e, "Pair vanished during sweep");
                        continue;
                    }
                };

                match decision {
                    Decision::Notify { previous, current } => {
                        info!(%user, app_id, previous, current, "Discount changed, notifying");
                        let text = format::discount_alert(&details.name, current, &price, app_id);
                        self.notifier.send(user, &text).await;
                        report.notified += 1;
                    }
                    Decision::Reset { previous } => {
                        debug!(%user, app_id, previous, "Discount ended, history cleared");
                    }
                    Decision::Unchanged => {}
                }
            }
        }

        info!(
            pairs = report.pairs,
            lookups = report.lookups,
            notified = report.notified,
            skipped = report.skipped,
            failed = report.failed,
            "Sweep complete"
        );
        report
    }

    /// Sweep every interval until `shutdown` turns true or its sender is dropped.
    /// The first sweep happens one interval after start.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_s = self.interval.as_secs(),
            "Discount watcher started"
        );

        let mut sweep_number = 0u64;

        while !*shutdown.borrow() {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }

            sweep_number += 1;
            let report = self.sweep().await;

            if let Some(ref health) = self.health {
                let watches = self.registry.watch_count().await;
                health.record_sweep(sweep_number, report, watches).await;
            }
        }

        info!(sweeps = sweep_number, "Discount watcher stopped");
    }

    pub fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{ItemPriceSnapshot, PriceOverview, SearchHit};
    use crate::store::LookupError;
    use crate::watch::discount::DiscountSource;
    use crate::watch::policy::RewatchPolicy;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    struct CountingStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LookupService for CountingStore {
        async fn search_by_name(&self, _term: &str) -> Result<SearchHit, LookupError> {
            Err(LookupError::NotFound)
        }

        async fn get_details(&self, app_id: AppId) -> Result<ItemPriceSnapshot, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ItemPriceSnapshot {
                app_id,
                name: format!("App {app_id}"),
                is_free: false,
                price: Some(PriceOverview {
                    currency: "RUB".to_string(),
                    initial: 1000,
                    final_price: 750,
                    discount_percent: Some(25),
                    initial_formatted: "10 руб.".to_string(),
                    final_formatted: "7,50 руб.".to_string(),
                }),
                related_ids: vec![],
            })
        }
    }

    #[derive(Default)]
    struct Inbox(Mutex<Vec<(UserId, String)>>);

    #[async_trait]
    impl Notifier for Inbox {
        async fn send(&self, user: UserId, text: &str) {
            self.0.lock().await.push((user, text.to_string()));
        }
    }

    fn config() -> WatcherConfig {
        WatcherConfig {
            sweep_interval_seconds: 0,
            lookup_delay_ms: 0,
            discount_source: DiscountSource::Reported,
            on_discount_end: DiscountEndPolicy::KeepLast,
            on_rewatch: RewatchPolicy::Preserve,
        }
    }

    #[tokio::test]
    async fn test_shared_app_is_looked_up_once() {
        let store = Arc::new(CountingStore {
            calls: AtomicUsize::new(0),
        });
        let registry = Arc::new(WatchRegistry::default());
        let inbox = Arc::new(Inbox::default());
        registry.add_watch(UserId(1), 10).await;
        registry.add_watch(UserId(2), 10).await;

        let watcher = DiscountWatcher::new(&config(), store.clone(), registry, inbox.clone());
        let report = watcher.sweep().await;

        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.pairs, 2);
        assert_eq!(report.lookups, 1);
        assert_eq!(report.notified, 2);
        assert_eq!(inbox.0.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_registry_sweep_is_noop() {
        let store = Arc::new(CountingStore {
            calls: AtomicUsize::new(0),
        });
        let watcher = DiscountWatcher::new(
            &config(),
            store.clone(),
            Arc::new(WatchRegistry::default()),
            Arc::new(Inbox::default()),
        );
        assert_eq!(watcher.sweep().await, SweepReport::default());
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let store = Arc::new(CountingStore {
            calls: AtomicUsize::new(0),
        });
        let registry = Arc::new(WatchRegistry::default());
        let inbox = Arc::new(Inbox::default());
        registry.add_watch(UserId(1), 10).await;

        let mut watcher =
            DiscountWatcher::new(&config(), store.clone(), registry, inbox.clone());
        watcher.interval = Duration::from_millis(20);
        let watcher = Arc::new(watcher);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = watcher.spawn(shutdown_rx);

        tokio::time::sleep(Duration::from_millis(150)).await;
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("watcher should stop")
            .unwrap();

        // Several sweeps ran, but the unchanged 25% was only announced once.
        assert!(store.calls.load(Ordering::SeqCst) >= 2);
        assert_eq!(inbox.0.lock().await.len(), 1);
    }
}
